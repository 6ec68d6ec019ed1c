//! 认证访问
//!
//! 会话命令只携带令牌，处理前需要先解析出用户名。
//! 认证数据由外部系统签发，这里只做只读查询。

use std::collections::HashMap;
use std::sync::Mutex;

use crate::store::StoreError;

/// 认证数据访问 trait
pub trait AuthAccess: Send + Sync {
    /// 按令牌查询用户名，令牌无效时返回 None
    fn resolve_username(&self, token: &str) -> Result<Option<String>, StoreError>;
}

/// 内存认证表
pub struct MemoryAuthAccess {
    tokens: Mutex<HashMap<String, String>>,
}

impl MemoryAuthAccess {
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// 登记令牌
    pub fn insert(&self, token: impl Into<String>, username: impl Into<String>) {
        let mut tokens = self.tokens.lock().expect("认证表锁中毒");
        tokens.insert(token.into(), username.into());
    }
}

impl Default for MemoryAuthAccess {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthAccess for MemoryAuthAccess {
    fn resolve_username(&self, token: &str) -> Result<Option<String>, StoreError> {
        let tokens = self.tokens.lock().expect("认证表锁中毒");
        Ok(tokens.get(token).cloned())
    }
}
