//! 国际象棋对局服务端
//!
//! 包含:
//! - 认证访问 (AuthAccess)
//! - 对局存储 (GameStore)
//! - 连接注册表 (ConnectionRegistry)
//! - 会话命令处理 (MessageHandler)

pub mod auth;
pub mod registry;
pub mod server;
pub mod store;

pub use auth::{AuthAccess, MemoryAuthAccess};
pub use registry::{ConnectionRegistry, SessionHandle};
pub use server::{MessageHandler, ServerState};
pub use store::{GameStore, MemoryGameStore, StoreError};
