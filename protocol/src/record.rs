//! 对局记录
//!
//! 存储层持久化的对局条目：席位、对局名和序列化的对局状态。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::Game;
use crate::message::GameId;
use crate::piece::Color;

/// 连接者在对局中的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// 白方席位
    White,
    /// 黑方席位
    Black,
    /// 旁观者
    Observer,
}

impl Role {
    /// 通知文案中使用的角色名
    pub fn describe(&self) -> &'static str {
        match self {
            Role::White => "white",
            Role::Black => "black",
            Role::Observer => "observer",
        }
    }

    /// 角色对应的阵营（旁观者没有）
    pub fn color(&self) -> Option<Color> {
        match self {
            Role::White => Some(Color::White),
            Role::Black => Some(Color::Black),
            Role::Observer => None,
        }
    }
}

/// 对局记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    /// 对局 ID
    pub game_id: GameId,
    /// 白方席位（空席位可被加入）
    pub white_username: Option<String>,
    /// 黑方席位
    pub black_username: Option<String>,
    /// 对局名
    pub game_name: String,
    /// 对局状态
    pub game: Game,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl GameRecord {
    /// 创建新对局记录，初始局面，双方席位为空
    pub fn new(game_id: GameId, game_name: impl Into<String>) -> Self {
        Self {
            game_id,
            white_username: None,
            black_username: None,
            game_name: game_name.into(),
            game: Game::new(),
            created_at: Utc::now(),
        }
    }

    /// 获取用户在本局中的角色
    pub fn role_of(&self, username: &str) -> Role {
        if self.white_username.as_deref() == Some(username) {
            Role::White
        } else if self.black_username.as_deref() == Some(username) {
            Role::Black
        } else {
            Role::Observer
        }
    }

    /// 获取指定阵营席位上的用户名
    pub fn seat_username(&self, color: Color) -> Option<&str> {
        match color {
            Color::White => self.white_username.as_deref(),
            Color::Black => self.black_username.as_deref(),
        }
    }

    /// 占据席位
    pub fn set_seat(&mut self, color: Color, username: impl Into<String>) {
        match color {
            Color::White => self.white_username = Some(username.into()),
            Color::Black => self.black_username = Some(username.into()),
        }
    }

    /// 清空用户占据的席位，返回腾出的阵营
    pub fn clear_seat(&mut self, username: &str) -> Option<Color> {
        if self.white_username.as_deref() == Some(username) {
            self.white_username = None;
            Some(Color::White)
        } else if self.black_username.as_deref() == Some(username) {
            self.black_username = None;
            Some(Color::Black)
        } else {
            None
        }
    }
}
