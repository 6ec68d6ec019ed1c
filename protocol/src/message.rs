//! 消息类型定义
//!
//! 与客户端约定的 JSON 消息：入站命令按 `commandType` 区分，
//! 出站消息按 `serverMessageType` 区分。

use serde::{Deserialize, Serialize};

use crate::game::Game;
use crate::moves::Move;

/// 对局 ID
pub type GameId = u32;

/// 会话 ID（服务端内部标识一条连接）
pub type SessionId = u64;

/// 客户端发送给服务端的命令
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "commandType")]
pub enum ClientCommand {
    /// 连接到一局对局（玩家或旁观者）
    #[serde(rename = "CONNECT")]
    Connect {
        #[serde(rename = "authToken")]
        auth_token: String,
        #[serde(rename = "gameID")]
        game_id: GameId,
    },

    /// 走棋
    #[serde(rename = "MAKE_MOVE")]
    MakeMove {
        #[serde(rename = "authToken")]
        auth_token: String,
        #[serde(rename = "gameID")]
        game_id: GameId,
        #[serde(rename = "move")]
        mv: Move,
    },

    /// 离开对局（腾出席位）
    #[serde(rename = "LEAVE")]
    Leave {
        #[serde(rename = "authToken")]
        auth_token: String,
        #[serde(rename = "gameID")]
        game_id: GameId,
    },

    /// 认输
    #[serde(rename = "RESIGN")]
    Resign {
        #[serde(rename = "authToken")]
        auth_token: String,
        #[serde(rename = "gameID")]
        game_id: GameId,
    },
}

impl ClientCommand {
    /// 命令携带的对局 ID
    pub fn game_id(&self) -> GameId {
        match self {
            ClientCommand::Connect { game_id, .. }
            | ClientCommand::MakeMove { game_id, .. }
            | ClientCommand::Leave { game_id, .. }
            | ClientCommand::Resign { game_id, .. } => *game_id,
        }
    }

    /// 命令携带的认证令牌
    pub fn auth_token(&self) -> &str {
        match self {
            ClientCommand::Connect { auth_token, .. }
            | ClientCommand::MakeMove { auth_token, .. }
            | ClientCommand::Leave { auth_token, .. }
            | ClientCommand::Resign { auth_token, .. } => auth_token,
        }
    }
}

/// 服务端发送给客户端的消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "serverMessageType")]
pub enum ServerMessage {
    /// 完整对局快照
    #[serde(rename = "LOAD_GAME")]
    LoadGame { game: Game },

    /// 叙述性通知（加入、走棋、将军、终局等）
    #[serde(rename = "NOTIFICATION")]
    Notification { message: String },

    /// 错误，只发给出错命令的来源连接
    #[serde(rename = "ERROR")]
    Error {
        #[serde(rename = "errorMessage")]
        error_message: String,
    },
}

impl ServerMessage {
    /// 构造通知消息
    pub fn notification(message: impl Into<String>) -> Self {
        ServerMessage::Notification {
            message: message.into(),
        }
    }

    /// 构造错误消息
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            error_message: message.into(),
        }
    }
}
