//! 协议常量定义

use std::time::Duration;

/// 协议版本号
pub const PROTOCOL_VERSION: u8 = 1;

/// 棋盘边长（行数 = 列数 = 8）
pub const BOARD_SIZE: u8 = 8;

/// 白方兵的起始行
pub const WHITE_PAWN_RANK: u8 = 2;

/// 黑方兵的起始行
pub const BLACK_PAWN_RANK: u8 = 7;

/// 消息帧最大大小
pub const MAX_FRAME_SIZE: usize = 65536;

/// 连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 连接超时 Duration
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);
