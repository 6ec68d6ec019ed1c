//! 国际象棋共享协议库
//!
//! 包含:
//! - 棋子、棋盘、格子等核心数据结构
//! - 走法生成和规则验证
//! - 对局状态机 (Game, Outcome)
//! - 消息类型定义 (ClientCommand, ServerMessage)
//! - 传输层抽象 (Connector, Connection, Listener traits)
//! - 帧编解码 (FrameReader, FrameWriter)
//! - 对局记录 (GameRecord)

mod board;
mod constants;
mod error;
mod game;
mod message;
mod moves;
mod notation;
mod piece;
mod record;
mod transport;

pub use board::Board;
pub use constants::*;
pub use error::{ChessError, ProtocolError, Result};
pub use game::{Game, Outcome};
pub use message::{ClientCommand, GameId, ServerMessage, SessionId};
pub use moves::{Move, MoveGenerator};
pub use notation::Notation;
pub use piece::{Color, Piece, PieceKind, Square};
pub use record::{GameRecord, Role};
pub use transport::{
    Connection, Connector, FrameReader, FrameWriter, Listener, NetworkConfig, TcpConnection,
    TcpConnector, TcpListener,
};
