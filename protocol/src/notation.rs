//! 走法记谱
//!
//! 通知消息使用的坐标记谱：起点和终点均为列字母 + 行数字。

use crate::moves::Move;
use crate::piece::PieceKind;

/// 记谱生成器
pub struct Notation;

impl Notation {
    /// 生成坐标记谱，如 "e2 to e4"，升变时附加升变棋子字母
    pub fn coordinate(mv: &Move) -> String {
        match mv.promotion {
            Some(kind) => format!("{} to {}={}", mv.from, mv.to, Self::piece_letter(kind)),
            None => format!("{} to {}", mv.from, mv.to),
        }
    }

    /// 棋子的英文记谱字母
    fn piece_letter(kind: PieceKind) -> char {
        match kind {
            PieceKind::King => 'K',
            PieceKind::Queen => 'Q',
            PieceKind::Rook => 'R',
            PieceKind::Bishop => 'B',
            PieceKind::Knight => 'N',
            PieceKind::Pawn => 'P',
        }
    }
}
