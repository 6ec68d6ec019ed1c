//! 棋子定义

use serde::{Deserialize, Serialize};

use crate::constants::BOARD_SIZE;

/// 棋子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    /// 兵
    Pawn,
    /// 车
    Rook,
    /// 马
    Knight,
    /// 象
    Bishop,
    /// 后
    Queen,
    /// 王
    King,
}

impl PieceKind {
    /// 兵升变可选的棋子类型
    pub const PROMOTION_KINDS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];
}

/// 阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    /// 白方（先手）
    White,
    /// 黑方（后手）
    Black,
}

impl Color {
    /// 获取对方阵营
    pub fn opponent(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// 兵的前进方向（行增量）
    pub fn pawn_direction(&self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// 兵的起始行
    pub fn pawn_start_rank(&self) -> u8 {
        match self {
            Color::White => crate::constants::WHITE_PAWN_RANK,
            Color::Black => crate::constants::BLACK_PAWN_RANK,
        }
    }

    /// 兵升变的底线行
    pub fn last_rank(&self) -> u8 {
        match self {
            Color::White => 8,
            Color::Black => 1,
        }
    }
}

/// 棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    /// 创建新棋子
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }
}

/// 棋盘格子，行和列均为 1-8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Square {
    /// 行 (1-8)，白方底线为 1
    pub rank: u8,
    /// 列 (1-8)，a 列为 1
    pub file: u8,
}

impl Square {
    /// 创建新格子
    pub fn new(rank: u8, file: u8) -> Option<Self> {
        if (1..=BOARD_SIZE).contains(&rank) && (1..=BOARD_SIZE).contains(&file) {
            Some(Self { rank, file })
        } else {
            None
        }
    }

    /// 创建新格子（不检查边界，内部使用）
    pub const fn new_unchecked(rank: u8, file: u8) -> Self {
        Self { rank, file }
    }

    /// 检查格子是否在棋盘内
    pub fn is_valid(&self) -> bool {
        (1..=BOARD_SIZE).contains(&self.rank) && (1..=BOARD_SIZE).contains(&self.file)
    }

    /// 获取偏移后的格子
    pub fn offset(&self, dr: i8, df: i8) -> Option<Square> {
        let rank = self.rank as i8 + dr;
        let file = self.file as i8 + df;
        if (1..=BOARD_SIZE as i8).contains(&rank) && (1..=BOARD_SIZE as i8).contains(&file) {
            Some(Square {
                rank: rank as u8,
                file: file as u8,
            })
        } else {
            None
        }
    }

    /// 转换为数组索引
    pub fn to_index(&self) -> usize {
        (self.rank as usize - 1) * BOARD_SIZE as usize + (self.file as usize - 1)
    }

    /// 从数组索引转换
    pub fn from_index(index: usize) -> Option<Self> {
        if index < (BOARD_SIZE as usize) * (BOARD_SIZE as usize) {
            Some(Square {
                rank: (index / BOARD_SIZE as usize) as u8 + 1,
                file: (index % BOARD_SIZE as usize) as u8 + 1,
            })
        } else {
            None
        }
    }
}

impl std::fmt::Display for Square {
    /// 代数坐标，如 "e2"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let file_char = (b'a' + self.file - 1) as char;
        write!(f, "{}{}", file_char, self.rank)
    }
}
