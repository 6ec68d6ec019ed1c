//! 走法生成和验证

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::piece::{Color, Piece, PieceKind, Square};

/// 走法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// 起始格子
    pub from: Square,
    /// 目标格子
    pub to: Square,
    /// 升变棋子类型（仅兵走到底线时有值）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceKind>,
}

impl Move {
    /// 创建新走法
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    /// 创建升变走法
    pub fn with_promotion(from: Square, to: Square, promotion: PieceKind) -> Self {
        Self {
            from,
            to,
            promotion: Some(promotion),
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// 车的移动方向
const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// 象的移动方向
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// 马的跳跃偏移
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

/// 王的移动偏移（周围 8 格）
const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// 走法生成器
pub struct MoveGenerator;

impl MoveGenerator {
    /// 生成指定格子上棋子的所有伪合法走法（不考虑己方王是否被攻击）
    ///
    /// 格子为空时返回空列表。不检查走子权：轮次归引擎管。
    pub fn pseudo_legal(board: &Board, origin: Square) -> Vec<Move> {
        let mut moves = Vec::new();
        if let Some(piece) = board.get(origin) {
            Self::generate_piece_moves(board, origin, piece, &mut moves);
        }
        moves
    }

    /// 生成指定阵营所有棋子的伪合法走法
    pub fn pseudo_legal_for_color(board: &Board, color: Color) -> Vec<Move> {
        let mut moves = Vec::with_capacity(32);
        for (sq, piece) in board.pieces(color) {
            Self::generate_piece_moves(board, sq, piece, &mut moves);
        }
        moves
    }

    /// 检查指定阵营是否有棋子攻击到目标格子
    ///
    /// 攻击判定只看伪合法走法，不递归进合法性过滤。
    pub fn is_attacked(board: &Board, target: Square, by_color: Color) -> bool {
        board.pieces(by_color).into_iter().any(|(sq, piece)| {
            let mut moves = Vec::new();
            Self::generate_piece_moves(board, sq, piece, &mut moves);
            moves.iter().any(|mv| mv.to == target)
        })
    }

    /// 按棋子类型分发走法生成
    fn generate_piece_moves(board: &Board, origin: Square, piece: Piece, moves: &mut Vec<Move>) {
        match piece.kind {
            PieceKind::Rook => {
                Self::generate_sliding_moves(board, origin, piece.color, &ROOK_DIRECTIONS, moves)
            }
            PieceKind::Bishop => {
                Self::generate_sliding_moves(board, origin, piece.color, &BISHOP_DIRECTIONS, moves)
            }
            PieceKind::Queen => {
                Self::generate_sliding_moves(board, origin, piece.color, &ROOK_DIRECTIONS, moves);
                Self::generate_sliding_moves(board, origin, piece.color, &BISHOP_DIRECTIONS, moves);
            }
            PieceKind::Knight => {
                Self::generate_stepping_moves(board, origin, piece.color, &KNIGHT_OFFSETS, moves)
            }
            PieceKind::King => {
                Self::generate_stepping_moves(board, origin, piece.color, &KING_OFFSETS, moves)
            }
            PieceKind::Pawn => Self::generate_pawn_moves(board, origin, piece.color, moves),
        }
    }

    /// 滑行棋子（车/象/后）：沿方向走到棋盘边缘、己方棋子前或第一个敌方棋子（含吃子）
    fn generate_sliding_moves(
        board: &Board,
        origin: Square,
        color: Color,
        directions: &[(i8, i8)],
        moves: &mut Vec<Move>,
    ) {
        for &(dr, df) in directions {
            let mut current = origin;
            while let Some(to) = current.offset(dr, df) {
                match board.get(to) {
                    Some(target) => {
                        if target.color != color {
                            moves.push(Move::new(origin, to));
                        }
                        break;
                    }
                    None => {
                        moves.push(Move::new(origin, to));
                        current = to;
                    }
                }
            }
        }
    }

    /// 跳跃棋子（马/王）：固定偏移集合，跳过出界和己方棋子占据的格子
    fn generate_stepping_moves(
        board: &Board,
        origin: Square,
        color: Color,
        offsets: &[(i8, i8)],
        moves: &mut Vec<Move>,
    ) {
        for &(dr, df) in offsets {
            if let Some(to) = origin.offset(dr, df) {
                match board.get(to) {
                    Some(target) if target.color == color => {}
                    _ => moves.push(Move::new(origin, to)),
                }
            }
        }
    }

    /// 兵：前进一格（空位）、起始行前进两格（两格均空）、斜吃一格（敌子）
    fn generate_pawn_moves(board: &Board, origin: Square, color: Color, moves: &mut Vec<Move>) {
        let direction = color.pawn_direction();

        // 前进
        if let Some(forward_one) = origin.offset(direction, 0) {
            if board.get(forward_one).is_none() {
                Self::push_pawn_move(origin, forward_one, color, moves);

                if origin.rank == color.pawn_start_rank() {
                    if let Some(forward_two) = origin.offset(direction * 2, 0) {
                        if board.get(forward_two).is_none() {
                            moves.push(Move::new(origin, forward_two));
                        }
                    }
                }
            }
        }

        // 斜吃
        for df in [-1i8, 1i8] {
            if let Some(to) = origin.offset(direction, df) {
                if let Some(target) = board.get(to) {
                    if target.color != color {
                        Self::push_pawn_move(origin, to, color, moves);
                    }
                }
            }
        }
    }

    /// 添加兵的走法；到达底线时按每种升变类型各生成一条
    fn push_pawn_move(from: Square, to: Square, color: Color, moves: &mut Vec<Move>) {
        if to.rank == color.last_rank() {
            for kind in PieceKind::PROMOTION_KINDS {
                moves.push(Move::with_promotion(from, to, kind));
            }
        } else {
            moves.push(Move::new(from, to));
        }
    }
}
