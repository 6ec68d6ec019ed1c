//! 对局引擎
//!
//! 负责回合状态、合法走法过滤、走法执行和终局判定。

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::ChessError;
use crate::moves::{Move, MoveGenerator};
use crate::piece::{Color, PieceKind, Square};

/// 对局结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// 进行中
    InProgress,
    /// 将死，loser 为被将死的一方
    Checkmate { loser: Color },
    /// 逼和（无子可动但未被将军）
    Stalemate,
    /// 认输，loser 为认输的一方
    Resigned { loser: Color },
}

impl Outcome {
    /// 是否已终局
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}

/// 一盘对局：棋盘、走子方和结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub board: Board,
    pub turn: Color,
    pub outcome: Outcome,
}

impl Game {
    /// 创建初始局面的对局，白方先走
    pub fn new() -> Self {
        Self {
            board: Board::initial(),
            turn: Color::White,
            outcome: Outcome::InProgress,
        }
    }

    /// 从给定棋盘和走子方创建对局（测试和局面恢复用）
    pub fn from_board(board: Board, turn: Color) -> Self {
        Self {
            board,
            turn,
            outcome: Outcome::InProgress,
        }
    }

    /// 生成指定格子上棋子的所有合法走法
    ///
    /// 在伪合法走法基础上，在棋盘副本上模拟每个走法并丢弃会让
    /// 己方王被攻击的走法。起始格为空或对局已终局时返回空列表。
    /// 被将军时同样适用：能解除将军的走法就是合法走法。
    pub fn legal_moves(&self, origin: Square) -> Vec<Move> {
        if self.outcome.is_terminal() {
            return Vec::new();
        }
        let piece = match self.board.get(origin) {
            Some(piece) => piece,
            None => return Vec::new(),
        };

        MoveGenerator::pseudo_legal(&self.board, origin)
            .into_iter()
            .filter(|mv| !self.leaves_king_attacked(*mv, piece.color))
            .collect()
    }

    /// 在棋盘副本上模拟走法，检查己方王是否被攻击
    fn leaves_king_attacked(&self, mv: Move, color: Color) -> bool {
        let mut scratch = self.board.clone();
        Self::execute_on(&mut scratch, mv, color);

        match scratch.find_king(color) {
            Some(king_sq) => MoveGenerator::is_attacked(&scratch, king_sq, color.opponent()),
            None => false,
        }
    }

    /// 检查指定阵营是否被将军
    pub fn is_in_check(&self, color: Color) -> bool {
        match self.board.find_king(color) {
            Some(king_sq) => MoveGenerator::is_attacked(&self.board, king_sq, color.opponent()),
            None => false,
        }
    }

    /// 检查指定阵营是否被将死：被将军且没有任何合法走法
    pub fn is_in_checkmate(&self, color: Color) -> bool {
        self.is_in_check(color) && !self.has_any_legal_move(color)
    }

    /// 检查指定阵营是否被逼和：未被将军但没有任何合法走法
    pub fn is_in_stalemate(&self, color: Color) -> bool {
        !self.is_in_check(color) && !self.has_any_legal_move(color)
    }

    /// 指定阵营是否还有合法走法
    fn has_any_legal_move(&self, color: Color) -> bool {
        self.board
            .pieces(color)
            .into_iter()
            .any(|(sq, _)| !self.legal_moves(sq).is_empty())
    }

    /// 执行走法
    ///
    /// 校验失败时对局保持不变；成功时执行吃子/移动/升变，切换
    /// 走子方并重新判定结果（先查将死再查逼和）。
    pub fn apply_move(&mut self, mv: Move) -> Result<(), ChessError> {
        if self.outcome.is_terminal() {
            return Err(ChessError::GameOver);
        }

        let piece = self
            .board
            .get(mv.from)
            .ok_or(ChessError::NoPiece { square: mv.from })?;

        if piece.color != self.turn {
            return Err(ChessError::NotYourTurn);
        }

        // 升变走法客户端可省略升变类型，默认升后
        let normalized = if piece.kind == PieceKind::Pawn && mv.to.rank == piece.color.last_rank() {
            Move {
                promotion: Some(mv.promotion.unwrap_or(PieceKind::Queen)),
                ..mv
            }
        } else {
            mv
        };

        if !self.legal_moves(mv.from).contains(&normalized) {
            return Err(ChessError::IllegalMove {
                from: mv.from,
                to: mv.to,
            });
        }

        Self::execute_on(&mut self.board, normalized, piece.color);
        self.turn = self.turn.opponent();

        if self.is_in_checkmate(self.turn) {
            self.outcome = Outcome::Checkmate { loser: self.turn };
        } else if self.is_in_stalemate(self.turn) {
            self.outcome = Outcome::Stalemate;
        }

        Ok(())
    }

    /// 认输
    pub fn resign(&mut self, color: Color) -> Result<(), ChessError> {
        if self.outcome.is_terminal() {
            return Err(ChessError::GameOver);
        }
        self.outcome = Outcome::Resigned { loser: color };
        Ok(())
    }

    /// 在棋盘上执行走法（吃子、移动、升变），不做校验
    fn execute_on(board: &mut Board, mv: Move, color: Color) {
        board.move_piece(mv.from, mv.to);

        if let Some(kind) = mv.promotion {
            board.set(mv.to, Some(crate::piece::Piece::new(kind, color)));
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::Piece;

    fn sq(rank: u8, file: u8) -> Square {
        Square::new_unchecked(rank, file)
    }

    fn apply(game: &mut Game, from: Square, to: Square) {
        game.apply_move(Move::new(from, to)).unwrap();
    }

    #[test]
    fn test_new_game() {
        let game = Game::new();
        assert_eq!(game.turn, Color::White);
        assert_eq!(game.outcome, Outcome::InProgress);
        assert!(!game.is_in_check(Color::White));
    }

    #[test]
    fn test_legal_moves_empty_origin() {
        let game = Game::new();
        assert!(game.legal_moves(sq(4, 4)).is_empty());
    }

    #[test]
    fn test_apply_move_no_piece() {
        let mut game = Game::new();
        let before = game.clone();

        let result = game.apply_move(Move::new(sq(4, 4), sq(5, 4)));
        assert_eq!(result, Err(ChessError::NoPiece { square: sq(4, 4) }));
        assert_eq!(game, before);
    }

    #[test]
    fn test_apply_move_wrong_turn() {
        let mut game = Game::new();
        let before = game.clone();

        // 白方回合移动黑兵
        let result = game.apply_move(Move::new(sq(7, 5), sq(6, 5)));
        assert_eq!(result, Err(ChessError::NotYourTurn));
        assert_eq!(game, before);
    }

    #[test]
    fn test_apply_move_illegal_target() {
        let mut game = Game::new();
        let before = game.clone();

        // 兵不能横走
        let result = game.apply_move(Move::new(sq(2, 5), sq(2, 6)));
        assert_eq!(
            result,
            Err(ChessError::IllegalMove {
                from: sq(2, 5),
                to: sq(2, 6)
            })
        );
        assert_eq!(game, before);
    }

    #[test]
    fn test_apply_move_flips_turn() {
        let mut game = Game::new();
        apply(&mut game, sq(2, 5), sq(4, 5)); // e4
        assert_eq!(game.turn, Color::Black);
        apply(&mut game, sq(7, 5), sq(5, 5)); // e5
        assert_eq!(game.turn, Color::White);
    }

    #[test]
    fn test_capture_removes_piece() {
        let mut game = Game::new();
        apply(&mut game, sq(2, 5), sq(4, 5)); // e4
        apply(&mut game, sq(7, 4), sq(5, 4)); // d5
        apply(&mut game, sq(4, 5), sq(5, 4)); // exd5

        assert_eq!(
            game.board.get(sq(5, 4)),
            Some(Piece::new(PieceKind::Pawn, Color::White))
        );
        assert_eq!(game.board.pieces(Color::Black).len(), 15);
    }

    #[test]
    fn test_fools_mate() {
        // 1. f3 e5 2. g4 Qh4# —— 白方被将死
        let mut game = Game::new();
        apply(&mut game, sq(2, 6), sq(3, 6)); // f3
        apply(&mut game, sq(7, 5), sq(5, 5)); // e5
        apply(&mut game, sq(2, 7), sq(4, 7)); // g4
        apply(&mut game, sq(8, 4), sq(4, 8)); // Qh4#

        assert_eq!(game.outcome, Outcome::Checkmate { loser: Color::White });
        assert!(game.is_in_check(Color::White));
        assert!(game.is_in_checkmate(Color::White));
        assert!(!game.is_in_stalemate(Color::White));

        // 白方每个棋子都没有合法走法
        for (origin, _) in game.board.pieces(Color::White) {
            assert!(game.legal_moves(origin).is_empty());
        }

        // 终局后任何走法都被拒绝
        let result = game.apply_move(Move::new(sq(2, 1), sq(3, 1)));
        assert_eq!(result, Err(ChessError::GameOver));
    }

    #[test]
    fn test_stalemate_boxed_king() {
        // 黑王 h8，白后 g6，白王 f7：黑方无将军但无合法走法
        let mut board = Board::empty();
        board.set(sq(8, 8), Some(Piece::new(PieceKind::King, Color::Black)));
        board.set(sq(6, 7), Some(Piece::new(PieceKind::Queen, Color::White)));
        board.set(sq(7, 6), Some(Piece::new(PieceKind::King, Color::White)));

        let mut game = Game::from_board(board, Color::Black);
        assert!(game.is_in_stalemate(Color::Black));
        assert!(!game.is_in_checkmate(Color::Black));
        assert!(!game.is_in_check(Color::Black));

        // 逼和局面下黑方走任何棋都失败
        let result = game.apply_move(Move::new(sq(8, 8), sq(8, 7)));
        assert_eq!(
            result,
            Err(ChessError::IllegalMove {
                from: sq(8, 8),
                to: sq(8, 7)
            })
        );
    }

    #[test]
    fn test_stalemate_outcome_after_move() {
        // 白后从 g5 走到 g6 后黑方立即被逼和
        let mut board = Board::empty();
        board.set(sq(8, 8), Some(Piece::new(PieceKind::King, Color::Black)));
        board.set(sq(5, 7), Some(Piece::new(PieceKind::Queen, Color::White)));
        board.set(sq(7, 6), Some(Piece::new(PieceKind::King, Color::White)));

        let mut game = Game::from_board(board, Color::White);
        apply(&mut game, sq(5, 7), sq(6, 7));

        assert_eq!(game.outcome, Outcome::Stalemate);
    }

    #[test]
    fn test_must_resolve_check() {
        // 被将军时只有解将的走法是合法的
        let mut board = Board::empty();
        board.set(sq(1, 5), Some(Piece::new(PieceKind::King, Color::White)));
        board.set(sq(8, 5), Some(Piece::new(PieceKind::Rook, Color::Black)));
        board.set(sq(8, 8), Some(Piece::new(PieceKind::King, Color::Black)));
        board.set(sq(2, 1), Some(Piece::new(PieceKind::Rook, Color::White)));

        let game = Game::from_board(board, Color::White);
        assert!(game.is_in_check(Color::White));

        // 白车可以垫将（e2），其余走法都不合法
        let rook_moves = game.legal_moves(sq(2, 1));
        assert_eq!(rook_moves.len(), 1);
        assert_eq!(rook_moves[0].to, sq(2, 5));

        // 王不能沿 e 列留在车的攻击线上
        for mv in game.legal_moves(sq(1, 5)) {
            assert_ne!(mv.to.file, 5);
        }
    }

    #[test]
    fn test_pinned_piece_cannot_move() {
        // d 列上被牵制的白车不能离线
        let mut board = Board::empty();
        board.set(sq(1, 4), Some(Piece::new(PieceKind::King, Color::White)));
        board.set(sq(4, 4), Some(Piece::new(PieceKind::Rook, Color::White)));
        board.set(sq(8, 4), Some(Piece::new(PieceKind::Queen, Color::Black)));
        board.set(sq(8, 8), Some(Piece::new(PieceKind::King, Color::Black)));

        let game = Game::from_board(board, Color::White);
        for mv in game.legal_moves(sq(4, 4)) {
            assert_eq!(mv.to.file, 4);
        }
    }

    #[test]
    fn test_promotion_defaults_to_queen() {
        let mut board = Board::empty();
        board.set(sq(7, 5), Some(Piece::new(PieceKind::Pawn, Color::White)));
        board.set(sq(1, 1), Some(Piece::new(PieceKind::King, Color::White)));
        board.set(sq(4, 8), Some(Piece::new(PieceKind::King, Color::Black)));

        let mut game = Game::from_board(board, Color::White);
        game.apply_move(Move::new(sq(7, 5), sq(8, 5))).unwrap();

        assert_eq!(
            game.board.get(sq(8, 5)),
            Some(Piece::new(PieceKind::Queen, Color::White))
        );
    }

    #[test]
    fn test_promotion_explicit_kind() {
        let mut board = Board::empty();
        board.set(sq(7, 5), Some(Piece::new(PieceKind::Pawn, Color::White)));
        board.set(sq(1, 1), Some(Piece::new(PieceKind::King, Color::White)));
        board.set(sq(4, 8), Some(Piece::new(PieceKind::King, Color::Black)));

        let mut game = Game::from_board(board, Color::White);
        game.apply_move(Move::with_promotion(sq(7, 5), sq(8, 5), PieceKind::Knight))
            .unwrap();

        assert_eq!(
            game.board.get(sq(8, 5)),
            Some(Piece::new(PieceKind::Knight, Color::White))
        );
    }

    #[test]
    fn test_resign() {
        let mut game = Game::new();
        game.resign(Color::Black).unwrap();

        assert_eq!(game.outcome, Outcome::Resigned { loser: Color::Black });

        // 认输后走棋和再次认输都被拒绝
        let result = game.apply_move(Move::new(sq(2, 5), sq(4, 5)));
        assert_eq!(result, Err(ChessError::GameOver));
        assert_eq!(game.resign(Color::White), Err(ChessError::GameOver));
    }

    #[test]
    fn test_check_notification_state() {
        // 后上 h5 将军但不是将死
        let mut game = Game::new();
        apply(&mut game, sq(2, 5), sq(4, 5)); // e4
        apply(&mut game, sq(7, 6), sq(6, 6)); // f6
        apply(&mut game, sq(1, 4), sq(5, 8)); // Qh5+

        assert!(game.is_in_check(Color::Black));
        assert!(!game.is_in_checkmate(Color::Black));
        assert_eq!(game.outcome, Outcome::InProgress);
    }
}
