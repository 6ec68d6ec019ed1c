//! 对局存储
//!
//! 会话层通过 GameStore trait 读写对局记录，
//! 内存实现用于测试和单进程部署。

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

use protocol::{GameId, GameRecord};

/// 存储错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// 对局不存在
    #[error("Game {game_id} not found")]
    NotFound { game_id: GameId },

    /// 后端访问失败
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// 对局存储 trait
pub trait GameStore: Send + Sync {
    /// 按 ID 读取对局记录
    fn get(&self, game_id: GameId) -> Result<GameRecord, StoreError>;

    /// 写回对局记录（按 game_id 整体替换）
    fn update(&self, record: &GameRecord) -> Result<(), StoreError>;

    /// 创建新对局，返回分配了 ID 的记录
    fn create_game(&self, game_name: &str) -> Result<GameRecord, StoreError>;
}

/// 内存对局存储
pub struct MemoryGameStore {
    games: Mutex<HashMap<GameId, GameRecord>>,
    next_id: Mutex<GameId>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self {
            games: Mutex::new(HashMap::new()),
            next_id: Mutex::new(1),
        }
    }
}

impl Default for MemoryGameStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GameStore for MemoryGameStore {
    fn get(&self, game_id: GameId) -> Result<GameRecord, StoreError> {
        let games = self.games.lock().expect("对局表锁中毒");
        games
            .get(&game_id)
            .cloned()
            .ok_or(StoreError::NotFound { game_id })
    }

    fn update(&self, record: &GameRecord) -> Result<(), StoreError> {
        let mut games = self.games.lock().expect("对局表锁中毒");
        if !games.contains_key(&record.game_id) {
            return Err(StoreError::NotFound {
                game_id: record.game_id,
            });
        }
        games.insert(record.game_id, record.clone());
        Ok(())
    }

    fn create_game(&self, game_name: &str) -> Result<GameRecord, StoreError> {
        let game_id = {
            let mut next_id = self.next_id.lock().expect("对局 ID 锁中毒");
            let id = *next_id;
            *next_id += 1;
            id
        };

        let record = GameRecord::new(game_id, game_name);
        let mut games = self.games.lock().expect("对局表锁中毒");
        games.insert(game_id, record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::Color;

    #[test]
    fn test_create_and_get() {
        let store = MemoryGameStore::new();
        let record = store.create_game("first game").unwrap();
        assert_eq!(record.game_id, 1);

        let loaded = store.get(record.game_id).unwrap();
        assert_eq!(loaded, record);

        let second = store.create_game("second game").unwrap();
        assert_eq!(second.game_id, 2);
    }

    #[test]
    fn test_get_missing() {
        let store = MemoryGameStore::new();
        assert_eq!(store.get(99), Err(StoreError::NotFound { game_id: 99 }));
    }

    #[test]
    fn test_update() {
        let store = MemoryGameStore::new();
        let mut record = store.create_game("game").unwrap();

        record.set_seat(Color::White, "alice");
        store.update(&record).unwrap();

        let loaded = store.get(record.game_id).unwrap();
        assert_eq!(loaded.white_username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_update_missing() {
        let store = MemoryGameStore::new();
        let record = GameRecord::new(7, "ghost");
        assert_eq!(
            store.update(&record),
            Err(StoreError::NotFound { game_id: 7 })
        );
    }
}
