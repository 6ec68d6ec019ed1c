//! 连接注册表
//!
//! 按对局分组维护活跃连接。广播时在锁内克隆发送通道，
//! 锁外逐个发送，发送失败（对端已断开）直接跳过。

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;

use protocol::{GameId, ServerMessage, SessionId};

/// 会话句柄：连接任务的标识和出站通道
#[derive(Clone)]
pub struct SessionHandle {
    pub id: SessionId,
    pub sender: mpsc::Sender<ServerMessage>,
}

impl SessionHandle {
    pub fn new(id: SessionId, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self { id, sender }
    }

    /// 向本连接发送消息，对端已断开时忽略
    pub async fn send(&self, msg: ServerMessage) {
        let _ = self.sender.send(msg).await;
    }
}

/// 注册表条目
struct Entry {
    username: String,
    sender: mpsc::Sender<ServerMessage>,
}

/// 连接注册表
pub struct ConnectionRegistry {
    /// 对局 ID -> (会话 ID -> 条目)
    games: Mutex<HashMap<GameId, HashMap<SessionId, Entry>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            games: Mutex::new(HashMap::new()),
        }
    }

    /// 把会话挂到对局下
    pub fn add(&self, game_id: GameId, session: &SessionHandle, username: impl Into<String>) {
        let mut games = self.games.lock().expect("注册表锁中毒");
        games.entry(game_id).or_default().insert(
            session.id,
            Entry {
                username: username.into(),
                sender: session.sender.clone(),
            },
        );
    }

    /// 从对局下移除会话，对局无剩余连接时回收整组
    pub fn remove(&self, game_id: GameId, session_id: SessionId) {
        let mut games = self.games.lock().expect("注册表锁中毒");
        if let Some(sessions) = games.get_mut(&game_id) {
            sessions.remove(&session_id);
            if sessions.is_empty() {
                games.remove(&game_id);
            }
        }
    }

    /// 按会话 ID 全局移除（断线清理），返回其所在对局和用户名
    pub fn remove_session(&self, session_id: SessionId) -> Option<(GameId, String)> {
        let mut games = self.games.lock().expect("注册表锁中毒");
        let game_id = games
            .iter()
            .find(|(_, sessions)| sessions.contains_key(&session_id))
            .map(|(&game_id, _)| game_id)?;

        let sessions = games.get_mut(&game_id)?;
        let entry = sessions.remove(&session_id)?;
        if sessions.is_empty() {
            games.remove(&game_id);
        }
        Some((game_id, entry.username))
    }

    /// 对局内连接数
    pub fn session_count(&self, game_id: GameId) -> usize {
        let games = self.games.lock().expect("注册表锁中毒");
        games.get(&game_id).map_or(0, |s| s.len())
    }

    /// 广播给对局内所有连接，可排除一个会话（通常是动作发起者）
    pub async fn broadcast(
        &self,
        game_id: GameId,
        exclude: Option<SessionId>,
        msg: ServerMessage,
    ) {
        let senders: Vec<mpsc::Sender<ServerMessage>> = {
            let games = self.games.lock().expect("注册表锁中毒");
            match games.get(&game_id) {
                Some(sessions) => sessions
                    .iter()
                    .filter(|(&id, _)| Some(id) != exclude)
                    .map(|(_, entry)| entry.sender.clone())
                    .collect(),
                None => return,
            }
        };

        for sender in senders {
            let _ = sender.send(msg.clone()).await;
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_session(id: SessionId) -> (SessionHandle, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(8);
        (SessionHandle::new(id, tx), rx)
    }

    #[tokio::test]
    async fn test_broadcast_excludes_sender() {
        let registry = ConnectionRegistry::new();
        let (alice, mut alice_rx) = make_session(1);
        let (bob, mut bob_rx) = make_session(2);

        registry.add(1, &alice, "alice");
        registry.add(1, &bob, "bob");

        registry
            .broadcast(1, Some(alice.id), ServerMessage::notification("hello"))
            .await;

        let msg = bob_rx.recv().await.unwrap();
        assert_eq!(msg, ServerMessage::notification("hello"));
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_is_scoped_to_game() {
        let registry = ConnectionRegistry::new();
        let (alice, mut alice_rx) = make_session(1);
        let (carol, mut carol_rx) = make_session(2);

        registry.add(1, &alice, "alice");
        registry.add(2, &carol, "carol");

        registry
            .broadcast(1, None, ServerMessage::notification("game 1 only"))
            .await;

        assert_eq!(
            alice_rx.recv().await.unwrap(),
            ServerMessage::notification("game 1 only")
        );
        assert!(carol_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_empty_game_evicted() {
        let registry = ConnectionRegistry::new();
        let (alice, _alice_rx) = make_session(1);

        registry.add(1, &alice, "alice");
        assert_eq!(registry.session_count(1), 1);

        registry.remove(1, alice.id);
        assert_eq!(registry.session_count(1), 0);

        // 空组已被回收，广播不会触达任何连接
        registry
            .broadcast(1, None, ServerMessage::notification("nobody"))
            .await;
    }

    #[tokio::test]
    async fn test_remove_session_returns_location() {
        let registry = ConnectionRegistry::new();
        let (bob, _bob_rx) = make_session(7);

        registry.add(3, &bob, "bob");
        assert_eq!(registry.remove_session(7), Some((3, "bob".to_string())));
        assert_eq!(registry.remove_session(7), None);
    }

    #[tokio::test]
    async fn test_dead_receiver_skipped() {
        let registry = ConnectionRegistry::new();
        let (alice, alice_rx) = make_session(1);
        let (bob, mut bob_rx) = make_session(2);

        registry.add(1, &alice, "alice");
        registry.add(1, &bob, "bob");
        drop(alice_rx);

        registry
            .broadcast(1, None, ServerMessage::notification("still delivered"))
            .await;

        assert_eq!(
            bob_rx.recv().await.unwrap(),
            ServerMessage::notification("still delivered")
        );
    }
}
