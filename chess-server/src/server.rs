//! 服务器主逻辑
//!
//! 每条连接一个读任务和一个写任务，命令经 MessageHandler 处理，
//! 同一对局的命令用对局级互斥锁串行化。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{info, warn};

use protocol::{
    ClientCommand, Color, Connection, GameId, Listener, Notation, Outcome, ProtocolError,
    ServerMessage, SessionId, TcpListener,
};

use crate::auth::AuthAccess;
use crate::registry::{ConnectionRegistry, SessionHandle};
use crate::store::{GameStore, StoreError};

/// 连接出站通道容量
const OUTBOUND_CHANNEL_SIZE: usize = 32;

/// 服务器状态
pub struct ServerState {
    pub auth: Arc<dyn AuthAccess>,
    pub store: Arc<dyn GameStore>,
    pub registry: ConnectionRegistry,
    /// 对局 ID -> 串行化锁
    game_locks: Mutex<HashMap<GameId, Arc<tokio::sync::Mutex<()>>>>,
}

impl ServerState {
    pub fn new(auth: Arc<dyn AuthAccess>, store: Arc<dyn GameStore>) -> Self {
        Self {
            auth,
            store,
            registry: ConnectionRegistry::new(),
            game_locks: Mutex::new(HashMap::new()),
        }
    }

    /// 获取对局的串行化锁，顺带回收闲置条目
    fn game_lock(&self, game_id: GameId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.game_locks.lock().expect("对局锁表锁中毒");
        // Arc 只在持有本表锁时被克隆，计数为 1 即没有在途命令
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(game_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

/// 待发送的消息
struct PendingMessages {
    /// 回复命令来源连接
    replies: Vec<ServerMessage>,
    /// (对局, 排除的会话, 消息)
    broadcasts: Vec<(GameId, Option<SessionId>, ServerMessage)>,
}

impl PendingMessages {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            broadcasts: Vec::new(),
        }
    }

    fn reply(&mut self, msg: ServerMessage) {
        self.replies.push(msg);
    }

    fn broadcast(&mut self, game_id: GameId, exclude: Option<SessionId>, msg: ServerMessage) {
        self.broadcasts.push((game_id, exclude, msg));
    }

    async fn flush(self, state: &ServerState, session: &SessionHandle) {
        for msg in self.replies {
            session.send(msg).await;
        }
        for (game_id, exclude, msg) in self.broadcasts {
            state.registry.broadcast(game_id, exclude, msg).await;
        }
    }
}

/// 消息处理器
pub struct MessageHandler;

impl MessageHandler {
    /// 处理客户端命令
    pub async fn handle(state: &ServerState, session: &SessionHandle, cmd: ClientCommand) {
        let game_id = cmd.game_id();

        // 令牌无效时不触碰注册表，直接回错误
        let username = match state.auth.resolve_username(cmd.auth_token()) {
            Ok(Some(name)) => name,
            Ok(None) => {
                session.send(ServerMessage::error("Error: unauthorized")).await;
                return;
            }
            Err(e) => {
                session.send(Self::store_error(e)).await;
                return;
            }
        };

        // 同一对局的命令串行处理
        let lock = state.game_lock(game_id);
        let _guard = lock.lock().await;

        let mut pending = PendingMessages::new();
        match cmd {
            ClientCommand::Connect { .. } => {
                Self::handle_connect(state, &mut pending, session, &username, game_id);
            }
            ClientCommand::MakeMove { mv, .. } => {
                Self::handle_make_move(state, &mut pending, session, &username, game_id, mv);
            }
            ClientCommand::Leave { .. } => {
                Self::handle_leave(state, &mut pending, session, &username, game_id);
            }
            ClientCommand::Resign { .. } => {
                Self::handle_resign(state, &mut pending, &username, game_id);
            }
        }

        pending.flush(state, session).await;
    }

    /// 处理连接对局
    fn handle_connect(
        state: &ServerState,
        pending: &mut PendingMessages,
        session: &SessionHandle,
        username: &str,
        game_id: GameId,
    ) {
        let record = match state.store.get(game_id) {
            Ok(r) => r,
            Err(e) => {
                pending.reply(Self::store_error(e));
                return;
            }
        };

        let role = record.role_of(username);
        state.registry.add(game_id, session, username);

        info!("{} 以 {} 身份连接对局 {}", username, role.describe(), game_id);

        pending.reply(ServerMessage::LoadGame { game: record.game });
        pending.broadcast(
            game_id,
            Some(session.id),
            ServerMessage::notification(format!(
                "{} joined the game as {}!",
                username,
                role.describe()
            )),
        );
    }

    /// 处理走棋
    fn handle_make_move(
        state: &ServerState,
        pending: &mut PendingMessages,
        session: &SessionHandle,
        username: &str,
        game_id: GameId,
        mv: protocol::Move,
    ) {
        let mut record = match state.store.get(game_id) {
            Ok(r) => r,
            Err(e) => {
                pending.reply(Self::store_error(e));
                return;
            }
        };

        let color = match record.role_of(username).color() {
            Some(c) => c,
            None => {
                pending.reply(ServerMessage::error("Error: observers cannot make moves"));
                return;
            }
        };

        if record.game.outcome.is_terminal() {
            pending.reply(ServerMessage::error("Error: game is over"));
            return;
        }

        if record.game.turn != color {
            pending.reply(ServerMessage::error("Error: not your turn"));
            return;
        }

        if let Err(e) = record.game.apply_move(mv) {
            pending.reply(ServerMessage::error(format!("Error: {}", e)));
            return;
        }

        if let Err(e) = state.store.update(&record) {
            pending.reply(Self::store_error(e));
            return;
        }

        info!("{} 在对局 {} 中走棋 {}", username, game_id, mv);

        // 全员收到新局面，走棋通知不发给走棋者本人
        pending.broadcast(
            game_id,
            None,
            ServerMessage::LoadGame {
                game: record.game.clone(),
            },
        );
        pending.broadcast(
            game_id,
            Some(session.id),
            ServerMessage::notification(format!(
                "{} made move: {}",
                username,
                Notation::coordinate(&mv)
            )),
        );

        // 对手状态通知
        let opponent = color.opponent();
        let opponent_name = record
            .seat_username(opponent)
            .unwrap_or(Self::color_name(opponent))
            .to_string();

        match record.game.outcome {
            Outcome::Checkmate { .. } => {
                pending.broadcast(
                    game_id,
                    None,
                    ServerMessage::notification(format!("{} is in checkmate!", opponent_name)),
                );
            }
            Outcome::Stalemate => {
                pending.broadcast(
                    game_id,
                    None,
                    ServerMessage::notification(format!("{} is in stalemate!", opponent_name)),
                );
            }
            _ => {
                if record.game.is_in_check(opponent) {
                    pending.broadcast(
                        game_id,
                        None,
                        ServerMessage::notification(format!("{} is in check!", opponent_name)),
                    );
                }
            }
        }
    }

    /// 处理认输
    fn handle_resign(
        state: &ServerState,
        pending: &mut PendingMessages,
        username: &str,
        game_id: GameId,
    ) {
        let mut record = match state.store.get(game_id) {
            Ok(r) => r,
            Err(e) => {
                pending.reply(Self::store_error(e));
                return;
            }
        };

        let color = match record.role_of(username).color() {
            Some(c) => c,
            None => {
                pending.reply(ServerMessage::error("Error: observers cannot resign"));
                return;
            }
        };

        if record.game.resign(color).is_err() {
            pending.reply(ServerMessage::error("Error: game is over"));
            return;
        }

        if let Err(e) = state.store.update(&record) {
            pending.reply(Self::store_error(e));
            return;
        }

        info!("{} 在对局 {} 中认输", username, game_id);

        pending.broadcast(
            game_id,
            None,
            ServerMessage::notification(format!("{} has resigned. Game is over!", username)),
        );
    }

    /// 处理离开对局
    fn handle_leave(
        state: &ServerState,
        pending: &mut PendingMessages,
        session: &SessionHandle,
        username: &str,
        game_id: GameId,
    ) {
        let mut record = match state.store.get(game_id) {
            Ok(r) => r,
            Err(e) => {
                pending.reply(Self::store_error(e));
                return;
            }
        };

        // 旁观者没有席位可腾，跳过写回
        if record.clear_seat(username).is_some() {
            if let Err(e) = state.store.update(&record) {
                pending.reply(Self::store_error(e));
                return;
            }
        }

        state.registry.remove(game_id, session.id);

        info!("{} 离开对局 {}", username, game_id);

        pending.broadcast(
            game_id,
            Some(session.id),
            ServerMessage::notification(format!("{} has left the game.", username)),
        );
    }

    /// 处理连接断开：从注册表移除并通知同局其他人，席位保留以便重连
    pub async fn handle_disconnect(state: &ServerState, session_id: SessionId) {
        if let Some((game_id, username)) = state.registry.remove_session(session_id) {
            info!("{} 与对局 {} 的连接断开", username, game_id);
            state
                .registry
                .broadcast(
                    game_id,
                    None,
                    ServerMessage::notification(format!("{} has left the game.", username)),
                )
                .await;
        }
    }

    fn store_error(e: StoreError) -> ServerMessage {
        warn!("存储访问失败: {}", e);
        match e {
            StoreError::NotFound { .. } => ServerMessage::error("Error: game not found"),
            StoreError::Backend(_) => ServerMessage::error("Error: storage failure"),
        }
    }

    fn color_name(color: Color) -> &'static str {
        match color {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}

/// 绑定地址并运行服务器主循环
pub async fn run(state: Arc<ServerState>, addr: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    run_with_listener(state, listener).await
}

/// 在已绑定的监听器上运行服务器主循环
pub async fn run_with_listener(
    state: Arc<ServerState>,
    mut listener: TcpListener,
) -> anyhow::Result<()> {
    if let Some(local) = listener.local_addr() {
        info!("服务器监听 {}", local);
    }

    let mut next_session_id: SessionId = 1;
    loop {
        match listener.accept().await {
            Ok(conn) => {
                let session_id = next_session_id;
                next_session_id += 1;
                let state = state.clone();
                tokio::spawn(handle_connection(state, session_id, conn));
            }
            Err(e) => {
                warn!("接受连接失败: {}", e);
            }
        }
    }
}

/// 单条连接的生命周期：读循环 + 写任务
async fn handle_connection(
    state: Arc<ServerState>,
    session_id: SessionId,
    conn: protocol::TcpConnection,
) {
    let peer = conn.peer_addr().unwrap_or_else(|| "未知".to_string());
    info!("新连接 {} (会话 {})", peer, session_id);

    let (mut reader, mut writer) = conn.split();
    let (tx, mut rx) = mpsc::channel(OUTBOUND_CHANNEL_SIZE);
    let session = SessionHandle::new(session_id, tx);

    let writer_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if writer.write_frame(&msg).await.is_err() {
                break;
            }
        }
    });

    loop {
        match reader.read_frame::<ClientCommand>().await {
            Ok(cmd) => {
                MessageHandler::handle(&state, &session, cmd).await;
            }
            Err(ProtocolError::ConnectionClosed) => break,
            Err(ProtocolError::Json(e)) => {
                // 帧已完整读出，连接仍可用
                warn!("会话 {} 发来无法解析的命令: {}", session_id, e);
                session
                    .send(ServerMessage::error("Error: malformed command"))
                    .await;
            }
            Err(e) => {
                warn!("会话 {} 读取失败: {}", session_id, e);
                break;
            }
        }
    }

    MessageHandler::handle_disconnect(&state, session_id).await;
    drop(session);
    let _ = writer_task.await;

    info!("连接 {} (会话 {}) 已关闭", peer, session_id);
}
