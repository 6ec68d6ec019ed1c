use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chess_server::{MemoryAuthAccess, MemoryGameStore, ServerState};
use protocol::NetworkConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("chess_server=debug".parse()?))
        .init();

    info!("国际象棋服务端启动中...");

    let config = NetworkConfig::default();
    let state = Arc::new(ServerState::new(
        Arc::new(MemoryAuthAccess::new()),
        Arc::new(MemoryGameStore::new()),
    ));

    chess_server::server::run(state, &config.addr()).await
}
