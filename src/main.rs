use std::sync::Arc;
use tokio::sync::Notify;

use hooked::config::{AppState, Config};
use hooked::handler::build_router;
use hooked::logger;
use hooked::repository;
use hooked::server::{create_reusable_listener, start_server_loop, start_signal_handler};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;
    logger::init(&cfg)?;

    // Create the Tokio runtime, sized by `server.workers` when set
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        logger::log_debug(&format!("[Config] Using {workers} worker threads"));
    } else {
        logger::log_debug("[Config] Using default worker threads (CPU cores)");
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = create_reusable_listener(addr)?;

    let router = build_router(repository::from_env().await)?;
    logger::log_server_start(&addr, &cfg, router.route_count());

    let state = Arc::new(AppState::new(cfg, router));
    let shutdown = Arc::new(Notify::new());
    start_signal_handler(Arc::clone(&shutdown));

    start_server_loop(listener, state, shutdown).await?;
    Ok(())
}
