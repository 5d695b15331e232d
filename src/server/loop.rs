// Server loop module
// Accepts connections until shutdown is requested, then waits for in-flight work

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Interval between checks while draining connections
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Run the accept loop on `listener` until `shutdown` is notified.
///
/// Connections still open at shutdown get up to the request timeout to finish.
#[allow(clippy::ignored_unit_patterns)]
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: Arc<Notify>,
) -> std::io::Result<()> {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state),
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            _ = shutdown.notified() => break,
        }
    }

    // Stop accepting before draining
    drop(listener);
    logger::log_shutdown(state.active_connections());

    let deadline = tokio::time::Instant::now()
        + Duration::from_secs(state.config.request_timeout_secs());
    while state.active_connections() > 0 {
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "[Shutdown] Giving up on {} connection(s)",
                state.active_connections()
            ));
            break;
        }
        tokio::time::sleep(DRAIN_POLL).await;
    }

    logger::log_info("[Shutdown] Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handler::build_router;
    use crate::repository::MemoryRepository;
    use crate::server::create_reusable_listener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn state() -> Arc<AppState> {
        let mut config = Config::load_from("does-not-exist").unwrap();
        config.logging.access_log = false;
        config.performance.keep_alive_timeout = 0;
        let router = build_router(Arc::new(MemoryRepository::new())).unwrap();
        Arc::new(AppState::new(config, router))
    }

    async fn roundtrip(addr: std::net::SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let server = tokio::spawn(start_server_loop(listener, state(), Arc::clone(&shutdown)));

        let response = roundtrip(
            addr,
            "GET /participants HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("access-control-allow-origin: *"));
        assert!(response.ends_with("[]\n"));

        let response = roundtrip(
            addr,
            "PATCH /participants HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 405"));
        assert!(response.contains("allow: GET, OPTIONS"));

        shutdown.notify_one();
        server.await.unwrap().unwrap();
        assert!(TcpStream::connect(addr).await.is_err());
    }
}
