//! Throwaway HTTP server for testing the blocking clients against real sockets.

use std::net::SocketAddr;
use std::sync::mpsc;

use actix_web::{web, App, HttpServer};

/// Serve the routes registered by `configure` on an ephemeral local port.
///
/// The server runs on its own thread and actix system until the test process
/// exits.  Returns the base URL, e.g., `http://127.0.0.1:41234`.
pub(crate) fn spawn<F>(configure: F) -> std::io::Result<String>
where
    F: Fn(&mut web::ServiceConfig) + Send + Clone + 'static,
{
    let (tx, rx) = mpsc::channel::<std::io::Result<SocketAddr>>();
    std::thread::spawn(move || {
        actix_web::rt::System::new().block_on(async move {
            let server = match HttpServer::new(move || App::new().configure(configure.clone()))
                .workers(1)
                .bind(("127.0.0.1", 0))
            {
                Ok(server) => server,
                Err(e) => {
                    let _ = tx.send(Err(e));
                    return;
                }
            };
            let addr = server.addrs()[0];
            let running = server.disable_signals().run();
            let _ = tx.send(Ok(addr));
            let _ = running.await;
        })
    });

    let addr = rx.recv().map_err(std::io::Error::other)??;
    Ok(format!("http://{}", addr))
}
