//! Stub API server.

use crate::api::router::route_request;
use crate::client::Client;
use crate::config::ServerConfig;
use crate::stub::StubStore;
use anyhow::Context;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// How long shutdown waits for in-flight requests before dropping connections
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Stub server bound to a TCP listener, owning its own stores
pub struct StubServer {
    listener: TcpListener,
    addr: SocketAddr,
    store: Arc<StubStore>,
}

impl StubServer {
    /// Bind the listener described by `config`. Port `0` lets the OS pick one.
    pub async fn bind(config: &ServerConfig) -> Result<Self, anyhow::Error> {
        let listener = TcpListener::bind((config.host.as_str(), config.port))
            .await
            .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
        let addr = listener
            .local_addr()
            .context("Failed to read bound address")?;

        Ok(Self {
            listener,
            addr,
            store: Arc::new(StubStore::new()),
        })
    }

    /// Address the server is listening on
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stores served by this instance
    pub fn store(&self) -> Arc<StubStore> {
        Arc::clone(&self.store)
    }

    /// Serve requests until `shutdown` resolves, then close every open connection.
    ///
    /// Idle keep-alive connections are closed right away; in-flight requests
    /// get [`SHUTDOWN_GRACE`] to complete.
    pub async fn run<F>(self, shutdown: F) -> Result<(), anyhow::Error>
    where
        F: Future<Output = ()>,
    {
        let StubServer {
            listener,
            addr,
            store,
        } = self;
        info!("Assured stub server listening on http://{}", addr);
        tokio::pin!(shutdown);
        let graceful = GracefulShutdown::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            debug!("Accepted connection from {}", peer);
                            serve_connection(stream, Arc::clone(&store), &graceful);
                        }
                        Err(e) => {
                            error!("Accept error on {}: {}", addr, e);
                        }
                    }
                }
                _ = &mut shutdown => {
                    info!("Stub server on {} shutting down", addr);
                    break;
                }
            }
        }

        // Refuse new connections while the open ones drain
        drop(listener);
        if tokio::time::timeout(SHUTDOWN_GRACE, graceful.shutdown())
            .await
            .is_err()
        {
            warn!(
                "Stub server on {} dropped connections still busy after {:?}",
                addr, SHUTDOWN_GRACE
            );
        }
        Ok(())
    }

    /// Run the accept loop on a background task
    pub fn start(self) -> ServerHandle {
        let addr = self.addr;
        let store = self.store();
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);

        let task = tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.recv().await;
            };
            if let Err(e) = self.run(shutdown).await {
                error!("Stub server on {} stopped: {:#}", addr, e);
            }
        });

        ServerHandle {
            addr,
            store,
            shutdown_tx,
            task: Some(task),
        }
    }
}

fn serve_connection(
    stream: tokio::net::TcpStream,
    store: Arc<StubStore>,
    graceful: &GracefulShutdown,
) {
    let io = TokioIo::new(stream);
    let service = service_fn(move |req: Request<Incoming>| {
        let store = Arc::clone(&store);
        async move { route_request(req, store).await }
    });
    let conn = graceful.watch(http1::Builder::new().serve_connection(io, service));

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!("Stub API connection error: {}", e);
        }
    });
}

/// Address clients should dial: an unspecified bind address maps to loopback
fn client_addr(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), addr.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), addr.port())
        }
        _ => addr,
    }
}

/// Handle to a server started with [`StubServer::start`].
///
/// Dropping the handle stops the accept loop; use [`ServerHandle::shutdown`]
/// to also close open connections.
pub struct ServerHandle {
    addr: SocketAddr,
    store: Arc<StubStore>,
    shutdown_tx: broadcast::Sender<()>,
    task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL of the server, e.g. `http://127.0.0.1:41234`.
    ///
    /// A server bound to `0.0.0.0` or `::` is addressed through loopback.
    pub fn url(&self) -> String {
        format!("http://{}", client_addr(self.addr))
    }

    /// Client pointed at this server
    pub fn client(&self) -> Client {
        Client::new(&self.url())
    }

    pub fn store(&self) -> Arc<StubStore> {
        Arc::clone(&self.store)
    }

    /// Stop accepting connections, close open ones and wait for the server to exit
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Stub server task failed: {}", e);
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_addr_maps_unspecified_to_loopback() {
        let v4: SocketAddr = "0.0.0.0:8080".parse().unwrap();
        assert_eq!(client_addr(v4), "127.0.0.1:8080".parse().unwrap());

        let v6: SocketAddr = "[::]:8080".parse().unwrap();
        assert_eq!(client_addr(v6), "[::1]:8080".parse().unwrap());

        let bound: SocketAddr = "192.168.1.10:8080".parse().unwrap();
        assert_eq!(client_addr(bound), bound);
    }

    #[tokio::test]
    async fn test_url_for_wildcard_bind() {
        let server = StubServer::bind(&ServerConfig::default()).await.unwrap();
        let port = server.local_addr().port();
        let handle = server.start();

        assert_eq!(handle.url(), format!("http://127.0.0.1:{port}"));
        assert_eq!(handle.client().url(), format!("http://127.0.0.1:{port}/when"));
        handle.shutdown().await;
    }
}
