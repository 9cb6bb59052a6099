//! Scripted discovery and loopback responders for proxy tests.
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use super::{Discovered, Proxy, ProxyDiscovery, ProxyType};
use crate::error::DiscoveryError;

/// Plays back one scripted outcome per discovery run.
///
/// Runs past the end of the script find nothing.
pub struct ScriptedDiscovery {
    runs: Mutex<VecDeque<Result<Vec<Proxy>, DiscoveryError>>>,
    hang: bool,
}

impl ScriptedDiscovery {
    pub fn new(runs: Vec<Result<Vec<Proxy>, DiscoveryError>>) -> Self {
        Self {
            runs: Mutex::new(runs.into()),
            hang: false,
        }
    }

    /// A discovery that never produces anything and never finishes
    pub fn hanging() -> Self {
        Self {
            runs: Mutex::new(VecDeque::new()),
            hang: true,
        }
    }
}

#[async_trait]
impl ProxyDiscovery for ScriptedDiscovery {
    async fn discover(
        &self,
        _types: &[ProxyType],
        _limit: usize,
        intake: mpsc::Sender<Discovered>,
    ) -> Result<(), DiscoveryError> {
        if self.hang {
            std::future::pending::<()>().await;
        }

        let run = self
            .runs
            .lock()
            .expect("script lock poisoned")
            .pop_front()
            .unwrap_or(Ok(Vec::new()));

        for proxy in run? {
            if intake.send(Discovered::Proxy(proxy)).await.is_err() {
                return Ok(());
            }
        }
        let _ = intake.send(Discovered::Finished).await;
        Ok(())
    }
}

/// Bind `count` loopback listeners that answer every request with 200 and
/// a body listing all of them, one `127.0.0.1:port` per line.
///
/// Each listener works both as a proxy-list page and as a plain HTTP proxy.
pub async fn spawn_proxy_list(count: usize) -> Vec<u16> {
    let mut listeners = Vec::with_capacity(count);
    for _ in 0..count {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        listeners.push(listener);
    }

    let ports: Vec<u16> = listeners
        .iter()
        .map(|listener| listener.local_addr().expect("local addr").port())
        .collect();
    let body: String = ports.iter().map(|p| format!("127.0.0.1:{}\n", p)).collect();

    for listener in listeners {
        tokio::spawn(respond_forever(listener, body.clone()));
    }
    ports
}

async fn respond_forever(listener: TcpListener, body: String) {
    while let Ok((mut socket, _)) = listener.accept().await {
        let body = body.clone();
        tokio::spawn(async move {
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
    }
}
