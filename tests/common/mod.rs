//! Shared utilities for integration tests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use cidrd::lifecycle::{run_until, ServerError};
use cidrd::ServerConfig;

/// A server running on a socket inside its own temp directory.
pub struct TestServer {
    _dir: tempfile::TempDir,
    pub socket: PathBuf,
    pub cidrs: PathBuf,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    /// Write `prefixes` to a fresh file and start a server on it.
    pub async fn start(prefixes: &str) -> Self {
        Self::start_with(prefixes, |_| {}).await
    }

    /// Like [`TestServer::start`], letting the caller tweak the config.
    pub async fn start_with(prefixes: &str, tweak: impl FnOnce(&mut ServerConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("cidrd.sock");
        let cidrs = dir.path().join("ranges.txt");
        std::fs::write(&cidrs, prefixes).unwrap();

        let mut config = ServerConfig::new(&socket, &cidrs);
        config.drain_timeout = Duration::from_secs(1);
        tweak(&mut config);

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(run_until(config, async move {
            let _ = stop_rx.await;
            Ok(())
        }));

        wait_for_socket(&socket).await;

        Self {
            _dir: dir,
            socket,
            cidrs,
            stop: Some(stop_tx),
            handle,
        }
    }

    pub async fn client(&self) -> Client {
        Client::connect(&self.socket).await
    }

    /// Replace the prefix file contents.
    pub fn write_prefixes(&self, prefixes: &str) {
        std::fs::write(&self.cidrs, prefixes).unwrap();
    }

    /// Stop the server and return how it exited.
    pub async fn stop(mut self) -> Result<(), ServerError> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.handle.await.unwrap()
    }
}

/// Wait until something is accepting connections on `path`.
pub async fn wait_for_socket(path: &Path) {
    for _ in 0..200 {
        if UnixStream::connect(path).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("server never started listening on {}", path.display());
}

/// Line-protocol client.
pub struct Client {
    stream: BufReader<UnixStream>,
}

impl Client {
    pub async fn connect(path: &Path) -> Self {
        let stream = UnixStream::connect(path).await.unwrap();
        Self {
            stream: BufReader::new(stream),
        }
    }

    /// Send one query line and return the response token without its newline.
    pub async fn query(&mut self, addr: &str) -> String {
        self.stream.write_all(addr.as_bytes()).await.unwrap();
        self.stream.write_all(b"\n").await.unwrap();
        let mut line = String::new();
        self.stream.read_line(&mut line).await.unwrap();
        assert!(line.ends_with('\n'), "response not newline-terminated: {line:?}");
        line.trim_end().to_string()
    }
}

/// Poll `probe` until it returns `expected`, failing after a few seconds.
#[allow(dead_code)]
pub async fn eventually(client: &mut Client, probe: &str, expected: &str) {
    for _ in 0..250 {
        if client.query(probe).await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("{probe} never answered {expected}");
}
