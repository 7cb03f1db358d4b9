use std::ffi::OsStr;
use std::future::Future;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::process::{Command, Output};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use apiprobe::config::EngineConfig;

/// What the stub server answers for one request.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub delay: Duration,
}

impl StubResponse {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: b"OK".to_vec(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// The parts of a received request the tests inspect.
#[derive(Debug, Clone, Default)]
pub struct StubRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl StubRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

type Handler = dyn Fn(&StubRequest) -> StubResponse + Send + Sync;

pub struct ServerHandle {
    pub url: String,
    hits: Arc<AtomicUsize>,
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ServerHandle {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

type ClientFn = dyn Fn(TcpStream, &AtomicUsize) + Send + Sync;

/// Spawn a stub HTTP server whose answers come from `handler`.
///
/// # Errors
///
/// Returns an error if the listener cannot be created or configured.
pub fn spawn_stub_server<F>(handler: F) -> Result<ServerHandle, String>
where
    F: Fn(&StubRequest) -> StubResponse + Send + Sync + 'static,
{
    let handler: Arc<Handler> = Arc::new(handler);
    spawn_listener(Arc::new(move |stream: TcpStream, hits: &AtomicUsize| {
        handle_client(stream, handler.as_ref(), hits);
    }))
}

/// Spawn a server that answers every request with `raw` bytes and then
/// closes the socket, for responses a well-formed stub cannot produce.
///
/// # Errors
///
/// Returns an error if the listener cannot be created or configured.
pub fn spawn_raw_server_or_skip(raw: Vec<u8>) -> Result<Option<ServerHandle>, String> {
    let raw = Arc::new(raw);
    skip_when_forbidden(spawn_listener(Arc::new(move |mut stream: TcpStream, hits: &AtomicUsize| {
        if prepare_stream(&stream).is_none() || read_request(&mut stream).is_none() {
            return;
        }
        hits.fetch_add(1, Ordering::SeqCst);
        if stream.write_all(&raw).is_ok() && stream.flush().is_ok() {
            drop(stream.shutdown(Shutdown::Both));
        }
    })))
}

fn spawn_listener(on_client: Arc<ClientFn>) -> Result<ServerHandle, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    let hits = Arc::new(AtomicUsize::new(0));

    let server_hits = hits.clone();
    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            match listener.accept() {
                Ok((stream, _)) => {
                    let on_client = on_client.clone();
                    let hits = server_hits.clone();
                    thread::spawn(move || on_client(stream, &hits));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(5));
                }
                Err(_) => break,
            }
        }
    });

    Ok(ServerHandle {
        url: format!("http://{}", addr),
        hits,
        shutdown: shutdown_tx,
        thread: Some(handle),
    })
}

/// Like [`spawn_stub_server`], but skips when the sandbox forbids sockets.
///
/// # Errors
///
/// Returns an error for any other listener failure.
pub fn spawn_stub_server_or_skip<F>(handler: F) -> Result<Option<ServerHandle>, String>
where
    F: Fn(&StubRequest) -> StubResponse + Send + Sync + 'static,
{
    skip_when_forbidden(spawn_stub_server(handler))
}

fn skip_when_forbidden(
    spawned: Result<ServerHandle, String>,
) -> Result<Option<ServerHandle>, String> {
    match spawned {
        Ok(server) => Ok(Some(server)),
        Err(err) if err.contains("Operation not permitted") => {
            eprintln!("Skipping stub-server test: {}", err);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn prepare_stream(stream: &TcpStream) -> Option<()> {
    stream.set_nonblocking(false).ok()?;
    stream.set_read_timeout(Some(Duration::from_secs(5))).ok()
}

fn handle_client(mut stream: TcpStream, handler: &Handler, hits: &AtomicUsize) {
    if prepare_stream(&stream).is_none() {
        return;
    }
    let Some(request) = read_request(&mut stream) else {
        return;
    };
    hits.fetch_add(1, Ordering::SeqCst);

    let response = handler(&request);
    if !response.delay.is_zero() {
        thread::sleep(response.delay);
    }

    let mut head = format!(
        "HTTP/1.1 {} Stub\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status,
        response.body.len()
    );
    for (name, value) in &response.headers {
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");

    if stream.write_all(head.as_bytes()).is_err() || stream.write_all(&response.body).is_err() {
        return;
    }
    if stream.flush().is_err() {
        return;
    }
    drop(stream.shutdown(Shutdown::Both));
}

fn read_request(stream: &mut TcpStream) -> Option<StubRequest> {
    let mut data = Vec::new();
    let mut buffer = [0u8; 4096];
    let header_end = loop {
        let read = stream.read(&mut buffer).ok()?;
        if read == 0 {
            return None;
        }
        data.extend_from_slice(buffer.get(..read)?);
        if let Some(pos) = data.windows(4).position(|window| window == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(data.get(..header_end)?).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_owned();
    let path = request_line.next()?.to_owned();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);
    let body_start = header_end.checked_add(4)?;
    let mut body = data.get(body_start..).map(<[u8]>::to_vec).unwrap_or_default();
    while body.len() < content_length {
        let read = stream.read(&mut buffer).ok()?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(buffer.get(..read)?);
    }

    Some(StubRequest {
        method,
        path,
        headers,
        body,
    })
}

/// Engine settings tuned for fast tests: short backoff, generous rate.
pub fn test_config() -> EngineConfig {
    EngineConfig {
        rate_limit_per_second: 1000,
        retry_delay: Duration::from_millis(10),
        max_retry_delay: Duration::from_millis(20),
        default_timeout: Duration::from_secs(5),
        ..EngineConfig::default()
    }
}

pub fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

/// Run the `apiprobe` binary and capture output.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_apiprobe<I, S>(args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = apiprobe_bin()?;
    Command::new(bin)
        .args(args)
        .env("RUST_LOG", "error")
        .env_remove("APIPROBE_LOG")
        .output()
        .map_err(|err| format!("run apiprobe failed: {}", err))
}

fn apiprobe_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_apiprobe").map_or_else(
        || Err("CARGO_BIN_EXE_apiprobe missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}
