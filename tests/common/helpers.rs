#![allow(dead_code)]

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{CONTENT_LENGTH, CONTENT_RANGE, RANGE},
        HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use proxysplit::http::{create_http_client, HttpClientConfig};
use proxysplit::{Download, DownloaderBuilder, ProxyPool};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const FILE_NAME: &str = "file.bin";
pub const START_PORT: u16 = 9000;
/// Header through which each test identity tags its requests.
pub const IDENTITY_HEADER: &str = "x-proxy-port";

// === Content Helpers ===

/// Creates test file content of specified size
pub fn create_test_content(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

pub fn chunk_size(size: u64) -> NonZeroU64 {
    NonZeroU64::new(size).expect("chunk size must not be zero")
}

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Asserts that a file exists at the given path
pub fn assert_file_exists(path: &Path) {
    assert!(path.exists(), "File should exist at path: {:?}", path);
}

/// Asserts that a file has the expected size
pub fn assert_file_size(path: &Path, expected_size: u64) {
    let metadata = fs::metadata(path).expect("Failed to get file metadata");
    assert_eq!(
        metadata.len(),
        expected_size,
        "File size mismatch at path: {:?}",
        path
    );
}

/// Names of the files left in `dir`.
pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

// === Pool Helpers ===

/// A pool whose identities talk to the server directly and tag every request
/// with their port.
pub fn direct_pool(count: usize) -> ProxyPool {
    ProxyPool::with_client_factory(START_PORT, count, |identity| {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(IDENTITY_HEADER),
            HeaderValue::from(identity.port()),
        );
        Ok(create_http_client(HttpClientConfig {
            headers: Some(headers),
            ..HttpClientConfig::default()
        })?)
    })
    .expect("Failed to create proxy pool")
}

// === Downloader Helpers ===

/// A hidden downloader writing partial files to `scratch`.
pub fn test_downloader(scratch: &Path, chunk: u64) -> DownloaderBuilder {
    DownloaderBuilder::hidden()
        .scratch_dir(scratch.to_path_buf())
        .chunk_size(chunk_size(chunk))
}

/// Scratch dir, output dir and the download pointing at `server`.
pub struct Workspace {
    pub root: TempDir,
    pub scratch: PathBuf,
    pub output: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let root = create_temp_dir();
        let scratch = root.path().join("scratch");
        let output = root.path().join("out").join(FILE_NAME);
        Self {
            root,
            scratch,
            output,
        }
    }

    pub fn download(&self, server: &TestServer) -> Download {
        Download::parse(&server.url, self.output.clone()).expect("Failed to create download")
    }

    pub fn partial(&self, index: usize) -> PathBuf {
        self.scratch.join(format!("{}.progress.{}", FILE_NAME, index))
    }
}

// === Range Server ===

/// How the test server answers.
pub struct ServerState {
    pub content: Vec<u8>,
    /// Answer HEAD with the full length; otherwise 500.
    pub head_ok: bool,
    /// Length announced by HEAD instead of the real one.
    pub declared_length: Option<u64>,
    /// Answer the `bytes=0-0` size request with a Content-Range header.
    pub size_content_range: bool,
    /// Serve ranges; otherwise always the whole body with 200.
    pub honor_ranges: bool,
    /// Delay before answering chunk requests.
    pub chunk_delay: Duration,
    /// Remaining truncated answers per range start.
    truncations: Mutex<HashMap<u64, usize>>,
    pub head_requests: AtomicUsize,
    pub size_requests: AtomicUsize,
    pub chunk_requests: AtomicUsize,
    /// Identities with a request in flight.
    in_flight: Mutex<HashSet<String>>,
    /// Set when an identity was seen twice concurrently.
    pub overlapping_leases: AtomicUsize,
    pub ports_seen: Mutex<HashSet<String>>,
}

impl ServerState {
    pub fn new(content: Vec<u8>) -> Self {
        Self {
            content,
            head_ok: true,
            declared_length: None,
            size_content_range: true,
            honor_ranges: true,
            chunk_delay: Duration::ZERO,
            truncations: Mutex::new(HashMap::new()),
            head_requests: AtomicUsize::new(0),
            size_requests: AtomicUsize::new(0),
            chunk_requests: AtomicUsize::new(0),
            in_flight: Mutex::new(HashSet::new()),
            overlapping_leases: AtomicUsize::new(0),
            ports_seen: Mutex::new(HashSet::new()),
        }
    }

    pub fn failing_head(mut self) -> Self {
        self.head_ok = false;
        self
    }

    pub fn declaring_length(mut self, length: u64) -> Self {
        self.declared_length = Some(length);
        self
    }

    pub fn without_size_content_range(mut self) -> Self {
        self.size_content_range = false;
        self
    }

    pub fn ignoring_ranges(mut self) -> Self {
        self.honor_ranges = false;
        self
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    /// Answer the next `times` requests for the range starting at `start`
    /// with one byte missing.
    pub fn truncating(self, start: u64, times: usize) -> Self {
        self.truncations.lock().unwrap().insert(start, times);
        self
    }

    pub fn chunk_requests(&self) -> usize {
        self.chunk_requests.load(Ordering::SeqCst)
    }

    fn take_truncation(&self, start: u64) -> bool {
        let mut truncations = self.truncations.lock().unwrap();
        match truncations.get_mut(&start) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

pub struct TestServer {
    pub url: String,
    pub state: Arc<ServerState>,
}

impl TestServer {
    pub async fn start(state: ServerState) -> Self {
        let state = Arc::new(state);
        let app = Router::new()
            .route(&format!("/{}", FILE_NAME), get(serve_file))
            .with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            url: format!("http://{}/{}", addr, FILE_NAME),
            state,
        }
    }

    pub async fn with_content(content: Vec<u8>) -> Self {
        Self::start(ServerState::new(content)).await
    }
}

fn parse_range(headers: &HeaderMap) -> Option<(u64, u64)> {
    let value = headers.get(RANGE)?.to_str().ok()?;
    let (start, end) = value.strip_prefix("bytes=")?.split_once('-')?;
    Some((start.parse().ok()?, end.parse().ok()?))
}

fn full_body(state: &ServerState) -> Response {
    (StatusCode::OK, state.content.clone()).into_response()
}

fn partial_body(state: &ServerState, start: u64, end: u64, truncate: bool) -> Response {
    let len = state.content.len() as u64;
    let end = end.min(len - 1);
    let mut body = state.content[start as usize..=end as usize].to_vec();
    if truncate {
        body.pop();
    }
    Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(CONTENT_RANGE, format!("bytes {}-{}/{}", start, end, len))
        .body(Body::from(body))
        .unwrap()
}

async fn serve_file(
    State(state): State<Arc<ServerState>>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    let port = headers
        .get(IDENTITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    state.ports_seen.lock().unwrap().insert(port.clone());

    if method == Method::HEAD {
        state.head_requests.fetch_add(1, Ordering::SeqCst);
        if !state.head_ok {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        return Response::builder()
            .status(StatusCode::OK)
            .header(
                CONTENT_LENGTH,
                state
                    .declared_length
                    .unwrap_or(state.content.len() as u64),
            )
            .body(Body::empty())
            .unwrap();
    }

    let Some((start, end)) = parse_range(&headers) else {
        return full_body(&state);
    };

    // Tests never plan one-byte chunks, so `bytes=0-0` is always the size request.
    if (start, end) == (0, 0) {
        state.size_requests.fetch_add(1, Ordering::SeqCst);
        if !state.size_content_range {
            return (StatusCode::OK, vec![state.content[0]]).into_response();
        }
        return partial_body(&state, 0, 0, false);
    }

    state.chunk_requests.fetch_add(1, Ordering::SeqCst);
    if !state.in_flight.lock().unwrap().insert(port.clone()) {
        state.overlapping_leases.fetch_add(1, Ordering::SeqCst);
    }
    if !state.chunk_delay.is_zero() {
        tokio::time::sleep(state.chunk_delay).await;
    }
    let response = if state.honor_ranges {
        partial_body(&state, start, end, state.take_truncation(start))
    } else {
        full_body(&state)
    };
    state.in_flight.lock().unwrap().remove(&port);
    response
}

// === SOCKS5 Endpoint ===

/// Minimal SOCKS5 endpoint (no authentication, CONNECT only) relaying to the
/// requested host, so the binary can run against the local range server.
pub struct SocksProxy {
    pub port: u16,
    pub connections: Arc<AtomicUsize>,
}

impl SocksProxy {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind SOCKS endpoint");
        let port = listener.local_addr().unwrap().port();
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = connections.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let _ = relay(stream).await;
                });
            }
        });
        Self { port, connections }
    }
}

/// A port with nothing listening on it.
pub fn unused_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .expect("Failed to find a free port")
        .port()
}

async fn relay(mut client: TcpStream) -> io::Result<()> {
    // Greeting: VER NMETHODS METHODS...
    let mut greeting = [0u8; 2];
    client.read_exact(&mut greeting).await?;
    let mut methods = vec![0u8; greeting[1] as usize];
    client.read_exact(&mut methods).await?;
    client.write_all(&[5, 0]).await?;

    // Request: VER CMD RSV ATYP DST.ADDR DST.PORT
    let mut request = [0u8; 4];
    client.read_exact(&mut request).await?;
    let host = match request[3] {
        1 => {
            let mut ip = [0u8; 4];
            client.read_exact(&mut ip).await?;
            Ipv4Addr::from(ip).to_string()
        }
        3 => {
            let mut len = [0u8; 1];
            client.read_exact(&mut len).await?;
            let mut name = vec![0u8; len[0] as usize];
            client.read_exact(&mut name).await?;
            String::from_utf8_lossy(&name).into_owned()
        }
        4 => {
            let mut ip = [0u8; 16];
            client.read_exact(&mut ip).await?;
            Ipv6Addr::from(ip).to_string()
        }
        _ => return Err(io::Error::other("unsupported address type")),
    };
    let mut port = [0u8; 2];
    client.read_exact(&mut port).await?;

    let mut upstream = match TcpStream::connect((host.as_str(), u16::from_be_bytes(port))).await {
        Ok(stream) => stream,
        Err(e) => {
            client.write_all(&[5, 5, 0, 1, 0, 0, 0, 0, 0, 0]).await?;
            return Err(e);
        }
    };
    client.write_all(&[5, 0, 0, 1, 0, 0, 0, 0, 0, 0]).await?;
    tokio::io::copy_bidirectional(&mut client, &mut upstream).await?;
    Ok(())
}
