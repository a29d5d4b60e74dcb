use std::ffi::OsString;
use std::future::Future;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use clap::Parser;

use crate::args::LoadArgs;
use crate::error::{AppError, AppResult};

const ACCEPT_POLL: Duration = Duration::from_millis(5);
const HANG_POLL: Duration = Duration::from_millis(10);
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// How the stub answers every request.
#[derive(Debug, Clone, Copy)]
pub(crate) enum StubMode {
    Ok,
    Status(u16),
    /// Reads the request and never answers.
    Hang,
}

#[derive(Debug, Default)]
struct StubState {
    stop: AtomicBool,
    active: AtomicUsize,
    peak: AtomicUsize,
    paths: Mutex<Vec<String>>,
}

pub(crate) struct StubServer {
    url: String,
    state: Arc<StubState>,
    thread: Option<thread::JoinHandle<()>>,
}

impl StubServer {
    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn requests_with_prefix(&self, prefix: &str) -> usize {
        self.state
            .paths
            .lock()
            .map_or(0, |paths| paths.iter().filter(|path| path.starts_with(prefix)).count())
    }

    pub(crate) fn peak_connections(&self) -> usize {
        self.state.peak.load(Ordering::Acquire)
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.state.stop.store(true, Ordering::Release);
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

/// Spawns a thread-per-connection HTTP/1.1 stub on an ephemeral port.
pub(crate) fn spawn_stub_server(mode: StubMode) -> AppResult<StubServer> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    listener.set_nonblocking(true)?;

    let state = Arc::new(StubState::default());
    let accept_state = Arc::clone(&state);
    let handle = thread::spawn(move || {
        while !accept_state.stop.load(Ordering::Acquire) {
            match listener.accept() {
                Ok((stream, _)) => {
                    let state = Arc::clone(&accept_state);
                    thread::spawn(move || handle_client(stream, mode, &state));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL);
                }
                Err(_) => break,
            }
        }
    });

    Ok(StubServer {
        url: format!("http://{}", addr),
        state,
        thread: Some(handle),
    })
}

/// A URL on which nothing listens.
pub(crate) fn closed_port_url() -> AppResult<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}", addr))
}

/// Parses a full argv (program name first) into [`LoadArgs`].
pub(crate) fn parse_cli<I, T>(argv: I) -> AppResult<LoadArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    LoadArgs::try_parse_from(argv)
        .map_err(|err| AppError::validation(format!("CLI parse failed: {}", err)))
}

pub(crate) fn run_async_test<F, T>(future: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::validation(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(future)
}

/// Like [`run_async_test`] with the clock paused, so sleeps auto-advance.
pub(crate) fn run_paused_test<F, T>(future: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .map_err(|err| AppError::validation(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(future)
}

fn handle_client(mut stream: TcpStream, mode: StubMode, state: &StubState) {
    let active = state.active.fetch_add(1, Ordering::AcqRel).saturating_add(1);
    state.peak.fetch_max(active, Ordering::AcqRel);

    if let Some(path) = read_request(&mut stream) {
        if let Ok(mut paths) = state.paths.lock() {
            paths.push(path);
        }
        match mode {
            StubMode::Ok => respond(&mut stream, "200 OK"),
            StubMode::Status(code) => respond(&mut stream, &format!("{} Stub", code)),
            StubMode::Hang => {
                while !state.stop.load(Ordering::Acquire) {
                    thread::sleep(HANG_POLL);
                }
            }
        }
    }

    drop(stream.shutdown(Shutdown::Both));
    state.active.fetch_sub(1, Ordering::AcqRel);
}

/// Reads the request head and any `Content-Length` body; returns the target.
fn read_request(stream: &mut TcpStream) -> Option<String> {
    stream.set_read_timeout(Some(READ_TIMEOUT)).ok()?;
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    let head_end = loop {
        let read = stream.read(&mut chunk).ok()?;
        if read == 0 {
            return None;
        }
        buffer.extend_from_slice(chunk.get(..read)?);
        if let Some(pos) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            break pos.saturating_add(4);
        }
    };

    let head = String::from_utf8_lossy(buffer.get(..head_end)?).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    let mut body_read = buffer.len().saturating_sub(head_end);
    while body_read < content_length {
        let read = stream.read(&mut chunk).ok()?;
        if read == 0 {
            break;
        }
        body_read = body_read.saturating_add(read);
    }

    head.lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .map(str::to_owned)
}

fn respond(stream: &mut TcpStream, status: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: 2\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\nOK",
        status
    );
    if stream.write_all(response.as_bytes()).is_err() {
        return;
    }
    drop(stream.flush());
}
