//! Minimal HTTP stand-in for the JMX console.
//!
//! Each connection carries one form-encoded POST; the console records it,
//! asks the test's responder for a reply and closes the connection.

use std::collections::BTreeMap;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use jboss_config::ManagementEndpoint;
use url::form_urlencoded;

use crate::control::HttpConsole;

/// One request received by the fake console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedCall {
    pub path: String,
    pub params: BTreeMap<String, String>,
}

impl RecordedCall {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn method(&self) -> Option<&str> {
        self.param("methodName")
    }
}

/// Reply returned for a recorded call.
#[derive(Debug, Clone)]
pub(crate) struct ConsoleReply {
    pub status: u16,
    pub body: String,
}

impl ConsoleReply {
    pub fn ok(body: String) -> Self {
        Self { status: 200, body }
    }

    pub fn error(status: u16) -> Self {
        Self {
            status,
            body: String::from("<html><body>internal error</body></html>"),
        }
    }
}

type Responder = dyn Fn(&RecordedCall) -> ConsoleReply + Send + Sync;

pub(crate) struct FakeConsole {
    port: u16,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FakeConsole {
    /// Starts a console on an ephemeral port that answers with `responder`.
    pub fn spawn<F>(responder: F) -> Result<Self>
    where
        F: Fn(&RecordedCall) -> ConsoleReply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake console")?;
        listener
            .set_nonblocking(true)
            .context("fake console nonblocking")?;
        let port = listener.local_addr().context("local addr")?.port();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));
        let responder: Arc<Responder> = Arc::new(responder);

        let thread_calls = Arc::clone(&calls);
        let thread_stop = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            while !thread_stop.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        // A failed exchange surfaces as a transport error in
                        // the client under test.
                        let _ = serve(stream, responder.as_ref(), &thread_calls);
                    }
                    Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                        thread::sleep(Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            calls,
            stop,
            handle: Some(handle),
        })
    }

    /// Starts a console that always answers `200` with `body`.
    pub fn answering(body: String) -> Result<Self> {
        Self::spawn(move |_| ConsoleReply::ok(body.clone()))
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn endpoint(&self) -> ManagementEndpoint {
        ManagementEndpoint::new("127.0.0.1", self.port)
    }

    pub fn console(&self) -> HttpConsole {
        HttpConsole::new(&self.endpoint(), Duration::from_secs(5)).expect("build console client")
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl Drop for FakeConsole {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve(
    stream: TcpStream,
    responder: &Responder,
    calls: &Mutex<Vec<RecordedCall>>,
) -> Result<()> {
    stream
        .set_nonblocking(false)
        .context("blocking connection")?;
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .context("read timeout")?;
    let call = read_call(&stream)?;
    let reply = responder(&call);
    calls
        .lock()
        .map_err(|error| anyhow!("lock calls: {error}"))?
        .push(call);
    write_reply(&stream, &reply)
}

fn read_call(stream: &TcpStream) -> Result<RecordedCall> {
    let mut reader = BufReader::new(stream.try_clone().context("clone stream")?);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .context("read request line")?;
    let path = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| anyhow!("malformed request line: {request_line:?}"))?
        .to_owned();

    let mut content_length = 0_usize;
    loop {
        let mut header = String::new();
        let read = reader.read_line(&mut header).context("read header")?;
        let header = header.trim_end();
        if read == 0 || header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().context("content length")?;
            }
        }
    }

    let mut body = vec![0_u8; content_length];
    reader.read_exact(&mut body).context("read body")?;
    let params = form_urlencoded::parse(&body).into_owned().collect();
    Ok(RecordedCall { path, params })
}

fn write_reply(mut stream: &TcpStream, reply: &ConsoleReply) -> Result<()> {
    let reason = if reply.status < 400 { "OK" } else { "Error" };
    write!(
        stream,
        "HTTP/1.1 {} {reason}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.status,
        reply.body.len(),
        reply.body
    )
    .context("write reply")?;
    stream.flush().context("flush reply")
}
