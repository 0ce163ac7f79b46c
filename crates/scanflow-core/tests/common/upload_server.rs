//! Minimal HTTP/1.1 server that accepts uploads for integration tests.
//!
//! Reads one request per connection, decoding `Content-Length` or chunked
//! bodies, hands it to the test over a channel and answers with a fixed
//! status and body. It can instead hang up partway through a request.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct UploadServerOptions {
    pub status: u16,
    pub reason: &'static str,
    pub body: String,
    /// Read this many bytes of the request, then close without answering.
    pub hang_up_after: Option<usize>,
}

impl Default for UploadServerOptions {
    fn default() -> Self {
        Self {
            status: 201,
            reason: "Created",
            body: String::new(),
            hang_up_after: None,
        }
    }
}

/// One request as the server saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Starts a server in a background thread. Returns its `host:port` and a
/// receiver yielding every request it reads. Runs until the process exits.
pub fn start(opts: UploadServerOptions) -> (String, mpsc::Receiver<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let tx = tx.clone();
            let opts = opts.clone();
            thread::spawn(move || handle(stream, &opts, &tx));
        }
    });
    (format!("127.0.0.1:{port}"), rx)
}

fn handle(stream: TcpStream, opts: &UploadServerOptions, tx: &mpsc::Sender<Recorded>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let mut writer = match stream.try_clone() {
        Ok(w) => w,
        Err(_) => return,
    };
    let mut reader = BufReader::new(stream);
    if let Some(limit) = opts.hang_up_after {
        let mut head = vec![0; limit];
        let _ = reader.read_exact(&mut head);
        return;
    }
    let Some(recorded) = read_request(&mut reader) else {
        return;
    };
    let _ = tx.send(recorded);
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        opts.status,
        opts.reason,
        opts.body.len(),
        opts.body
    );
    let _ = writer.write_all(response.as_bytes());
}

fn read_line(reader: &mut impl BufRead) -> Option<String> {
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
    }
}

fn read_request(reader: &mut impl BufRead) -> Option<Recorded> {
    let request_line = read_line(reader)?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        let line = read_line(reader)?;
        if line.is_empty() {
            break;
        }
        let (name, value) = line.split_once(':')?;
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }
    let mut recorded = Recorded {
        method,
        target,
        headers,
        body: Vec::new(),
    };

    if recorded
        .header("transfer-encoding")
        .is_some_and(|v| v.eq_ignore_ascii_case("chunked"))
    {
        loop {
            let size_line = read_line(reader)?;
            let size = usize::from_str_radix(size_line.split(';').next()?.trim(), 16).ok()?;
            if size == 0 {
                while !read_line(reader)?.is_empty() {}
                break;
            }
            let start = recorded.body.len();
            recorded.body.resize(start + size, 0);
            reader.read_exact(&mut recorded.body[start..]).ok()?;
            read_line(reader)?;
        }
    } else if let Some(len) = recorded.header("content-length") {
        let len: usize = len.parse().ok()?;
        recorded.body = vec![0; len];
        reader.read_exact(&mut recorded.body).ok()?;
    }
    Some(recorded)
}
