//! Local network stubs shared by the integration tests.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Reads an HTTP request head up to and including the blank line.
async fn read_head(stream: &mut TcpStream) -> io::Result<String> {
    let mut buf = Vec::new();
    let mut byte = [0u8; 1];
    while !buf.ends_with(b"\r\n\r\n") {
        if stream.read(&mut byte).await? == 0 {
            break;
        }
        buf.push(byte[0]);
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Writes a `200 OK` response. HEAD requests get headers only.
async fn respond(stream: &mut TcpStream, head: &str, body: &str) -> io::Result<()> {
    let mut response = format!(
        "HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
        body.len()
    );
    if !head.starts_with("HEAD ") {
        response.push_str(body);
    }
    stream.write_all(response.as_bytes()).await?;
    stream.flush().await
}

/// An HTTP/1.1 server that records every request head it receives.
///
/// Used both as an origin (direct connections see origin-form request lines)
/// and as an HTTP proxy (proxied requests arrive in absolute-form).
pub struct RecordingServer {
    pub addr: SocketAddr,
    heads: Arc<Mutex<Vec<String>>>,
    connections: Arc<AtomicUsize>,
}

impl RecordingServer {
    pub async fn start(body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let heads = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));

        let seen = Arc::clone(&heads);
        let accepted = Arc::clone(&connections);
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                accepted.fetch_add(1, Ordering::SeqCst);
                let seen = Arc::clone(&seen);
                tokio::spawn(async move {
                    let head = read_head(&mut stream).await.unwrap_or_default();
                    seen.lock().unwrap().push(head.clone());
                    let _ = respond(&mut stream, &head, body).await;
                });
            }
        });

        Self {
            addr,
            heads,
            connections,
        }
    }

    pub fn http_descriptor(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn heads(&self) -> Vec<String> {
        self.heads.lock().unwrap().clone()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// A SOCKS4/4a/5 proxy that accepts one CONNECT per connection, records the
/// requested target, then answers the tunneled HTTP request itself.
pub struct SocksStub {
    pub addr: SocketAddr,
    targets: Arc<Mutex<Vec<String>>>,
    credentials: Arc<Mutex<Vec<(String, String)>>>,
    heads: Arc<Mutex<Vec<String>>>,
}

struct Handshake {
    target: String,
    credentials: Option<(String, String)>,
}

async fn read_string(stream: &mut TcpStream) -> io::Result<String> {
    let len = stream.read_u8().await?;
    let mut raw = vec![0u8; usize::from(len)];
    stream.read_exact(&mut raw).await?;
    Ok(String::from_utf8_lossy(&raw).into_owned())
}

async fn read_nul_terminated(stream: &mut TcpStream) -> io::Result<String> {
    let mut raw = Vec::new();
    loop {
        match stream.read_u8().await? {
            0 => break,
            byte => raw.push(byte),
        }
    }
    Ok(String::from_utf8_lossy(&raw).into_owned())
}

async fn socks_handshake(stream: &mut TcpStream) -> io::Result<Handshake> {
    match stream.read_u8().await? {
        4 => socks4_handshake(stream).await,
        5 => socks5_handshake(stream).await,
        other => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unknown SOCKS version {other}"),
        )),
    }
}

/// SOCKS4 after the version byte. A `0.0.0.x` address marks the 4a form,
/// where the hostname follows the user id.
async fn socks4_handshake(stream: &mut TcpStream) -> io::Result<Handshake> {
    let _command = stream.read_u8().await?;
    let port = stream.read_u16().await?;
    let mut octets = [0u8; 4];
    stream.read_exact(&mut octets).await?;
    let _user_id = read_nul_terminated(stream).await?;

    let host = if octets[..3] == [0, 0, 0] && octets[3] != 0 {
        read_nul_terminated(stream).await?
    } else {
        Ipv4Addr::from(octets).to_string()
    };

    stream.write_all(&[0, 0x5A, 0, 0, 0, 0, 0, 0]).await?;

    Ok(Handshake {
        target: format!("{host}:{port}"),
        credentials: None,
    })
}

/// SOCKS5 after the version byte.
async fn socks5_handshake(stream: &mut TcpStream) -> io::Result<Handshake> {
    let method_count = stream.read_u8().await?;
    let mut methods = vec![0u8; usize::from(method_count)];
    stream.read_exact(&mut methods).await?;

    let credentials = if methods.contains(&0x02) {
        stream.write_all(&[5, 0x02]).await?;
        let _subnegotiation_version = stream.read_u8().await?;
        let username = read_string(stream).await?;
        let password = read_string(stream).await?;
        stream.write_all(&[1, 0]).await?;
        Some((username, password))
    } else {
        stream.write_all(&[5, 0x00]).await?;
        None
    };

    let mut request = [0u8; 4];
    stream.read_exact(&mut request).await?;
    let host = match request[3] {
        0x01 => {
            let mut octets = [0u8; 4];
            stream.read_exact(&mut octets).await?;
            Ipv4Addr::from(octets).to_string()
        }
        0x03 => read_string(stream).await?,
        0x04 => {
            let mut octets = [0u8; 16];
            stream.read_exact(&mut octets).await?;
            format!("[{}]", Ipv6Addr::from(octets))
        }
        other => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unknown address type {other}"),
            ));
        }
    };
    let port = stream.read_u16().await?;

    stream.write_all(&[5, 0, 0, 1, 0, 0, 0, 0, 0, 0]).await?;

    Ok(Handshake {
        target: format!("{host}:{port}"),
        credentials,
    })
}

impl SocksStub {
    pub async fn start(body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let targets = Arc::new(Mutex::new(Vec::new()));
        let credentials = Arc::new(Mutex::new(Vec::new()));
        let heads = Arc::new(Mutex::new(Vec::new()));

        let (t, c, h) = (
            Arc::clone(&targets),
            Arc::clone(&credentials),
            Arc::clone(&heads),
        );
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let (t, c, h) = (Arc::clone(&t), Arc::clone(&c), Arc::clone(&h));
                tokio::spawn(async move {
                    let Ok(handshake) = socks_handshake(&mut stream).await else {
                        return;
                    };
                    t.lock().unwrap().push(handshake.target);
                    if let Some(creds) = handshake.credentials {
                        c.lock().unwrap().push(creds);
                    }

                    let head = read_head(&mut stream).await.unwrap_or_default();
                    h.lock().unwrap().push(head.clone());
                    let _ = respond(&mut stream, &head, body).await;
                });
            }
        });

        Self {
            addr,
            targets,
            credentials,
            heads,
        }
    }

    pub fn descriptor(&self, scheme: &str) -> String {
        format!("{scheme}://{}", self.addr)
    }

    pub fn targets(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }

    pub fn credentials(&self) -> Vec<(String, String)> {
        self.credentials.lock().unwrap().clone()
    }

    pub fn heads(&self) -> Vec<String> {
        self.heads.lock().unwrap().clone()
    }
}

/// Answers every request with headers promising a body that never arrives.
pub struct StalledBodyServer {
    pub addr: SocketAddr,
}

impl StalledBodyServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((mut stream, _)) = listener.accept().await {
                let _ = read_head(&mut stream).await;
                let _ = stream
                    .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 1024\r\n\r\npartial")
                    .await;
                held.push(stream);
            }
        });

        Self { addr }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

/// Accepts connections and never writes a byte.
pub struct SilentServer {
    pub addr: SocketAddr,
    connections: Arc<AtomicUsize>,
}

impl SilentServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));

        let accepted = Arc::clone(&connections);
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                accepted.fetch_add(1, Ordering::SeqCst);
                held.push(stream);
            }
        });

        Self { addr, connections }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// Returns a loopback address with nothing listening on it.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
