//! Shared fixtures for acquisition integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use sunlapse_acquisition::{FrameFetcher, HttpFetcher, SessionOptions};
use sunlapse_common::clock::FixedClock;
use sunlapse_common::error::{SunlapseError, SunlapseResult};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub fn capture_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
}

pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(capture_date()))
}

pub fn fast_options() -> SessionOptions {
    SessionOptions {
        tick: Duration::from_millis(10),
    }
}

/// A small valid JPEG.
pub fn jpeg_bytes() -> Vec<u8> {
    let image = image::RgbImage::from_pixel(16, 12, image::Rgb([200, 120, 40]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut out, image::ImageFormat::Jpeg)
        .unwrap();
    out.into_inner()
}

/// Serves a fixed body and counts calls.
pub struct StaticFetcher {
    body: Vec<u8>,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new(body: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            body,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameFetcher for StaticFetcher {
    async fn fetch(&self, _url: &str) -> SunlapseResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Serves a valid frame for the first `good_calls` fetches, then fails
/// every later fetch with a download error.
pub struct FailingAfterFetcher {
    body: Vec<u8>,
    good_calls: usize,
    calls: AtomicUsize,
}

impl FailingAfterFetcher {
    pub fn new(body: Vec<u8>, good_calls: usize) -> Arc<Self> {
        Arc::new(Self {
            body,
            good_calls,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameFetcher for FailingAfterFetcher {
    async fn fetch(&self, url: &str) -> SunlapseResult<Vec<u8>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.good_calls {
            Ok(self.body.clone())
        } else {
            Err(SunlapseError::download(url, "connection reset by peer"))
        }
    }

    fn name(&self) -> &str {
        "failing-after"
    }
}

/// Real HTTP fetcher pointed at a local test server instead of the
/// catalog URL.
pub struct LocalHttpFetcher {
    inner: HttpFetcher,
    url: String,
}

impl LocalHttpFetcher {
    pub fn new(url: String) -> Arc<Self> {
        Arc::new(Self {
            inner: HttpFetcher::with_timeout(Duration::from_secs(2)).unwrap(),
            url,
        })
    }
}

#[async_trait]
impl FrameFetcher for LocalHttpFetcher {
    async fn fetch(&self, _url: &str) -> SunlapseResult<Vec<u8>> {
        self.inner.fetch(&self.url).await
    }

    fn name(&self) -> &str {
        "local-http"
    }
}

/// Start an HTTP server answering every request with `status` and `body`.
/// Returns the URL to fetch.
pub async fn serve(status: &'static str, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let body = body.clone();
            tokio::spawn(async move {
                read_request_head(&mut socket).await;
                let head = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                socket.write_all(head.as_bytes()).await.ok();
                socket.write_all(&body).await.ok();
                socket.shutdown().await.ok();
            });
        }
    });

    format!("http://{addr}/latest.jpg")
}

/// Start a server that accepts connections but never answers.
pub async fn serve_silent() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                read_request_head(&mut socket).await;
                tokio::time::sleep(Duration::from_secs(30)).await;
            });
        }
    });

    format!("http://{addr}/latest.jpg")
}

async fn read_request_head(socket: &mut tokio::net::TcpStream) {
    let mut buf = [0u8; 1024];
    let mut head = Vec::new();
    loop {
        let n = socket.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        head.extend_from_slice(&buf[..n]);
        if head.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
}
