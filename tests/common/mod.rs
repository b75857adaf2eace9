//! Shared fixtures: a tiny HTTP server on localhost and format builders.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tubefetch::extractor::{Format, FormatList, UnavailableDecipherer, Video, YoutubeClient};
use tubefetch::{AppSettings, Logger};

#[derive(Clone)]
pub struct Route {
    pub status: u16,
    pub body: Vec<u8>,
    /// Announce more bytes than `body` and keep the connection open after
    /// sending it
    pub stall: bool,
}

impl Route {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            stall: false,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
            stall: false,
        }
    }

    /// 200 that sends `prefix` and then never finishes the body
    pub fn stalled(prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            stall: true,
            ..Self::ok(prefix)
        }
    }
}

/// Serves fixed responses by path (query string ignored) and records every
/// requested path.
pub struct TestServer {
    pub base_url: String,
    hits: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    pub async fn start(routes: Vec<(&str, Route)>) -> Self {
        let routes: HashMap<String, Route> = routes
            .into_iter()
            .map(|(path, route)| (path.to_string(), route))
            .collect();
        let routes = Arc::new(routes);
        let hits = Arc::new(Mutex::new(Vec::new()));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let server_hits = hits.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let routes = routes.clone();
                let hits = server_hits.clone();
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    loop {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => {
                                request.extend_from_slice(&buf[..n]);
                                if request.windows(4).any(|w| w == b"\r\n\r\n") {
                                    break;
                                }
                            }
                        }
                    }

                    let request = String::from_utf8_lossy(&request);
                    let target = request
                        .lines()
                        .next()
                        .and_then(|line| line.split_whitespace().nth(1))
                        .unwrap_or("/")
                        .to_string();
                    let path = target.split('?').next().unwrap_or("/").to_string();
                    hits.lock().unwrap().push(path.clone());

                    let route = routes.get(&path).cloned().unwrap_or(Route::status(404));
                    let announced = if route.stall {
                        route.body.len() + 1_000_000
                    } else {
                        route.body.len()
                    };
                    let head = format!(
                        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n",
                        route.status,
                        reason(route.status),
                        announced
                    );
                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket.write_all(&route.body).await;
                    let _ = socket.flush().await;
                    if route.stall {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                    }
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            hits,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

pub fn client() -> YoutubeClient {
    YoutubeClient::new(
        &AppSettings::default(),
        Arc::new(UnavailableDecipherer),
        Logger::off(),
    )
    .expect("client")
}

pub fn stream_format(itag: i64, mime: &str, url: Option<String>) -> Format {
    Format {
        itag,
        mime_type: mime.to_string(),
        url,
        ..Default::default()
    }
}

pub fn split_video(video_formats: Vec<Format>, audio_formats: Vec<Format>) -> Video {
    let formats: FormatList = video_formats
        .iter()
        .chain(audio_formats.iter())
        .cloned()
        .collect();
    Video {
        id: "XbNghLqsVwU".to_string(),
        title: "Split Video".to_string(),
        formats,
        video_formats: FormatList::new(video_formats),
        audio_formats: FormatList::new(audio_formats),
        ..Default::default()
    }
}
