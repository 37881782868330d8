//! HTTP transport seam
//!
//! The client builds plain request values and hands them to a [`Transport`].
//! Production code uses [`ReqwestTransport`]; tests swap in a recorder.

use std::fmt;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::error::{ChannelFinderError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Put => reqwest::Method::PUT,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A fully built request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A received response, body fully read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Final URL, after redirects
    pub url: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("application/json"))
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one exchange. Non-2xx statuses are returned, not raised.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// reqwest-backed transport
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ChannelFinderError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap a preconfigured client (proxies, TLS roots, default headers)
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .request(request.method.into(), request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ChannelFinderError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response
            .bytes()
            .await
            .map_err(|e| ChannelFinderError::Transport(e.to_string()))?
            .to_vec();

        Ok(HttpResponse {
            status,
            url,
            content_type,
            body,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer one connection with `response` and hand back the raw request
    async fn serve_once(response: &'static str) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];

            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);

                let text = String::from_utf8_lossy(&buf).to_lowercase();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + length {
                        break;
                    }
                }
            }

            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&buf).into_owned()
        });

        let url = Url::parse(&format!("http://{addr}/ChannelFinder/resources/tags/T1")).unwrap();
        (url, handle)
    }

    #[tokio::test]
    async fn reqwest_sends_headers_and_body() {
        let (url, server) = serve_once(
            "HTTP/1.1 404 Not Found\r\n\
             Content-Type: application/json;charset=UTF-8\r\n\
             Content-Length: 39\r\n\
             Connection: close\r\n\
             \r\n\
             {\"error\":\"NotFound\",\"message\":\"no tag\"}",
        )
        .await;

        let mut request = HttpRequest::new(Method::Put, url.clone());
        request
            .headers
            .push(("Cache-Control", "no-cache".to_string()));
        request
            .headers
            .push(("Content-Type", "application/json".to_string()));
        request.body = Some(br#"{"name":"T1","owner":"me"}"#.to_vec());

        let response = ReqwestTransport::new().unwrap().send(request).await.unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.is_success());
        assert!(response.is_json());
        assert_eq!(
            response.content_type.as_deref(),
            Some("application/json;charset=UTF-8")
        );
        assert_eq!(response.url, url.as_str());
        assert_eq!(
            response.body,
            br#"{"error":"NotFound","message":"no tag"}"#.to_vec()
        );

        let raw = server.await.unwrap();
        let lower = raw.to_lowercase();
        assert!(raw.starts_with("PUT /ChannelFinder/resources/tags/T1 HTTP/1.1"), "{raw}");
        assert!(lower.contains("cache-control: no-cache"), "{raw}");
        assert!(lower.contains("content-type: application/json"), "{raw}");
        assert!(raw.ends_with(r#"{"name":"T1","owner":"me"}"#), "{raw}");
    }

    #[tokio::test]
    async fn reqwest_connect_failure_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{addr}/ChannelFinder")).unwrap();
        let err = ReqwestTransport::new()
            .unwrap()
            .send(HttpRequest::new(Method::Get, url))
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelFinderError::Transport(_)), "{err}");
    }
}
