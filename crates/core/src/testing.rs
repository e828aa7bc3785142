//! In-memory stand-ins for the outbound clients. Each fake records what it was
//! asked so tests can assert on the calls, and clones share that record.

use crate::domain::news::NewsArticle;
use crate::domain::user::User;
use crate::llm::{ChatClient, ChatRequest, Provider};
use crate::news::{NewsApiStatusError, NewsProvider, NewsQuery, NewsSearchResponse};
use crate::storage::users::UserRepository;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum NewsBehavior {
    Articles(Vec<NewsArticle>),
    Status(u16),
    Fail(&'static str),
}

#[derive(Debug, Clone)]
pub struct FakeNews {
    behavior: NewsBehavior,
    queries: Arc<Mutex<Vec<NewsQuery>>>,
}

impl FakeNews {
    fn new(behavior: NewsBehavior) -> Self {
        Self {
            behavior,
            queries: Arc::default(),
        }
    }

    pub fn articles(articles: Vec<NewsArticle>) -> Self {
        Self::new(NewsBehavior::Articles(articles))
    }

    pub fn status(status: u16) -> Self {
        Self::new(NewsBehavior::Status(status))
    }

    pub fn failing(msg: &'static str) -> Self {
        Self::new(NewsBehavior::Fail(msg))
    }

    pub fn queries(&self) -> Vec<NewsQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl NewsProvider for FakeNews {
    fn provider_name(&self) -> &'static str {
        "fake"
    }

    async fn search(&self, query: &NewsQuery) -> anyhow::Result<NewsSearchResponse> {
        self.queries.lock().unwrap().push(query.clone());
        match &self.behavior {
            NewsBehavior::Articles(articles) => Ok(NewsSearchResponse {
                articles: Some(articles.clone()),
            }),
            NewsBehavior::Status(status) => Err(NewsApiStatusError {
                status: *status,
                body: "{\"status\":\"error\",\"code\":\"apiKeyInvalid\"}".to_string(),
            }
            .into()),
            NewsBehavior::Fail(msg) => Err(anyhow::anyhow!(*msg)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FakeChat {
    reply: Result<String, &'static str>,
    calls: Arc<Mutex<Vec<ChatRequest>>>,
}

impl FakeChat {
    pub fn reply(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: Arc::default(),
        }
    }

    pub fn failing(msg: &'static str) -> Self {
        Self {
            reply: Err(msg),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<ChatRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChatClient for FakeChat {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    async fn complete(&self, req: ChatRequest) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push(req);
        self.reply.clone().map_err(|msg| anyhow::anyhow!(msg))
    }
}

#[derive(Debug, Clone)]
pub struct FakeUsers(Result<Vec<User>, &'static str>);

impl FakeUsers {
    pub fn ok(users: Vec<User>) -> Self {
        Self(Ok(users))
    }

    pub fn failing(msg: &'static str) -> Self {
        Self(Err(msg))
    }
}

#[async_trait::async_trait]
impl UserRepository for FakeUsers {
    async fn list_all(&self) -> anyhow::Result<Vec<User>> {
        self.0.clone().map_err(|msg| anyhow::anyhow!(msg))
    }
}

/// Answers exactly one HTTP request on a loopback port with `status` and `body`,
/// returning the base URL to point a client at.
#[cfg(test)]
pub(crate) async fn serve_once(status: u16, body: &'static str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();

        // Drain the request so closing the socket does not reset the connection.
        let mut req = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = sock.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            req.extend_from_slice(&chunk[..n]);
            if let Some(head_end) = req.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&req[..head_end]).to_ascii_lowercase();
                let content_len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if req.len() >= head_end + 4 + content_len {
                    break;
                }
            }
        }

        let res = format!(
            "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        sock.write_all(res.as_bytes()).await.unwrap();
        sock.shutdown().await.ok();
    });

    format!("http://{addr}")
}
