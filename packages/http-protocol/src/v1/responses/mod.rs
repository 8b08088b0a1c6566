//! Responses of the tracker.
//!
//! Every response is sent with status `200 OK`. Failures are bencoded bodies
//! with a `failure reason` key, see [`error`].
pub mod announce;
pub mod error;
pub mod scrape;

pub const SERVER: &str = "swarm-tracker";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Plain,
    Html,
}

impl ContentType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "text/plain",
            Self::Html => "text/html",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub body: Vec<u8>,
    pub content_type: ContentType,
    pub keep_alive: bool,
}

impl Response {
    /// A `text/plain` response. Bencoded bodies are sent as plain text too.
    #[must_use]
    pub fn plain(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            content_type: ContentType::Plain,
            keep_alive: false,
        }
    }

    /// A `text/html` page. Robots are asked not to index it.
    #[must_use]
    pub fn html(body: &str) -> Self {
        Self {
            body: format!("<html><head><meta name=\"robots\" content=\"noindex, nofollow\" /></head><body>{body}</body></html>")
                .into_bytes(),
            content_type: ContentType::Html,
            keep_alive: false,
        }
    }

    /// The page browsers get.
    #[must_use]
    pub fn banner() -> Self {
        Self::html("Tracker is running")
    }

    #[must_use]
    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// The whole response: head and body.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 200 OK\r\nServer: {SERVER}\r\nContent-Type: {}\r\nContent-Length: {}\r\n",
            self.content_type.as_str(),
            self.body.len()
        );

        if !self.keep_alive {
            head.push_str("Connection: Close\r\n");
        }

        head.push_str("\r\n");

        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}
