//! Parser for raw tracker requests.
//!
//! Only `GET` requests with the passkey in the path are served. The parser
//! walks the request once through the stages of a [`Stage`] state machine:
//!
//! ```text
//! GET /<passkey: 32 bytes>/<action>?<query> HTTP/<version>\r\n
//! <name>: <value>\r\n
//! ...
//! ```
//!
//! A request without query string is answered with the banner page.
use std::collections::HashMap;

use thiserror::Error;

use super::query::Query;

/// Requests shorter than this can't carry a passkey and an action.
pub const MIN_REQUEST_LENGTH: usize = 60;

pub const PASSKEY_LENGTH: usize = 32;

const PREFIX: &[u8] = b"GET /";
const PASSKEY_START: usize = PREFIX.len();
const PASSKEY_END: usize = PASSKEY_START + PASSKEY_LENGTH;

/// The action is chosen by the first letter of the path segment after the
/// passkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Announce,
    Scrape,
    Update,
    Report,
    Invalid,
}

impl Action {
    fn from_first_letter(letter: u8) -> Self {
        match letter {
            b'a' => Self::Announce,
            b's' => Self::Scrape,
            b'u' => Self::Update,
            b'r' => Self::Report,
            _ => Self::Invalid,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub passkey: String,
    pub action: Action,
    pub query: Query,
    /// The version after `HTTP/`, for example `1.1`.
    pub http_version: String,
    /// Header names are lowercase.
    pub headers: HashMap<String, String>,
}

impl Request {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Whether the connection stays open after the response.
    ///
    /// An explicit `Connection` header decides. Without it `HTTP/1.0`
    /// closes and newer versions keep the connection.
    #[must_use]
    pub fn keep_alive(&self, keepalive_enabled: bool) -> bool {
        if !keepalive_enabled {
            return false;
        }

        match self.header("connection") {
            Some(connection) => connection.eq_ignore_ascii_case("keep-alive"),
            None => self.http_version != "1.0",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedRequest {
    Tracker(Request),
    /// The request has no query string.
    Banner,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseRequestError {
    #[error("GET string too short")]
    TooShort,

    #[error("Malformed announce")]
    MalformedAnnounce,

    #[error("Malformed HTTP request")]
    MalformedHttpRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Prefix,
    Passkey,
    Action,
    Query,
    Version,
    Headers,
    Banner,
    Done,
}

/// Parses a raw request.
///
/// # Errors
///
/// - [`ParseRequestError::TooShort`] when the request is shorter than
///   [`MIN_REQUEST_LENGTH`].
/// - [`ParseRequestError::MalformedAnnounce`] when it's not a `GET` or the
///   passkey is not followed by `/`.
/// - [`ParseRequestError::MalformedHttpRequest`] when the query is not
///   followed by the HTTP version.
pub fn parse(raw_request: &[u8]) -> Result<ParsedRequest, ParseRequestError> {
    let mut parser = Parser::new(raw_request);
    let mut stage = Stage::Prefix;

    loop {
        stage = match stage {
            Stage::Prefix => parser.prefix()?,
            Stage::Passkey => parser.passkey()?,
            Stage::Action => parser.action(),
            Stage::Query => parser.query(),
            Stage::Version => parser.version()?,
            Stage::Headers => parser.headers(),
            Stage::Banner => return Ok(ParsedRequest::Banner),
            Stage::Done => return Ok(ParsedRequest::Tracker(parser.request)),
        };
    }
}

struct Parser<'a> {
    input: &'a [u8],
    position: usize,
    request: Request,
}

impl<'a> Parser<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            position: 0,
            request: Request {
                passkey: String::new(),
                action: Action::Invalid,
                query: Query::default(),
                http_version: String::new(),
                headers: HashMap::new(),
            },
        }
    }

    fn prefix(&mut self) -> Result<Stage, ParseRequestError> {
        if self.input.len() < MIN_REQUEST_LENGTH {
            return Err(ParseRequestError::TooShort);
        }

        if !self.input.starts_with(PREFIX) {
            return Err(ParseRequestError::MalformedAnnounce);
        }

        self.position = PASSKEY_START;

        Ok(Stage::Passkey)
    }

    fn passkey(&mut self) -> Result<Stage, ParseRequestError> {
        if self.input[PASSKEY_END] != b'/' {
            return Err(ParseRequestError::MalformedAnnounce);
        }

        self.request.passkey = String::from_utf8_lossy(&self.input[PASSKEY_START..PASSKEY_END]).into_owned();
        self.position = PASSKEY_END + 1;

        Ok(Stage::Action)
    }

    fn action(&mut self) -> Stage {
        self.request.action = Action::from_first_letter(self.input[self.position]);

        while self.position < self.input.len() && !matches!(self.input[self.position], b'?' | b' ') {
            self.position += 1;
        }

        if self.input.get(self.position) == Some(&b'?') {
            self.position += 1;
            Stage::Query
        } else {
            Stage::Banner
        }
    }

    fn query(&mut self) -> Stage {
        let rest = &self.input[self.position..];
        let end = rest.iter().position(|byte| *byte == b' ').unwrap_or(rest.len());

        self.request.query = Query::from_bytes(&rest[..end]);
        self.position = (self.position + end + 1).min(self.input.len());

        Stage::Version
    }

    fn version(&mut self) -> Result<Stage, ParseRequestError> {
        let rest = &self.input[self.position..];

        if !rest.starts_with(b"HTTP/") {
            return Err(ParseRequestError::MalformedHttpRequest);
        }

        let version = &rest[5..];
        let end = version
            .iter()
            .position(|byte| matches!(byte, b'\r' | b'\n'))
            .unwrap_or(version.len());

        self.request.http_version = String::from_utf8_lossy(&version[..end]).trim().to_string();
        self.position += 5 + end;

        Ok(Stage::Headers)
    }

    fn headers(&mut self) -> Stage {
        // The first line is what is left of the request line.
        let lines = self.input[self.position..].split(|byte| *byte == b'\n').skip(1);

        for line in lines {
            let line = line.trim_ascii();

            if line.is_empty() {
                break;
            }

            let Some(colon) = line.iter().position(|byte| *byte == b':') else {
                continue;
            };

            let name = String::from_utf8_lossy(line[..colon].trim_ascii()).to_ascii_lowercase();
            let value = String::from_utf8_lossy(line[colon + 1..].trim_ascii()).into_owned();

            self.request.headers.insert(name, value);
        }

        self.position = self.input.len();

        Stage::Done
    }
}
