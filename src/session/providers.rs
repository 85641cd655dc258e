//! Concrete session sources.

use std::future::Future;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::COOKIE;
use serde_json::Value;

use crate::config::SessionConfig;
use crate::session::source::{SessionError, SessionSource};

/// Blank strings count as "no token".
fn non_blank(token: &str) -> Option<String> {
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Always returns the same token.
#[derive(Debug, Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl SessionSource for StaticToken {
    fn session_token(&self) -> impl Future<Output = Result<Option<String>, SessionError>> + Send {
        let token = non_blank(&self.token);
        async move { Ok(token) }
    }
}

/// Reads the token from an environment variable on every lookup.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl SessionSource for EnvToken {
    fn session_token(&self) -> impl Future<Output = Result<Option<String>, SessionError>> + Send {
        let result = match std::env::var(&self.var) {
            Ok(value) => Ok(non_blank(&value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(SessionError::Decode(format!(
                "environment variable {} is not valid UTF-8",
                self.var
            ))),
        };
        async move { result }
    }
}

/// Reads the token from a file on every lookup. A missing file means no
/// session.
#[derive(Debug, Clone)]
pub struct FileToken {
    path: PathBuf,
}

impl FileToken {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionSource for FileToken {
    fn session_token(&self) -> impl Future<Output = Result<Option<String>, SessionError>> + Send {
        let path = self.path.clone();
        async move {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => Ok(non_blank(&content)),
                Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
                Err(e) => Err(SessionError::Io(e)),
            }
        }
    }
}

/// Asks a session endpoint (e.g. `/api/auth/session`) for the current
/// session and pulls the bearer token out of its JSON body.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: reqwest::Client,
    url: String,
    cookie: Option<String>,
    token_field: String,
}

impl HttpSession {
    pub fn new(
        url: impl Into<String>,
        cookie: Option<String>,
        token_field: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            cookie,
            token_field: token_field.into(),
        })
    }

    async fn lookup(&self) -> Result<Option<String>, SessionError> {
        let mut request = self.client.get(&self.url);
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SessionError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SessionError::Decode(e.to_string()))?;
        Ok(extract_token(&body, &self.token_field))
    }
}

/// Token field of a session payload. `null`, `{}` and blank values mean no
/// session.
pub fn extract_token(body: &Value, field: &str) -> Option<String> {
    body.get(field).and_then(Value::as_str).and_then(non_blank)
}

impl SessionSource for HttpSession {
    fn session_token(&self) -> impl Future<Output = Result<Option<String>, SessionError>> + Send {
        self.lookup()
    }
}

/// A session source chosen by configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredSession {
    Static(StaticToken),
    Env(EnvToken),
    File(FileToken),
    Http(HttpSession),
}

impl ConfiguredSession {
    /// Build the source described by `config`. HTTP lookups share the API
    /// request timeout.
    pub fn from_config(config: &SessionConfig, timeout: Duration) -> Result<Self, SessionError> {
        let session = match config {
            SessionConfig::Static { token } => Self::Static(StaticToken::new(token.clone())),
            SessionConfig::Env { var } => Self::Env(EnvToken::new(var.clone())),
            SessionConfig::File { path } => Self::File(FileToken::new(path)),
            SessionConfig::Http { url, cookie, token_field } => Self::Http(HttpSession::new(
                url.clone(),
                cookie.clone(),
                token_field.clone(),
                timeout,
            )?),
        };
        Ok(session)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Static(_) => "static",
            Self::Env(_) => "env",
            Self::File(_) => "file",
            Self::Http(_) => "http",
        }
    }
}

impl SessionSource for ConfiguredSession {
    fn session_token(&self) -> impl Future<Output = Result<Option<String>, SessionError>> + Send {
        async move {
            match self {
                Self::Static(source) => source.session_token().await,
                Self::Env(source) => source.session_token().await,
                Self::File(source) => source.session_token().await,
                Self::Http(source) => source.session_token().await,
            }
        }
    }
}
