//! RuX REST API client

use std::sync::Arc;

use derivative::Derivative;
use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use rux_session::{SessionCache, StoreError};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error, warn};

mod auth;
mod posts;
mod users;


pub use posts::PostQuery;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication rejected: {message}")]
    Unauthorized { message: String },
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Response carries no token")]
    MissingToken,
    #[error("Not signed in")]
    NotSignedIn,
    #[error("No signup waiting for verification")]
    MissingPendingEmail,
    #[error("Cannot reach the API")]
    Transport(#[from] reqwest::Error),
    #[error("Cannot persist session")]
    Session(#[from] StoreError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Notification that the server rejected the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLost {
    /// Path of the request which was rejected
    pub path: String,
}

type Listener = Arc<dyn Fn(&SessionLost) + Send + Sync>;

/// Body of error responses
///
/// Backend is not consistent about it, so anything with a `message` or `error` is accepted.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    /// Extracts the most relevant message from the response body
    async fn message(response: Response) -> String {
        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        body.message
            .or(body.error)
            .unwrap_or(text)
            .trim()
            .to_owned()
    }
}

#[derive(Derivative)]
#[derivative(Debug)]
struct ClientInner {
    /// HTTP client
    http: reqwest::Client,
    /// Base address, without trailing slash
    base_url: String,
    /// Current user session
    session: Arc<SessionCache>,
    /// Callbacks run when server rejects the session
    #[derivative(Debug = "ignore")]
    listeners: RwLock<Vec<Listener>>,
}

/// Handle to the remote API
///
/// Every request carries the persisted bearer token if there is one. Any `401 Unauthorized`
/// answer closes the session: the token is removed, the claims cache is dropped and the
/// registered [`SessionLost`] listeners are notified. The reason given by the server is kept in
/// [`Error::Unauthorized`].
#[derive(Debug, Clone)]
pub struct Client(Arc<ClientInner>);

impl Client {
    /// Creates client for the API hosted at `base_url`
    pub fn new(base_url: impl Into<String>, session: Arc<SessionCache>) -> Self {
        let base_url: String = base_url.into();
        Self(Arc::new(ClientInner {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            session,
            listeners: RwLock::new(Vec::new()),
        }))
    }

    /// Access to the session
    pub fn session(&self) -> &SessionCache {
        &self.0.session
    }

    /// Registers callback run every time the server rejects the session
    pub fn on_session_lost(&self, listener: impl Fn(&SessionLost) + Send + Sync + 'static) {
        self.0.listeners.write().push(Arc::new(listener));
    }

    /// Prepares request to the API path with bearer token attached
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.0.base_url);
        let request = self.0.http.request(method, url);

        match self.0.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends the request, turning non-success statuses into errors
    async fn send(&self, path: &str, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!(path, %status, "API response");

        if status == StatusCode::UNAUTHORIZED {
            let message = ErrorBody::message(response).await;
            warn!(path, %message, "Session rejected");
            self.session_lost(path);
            return Err(Error::Unauthorized { message });
        }

        if !status.is_success() {
            let message = ErrorBody::message(response).await;
            warn!(path, %status, %message, "API request failed");
            return Err(Error::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    /// Sends the request and decodes JSON answer
    async fn send_json<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> Result<T> {
        let response = self.send(path, request).await?;
        response.json().await.map_err(Into::into)
    }

    /// Sends the request and returns the plain text answer
    async fn send_text(&self, path: &str, request: RequestBuilder) -> Result<String> {
        let response = self.send(path, request).await?;
        response.text().await.map_err(Into::into)
    }

    /// Tears the session down after the server rejected it
    fn session_lost(&self, path: &str) {
        if let Err(err) = self.0.session.sign_out() {
            error!(error = %err, "Cannot remove rejected session token");
        }

        let event = SessionLost {
            path: path.to_owned(),
        };
        // Listeners may register further listeners, so they run without the lock held
        let listeners = self.0.listeners.read().clone();
        for listener in listeners {
            listener(&event);
        }
    }
}
