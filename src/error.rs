use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::process::CaptchaPrompt;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    // -- Transport
    #[error("Connection Error: {0}")]
    Connection(#[source] reqwest::Error),
    #[error("Request timed out after {timeout:?}: {source}")]
    Timeout {
        timeout: Duration,
        #[source]
        source: reqwest::Error,
    },
    #[error("The portal answered {url} with HTTP {status}")]
    HttpStatus { status: u16, url: String },
    #[error("Gave up after {0} redirects")]
    TooManyRedirects(usize),

    // -- Configuration
    #[error("There is no SAES portal for campus: {0}")]
    UnknownCampus(String),
    #[error("Invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // -- Markup drift
    #[error("The captcha image is missing from the login page.")]
    CaptchaNotFound,
    #[error("The navigation menu has no link to the {0} page.")]
    NavigationLinkNotFound(&'static str),
    #[error("The login form is missing the {0} field.")]
    MissingFormField(&'static str),
    #[error("The page layout changed, couldn't find: {0}")]
    MalformedPage(String),
    #[error("The selector you are trying to scrape for is invalid. Selector: {0}")]
    InvalidSelector(String),

    // -- Session state
    #[error("The login form is not present, the session is already authenticated.")]
    FormNotPresent,
    #[error("No page has been loaded yet, load the login page first.")]
    DocumentNotLoaded,
    #[error("The session is not authenticated.")]
    NotAuthenticated,
    #[error("The session has expired, log in again.")]
    SessionExpired,
    #[error("Login rejected {attempts} times, last message: {message}")]
    LoginAttemptsExhausted { attempts: usize, message: String },

    // -- Runtime
    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),
    #[error("Couldn't send a message through a channel.")]
    RuntimeSendError,
    #[error("The other side of the channel hung up.")]
    RuntimeChannelClosed,
}

impl Error {
    /// Transport failures the caller may retry as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Connection(_) | Error::Timeout { .. } | Error::HttpStatus { .. }
        )
    }

    /// The portal's markup no longer matches what the extractors expect.
    pub fn is_markup_drift(&self) -> bool {
        matches!(
            self,
            Error::CaptchaNotFound
                | Error::NavigationLinkNotFound(_)
                | Error::MissingFormField(_)
                | Error::MalformedPage(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::Connection(value)
    }
}

impl From<mpsc::error::SendError<CaptchaPrompt>> for Error {
    fn from(_value: mpsc::error::SendError<CaptchaPrompt>) -> Self {
        Error::RuntimeSendError
    }
}

impl From<mpsc::error::SendError<String>> for Error {
    fn from(_value: mpsc::error::SendError<String>) -> Self {
        Error::RuntimeSendError
    }
}
