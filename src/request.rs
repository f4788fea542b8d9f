//! The session's only way out to the network.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, SystemTime};

use encoding_rs::{Encoding, UTF_8};
use reqwest::blocking::{Client, ClientBuilder};
use reqwest::cookie::Cookie;
use reqwest::header::{CONTENT_TYPE, COOKIE, LOCATION};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use url::Url;

use crate::{Error, Result, MAX_REDIRECTS, USER_AGENT};

/// Cookies by name, kept in memory only.
pub type CookieJar = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    /// Urlencoded form fields, only sent with `Post`.
    pub form: Vec<(String, String)>,
    pub cookies: CookieJar,
    pub timeout: Duration,
}

impl Request {
    pub fn get(url: Url, cookies: &CookieJar, timeout: Duration) -> Self {
        Self {
            method: Method::Get,
            url,
            form: Vec::new(),
            cookies: cookies.clone(),
            timeout,
        }
    }

    pub fn post_form(url: Url, form: Vec<(String, String)>, cookies: &CookieJar, timeout: Duration) -> Self {
        Self {
            method: Method::Post,
            url,
            form,
            cookies: cookies.clone(),
            timeout,
        }
    }
}

/// A fully read response, after every redirect was followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Where the request finally landed.
    pub url: Url,
    pub status: u16,
    /// Every cookie set along the way, later ones winning.
    pub cookies: CookieJar,
    /// Cookies the server told us to drop, either expired or emptied.
    pub expired_cookies: BTreeSet<String>,
    /// From `Content-Type`, UTF-8 when absent or unknown.
    pub charset: Option<String>,
    pub body: Vec<u8>,
}

impl Page {
    /// Body decoded with the charset the server announced.
    pub fn text(&self) -> String {
        let encoding = self
            .charset
            .as_deref()
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8);
        let (text, _, _) = encoding.decode(&self.body);
        text.into_owned()
    }

    /// Brings `jar` up to date with what this response set and expired.
    pub fn apply_cookies(&self, jar: &mut CookieJar) {
        for name in &self.expired_cookies {
            jar.remove(name);
        }
        jar.extend(self.cookies.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs one logical request, following redirects itself and reading the whole body.
pub trait Transport {
    fn execute(&self, request: &Request) -> Result<Page>;
}

/// Blocking `reqwest` transport.
///
/// Redirects are followed by hand: ASP.NET issues the auth cookie on the 302
/// that ends the login postback, and the next hop must already carry it.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = client_builder().build()?;
        Ok(Self { client })
    }

    fn send(&self, method: Method, url: &Url, form: &[(String, String)], cookies: &CookieJar, timeout: Duration) -> Result<reqwest::blocking::Response> {
        let builder = match method {
            Method::Get => self.client.get(url.clone()),
            Method::Post => self.client.post(url.clone()).form(form),
        };
        let builder = builder.timeout(timeout);
        let builder = match cookie_header(cookies) {
            Some(header) => builder.header(COOKIE, header),
            None => builder,
        };
        builder.send().map_err(|e| classify(e, timeout))
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &Request) -> Result<Page> {
        let mut method = request.method;
        let mut url = request.url.clone();
        let mut jar = request.cookies.clone();
        let mut issued = CookieJar::new();
        let mut expired = BTreeSet::new();

        for _ in 0..=MAX_REDIRECTS {
            let res = self.send(method, &url, &request.form, &jar, request.timeout)?;
            for cookie in res.cookies() {
                let name = cookie.name().to_string();
                if is_removal(&cookie) {
                    jar.remove(&name);
                    issued.remove(&name);
                    expired.insert(name);
                } else {
                    jar.insert(name.clone(), cookie.value().to_string());
                    issued.insert(name.clone(), cookie.value().to_string());
                    expired.remove(&name);
                }
            }

            let status = res.status();
            if let Some(next) = redirect_target(&url, status, res.headers().get(LOCATION).and_then(|v| v.to_str().ok())) {
                method = redirect_method(method, status);
                url = next;
                continue;
            }

            let charset = res
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .and_then(charset_of);
            let body = res.bytes().map_err(|e| classify(e, request.timeout))?.to_vec();
            return Ok(Page {
                url,
                status: status.as_u16(),
                cookies: issued,
                expired_cookies: expired,
                charset,
                body,
            });
        }
        Err(Error::TooManyRedirects(MAX_REDIRECTS))
    }
}

fn client_builder() -> ClientBuilder {
    Client::builder().user_agent(USER_AGENT).redirect(Policy::none())
}

fn classify(err: reqwest::Error, timeout: Duration) -> Error {
    if err.is_timeout() {
        Error::Timeout { timeout, source: err }
    } else {
        Error::Connection(err)
    }
}

/// ASP.NET signs a user out by re-issuing the cookie empty with a past expiry.
fn is_removal(cookie: &Cookie<'_>) -> bool {
    cookie.value().is_empty()
        || cookie.max_age() == Some(Duration::ZERO)
        || cookie.expires().is_some_and(|at| at <= SystemTime::now())
}

/// The `charset` parameter of a `Content-Type` value.
fn charset_of(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

/// `Cookie` header value for the jar, `None` when empty.
pub fn cookie_header(cookies: &CookieJar) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    let pairs: Vec<_> = cookies.iter().map(|(name, value)| format!("{name}={value}")).collect();
    Some(pairs.join("; "))
}

/// Where a redirect response points to, resolved against the url that produced it.
fn redirect_target(current: &Url, status: StatusCode, location: Option<&str>) -> Option<Url> {
    if !status.is_redirection() || status == StatusCode::NOT_MODIFIED {
        return None;
    }
    current.join(location?).ok()
}

/// 307 and 308 replay the request as is, every other redirect turns into a GET.
fn redirect_method(method: Method, status: StatusCode) -> Method {
    match status {
        StatusCode::TEMPORARY_REDIRECT | StatusCode::PERMANENT_REDIRECT => method,
        _ => Method::Get,
    }
}
