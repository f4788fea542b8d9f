use std::time::Duration;

use chrono::Local;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::document::HtmlDocument;
use crate::models::{GradeEntry, ScheduleEntry, StudentProfile, Transcript};
use crate::parse::{self, selectors, NavLink};
use crate::request::{CookieJar, HttpTransport, Page, Request, Transport};
use crate::{info_time, schools, Error, Result, DEFAULT_TIMEOUT_SECS, HOME_PATH, LOGIN_ACTION_PATH};

/// ASP.NET postback state echoed back verbatim: (form field, id of the element holding it).
const POSTBACK_STATE: [(&str, &str); 5] = [
    ("__EVENTTARGET", "__EVENTTARGET"),
    ("__EVENTARGUMENT", "__EVENTARGUMENT"),
    ("__VIEWSTATE", "__VIEWSTATE"),
    ("__VIEWSTATEGENERATOR", "__VIEWSTATEGENERATOR"),
    ("__EVENTVALIDATION", "__EVENTVALIDATION"),
];
/// Tokens tying the answer to the captcha image that was shown.
const CAPTCHA_STATE: [(&str, &str); 2] = [
    (
        "LBD_VCID_c_default_ctl00_leftcolumn_loginuser_logincaptcha",
        "LBD_VCID_c_default_ctl00_leftcolumn_loginuser_logincaptcha",
    ),
    (
        "LBD_BackWorkaround_c_default_ctl00_leftcolumn_loginuser_logincaptcha",
        "LBD_BackWorkaround_c_default_ctl00_leftcolumn_loginuser_logincaptcha",
    ),
];
const LOGIN_BUTTON: (&str, &str) = ("ctl00$leftColumn$LoginUser$LoginButton", "ctl00_leftColumn_LoginUser_LoginButton");
const USER_FIELD: &str = "ctl00$leftColumn$LoginUser$UserName";
const PASSWORD_FIELD: &str = "ctl00$leftColumn$LoginUser$Password";
const CAPTCHA_FIELD: &str = "ctl00$leftColumn$LoginUser$CaptchaCodeTextBox";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Nothing loaded yet.
    Unauthenticated,
    /// The working document is the login form.
    LoginPageLoaded,
    Authenticated,
    /// The portal bounced an authenticated request back to the login page.
    Expired,
}

/// Result of a login attempt the portal answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Accepted,
    /// Wrong credentials or captcha, with the portal's message.
    Rejected(String),
}

impl LoginOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, LoginOutcome::Accepted)
    }
}

/// One student's browsing session against one campus portal.
///
/// Holds the cookie jar and the working document (the login form before
/// authenticating, the landing page after). Pages fetched for extraction are
/// returned to the caller and never replace the working document.
#[derive(Debug)]
pub struct Session<T: Transport = HttpTransport> {
    transport: T,
    base_url: Url,
    cookies: CookieJar,
    document: Option<HtmlDocument>,
    state: SessionState,
    timeout: Duration,
}

impl Session<HttpTransport> {
    /// Fresh session against the portal of `campus_id`.
    pub fn open(campus_id: &str) -> Result<Self> {
        Self::with_transport(campus_id, HttpTransport::new()?)
    }
}

impl<T: Transport> Session<T> {
    pub fn with_transport(campus_id: &str, transport: T) -> Result<Self> {
        let base_url = Url::parse(schools::resolve(campus_id)?)?;
        Ok(Self::from_base_url(base_url, transport))
    }

    pub fn from_base_url(base_url: Url, transport: T) -> Self {
        Self {
            transport,
            base_url,
            cookies: CookieJar::new(),
            document: None,
            state: SessionState::Unauthenticated,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Timeout used by every request except [`Session::reload`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn document(&self) -> Option<&HtmlDocument> {
        self.document.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Points the session at another campus. Cookies and document only belong
    /// to the portal that issued them, so they are dropped if the url changes.
    pub fn switch_campus(&mut self, campus_id: &str) -> Result<()> {
        let base_url = Url::parse(schools::resolve(campus_id)?)?;
        if base_url != self.base_url {
            self.base_url = base_url;
            self.reset();
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.cookies.clear();
        self.document = None;
        self.state = SessionState::Unauthenticated;
    }

    /// Starts over from the login page with the cookies it hands out.
    pub fn load_login_page(&mut self) -> Result<()> {
        let start = Local::now();
        let page = self
            .transport
            .execute(&Request::get(self.base_url.clone(), &CookieJar::new(), self.timeout))?;
        ensure_success(&page)?;

        let body = page.text();
        self.cookies = page.cookies;
        self.document = Some(HtmlDocument::parse(page.url, &body));
        self.state = SessionState::LoginPageLoaded;
        info_time!(start, "Loaded login page of {}", self.base_url);
        Ok(())
    }

    /// Downloads the captcha shown on the login form.
    pub fn captcha_image(&self) -> Result<Vec<u8>> {
        let doc = self.working()?;
        let src = doc
            .element_by_id(selectors::CAPTCHA_IMAGE)
            .and_then(|img| doc.abs_url(img, "src"))
            .ok_or(Error::CaptchaNotFound)?;

        // Whatever the portal claims the content type is, the body is the image.
        let page = self.transport.execute(&Request::get(src, &self.cookies, self.timeout))?;
        ensure_success(&page)?;
        Ok(page.body)
    }

    /// Posts the login form of the working document.
    ///
    /// A rejection leaves the session on the redisplayed form, which carries
    /// the postback state for the next attempt.
    pub fn login(&mut self, user: &str, password: &str, captcha: &str) -> Result<LoginOutcome> {
        let doc = self.working()?;
        if self.state == SessionState::Authenticated || doc.element_by_id(selectors::LOGOUT_CONTROL).is_some() {
            return Err(Error::FormNotPresent);
        }
        let form = login_form(doc, user, password, captcha)?;

        let action = self.base_url.join(LOGIN_ACTION_PATH)?;
        let page = self
            .transport
            .execute(&Request::post_form(action, form, &self.cookies, self.timeout))?;
        ensure_success(&page)?;

        let body = page.text();
        let document = HtmlDocument::parse(page.url.clone(), &body);
        let rejection = document.text_of(selectors::LOGIN_ERROR)?;
        self.document = Some(document);

        match rejection {
            None => {
                page.apply_cookies(&mut self.cookies);
                self.state = SessionState::Authenticated;
                info_time!("Logged in to {}", self.base_url);
                Ok(LoginOutcome::Accepted)
            }
            Some(message) => {
                info_time!("Login rejected: {}", message);
                Ok(LoginOutcome::Rejected(message))
            }
        }
    }

    /// Fetches the landing page again, refreshing the working document.
    pub fn reload(&mut self, timeout: Duration) -> Result<()> {
        let home = self.base_url.join(HOME_PATH)?;
        let page = self.authenticated_get(home, timeout, false)?;
        let body = page.text();
        self.document = Some(HtmlDocument::parse(page.url, &body));
        Ok(())
    }

    pub fn reload_default(&mut self) -> Result<()> {
        self.reload(self.timeout)
    }

    /// Follows a navigation menu entry of the working document and returns the page behind it.
    pub fn fetch_page(&mut self, link: NavLink) -> Result<HtmlDocument> {
        let start = Local::now();
        require_authenticated(self.state)?;
        let url = parse::nav_link(self.working()?, link)?;
        let page = self.authenticated_get(url, self.timeout, link.tolerates_error_status())?;
        let body = page.text();
        info_time!(start, "Fetched the {} page", link.label());
        Ok(HtmlDocument::parse(page.url, &body))
    }

    pub fn student_profile(&mut self) -> Result<StudentProfile> {
        parse::student_profile(&self.fetch_page(NavLink::Kardex)?)
    }

    pub fn schedule(&mut self) -> Result<Vec<ScheduleEntry>> {
        parse::schedule(&self.fetch_page(NavLink::Schedule)?)
    }

    pub fn grades(&mut self) -> Result<Vec<GradeEntry>> {
        parse::grades(&self.fetch_page(NavLink::Grades)?)
    }

    pub fn transcript(&mut self) -> Result<Transcript> {
        parse::transcript(&self.fetch_page(NavLink::Kardex)?)
    }

    fn working(&self) -> Result<&HtmlDocument> {
        self.document.as_ref().ok_or(Error::DocumentNotLoaded)
    }

    /// GET with the session cookies. Landing anywhere but `url` means the portal
    /// sent us back to the login page; the session is then marked expired and
    /// nothing else about it changes.
    fn authenticated_get(&mut self, url: Url, timeout: Duration, allow_error_status: bool) -> Result<Page> {
        require_authenticated(self.state)?;
        let page = self.transport.execute(&Request::get(url.clone(), &self.cookies, timeout))?;
        if page.url != url {
            info_time!("Session expired, {} redirected to {}", url, page.url);
            self.state = SessionState::Expired;
            return Err(Error::SessionExpired);
        }
        if !allow_error_status {
            ensure_success(&page)?;
        }
        page.apply_cookies(&mut self.cookies);
        Ok(page)
    }

    /// Everything needed to pick the session up again later.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            base_url: self.base_url.to_string(),
            cookies: self.cookies.clone(),
            state: self.state,
            document: self.document.as_ref().map(|doc| DocumentSnapshot {
                url: doc.url().to_string(),
                html: doc.html(),
            }),
        }
    }

    pub fn restore(snapshot: SessionSnapshot, transport: T) -> Result<Self> {
        let document = match snapshot.document {
            Some(doc) => Some(HtmlDocument::parse(Url::parse(&doc.url)?, &doc.html)),
            None => None,
        };
        let mut session = Self::from_base_url(Url::parse(&snapshot.base_url)?, transport);
        session.cookies = snapshot.cookies;
        session.document = document;
        session.state = snapshot.state;
        Ok(session)
    }
}

fn require_authenticated(state: SessionState) -> Result<()> {
    match state {
        SessionState::Authenticated => Ok(()),
        SessionState::Expired => Err(Error::SessionExpired),
        SessionState::Unauthenticated | SessionState::LoginPageLoaded => Err(Error::NotAuthenticated),
    }
}

fn ensure_success(page: &Page) -> Result<()> {
    if page.is_success() {
        Ok(())
    } else {
        Err(Error::HttpStatus {
            status: page.status,
            url: page.url.to_string(),
        })
    }
}

/// Login postback body, in the order the portal's own form submits it.
fn login_form(doc: &HtmlDocument, user: &str, password: &str, captcha: &str) -> Result<Vec<(String, String)>> {
    let hidden = |(field, id): (&'static str, &str)| -> Result<(String, String)> {
        let element = doc.element_by_id(id).ok_or(Error::MissingFormField(field))?;
        let value = element.value().attr("value").unwrap_or_default();
        Ok((field.to_string(), value.to_string()))
    };

    let mut form = Vec::with_capacity(11);
    for token in POSTBACK_STATE {
        form.push(hidden(token)?);
    }
    form.push((USER_FIELD.to_string(), user.to_string()));
    form.push((PASSWORD_FIELD.to_string(), password.to_string()));
    form.push((CAPTCHA_FIELD.to_string(), captcha.to_string()));
    for token in CAPTCHA_STATE {
        form.push(hidden(token)?);
    }
    form.push(hidden(LOGIN_BUTTON)?);
    Ok(form)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub url: String,
    pub html: String,
}

/// Serializable copy of a session. The crate never stores it anywhere itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub base_url: String,
    pub cookies: CookieJar,
    pub state: SessionState,
    pub document: Option<DocumentSnapshot>,
}

impl SessionSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
