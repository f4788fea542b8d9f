//! Scraping client for SAES, the IPN student records portal.
//!
//! A [`Session`] is opened per campus, walks the portal's ASP.NET login
//! postback and then pulls the student's profile, schedule, grades and
//! kardex out of the authenticated pages.

mod document;
mod error;
#[doc(hidden)]
pub mod macros;
pub mod models;
mod parse;
pub mod process;
pub mod request;
pub mod schools;
pub mod session;

pub use document::HtmlDocument;
pub use error::{Error, Result};
pub use models::{GradeEntry, ScheduleEntry, StudentProfile, Transcript, TranscriptEntry, TranscriptLevel};
pub use parse::{capitalize, NavLink};
pub use request::{HttpTransport, Transport};
pub use session::{LoginOutcome, Session, SessionSnapshot, SessionState};

/// Sent with every request, the portal turns away clients it doesn't recognise.
pub const USER_AGENT: &str = "Chrome/81.0.4044.138";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
/// Landing page of an authenticated student, relative to the campus url.
pub const HOME_PATH: &str = "alumnos/default.aspx";
/// Target of the login postback, relative to the campus url.
pub const LOGIN_ACTION_PATH: &str = "Default.aspx?ReturnUrl=%2falumnos%2fdefault.aspx";
const MAX_REDIRECTS: usize = 10;
pub const MAX_LOGIN_ATTEMPTS: usize = 3;
