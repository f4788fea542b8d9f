//! Runs a blocking [`Session`] on its own thread and talks to it over channels,
//! so an async front end can show captchas and collect answers meanwhile.

use chrono::Local;
use serde::Serialize;
use tokio::{
    sync::mpsc,
    task::{spawn_blocking, JoinHandle},
};
use url::Url;

use crate::models::{GradeEntry, ScheduleEntry, StudentProfile, Transcript};
use crate::request::Transport;
use crate::session::{LoginOutcome, Session};
use crate::{info_time, schools, Error, Result, MAX_LOGIN_ATTEMPTS};

#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

/// Sent by the worker every time it needs a captcha solved.
#[derive(Debug, Clone)]
pub struct CaptchaPrompt {
    pub image: Vec<u8>,
    /// Starts at 1.
    pub attempt: usize,
    /// Why the previous attempt was turned down.
    pub rejection: Option<String>,
}

/// Everything the portal knows about the student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub profile: StudentProfile,
    pub schedule: Vec<ScheduleEntry>,
    pub grades: Vec<GradeEntry>,
    pub transcript: Transcript,
}

/// Handle to a running session worker.
/// The `prompts` channel closes once the worker is done; then await `handle`.
pub struct SessionWorker {
    pub prompts: mpsc::Receiver<CaptchaPrompt>,
    pub answers: mpsc::Sender<String>,
    pub handle: JoinHandle<Result<Report>>,
}

/// Spawns the worker on tokio's blocking pool, must be called from within a runtime.
/// The transport is built by `connect` on the worker thread, blocking clients
/// must not live on the async side.
pub fn spawn_session<T, F>(campus_id: &str, credentials: Credentials, connect: F) -> Result<SessionWorker>
where
    T: Transport + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let base_url = Url::parse(schools::resolve(campus_id)?)?;
    let (prompt_tx, prompt_rx) = mpsc::channel(1);
    let (answer_tx, answer_rx) = mpsc::channel(1);

    let handle = spawn_blocking(move || {
        let session = Session::from_base_url(base_url, connect()?);
        run_session(session, credentials, prompt_tx, answer_rx)
    });

    Ok(SessionWorker {
        prompts: prompt_rx,
        answers: answer_tx,
        handle,
    })
}

/// Logs in, asking for a captcha answer per attempt, and collects the report.
fn run_session<T: Transport>(
    mut session: Session<T>,
    credentials: Credentials,
    prompts: mpsc::Sender<CaptchaPrompt>,
    mut answers: mpsc::Receiver<String>,
) -> Result<Report> {
    let start_time = Local::now();
    session.load_login_page()?;

    let mut rejection: Option<String> = None;
    for attempt in 1..=MAX_LOGIN_ATTEMPTS {
        let image = match session.captcha_image() {
            // The redisplayed form may come without a captcha, start over then.
            Err(Error::CaptchaNotFound) if attempt > 1 => {
                session.load_login_page()?;
                session.captcha_image()?
            }
            other => other?,
        };
        prompts.blocking_send(CaptchaPrompt {
            image,
            attempt,
            rejection: rejection.take(),
        })?;
        let answer = answers.blocking_recv().ok_or(Error::RuntimeChannelClosed)?;

        match session.login(&credentials.user, &credentials.password, answer.trim())? {
            LoginOutcome::Accepted => {
                let report = collect_report(&mut session)?;
                info_time!(start_time, "Collected the report of {}", report.profile.id_number);
                return Ok(report);
            }
            LoginOutcome::Rejected(message) => rejection = Some(message),
        }
    }

    Err(Error::LoginAttemptsExhausted {
        attempts: MAX_LOGIN_ATTEMPTS,
        message: rejection.unwrap_or_default(),
    })
}

fn collect_report<T: Transport>(session: &mut Session<T>) -> Result<Report> {
    Ok(Report {
        profile: session.student_profile()?,
        schedule: session.schedule()?,
        grades: session.grades()?,
        transcript: session.transcript()?,
    })
}
