#![allow(dead_code)]

use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};

use saes::request::{CookieJar, Page, Request, Transport};
use saes::{Error, Result};
use url::Url;

pub const BASE: &str = "https://www.saes.escom.ipn.mx/";
pub const HOME: &str = "https://www.saes.escom.ipn.mx/alumnos/default.aspx";
pub const LOGIN_ACTION: &str = "https://www.saes.escom.ipn.mx/Default.aspx?ReturnUrl=%2falumnos%2fdefault.aspx";
pub const CAPTCHA: &str =
    "https://www.saes.escom.ipn.mx/BotDetectCaptcha.ashx?get=image&c=c_default_ctl00_leftcolumn_loginuser_logincaptcha&t=4f1c";
pub const RETRY_CAPTCHA: &str =
    "https://www.saes.escom.ipn.mx/BotDetectCaptcha.ashx?get=image&c=c_default_ctl00_leftcolumn_loginuser_logincaptcha&t=9a7e";
pub const SCHEDULE: &str = "https://www.saes.escom.ipn.mx/Alumnos/Informacion_semestral/Horario_Alumno.aspx";
pub const GRADES: &str = "https://www.saes.escom.ipn.mx/Alumnos/Informacion_semestral/calificaciones_sem.aspx";
pub const KARDEX: &str = "https://www.saes.escom.ipn.mx/Alumnos/boleta/kardex.aspx";

pub const LOGIN_HTML: &str = include_str!("../fixtures/login.html");
pub const LOGIN_REJECTED_HTML: &str = include_str!("../fixtures/login_rejected.html");
pub const HOME_HTML: &str = include_str!("../fixtures/home.html");
pub const GRADES_HTML: &str = include_str!("../fixtures/grades.html");
pub const GRADES_EMPTY_HTML: &str = include_str!("../fixtures/grades_empty.html");
pub const SCHEDULE_HTML: &str = include_str!("../fixtures/schedule.html");
pub const KARDEX_HTML: &str = include_str!("../fixtures/kardex.html");

pub const CAPTCHA_BYTES: &[u8] = b"\xff\xd8\xff\xe0fake-jpeg";

#[derive(Debug, Default)]
struct Script {
    responses: VecDeque<Result<Page>>,
    requests: Vec<Request>,
}

/// Answers requests with pages queued up front, in order, and remembers every request.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, page: Page) -> &Self {
        self.script.lock().unwrap().responses.push_back(Ok(page));
        self
    }

    pub fn fail(&self, err: Error) -> &Self {
        self.script.lock().unwrap().responses.push_back(Err(err));
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.script.lock().unwrap().requests.len()
    }

    pub fn pending(&self) -> usize {
        self.script.lock().unwrap().responses.len()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &Request) -> Result<Page> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(request.clone());
        script
            .responses
            .pop_front()
            .unwrap_or_else(|| panic!("no response scripted for {}", request.url))
    }
}

pub fn page(url: &str, html: &str) -> Page {
    Page {
        url: Url::parse(url).unwrap(),
        status: 200,
        cookies: CookieJar::new(),
        expired_cookies: BTreeSet::new(),
        charset: None,
        body: html.as_bytes().to_vec(),
    }
}

pub fn with_cookies(mut page: Page, cookies: &[(&str, &str)]) -> Page {
    for (name, value) in cookies {
        page.cookies.insert(name.to_string(), value.to_string());
    }
    page
}

pub fn with_expired(mut page: Page, names: &[&str]) -> Page {
    page.expired_cookies.extend(names.iter().map(|name| name.to_string()));
    page
}

/// Re-encodes an HTML page the way older IIS setups serve it.
pub fn latin1(mut page: Page) -> Page {
    let html = String::from_utf8(page.body).unwrap();
    page.body = html.chars().map(|c| u8::try_from(u32::from(c)).unwrap()).collect();
    page.charset = Some("iso-8859-1".into());
    page
}

pub fn with_status(mut page: Page, status: u16) -> Page {
    page.status = status;
    page
}

pub fn image(url: &str) -> Page {
    Page {
        url: Url::parse(url).unwrap(),
        status: 200,
        cookies: CookieJar::new(),
        expired_cookies: BTreeSet::new(),
        charset: None,
        body: CAPTCHA_BYTES.to_vec(),
    }
}

pub fn jar(cookies: &[(&str, &str)]) -> CookieJar {
    cookies.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

/// Queues the login page and a successful postback landing on the home page.
pub fn script_login(transport: &ScriptedTransport) {
    transport
        .respond(with_cookies(page(BASE, LOGIN_HTML), &[("ASP.NET_SessionId", "sess1")]))
        .respond(with_cookies(page(HOME, HOME_HTML), &[(".ASPXFORMSAUTH", "auth1")]));
}
