use std::{env, io};

use chrono::Local;
use saes::{
    info_time,
    process::{spawn_session, Credentials},
    schools, Error, HttpTransport, Result,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

const DEFAULT_CAPTCHA_PATH: &str = "captcha.jpg";

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Local::now();
    let mut args = env::args().skip(1);
    let (Some(campus), Some(user)) = (args.next(), args.next()) else {
        eprintln!("usage: saes <campus> <boleta>\n\ncampuses:");
        for campus in schools::campuses() {
            eprintln!("  {:<10} {}", campus.id, campus.name);
        }
        std::process::exit(2);
    };
    let captcha_path = env::var("SAES_CAPTCHA_PATH").unwrap_or_else(|_| DEFAULT_CAPTCHA_PATH.into());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let password = match env::var("SAES_PASSWORD") {
        Ok(password) => password,
        Err(_) => {
            eprint!("Password: ");
            read_answer(&mut lines, "password").await?
        }
    };

    let mut worker = spawn_session(&campus, Credentials { user, password }, HttpTransport::new)?;
    while let Some(prompt) = worker.prompts.recv().await {
        if let Some(message) = &prompt.rejection {
            eprintln!("SAES turned the login down: {message}");
        }
        tokio::fs::write(&captcha_path, &prompt.image).await?;
        eprint!("[{}] Captcha saved to {captcha_path}, type what it says: ", prompt.attempt);
        let answer = read_answer(&mut lines, "captcha").await?;
        worker.answers.send(answer).await?;
    }

    let report = worker.handle.await??;
    println!("{}", serde_json::to_string_pretty(&report)?);
    info_time!(start_time, "Done");

    Ok(())
}

/// Next line typed by the user, running out of input is an error.
async fn read_answer<R: AsyncBufRead + Unpin>(lines: &mut Lines<R>, what: &str) -> Result<String> {
    let line = lines.next_line().await?;
    line.ok_or_else(|| {
        Error::from(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("stdin closed before the {what} was given"),
        ))
    })
}
