//! Manual test client: posts a sample batch to a running service and prints
//! the status code plus the first lines of the response.
//!
//! Usage: `addrgroup-client [URL]` (default `http://localhost:8080/`, or
//! `ADDRGROUP_URL` when set).

use std::process::ExitCode;
use std::time::Duration;

use addrgroup_service::logging::{self, Component, LogLevel};
use addrgroup_service::model::ParseRequest;

const DEFAULT_URL: &str = "http://localhost:8080/";
const MAX_PRINTED_LINES: usize = 5;

fn sample_request() -> ParseRequest {
    ParseRequest::parse_address([
        "John Daggett, 341 King Road, Plymouth MA",
        "John Daggett, 341 King Road, Plymouth MA",
        "Anthony Daggett, 341 King Road, Plymouth MA",
        "Alice Ford, 22 East Broadway, Richmond VA",
        "Terry Kalkas, 402 Lans Road, Beaver Falls PA",
        " Eric Adams, 20 Post Road, Sudbury MA",
        "Sal Carpenter, 73 6th Street, Boston MA",
    ])
}

fn run(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let body = serde_json::to_string_pretty(&sample_request())?;
    let response = client
        .post(url)
        .header("Content-Type", "application/json")
        .body(body)
        .send()?;

    println!("{}", response.status().as_u16());
    let text = response.text()?;
    for line in text.lines().take(MAX_PRINTED_LINES) {
        println!("{}", line);
    }
    Ok(())
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    logging::init_logger(LogLevel::Warning, None, false);

    let url = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("ADDRGROUP_URL").ok())
        .unwrap_or_else(|| DEFAULT_URL.to_string());

    match run(&url) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logging::error(Component::Client, Some(&url), &format!("request failed: {}", e));
            ExitCode::FAILURE
        }
    }
}
