//! Interactive command-line client for Redis-compatible servers
//!
//! Connects to the given server and enters a read-eval-print loop:
//!
//! ```text
//! $ redwire-cli redis://localhost
//! $ redwire-cli redis://secret@redis.internal:16379
//! ```
//!
//! Type `quit` to leave. After `subscribe <channel>`, use `poll` to wait for
//! the next message. Run under `rlwrap` for line editing and history.

use anyhow::Result;
use clap::Parser;
use redwire::{RedisError, RedisProtocol, Value};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Interactive RESP2 client
#[derive(Parser)]
#[command(name = "redwire-cli")]
struct Args {
    /// Connection string, e.g. redis://localhost or redis://secret@host:16379
    connection: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match repl(&args.connection) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

fn repl(connection: &str) -> Result<ExitCode> {
    let mut redis = RedisProtocol::open(connection)?;
    println!("Connecting to {}", redis.endpoint());
    if let Err(error) = redis.connect() {
        eprintln!("{error}");
        return Ok(ExitCode::FAILURE);
    }

    let prompt = format!("\x1b[34;1m{}\x1b[0m> ", redis.endpoint());
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            let _ = redis.send("quit");
            break;
        }
        if input
            .get(..9)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("subscribe"))
        {
            println!("\x1b[32;1mUse `poll` to wait for the next message\x1b[0m");
        }

        let result = if input == "poll" {
            redis.receive(None)
        } else {
            redis.send(input).and_then(|()| redis.receive(None))
        };
        match result {
            Ok(Some(value)) => println!("{}", render(&value)),
            Ok(None) => println!("(nil)"),
            Err(error @ RedisError::Protocol(_)) => eprintln!("{error}"),
            Err(error) => return Err(error.into()),
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Render a reply the way redis-cli does
fn render(value: &Value) -> String {
    match value {
        Value::Simple(text) => text.clone(),
        Value::Integer(number) => format!("(integer) {number}"),
        Value::Bulk(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => format!("\"{text}\""),
            Err(_) => format!("{bytes:?}"),
        },
        Value::Null => "(nil)".to_string(),
        Value::Array(items) => {
            if items.is_empty() {
                "(empty array)".to_string()
            } else {
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| format!("{}) {}", index + 1, render(item)))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
    }
}
