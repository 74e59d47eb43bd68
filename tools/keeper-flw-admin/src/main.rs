// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Keeper four letter word CLI
//!
//! Sends admin words to a Keeper listener and prints the replies.
//!
//! # Usage
//!
//! ```bash
//! # Liveness probe
//! keeper-flw-admin ruok
//!
//! # Several words, one connection each
//! keeper-flw-admin --host 10.0.0.5 mntr srvr
//!
//! # Key/value reports as a table or JSON
//! keeper-flw-admin --format table mntr
//! keeper-flw-admin --format json conf
//!
//! # Watch mode (continuous updates)
//! keeper-flw-admin --interval 1 mntr
//! ```

use clap::{Parser, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use tabled::{Table, Tabled};

/// Keeper four letter word CLI
#[derive(Parser, Debug)]
#[command(name = "keeper-flw-admin")]
#[command(about = "Send four letter admin words to a Keeper server")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "9181")]
    port: u16,

    /// Connect and read timeout in seconds
    #[arg(short, long, default_value = "5")]
    timeout: u64,

    /// Repeat every N seconds until interrupted
    #[arg(short, long)]
    interval: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Words to send, e.g. ruok mntr srvr
    #[arg(required = true)]
    words: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Reply as received
    Text,
    /// Key/value reports as a table
    Table,
    /// Key/value reports as JSON
    Json,
}

#[derive(Debug, Tabled)]
struct Entry {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    word: &'a str,
    server: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw: Option<&'a str>,
}

fn main() {
    let args = Args::parse();

    let result = match args.interval {
        Some(interval) => cmd_watch(&args, interval),
        None => cmd_send_all(&args),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_send_all(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let addr = resolve(&args.host, args.port)?;
    let timeout = Duration::from_secs(args.timeout);

    for word in &args.words {
        validate_word(word)?;
        let reply = send_word(addr, word, timeout)?;
        print_reply(word, addr, &reply, args.format)?;
    }
    Ok(())
}

fn cmd_watch(args: &Args, interval: u64) -> Result<(), Box<dyn std::error::Error>> {
    let addr = resolve(&args.host, args.port)?;
    let timeout = Duration::from_secs(args.timeout);
    for word in &args.words {
        validate_word(word)?;
    }

    loop {
        // Clear screen
        print!("\x1B[2J\x1B[1;1H");

        println!(
            "{} - {} (interval: {}s, Ctrl+C to stop)",
            "Keeper FLW Watch".cyan().bold(),
            chrono::Local::now().format("%H:%M:%S"),
            interval
        );
        println!("{}", "=".repeat(50));

        for word in &args.words {
            match send_word(addr, word, timeout) {
                Ok(reply) => print_reply(word, addr, &reply, args.format)?,
                Err(e) => println!("{} {}: {}", "Failed".red().bold(), word, e),
            }
        }

        std::thread::sleep(Duration::from_secs(interval));
    }
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, Box<dyn std::error::Error>> {
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| format!("cannot resolve {}:{}", host, port).into())
}

/// Words are exactly four bytes on the wire.
fn validate_word(word: &str) -> Result<(), String> {
    if word.len() == 4 && word.is_ascii() {
        Ok(())
    } else {
        Err(format!("{:?} is not a four letter word", word))
    }
}

/// Send one word on a fresh connection and read until the server closes.
fn send_word(addr: SocketAddr, word: &str, timeout: Duration) -> std::io::Result<String> {
    let mut stream = TcpStream::connect_timeout(&addr, timeout)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    stream.write_all(word.as_bytes())?;
    stream.shutdown(Shutdown::Write)?;

    let mut reply = String::new();
    stream.read_to_string(&mut reply)?;
    Ok(reply)
}

fn print_reply(
    word: &str,
    addr: SocketAddr,
    reply: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let entries = parse_key_values(reply);

    match (format, entries) {
        (OutputFormat::Json, entries) => {
            let report = JsonReport {
                word,
                server: addr.to_string(),
                raw: entries.is_none().then_some(reply),
                fields: entries.map(to_json_fields),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        (OutputFormat::Table, Some(entries)) => {
            print_header(word, addr);
            println!("{}", Table::new(entries));
        }
        _ => {
            print_header(word, addr);
            print!("{}", reply);
            if !reply.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

fn print_header(word: &str, addr: SocketAddr) {
    println!("{} {}", word.cyan().bold(), format!("@ {}", addr).dimmed());
}

/// Split a `mntr` (tab separated) or `conf` (`key=value`) reply into entries.
///
/// Returns `None` when any non-empty line is not a key/value pair.
fn parse_key_values(reply: &str) -> Option<Vec<Entry>> {
    let mut entries = Vec::new();
    for line in reply.lines().filter(|line| !line.is_empty()) {
        let (key, value) = line.split_once('\t').or_else(|| line.split_once('='))?;
        if key.is_empty() || key.contains(char::is_whitespace) {
            return None;
        }
        entries.push(Entry {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    if entries.is_empty() {
        None
    } else {
        Some(entries)
    }
}

fn to_json_fields(entries: Vec<Entry>) -> serde_json::Map<String, serde_json::Value> {
    entries
        .into_iter()
        .map(|entry| {
            let value = match entry.value.parse::<i64>() {
                Ok(n) => serde_json::Value::from(n),
                Err(_) => match entry.value.as_str() {
                    "true" => serde_json::Value::Bool(true),
                    "false" => serde_json::Value::Bool(false),
                    _ => serde_json::Value::String(entry.value),
                },
            };
            (entry.key, value)
        })
        .collect()
}
