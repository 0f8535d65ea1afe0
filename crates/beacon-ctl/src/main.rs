//! beacon-ctl — command-line client for the beacond node directory.

mod cmd;

use anyhow::{Context, Result};

use cmd::http::Target;

const DEFAULT_URL: &str = "http://127.0.0.1:8000";
const TOKEN_ENV: &str = "BEACON_TOKEN";

fn print_usage() {
    println!("Usage: beacon-ctl [--url <base>] [--token <token>] <command>");
    println!();
    println!("Commands:");
    println!("  register <name>   Record this host's address under <name>");
    println!("  lookup <name>     Print the address registered under <name>");
    println!("  health            Check that beacond is up");
    println!();
    println!("Options:");
    println!("  --url <base>      beacond base URL (default: {})", DEFAULT_URL);
    println!("  --token <token>   Bearer token (default: ${})", TOKEN_ENV);
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Register(&'a str),
    Lookup(&'a str),
    Health,
    Help,
}

/// `None` for an empty or unrecognised command line.
fn parse_command<'a>(words: &[&'a str]) -> Option<Command<'a>> {
    match words {
        ["register", name] => Some(Command::Register(*name)),
        ["lookup", name] => Some(Command::Lookup(*name)),
        ["health"] => Some(Command::Health),
        ["help"] | ["--help"] | ["-h"] => Some(Command::Help),
        _ => None,
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut target = Target {
        url: DEFAULT_URL.to_string(),
        token: std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty()),
    };
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--url" => {
                i += 1;
                target.url = args.get(i).context("--url requires a value")?.clone();
            }
            "--token" => {
                i += 1;
                target.token = Some(args.get(i).context("--token requires a value")?.clone());
            }
            other => remaining.push(other),
        }
        i += 1;
    }

    match parse_command(&remaining) {
        Some(Command::Register(name)) => cmd::nodes::cmd_register(&target, name).await,
        Some(Command::Lookup(name)) => cmd::nodes::cmd_lookup(&target, name).await,
        Some(Command::Health) => cmd::health::cmd_health(&target).await,
        Some(Command::Help) => {
            print_usage();
            Ok(())
        }
        None => {
            if !remaining.is_empty() {
                eprintln!("Unknown command: {}", remaining.join(" "));
                eprintln!();
            }
            print_usage();
            std::process::exit(1);
        }
    }
}
