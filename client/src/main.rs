use std::process::exit;

use client::connect;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use crate::console_cmd::ConsoleCmd;
use crate::console_input::console_input_thread;

mod console_cmd;
mod console_input;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some((host, port, username)) = parse_args(&args) else {
        eprintln!("Usage: client <host> <port> <username>");
        exit(1);
    };

    let handle = match connect(&host, port, &username).await {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("{e}");
            exit(1);
        }
    };

    println!("{}", handle.board());

    // Reprint the board whenever any tile changes.
    {
        let handle = handle.clone();
        let mut changes = handle.subscribe();
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(tile) => {
                        println!(
                            "{} set ({}, {}) to {}",
                            tile.owner, tile.row, tile.col, tile.color
                        );
                        println!("{}", handle.board());
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        println!("{}", handle.board());
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    let mut console_receiver = console_input_thread();
    while let Some(console_str) = console_receiver.recv().await {
        match ConsoleCmd::parse(console_str.trim()) {
            Ok(ConsoleCmd::Change { row, col, code }) => {
                if handle.is_valid(row, col, code) {
                    handle.change_tile(row, col, code);
                } else {
                    println!("invalid move: ({row}, {col}) {code}");
                }
            }
            Ok(ConsoleCmd::Quit) => break,
            Err(err) => println!("err: {err}"),
        }
    }
}

fn parse_args(args: &[String]) -> Option<(String, u16, String)> {
    if args.len() != 4 {
        return None;
    }
    let host = args[1].clone();
    let port = args[2].parse().ok()?;
    let username = args[3].clone();
    Some((host, port, username))
}
