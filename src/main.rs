use std::sync::Arc;

use anyhow::Error;
use clap::Parser;
use server::{start_server, ServerState};

use args::{Args, SubCommands};

mod args;
mod config;
mod decode;
mod error;
mod faults;
mod handler;
mod models;
mod reply;
mod router;
mod server;
mod utils;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "mockgpt=info".to_string()),
        )
        .init();
    let args = Args::parse();
    match args.subcmd {
        Some(SubCommands::Start(_)) | None => {
            let state = Arc::new(ServerState::new());
            start_server(state).await?;
        }
    };
    Ok(())
}
