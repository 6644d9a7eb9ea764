use clap::{command, Parser};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = r###"
Mockgpt is a test double for an OpenAI-compatible chat completion API. It
answers every request with the same fixed reply, either as a single JSON
response or as a paced SSE stream, and offers fault-injection routes that
add random delay or random 500s so you can exercise client retry and
resilience code against an unreliable upstream.
"###
)]
pub struct Args {
    #[command(subcommand)]
    pub subcmd: Option<SubCommands>,
}

#[derive(Parser, Debug)]
pub enum SubCommands {
    Start(StartSubCommand),
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Start the mock server", long_about = None)]
pub struct StartSubCommand {}
