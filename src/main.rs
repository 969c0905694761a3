use std::process::ExitCode;

use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    screenpilot_lib::run(screenpilot_lib::cli::Cli::parse()).await
}
