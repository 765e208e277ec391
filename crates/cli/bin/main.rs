use std::process::ExitCode;

use clap::Parser;
use lazy_query_cli::{init_tracing, run, Cli};
use lazy_query_configuration::ProcessEnvironment;

#[tokio::main]
pub async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli, ProcessEnvironment).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::FAILURE
        }
    }
}
