use std::path::PathBuf;

use clap::Parser;
use vocazoo::commands::{self, Command, Context};
use vocazoo::{Config, Error, logging};

#[derive(Parser, Debug)]
#[command(version, about = "Terminal client for the vocazoo vocabulary quiz", long_about = None)]
struct Args {
    /// Backend base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// File holding the login token
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,

    /// Append logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Error> {
    let mut config = Config::from_env()?;
    if let Some(api_url) = args.api_url {
        config.api_url = api_url;
    }
    if let Some(token_file) = args.token_file {
        config.token_file = token_file;
    }
    if args.log_file.is_some() {
        config.log_file = args.log_file;
    }

    logging::init(config.log_file.as_deref(), args.command.is_interactive())?;

    let ctx = Context::new(config);
    commands::dispatch(&ctx, args.command).await
}
