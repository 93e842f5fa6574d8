use std::env;

use anyhow::Context;
use clap::Parser;
use commission_sim::api::{Cli, run_cli, run_http_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let raw_args: Vec<String> = env::args().collect();
    if raw_args.get(1).map(|s| s.as_str()) == Some("serve") {
        let port = raw_args
            .get(2)
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);
        return run_http_server(port).await.context("server error");
    }

    let cli = Cli::parse_from(raw_args);
    print!("{}", run_cli(cli)?);
    Ok(())
}
