//! sfx-dl CLI - download every sample listed in the sound effects manifest.

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use clap::Parser;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = sfx_dl::cli::Cli::parse();
    match sfx_dl::cli::run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            log::error!("{e}");
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}
