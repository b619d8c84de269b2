use clap::Parser;
use gnss_integrity::cli::{args::Args, commands};
use std::process;

fn main() {
    let args = Args::parse();

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        tokio::select! {
            result = commands::run(args) => result,
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    eprintln!("Failed to listen for CTRL+C: {}", e);
                }
                eprintln!("\nReceived CTRL+C, shutting down...");
                Err(gnss_integrity::Error::processing_interrupted(
                    "Interrupted by user; transactions in flight were not committed",
                ))
            }
        }
    });

    match result {
        Ok(stats) if stats.stations_failed > 0 => process::exit(2),
        Ok(_) => process::exit(0),
        Err(error) => {
            // `{:#}` prints the source chain
            eprintln!("Error: {:#}", anyhow::Error::from(error));
            process::exit(1);
        }
    }
}
