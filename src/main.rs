use anyhow::{Context, Result};
use clap::Parser;
use contour_march::{RunConfig, pipeline};
use std::path::PathBuf;

/// Extract marching-squares contours from an RGB image with a fixed pool of workers.
#[derive(Parser, Debug)]
#[command(name = "contour_march", version)]
struct Args {
    /// Image to contour.
    input: PathBuf,
    /// Where to write the contoured image.
    output: PathBuf,
    /// Number of worker threads.
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    workers: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let workers = usize::try_from(args.workers).context("worker count does not fit in usize")?;
    let config = RunConfig::new(&args.input, &args.output, workers);
    match pipeline::run(config) {
        Ok(()) => Ok(()),
        Err(err) => {
            // A refused spawn exits with the OS code, the way the thread API reported it.
            if let Some(code) = err.os_exit_code() {
                eprintln!("Error: {err}");
                std::process::exit(code);
            }
            Err(anyhow::Error::new(err).context(format!(
                "contouring {} into {} failed",
                args.input.display(),
                args.output.display()
            )))
        }
    }
}
