use clap::Parser;
use env_logger::Env;
use log::{debug, info};
use snafu::ErrorCompat;

mod args;
mod vegsum;

fn main() {
    let args = args::Args::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    debug!("args: {:?}", args);

    match vegsum::run_summary(&args.data) {
        Ok(path) => {
            info!("Summary written to {}", path.display());
        }
        Err(e) => {
            eprintln!("An error occurred: {}", e);
            if let Some(source) = std::error::Error::source(e.as_ref()) {
                eprintln!("caused by: {}", source);
            }
            if let Some(bt) = ErrorCompat::backtrace(e.as_ref()) {
                eprintln!("trace: {}", bt);
            }
            std::process::exit(1);
        }
    }
}
