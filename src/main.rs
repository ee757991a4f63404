// src/main.rs

use std::process::ExitCode;

use assetdag::{cli, logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    match run_main().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("assetdag error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

/// `Ok(false)` when any task failed.
async fn run_main() -> anyhow::Result<bool> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    let report = run(args).await?;
    if !report.success() {
        eprintln!("assetdag: failed tasks: {:?}", report.failed);
    }
    Ok(report.success())
}
