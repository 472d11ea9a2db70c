//! Run a scheduled acquisition.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use sunlapse_acquisition::{
    AcquisitionParams, AcquisitionSession, HttpFetcher, RunOutcome, StatusEvent,
};
use sunlapse_common::config::AppConfig;

use crate::AcquireArgs;

pub async fn run(config: &AppConfig, args: AcquireArgs) -> anyhow::Result<()> {
    let defaults = &config.acquisition;
    let interval_secs = match (args.interval_secs, args.interval_mins) {
        (Some(secs), _) => secs,
        (None, Some(mins)) => mins.saturating_mul(60),
        (None, None) => defaults.interval_minutes.saturating_mul(60),
    };

    let params = AcquisitionParams {
        num_images: args.count.unwrap_or(defaults.num_images),
        interval_secs,
        target_dir: args.dir.unwrap_or_else(|| config.frames_dir.clone()),
        source: args.source.unwrap_or_else(|| defaults.source.clone()),
        start_number: args.start.unwrap_or(defaults.start_number),
    };

    let fetcher = HttpFetcher::with_timeout(Duration::from_secs(defaults.fetch_timeout_secs))?;
    let session = AcquisitionSession::new(Arc::new(fetcher));

    if !args.json {
        println!("Starting acquisition from: {}", params.source);
        println!("  Images: {}", params.num_images);
        println!("  Interval: {}s", params.interval_secs);
        println!("  Start number: {}", params.start_number);
        println!("  Output: {}", params.target_dir.display());
        println!();
        println!("Press Ctrl+C to stop...");
        println!();
    }

    let mut handle = session.start(params).await?;
    let mut stop_requested = false;

    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(event) => print_event(&event, args.json)?,
                None => break,
            },
            _ = tokio::signal::ctrl_c(), if !stop_requested => {
                stop_requested = true;
                tracing::info!("Ctrl-C received, stopping acquisition");
                session.stop();
            }
        }
    }

    let report = handle.wait().await?;
    tracing::debug!(frames = report.frames.len(), outcome = ?report.outcome, "Run ended");
    match report.outcome {
        RunOutcome::Completed | RunOutcome::Stopped => Ok(()),
        RunOutcome::Failed { cause } => {
            tracing::warn!(%cause, frames = report.frames.len(), "Acquisition run failed");
            Err(anyhow::anyhow!("Acquisition failed: {cause}"))
        }
    }
}

fn print_event(event: &StatusEvent, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    let mut stdout = std::io::stdout();
    match event {
        StatusEvent::Saved { filename } => {
            writeln!(stdout, "\rSaved {filename}                              ")?
        }
        StatusEvent::Countdown { seconds_remaining } => {
            write!(stdout, "\r  Next image in {seconds_remaining} seconds...  ")?;
            stdout.flush()?;
        }
        StatusEvent::Completed => writeln!(stdout, "\nDownload complete!")?,
        StatusEvent::Stopped => writeln!(stdout, "\nDownload stopped.")?,
        StatusEvent::Failed { cause } => writeln!(stdout, "\nDownload failed: {cause}")?,
    }
    Ok(())
}
