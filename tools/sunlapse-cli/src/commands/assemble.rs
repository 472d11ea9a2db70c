//! Assemble a directory of frames into a video.

use std::io::Write;
use std::path::PathBuf;

use sunlapse_assembler::{assemble_video, AssemblyJob, AssemblyProgress, AssemblyStage};
use sunlapse_common::config::AppConfig;
use sunlapse_common::error::SunlapseError;

pub async fn run(
    config: &AppConfig,
    dir: Option<PathBuf>,
    fps: Option<u32>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let dir = dir.unwrap_or_else(|| config.frames_dir.clone());
    let fps = fps.unwrap_or(config.video.fps);
    let output_path = output.unwrap_or_else(|| dir.join(&config.video.output_name));

    println!("Creating video from: {}", dir.display());
    println!("  Output: {}", output_path.display());
    println!("  FPS: {fps}");

    let job = AssemblyJob {
        input_dir: dir.clone(),
        output_path,
        fps,
        start_number: 1,
    };

    let progress_cb: Box<dyn Fn(AssemblyProgress) + Send> = Box::new(|p| {
        let _ = write_progress(&mut std::io::stdout(), &p);
    });

    match assemble_video(job, Some(progress_cb)).await {
        Ok(report) => {
            println!();
            for skipped in &report.skipped {
                println!(
                    "  Skipped {}: {}",
                    skipped.path.display(),
                    skipped.reason
                );
            }
            println!(
                "Video creation complete: {} ({} frames)",
                report.output_path.display(),
                report.frames_written
            );
            Ok(())
        }
        Err(SunlapseError::EmptyInput { dir }) => {
            tracing::warn!(dir = %dir.display(), "No frames to assemble");
            println!("No JPEG files found in {}", dir.display());
            Ok(())
        }
        Err(e) => {
            println!();
            Err(anyhow::anyhow!("Video creation failed: {e}"))
        }
    }
}

/// Rewrite the progress line in place. Flushes, since the line carries no
/// newline and stdout is line-buffered.
fn write_progress(out: &mut impl Write, p: &AssemblyProgress) -> std::io::Result<()> {
    if p.stage != AssemblyStage::Encoding {
        return Ok(());
    }
    write!(
        out,
        "\r  Progress: {}/{} frames  ",
        p.frames_done, p.total_frames
    )?;
    out.flush()
}
