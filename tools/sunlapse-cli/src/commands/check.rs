//! Check system capabilities.

use sunlapse_assembler::{FfmpegEncoder, VideoEncoder};
use sunlapse_common::config::{config_file_path, AppConfig};

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Sunlapse System Check");
    println!("{}", "=".repeat(50));

    let config_path = config_file_path();
    if config_path.exists() {
        println!("[OK] Config file: {}", config_path.display());
    } else {
        println!(
            "[INFO] No config file at {} (using defaults)",
            config_path.display()
        );
    }

    println!("[OK] Frames directory: {}", config.frames_dir.display());

    let encoder = FfmpegEncoder::new();
    let ffmpeg_ok = encoder.is_available();
    if ffmpeg_ok {
        println!("[OK] Video encoder: {}", encoder.name());
    } else {
        println!("[MISSING] Video encoder: ffmpeg not found in PATH");
        println!("          Install ffmpeg to assemble videos.");
    }

    println!();
    if ffmpeg_ok {
        println!("All required capabilities are available. Sunlapse is ready.");
    } else {
        println!("Acquisition works, but video assembly needs ffmpeg.");
    }

    Ok(())
}
