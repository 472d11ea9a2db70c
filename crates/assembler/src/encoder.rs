//! Video encoder backends.

use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use image::RgbImage;
use sunlapse_common::error::{SunlapseError, SunlapseResult};

/// Four-character codec identifier of the output stream.
pub const CODEC_FOURCC: &str = "mp4v";

/// Fixed properties of an output video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Trait for video encoding backends.
///
/// A backend is opened once with fixed dimensions and frame rate, receives
/// frames in presentation order at uniform spacing, and is finished once.
pub trait VideoEncoder: Send {
    /// Create the output file and prepare to receive frames.
    fn open(&mut self, path: &Path, spec: StreamSpec) -> SunlapseResult<()>;

    /// Append one frame. Its dimensions must match the opened stream.
    fn write_frame(&mut self, frame: &RgbImage) -> SunlapseResult<()>;

    /// Flush and close the output.
    fn finish(&mut self) -> SunlapseResult<()>;

    /// Check if this backend is usable on this system.
    fn is_available(&self) -> bool;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Encodes by piping raw RGB frames into an `ffmpeg` child process.
pub struct FfmpegEncoder {
    binary: String,
    active: Option<ActiveEncode>,
}

struct ActiveEncode {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_task: Option<JoinHandle<String>>,
    spec: StreamSpec,
    output: PathBuf,
    frames_written: u64,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegEncoder {
    pub fn new() -> Self {
        Self::with_binary("ffmpeg")
    }

    /// Use a specific ffmpeg executable.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            active: None,
        }
    }

    fn ffmpeg_args(path: &Path, spec: StreamSpec) -> Vec<String> {
        let mut args: Vec<String> = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-y",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        args.extend([
            "-s".to_string(),
            format!("{}x{}", spec.width, spec.height),
            "-r".to_string(),
            spec.fps.to_string(),
            "-i".to_string(),
            "-".to_string(),
            "-an".to_string(),
        ]);

        // yuv420p needs even dimensions.
        if spec.width % 2 != 0 || spec.height % 2 != 0 {
            args.extend([
                "-vf".to_string(),
                "pad=ceil(iw/2)*2:ceil(ih/2)*2".to_string(),
            ]);
        }

        args.extend([
            "-c:v".to_string(),
            "mpeg4".to_string(),
            "-tag:v".to_string(),
            CODEC_FOURCC.to_string(),
            "-q:v".to_string(),
            "3".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-f".to_string(),
            "mp4".to_string(),
        ]);
        args.push(path.to_string_lossy().into_owned());
        args
    }

    fn close(&mut self) -> SunlapseResult<()> {
        let Some(mut active) = self.active.take() else {
            return Ok(());
        };

        // Closing stdin signals end of stream.
        drop(active.stdin.take());

        let status = active
            .child
            .wait()
            .map_err(|e| SunlapseError::encode(format!("Failed to wait on ffmpeg: {e}")))?;

        let stderr_output = active
            .stderr_task
            .take()
            .map(|task| {
                task.join()
                    .unwrap_or_else(|_| "<failed to join stderr reader>".to_string())
            })
            .unwrap_or_default();

        if !status.success() {
            return Err(SunlapseError::encode(format!(
                "ffmpeg failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }

        tracing::info!(
            output = %active.output.display(),
            frames = active.frames_written,
            "ffmpeg finished"
        );
        Ok(())
    }
}

impl VideoEncoder for FfmpegEncoder {
    fn open(&mut self, path: &Path, spec: StreamSpec) -> SunlapseResult<()> {
        if self.active.is_some() {
            return Err(SunlapseError::encode("Encoder already open"));
        }

        let args = Self::ffmpeg_args(path, spec);
        tracing::debug!(?args, "Running ffmpeg");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SunlapseError::encode(format!("Failed to start ffmpeg: {e}")))?;

        tracing::info!(
            pid = child.id(),
            width = spec.width,
            height = spec.height,
            fps = spec.fps,
            codec = CODEC_FOURCC,
            "ffmpeg process started"
        );

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SunlapseError::encode("Failed to capture ffmpeg stdin"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| SunlapseError::encode("Failed to capture ffmpeg stderr"))?;

        // Drain stderr concurrently so ffmpeg never blocks on a full pipe.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        self.active = Some(ActiveEncode {
            child,
            stdin: Some(stdin),
            stderr_task: Some(stderr_task),
            spec,
            output: path.to_path_buf(),
            frames_written: 0,
        });
        Ok(())
    }

    fn write_frame(&mut self, frame: &RgbImage) -> SunlapseResult<()> {
        let active = self
            .active
            .as_mut()
            .ok_or_else(|| SunlapseError::encode("Encoder not open"))?;

        if frame.dimensions() != (active.spec.width, active.spec.height) {
            return Err(SunlapseError::encode(format!(
                "Frame is {}x{}, stream is {}x{}",
                frame.width(),
                frame.height(),
                active.spec.width,
                active.spec.height
            )));
        }

        let stdin = active
            .stdin
            .as_mut()
            .ok_or_else(|| SunlapseError::encode("ffmpeg stdin already closed"))?;

        if let Err(e) = stdin.write_all(frame.as_raw()) {
            // ffmpeg exited early; its stderr explains why.
            let reason = match self.close() {
                Err(close_err) => close_err.to_string(),
                Ok(()) => String::new(),
            };
            return Err(SunlapseError::encode(format!(
                "Failed to write frame to ffmpeg: {e} {reason}"
            )));
        }
        active.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> SunlapseResult<()> {
        if self.active.is_none() {
            return Err(SunlapseError::encode("Encoder not open"));
        }
        self.close()
    }

    fn is_available(&self) -> bool {
        command_exists(&self.binary)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if let Some(mut active) = self.active.take() {
            drop(active.stdin.take());
            let _ = active.child.kill();
            let _ = active.child.wait();
        }
    }
}

/// Whether `binary` resolves on PATH.
pub fn command_exists(binary: &str) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
