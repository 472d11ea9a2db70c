//! Frame directory to video assembly.

use std::path::{Path, PathBuf};

use image::RgbImage;
use sunlapse_common::error::{SunlapseError, SunlapseResult};
use sunlapse_frame_model::naming::{is_frame_candidate, sequence_key, sort_by_sequence};

use crate::encoder::{FfmpegEncoder, StreamSpec, VideoEncoder, CODEC_FOURCC};

/// File name of the assembled video inside the frames directory.
pub const OUTPUT_FILE_NAME: &str = "output.mp4";

/// An assembly job ready to be encoded.
#[derive(Debug, Clone)]
pub struct AssemblyJob {
    /// Directory holding the frames.
    pub input_dir: PathBuf,

    /// Output video path. Overwritten if it exists.
    pub output_path: PathBuf,

    /// Output frame rate.
    pub fps: u32,

    /// Reserved: first sequence number of the run. Currently unused; every
    /// listed frame is included.
    pub start_number: u64,
}

impl AssemblyJob {
    /// Job writing `<dir>/output.mp4`.
    pub fn for_directory(dir: impl Into<PathBuf>, fps: u32) -> Self {
        let input_dir = dir.into();
        Self {
            output_path: input_dir.join(OUTPUT_FILE_NAME),
            input_dir,
            fps,
            start_number: 1,
        }
    }
}

/// A frame left out of the video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFrame {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of a finished assembly.
#[derive(Debug, Clone)]
pub struct AssemblyReport {
    pub output_path: PathBuf,

    /// Number of frames appended to the video.
    pub frames_written: usize,

    /// Frames appended, in video order.
    pub included: Vec<PathBuf>,

    /// Frames that could not be decoded.
    pub skipped: Vec<SkippedFrame>,
}

/// Progress callback for assembly.
pub type ProgressCallback = Box<dyn Fn(AssemblyProgress) + Send>;

/// Assembly progress report.
#[derive(Debug, Clone)]
pub struct AssemblyProgress {
    /// Frames processed so far (written or skipped).
    pub frames_done: usize,

    /// Frames listed for this assembly.
    pub total_frames: usize,

    /// Current stage.
    pub stage: AssemblyStage,

    /// File most recently processed.
    pub current: Option<PathBuf>,
}

/// Stages of the assembly process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyStage {
    Listing,
    Encoding,
    Finalizing,
    Complete,
}

/// List the frames of `dir` in video order.
///
/// Keeps files ending in `.jpg` or `.jpeg`, orders them by sequence key,
/// then keeps every frame whose key is at least the smallest key listed.
/// Since that minimum comes from the same list, the last step keeps all
/// of them. Fails with `EmptyInput` when nothing matches.
pub fn list_frames(dir: &Path) -> SunlapseResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SunlapseError::invalid_input(format!("Directory {} does not exist", dir.display()))
        } else {
            SunlapseError::Io(e)
        }
    })?;

    let mut frames = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if is_frame_candidate(name) && path.is_file() {
            frames.push(path);
        }
    }

    if frames.is_empty() {
        return Err(SunlapseError::EmptyInput {
            dir: dir.to_path_buf(),
        });
    }

    sort_by_sequence(&mut frames);

    let key = |p: &PathBuf| {
        p.file_name()
            .map(|n| sequence_key(&n.to_string_lossy()))
            .unwrap_or(0)
    };
    let min_sequence = frames.iter().map(key).min().unwrap_or(0);
    frames.retain(|p| key(p) >= min_sequence);

    Ok(frames)
}

/// Decode a frame file into RGB.
pub fn decode_frame(path: &Path) -> SunlapseResult<RgbImage> {
    let subject = path.display().to_string();
    let image = image::ImageReader::open(path)
        .map_err(|e| SunlapseError::decode(subject.as_str(), e))?
        .with_guessed_format()
        .map_err(|e| SunlapseError::decode(subject.as_str(), e))?
        .decode()
        .map_err(|e| SunlapseError::decode(subject.as_str(), e))?;
    Ok(image.into_rgb8())
}

/// Assemble the frames of `job.input_dir` through `encoder`.
///
/// Fails before the output is created when the frame rate is zero, no
/// frames are found, or the first frame cannot be decoded. Later frames
/// that fail to decode are skipped and reported.
pub fn assemble_with_encoder(
    job: &AssemblyJob,
    encoder: &mut dyn VideoEncoder,
    progress: Option<&ProgressCallback>,
) -> SunlapseResult<AssemblyReport> {
    if job.fps == 0 {
        return Err(SunlapseError::invalid_input("frame rate must be positive"));
    }

    tracing::info!(
        dir = %job.input_dir.display(),
        output = %job.output_path.display(),
        fps = job.fps,
        "Starting assembly"
    );

    report(progress, 0, 0, AssemblyStage::Listing, None);
    let frames = list_frames(&job.input_dir)?;
    let total = frames.len();

    let first = decode_frame(&frames[0])?;
    let spec = StreamSpec {
        width: first.width(),
        height: first.height(),
        fps: job.fps,
    };

    if let Some(parent) = job.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    tracing::info!(
        backend = encoder.name(),
        frames = total,
        width = spec.width,
        height = spec.height,
        codec = CODEC_FOURCC,
        "Opening video stream"
    );
    encoder.open(&job.output_path, spec)?;

    let mut included = Vec::with_capacity(total);
    let mut skipped = Vec::new();
    let mut pending_first = Some(first);

    for (index, path) in frames.iter().enumerate() {
        let decoded = match pending_first.take() {
            Some(image) => Ok(image),
            None => decode_frame(path),
        };

        match decoded {
            Ok(image) => {
                let image = fit_to_stream(image, spec, path);
                if let Err(e) = encoder.write_frame(&image) {
                    let _ = encoder.finish();
                    let _ = std::fs::remove_file(&job.output_path);
                    return Err(e);
                }
                tracing::debug!(frame = %path.display(), "Added frame");
                included.push(path.clone());
            }
            Err(e) => {
                tracing::warn!(frame = %path.display(), error = %e, "Skipping unreadable frame");
                skipped.push(SkippedFrame {
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
        }

        report(
            progress,
            index + 1,
            total,
            AssemblyStage::Encoding,
            Some(path.clone()),
        );
    }

    report(progress, total, total, AssemblyStage::Finalizing, None);
    encoder.finish()?;

    tracing::info!(
        output = %job.output_path.display(),
        frames = included.len(),
        skipped = skipped.len(),
        "Assembly complete"
    );
    report(progress, total, total, AssemblyStage::Complete, None);

    Ok(AssemblyReport {
        output_path: job.output_path.clone(),
        frames_written: included.len(),
        included,
        skipped,
    })
}

/// Assemble with the ffmpeg backend on a blocking worker thread.
pub async fn assemble_video(
    job: AssemblyJob,
    progress: Option<ProgressCallback>,
) -> SunlapseResult<AssemblyReport> {
    tokio::task::spawn_blocking(move || {
        let mut encoder = FfmpegEncoder::new();
        if !encoder.is_available() {
            return Err(SunlapseError::encode(
                "No supported video encoder found (expected ffmpeg in PATH)",
            ));
        }
        assemble_with_encoder(&job, &mut encoder, progress.as_ref())
    })
    .await
    .map_err(|e| SunlapseError::Other(anyhow::anyhow!("assembly task failed: {e}")))?
}

/// Resize frames whose dimensions differ from the stream.
fn fit_to_stream(image: RgbImage, spec: StreamSpec, path: &Path) -> RgbImage {
    if image.dimensions() == (spec.width, spec.height) {
        return image;
    }
    tracing::warn!(
        frame = %path.display(),
        width = image.width(),
        height = image.height(),
        target_width = spec.width,
        target_height = spec.height,
        "Resizing frame to stream dimensions"
    );
    image::imageops::resize(
        &image,
        spec.width,
        spec.height,
        image::imageops::FilterType::Triangle,
    )
}

fn report(
    progress: Option<&ProgressCallback>,
    frames_done: usize,
    total_frames: usize,
    stage: AssemblyStage,
    current: Option<PathBuf>,
) {
    if let Some(cb) = progress {
        cb(AssemblyProgress {
            frames_done,
            total_frames,
            stage,
            current,
        });
    }
}
