//! Frame-sequence ingest and export collaborators.
//!
//! The core consumes an in-memory frame sequence; these types adapt it to
//! the filesystem. Container demuxing/encoding stays outside the crate — a
//! caller with a video file is expected to extract frames to an image
//! directory (or implement [`FrameSource`] over its own decoder).

use std::path::{Path, PathBuf};

use glob::glob;
use image::{ImageReader, RgbImage};
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

use crate::error::CoreError;
use crate::types::VideoMetadata;

/// Decodes a frame sequence plus its container-level metadata.
pub trait FrameSource {
    fn load(&self) -> Result<(Vec<RgbImage>, VideoMetadata), CoreError>;
}

/// Encodes a stabilized frame sequence.
pub trait FrameSink {
    fn write(&self, frames: &[RgbImage], metadata: &VideoMetadata) -> Result<(), CoreError>;
}

fn image_filter(entry: glob::GlobResult) -> Option<PathBuf> {
    if let Ok(p) = entry {
        for ext in &[".png", ".jpg", ".jpeg"] {
            if p.as_os_str().to_string_lossy().to_lowercase().ends_with(ext) {
                return Some(p);
            }
        }
    }
    None
}

/// Loads every png/jpg in a directory, in sorted path order, as the frame
/// sequence. The directory layout carries no timing, so the frame rate is
/// supplied by the caller; fourcc and bitrate are unknown and zeroed.
pub struct ImageDirSource {
    pub dir: PathBuf,
    pub fps: i32,
}

impl ImageDirSource {
    pub fn new(dir: impl AsRef<Path>, fps: i32) -> ImageDirSource {
        ImageDirSource {
            dir: dir.as_ref().to_path_buf(),
            fps,
        }
    }
}

impl FrameSource for ImageDirSource {
    fn load(&self) -> Result<(Vec<RgbImage>, VideoMetadata), CoreError> {
        let pattern = format!("{}/*", self.dir.display());
        let mut paths: Vec<PathBuf> = glob(&pattern)
            .map_err(|_| CoreError::NoFrames(self.dir.display().to_string()))?
            .filter_map(image_filter)
            .collect();
        paths.sort();
        if paths.is_empty() {
            return Err(CoreError::NoFrames(self.dir.display().to_string()));
        }
        log::debug!("loading {} frames from {}", paths.len(), self.dir.display());

        let frames: Vec<RgbImage> = paths
            .par_iter()
            .progress_count(paths.len() as u64)
            .map(|path| {
                let img = ImageReader::open(path)?.decode()?;
                Ok(img.to_rgb8())
            })
            .collect::<Result<Vec<RgbImage>, CoreError>>()?;

        let (width, height) = frames[0].dimensions();
        let metadata = VideoMetadata {
            fps: self.fps,
            fourcc: 0,
            bitrate: 0.0,
            width,
            height,
            frame_count: frames.len(),
        };
        Ok((frames, metadata))
    }
}

/// Writes frames as zero-padded numbered PNGs (`frame_007.png`), padded to
/// the digit count of the sequence length so lexical order is frame order.
pub struct ImageDirSink {
    pub dir: PathBuf,
}

impl ImageDirSink {
    pub fn new(dir: impl AsRef<Path>) -> ImageDirSink {
        ImageDirSink {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl FrameSink for ImageDirSink {
    fn write(&self, frames: &[RgbImage], metadata: &VideoMetadata) -> Result<(), CoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let digits = frames.len().to_string().len();
        log::debug!(
            "writing {} frames ({}x{}) to {}",
            frames.len(),
            metadata.width,
            metadata.height,
            self.dir.display()
        );
        for (i, frame) in frames.iter().enumerate() {
            let name = format!("frame_{:0width$}.png", i, width = digits);
            frame.save(self.dir.join(name))?;
        }
        Ok(())
    }
}
