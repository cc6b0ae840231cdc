use thiserror::Error;

/// Error taxonomy of the stabilization core.
///
/// The per-frame variants (`InsufficientFeatures`, `DegenerateHomography`,
/// `DegenerateSmoothedMatrix`) are non-fatal: the pipeline downgrades the
/// affected transform to identity and records the variant in the returned
/// warnings list. Everything else aborts the run with no partial output.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("sequence has {0} frames, need at least 2")]
    EmptySequence(usize),

    #[error("frame {index} is {got_w}x{got_h}, expected {want_w}x{want_h}")]
    InconsistentFrameSize {
        index: usize,
        got_w: u32,
        got_h: u32,
        want_w: u32,
        want_h: u32,
    },

    #[error("frame pair ending at frame {0} yielded too few features or matches")]
    InsufficientFeatures(usize),

    #[error("tracker returned a degenerate homography for frame {0}")]
    DegenerateHomography(usize),

    #[error("smoothed path matrix for frame {0} is not invertible")]
    DegenerateSmoothedMatrix(usize),

    #[error("no pixel is valid in every warped frame, cannot crop")]
    EmptyCommonSupport,

    #[error("stabilization cancelled")]
    Cancelled,

    #[error("no decodable frames found in {0}")]
    NoFrames(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl CoreError {
    /// Frame index carried by the per-frame (non-fatal) variants.
    pub fn frame_index(&self) -> Option<usize> {
        match self {
            CoreError::InsufficientFeatures(i)
            | CoreError::DegenerateHomography(i)
            | CoreError::DegenerateSmoothedMatrix(i) => Some(*i),
            _ => None,
        }
    }
}
