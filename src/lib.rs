//! Feature-based video stabilization.
//!
//! The pipeline estimates inter-frame camera motion from SIFT-class feature
//! matches (RANSAC over cross-checked descriptor matches), accumulates it
//! into a camera path, smooths the path with a symmetric window, warps each
//! frame against the residual motion, and crops the result to the largest
//! square valid in every warped frame.
//!
//! Video containers, UI and threading are collaborators outside this crate:
//! [`pipeline::stabilize`] is a pure function over an in-memory frame
//! sequence, reporting progress through an injected callback.

pub mod crop;
pub mod error;
pub mod estimator;
pub mod features;
pub mod homography;
pub mod io;
pub mod matching;
pub mod pipeline;
pub mod smoothing;
pub mod tracker;
pub mod types;
pub mod warp;

pub use error::CoreError;
pub use pipeline::{stabilize, stabilize_with_detector};
pub use types::{CropRect, Homography, Stabilized, StabilizeOptions, VideoMetadata};
