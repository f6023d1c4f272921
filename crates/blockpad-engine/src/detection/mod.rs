//! Language auto-detection for blocks marked `-a`.
//!
//! - **`classifier`**: the heuristic scorer behind the `Classifier` trait
//! - **`worker`**: the background classifier thread and its request protocol
//! - **`distance`**: bounded edit distance used to gate re-detection
//! - **`pipeline`**: `AutoDetector`, the per-block state machine that decides
//!   when to ask and whether an answer still applies

pub mod classifier;
pub mod distance;
pub mod pipeline;
pub mod worker;

pub use classifier::{Classification, Classifier, HeuristicClassifier};
pub use pipeline::{AutoDetector, DetectionSample, DetectionSettings, DetectionStats, Phase};
pub use worker::{
    ClassifierWorker, DetectionBackend, DetectionRequest, DetectionResponse, GlobalWorker,
    QueuedBackend,
};
