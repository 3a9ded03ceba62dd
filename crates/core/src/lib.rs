//! # spamfr-core
//!
//! French-language spam classification: a regex word tokenizer, a French
//! stop-word set, a two-stage bag-of-n-grams + TF-IDF vectorizer, a
//! class-balanced logistic regression, the offline training workflow, and the
//! prediction runtime that serves the persisted artifact pair.
//!
//! This is the core library crate with zero async dependencies. The HTTP
//! boundary lives in `spamfr-server`, the offline CLI in `spamfr-train`.

/// Logistic regression classifier and the L-BFGS optimizer that fits it.
pub mod classifier;
/// Global configuration constants: hyper-parameters, paths, limits, and defaults.
pub mod config;
/// Labeled datasets: CSV loading, language filtering, and stratified splitting.
pub mod dataset;
/// Prediction runtime: artifact loading, degraded mode, and prediction results.
pub mod detector;
/// Error taxonomy shared by training, persistence, and prediction.
pub mod error;
/// Binary classification metrics and confusion counts.
pub mod evaluation;
/// Artifact persistence: bincode payloads with CRC32 footers, written as a matched pair.
pub mod storage;
/// Tokenizer and French stop words.
pub mod text;
/// Offline training workflow: load, split, fit, evaluate, persist.
pub mod training;
/// Vectorization pipeline: n-gram counting stage followed by TF-IDF stage.
pub mod vectorize;

pub use classifier::{LogisticModel, LogisticRegression};
pub use dataset::{Label, LabeledMessage};
pub use detector::{Prediction, SpamDetector};
pub use error::{Result, SpamError};
pub use training::{TrainingOptions, TrainingReport};
pub use vectorize::{FittedVectorizer, Vectorizer};
