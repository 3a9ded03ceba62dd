//! Global configuration constants for the spam classifier.
//!
//! All hyper-parameters, input validation limits, artifact locations, and server
//! defaults are defined here. These are compile-time constants; runtime
//! configuration is handled via CLI arguments and environment variables in the
//! binaries.

/// Smallest n-gram length extracted by the counting stage (unigrams).
pub const NGRAM_MIN: usize = 1;

/// Largest n-gram length extracted by the counting stage (bigrams).
pub const NGRAM_MAX: usize = 2;

/// Minimum number of training documents an n-gram must appear in.
///
/// Absolute count. N-grams seen in fewer documents are dropped from the vocabulary.
pub const MIN_DF: usize = 2;

/// Maximum share of training documents an n-gram may appear in.
///
/// Proportion in `(0, 1]`. An n-gram is kept when `df <= MAX_DF * n_docs`.
pub const MAX_DF: f64 = 0.8;

/// Maximum vocabulary size after document-frequency pruning.
///
/// Surviving n-grams are ranked by total corpus frequency and the top entries kept.
pub const MAX_FEATURES: usize = 5000;

/// Share of the dataset held out for evaluation.
pub const TEST_SIZE: f64 = 0.2;

/// Seed for the stratified train/test shuffle.
pub const RANDOM_STATE: u64 = 42;

/// Iteration cap for the logistic regression optimizer.
pub const MAX_ITER: usize = 1000;

/// Inverse L2 regularization strength (`C`) of the logistic regression.
///
/// Smaller values mean stronger regularization. Standard value is 1.0.
pub const INVERSE_REGULARIZATION: f64 = 1.0;

/// Convergence tolerance on the max-abs gradient component.
pub const TOLERANCE: f64 = 1e-4;

/// Number of correction pairs kept by L-BFGS.
///
/// Typical range: 5–20. Default: 10.
pub const LBFGS_HISTORY: usize = 10;

/// Maximum backtracking steps per L-BFGS line search.
pub const LINE_SEARCH_MAX_STEPS: usize = 50;

/// Default location of the persisted classifier.
pub const DEFAULT_MODEL_PATH: &str = "models/spam_model.bin";

/// Default location of the persisted vectorizer pipeline (count + TF-IDF stages).
pub const DEFAULT_VECTORIZER_PATH: &str = "models/vectorizer.bin";

/// Default location of the language-filtered training dataset.
pub const DEFAULT_DATASET_PATH: &str = "dataset_french.csv";

/// Default location of the raw multilingual dataset.
pub const DEFAULT_RAW_DATASET_PATH: &str = "dataset_raw.csv";

/// Value of the `lang` column kept by the language filter.
pub const DEFAULT_LANGUAGE: &str = "french";

/// Default HTTP server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default directory holding the static landing page.
pub const DEFAULT_STATIC_DIR: &str = "web";

/// Maximum length of a message in bytes.
pub const MAX_TEXT_LEN: usize = 100_000;

/// Maximum number of messages per batch prediction request.
pub const MAX_BATCH_SIZE: usize = 1_000;

/// Maximum HTTP request body size in bytes (10 MB).
pub const MAX_REQUEST_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Per-request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Global rate limit in requests per second.
pub const RATE_LIMIT_RPS: u64 = 200;

/// Maximum number of concurrent in-flight requests.
pub const MAX_CONCURRENT_REQUESTS: usize = 512;

/// Default graceful shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;
