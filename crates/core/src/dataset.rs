//! Labeled message datasets.
//!
//! Training data is a CSV file with a header row containing at least `text`
//! and `labels` columns (`spam` / `ham`). The raw multilingual export also
//! carries a `lang` column, consumed only by [`filter_language`].

use crate::error::{Result, SpamError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use std::str::FromStr;

/// Binary message category. Numeric encoding: `ham = 0`, `spam = 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// Legitimate message (class 0).
    Ham,
    /// Spam message (class 1).
    Spam,
}

impl Label {
    /// Numeric class: `0` for ham, `1` for spam.
    pub fn as_class(self) -> u8 {
        match self {
            Label::Ham => 0,
            Label::Spam => 1,
        }
    }

    /// Returns `true` for [`Label::Spam`].
    pub fn is_spam(self) -> bool {
        self == Label::Spam
    }

    /// Upper-case display label used in prediction results.
    pub fn as_upper(self) -> &'static str {
        match self {
            Label::Ham => "HAM",
            Label::Spam => "SPAM",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Label::Ham => "ham",
            Label::Spam => "spam",
        })
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spam" => Ok(Label::Spam),
            "ham" => Ok(Label::Ham),
            other => Err(other.to_string()),
        }
    }
}

/// One training row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledMessage {
    /// Raw message text.
    pub text: String,
    /// Its category.
    pub label: Label,
}

impl LabeledMessage {
    /// Creates a labeled message.
    pub fn new(text: impl Into<String>, label: Label) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// Spam/ham counts of a set of messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDistribution {
    pub spam: usize,
    pub ham: usize,
}

impl LabelDistribution {
    /// Counts the labels in `labels`.
    pub fn of<'a, I: IntoIterator<Item = &'a Label>>(labels: I) -> Self {
        labels
            .into_iter()
            .fold(Self::default(), |mut acc, label| {
                match label {
                    Label::Spam => acc.spam += 1,
                    Label::Ham => acc.ham += 1,
                }
                acc
            })
    }

    /// Total number of messages.
    pub fn total(&self) -> usize {
        self.spam + self.ham
    }
}

/// Load a labeled dataset from a CSV file.
pub fn load_dataset(path: &Path) -> Result<Vec<LabeledMessage>> {
    let file = File::open(path).map_err(|e| {
        SpamError::Io(io::Error::new(
            e.kind(),
            format!("cannot open dataset {:?}: {}", path, e),
        ))
    })?;
    let messages = read_dataset(file)?;
    tracing::info!(
        "Loaded {} messages from {:?}",
        messages.len(),
        path
    );
    Ok(messages)
}

/// Read a labeled dataset from any CSV source with `text` and `labels` columns.
pub fn read_dataset<R: io::Read>(reader: R) -> Result<Vec<LabeledMessage>> {
    let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv.headers()?.clone();
    let text_col = column_index(&headers, "text")?;
    let label_col = column_index(&headers, "labels")?;

    let mut messages = Vec::new();
    for (i, record) in csv.records().enumerate() {
        let record = record?;
        // Row numbers are 1-based and count the header line.
        let row = i + 2;
        let raw_label = record.get(label_col).unwrap_or_default();
        let label = raw_label.parse::<Label>().map_err(|value| SpamError::InvalidLabel {
            row,
            value: if value.is_empty() {
                raw_label.to_string()
            } else {
                value
            },
        })?;
        let text = record.get(text_col).unwrap_or_default().to_string();
        messages.push(LabeledMessage { text, label });
    }
    if messages.is_empty() {
        return Err(SpamError::dataset("dataset contains no rows"));
    }
    Ok(messages)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| SpamError::MissingColumn(name.to_string()))
}

/// Outcome of a language filtering pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    /// Rows read from the raw dataset.
    pub total: usize,
    /// Rows whose `lang` matched.
    pub kept: usize,
    /// Label distribution of the kept rows.
    pub distribution: LabelDistribution,
}

/// Keep the rows of `input` whose `lang` column equals `language`, writing
/// their `text` and `labels` to `output`.
pub fn filter_language(input: &Path, output: &Path, language: &str) -> Result<FilterReport> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(input)?;
    let headers = reader.headers()?.clone();
    let text_col = column_index(&headers, "text")?;
    let label_col = column_index(&headers, "labels")?;
    let lang_col = column_index(&headers, "lang")?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record(["text", "labels"])?;

    let mut total = 0;
    let mut kept = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        total += 1;
        if record.get(lang_col).map(str::trim) != Some(language) {
            continue;
        }
        let raw_label = record.get(label_col).unwrap_or_default();
        let label = raw_label
            .parse::<Label>()
            .map_err(|value| SpamError::InvalidLabel { row: i + 2, value })?;
        writer.write_record([record.get(text_col).unwrap_or_default(), raw_label.trim()])?;
        kept.push(label);
    }
    writer.flush()?;

    let report = FilterReport {
        total,
        kept: kept.len(),
        distribution: LabelDistribution::of(&kept),
    };
    tracing::info!(
        total = report.total,
        kept = report.kept,
        spam = report.distribution.spam,
        ham = report.distribution.ham,
        language,
        "Filtered dataset by language"
    );
    Ok(report)
}

/// A train/test partition of a dataset.
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Vec<LabeledMessage>,
    pub test: Vec<LabeledMessage>,
}

/// Stratified shuffle split.
///
/// `ceil(test_size * n)` rows go to the test side, distributed across classes
/// in proportion to their size (largest remainder). Deterministic for a given
/// `seed` and input order.
pub fn stratified_split(messages: &[LabeledMessage], test_size: f64, seed: u64) -> Result<Split> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(SpamError::dataset(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }
    let n = messages.len();
    let n_test = (test_size * n as f64).ceil() as usize;
    let n_train = n.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(SpamError::dataset(format!(
            "cannot split {} rows with test_size={}",
            n, test_size
        )));
    }

    let mut by_class: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
    for (i, m) in messages.iter().enumerate() {
        by_class[m.label.as_class() as usize].push(i);
    }
    if let Some(smallest) = by_class.iter().map(Vec::len).min().filter(|&c| c < 2) {
        return Err(SpamError::dataset(format!(
            "the least populated class has only {} member(s); each class needs at least 2",
            smallest
        )));
    }
    if n_test < 2 || n_train < 2 {
        return Err(SpamError::dataset(format!(
            "split of {} rows leaves fewer rows than classes on one side",
            n
        )));
    }

    let test_counts = allocate(
        n_test,
        [by_class[0].len(), by_class[1].len()],
        n,
    );

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train_idx = Vec::with_capacity(n_train);
    let mut test_idx = Vec::with_capacity(n_test);
    for (indices, &k) in by_class.iter_mut().zip(&test_counts) {
        indices.shuffle(&mut rng);
        test_idx.extend_from_slice(&indices[..k]);
        train_idx.extend_from_slice(&indices[k..]);
    }
    train_idx.shuffle(&mut rng);
    test_idx.shuffle(&mut rng);

    let pick = |idx: &[usize]| -> Vec<LabeledMessage> {
        idx.iter().map(|&i| messages[i].clone()).collect()
    };
    Ok(Split {
        train: pick(&train_idx),
        test: pick(&test_idx),
    })
}

/// Per-class share of `total` proportional to `class_counts`, by largest
/// remainder. Each class keeps at least one row on both sides; rows moved to
/// satisfy that come from the other class, so the shares always sum to `total`.
fn allocate(total: usize, class_counts: [usize; 2], n: usize) -> [usize; 2] {
    let exact = class_counts.map(|c| total as f64 * c as f64 / n as f64);
    let mut alloc = exact.map(|e| e.floor() as usize);
    let remaining = total.saturating_sub(alloc.iter().sum::<usize>());
    let mut order = [0usize, 1];
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
    });
    for &c in order.iter().take(remaining) {
        alloc[c] += 1;
    }

    // Bounds on class 0 that leave class 1 within [1, count - 1] as well.
    // Non-empty whenever 2 <= total <= n - 2 and both classes have >= 2 rows.
    let [c0, c1] = class_counts;
    let lo = 1.max((total + 1).saturating_sub(c1));
    let hi = (c0 - 1).min(total - 1);
    let first = alloc[0].clamp(lo, hi.max(lo));
    [first, total - first]
}
