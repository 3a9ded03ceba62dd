//! Prediction runtime.
//!
//! [`SpamDetector::load`] never fails: if the artifact pair cannot be loaded
//! the detector is built in degraded mode and every prediction carries the
//! load error instead of a score. Once loaded, the model and vectorizer are
//! only read, so one detector can serve concurrent callers behind an `Arc`.

use crate::classifier::LogisticModel;
use crate::config;
use crate::error::{Result, SpamError};
use crate::storage::{self, ArtifactPaths};
use crate::vectorize::FittedVectorizer;
use serde::{Deserialize, Serialize};

/// Error reported by every prediction of a degraded detector.
pub const MODEL_NOT_LOADED: &str = "Model not loaded";

/// Result of one prediction: the input text plus either scores or an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub message: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Either the full score fields or the error field, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    Scored {
        is_spam: bool,
        /// `"SPAM"` or `"HAM"`.
        label: String,
        /// Probability of the predicted class.
        confidence: f64,
        confidence_percent: f64,
        spam_probability: f64,
        ham_probability: f64,
    },
    Failed {
        /// Always `null`.
        is_spam: Option<bool>,
        confidence: Option<f64>,
        confidence_percent: Option<f64>,
        error: String,
    },
}

impl Prediction {
    fn failed(message: &str, error: impl Into<String>) -> Self {
        Self {
            message: message.to_string(),
            outcome: Outcome::Failed {
                is_spam: None,
                confidence: None,
                confidence_percent: None,
                error: error.into(),
            },
        }
    }

    /// `Some(verdict)` for a scored prediction.
    pub fn is_spam(&self) -> Option<bool> {
        match &self.outcome {
            Outcome::Scored { is_spam, .. } => Some(*is_spam),
            Outcome::Failed { .. } => None,
        }
    }

    /// `"SPAM"` / `"HAM"` for a scored prediction.
    pub fn label(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Scored { label, .. } => Some(label),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match &self.outcome {
            Outcome::Scored { confidence, .. } => Some(*confidence),
            Outcome::Failed { .. } => None,
        }
    }

    /// The error message of a failed prediction.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Scored { .. } => None,
            Outcome::Failed { error, .. } => Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error().is_some()
    }
}

#[derive(Debug)]
struct Artifacts {
    model: LogisticModel,
    vectorizer: FittedVectorizer,
}

/// Loads the artifact pair once and scores messages with it.
#[derive(Debug)]
pub struct SpamDetector {
    artifacts: Option<Artifacts>,
    load_error: Option<String>,
}

impl SpamDetector {
    /// Load the artifact pair, falling back to degraded mode on any failure.
    pub fn load(paths: &ArtifactPaths) -> Self {
        match storage::load_artifacts(paths) {
            Ok((model, vectorizer)) => Self {
                artifacts: Some(Artifacts { model, vectorizer }),
                load_error: None,
            },
            Err(e) => {
                tracing::warn!("Artifacts unavailable, running degraded: {}", e);
                Self::degraded(e.to_string())
            }
        }
    }

    /// Build a detector from an in-memory pair.
    pub fn from_parts(model: LogisticModel, vectorizer: FittedVectorizer) -> Result<Self> {
        if model.n_features() != vectorizer.n_features() {
            return Err(SpamError::ArtifactMismatch(format!(
                "model expects {} features, vectorizer produces {}",
                model.n_features(),
                vectorizer.n_features()
            )));
        }
        Ok(Self {
            artifacts: Some(Artifacts { model, vectorizer }),
            load_error: None,
        })
    }

    /// A detector with no artifacts.
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            artifacts: None,
            load_error: Some(reason.into()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.artifacts.is_some()
    }

    /// Why loading failed, when degraded.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Vocabulary size of the loaded vectorizer.
    pub fn vocabulary_size(&self) -> Option<usize> {
        self.artifacts.as_ref().map(|a| a.vectorizer.n_features())
    }

    /// Score one message. Never panics on any input; failures are returned
    /// as an error-shaped [`Prediction`].
    pub fn predict(&self, text: &str) -> Prediction {
        let Some(artifacts) = &self.artifacts else {
            return Prediction::failed(text, MODEL_NOT_LOADED);
        };
        match Self::score(artifacts, text) {
            Ok(prediction) => prediction,
            Err(e) => {
                tracing::debug!("Prediction failed: {}", e);
                Prediction::failed(text, e.to_string())
            }
        }
    }

    /// Score each message independently, preserving order.
    pub fn batch_predict<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Prediction> {
        texts.iter().map(|t| self.predict(t.as_ref())).collect()
    }

    fn score(artifacts: &Artifacts, text: &str) -> Result<Prediction> {
        if text.trim().is_empty() {
            return Err(SpamError::Input("Text is empty".into()));
        }
        if text.len() > config::MAX_TEXT_LEN {
            return Err(SpamError::Input(format!(
                "Text exceeds maximum length of {} bytes",
                config::MAX_TEXT_LEN
            )));
        }
        let features = artifacts.vectorizer.transform_one(text)?;
        let probabilities = artifacts.model.predict_proba(&features)?;
        let label = probabilities.predicted();
        let confidence = probabilities.confidence();
        Ok(Prediction {
            message: text.to_string(),
            outcome: Outcome::Scored {
                is_spam: label.is_spam(),
                label: label.as_upper().to_string(),
                confidence,
                confidence_percent: confidence * 100.0,
                spam_probability: probabilities.spam,
                ham_probability: probabilities.ham,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorize::Vectorizer;
    use tempfile::TempDir;

    /// A pair with hand-set weights: `argent` and `gratuit` push toward spam,
    /// `salut`, `demain` and `voit` toward ham.
    fn detector() -> SpamDetector {
        let docs = [
            "argent gratuit",
            "argent gratuit gagnez",
            "salut demain voit",
            "salut demain voit ce soir",
            "merci beaucoup",
            "merci beaucoup ami",
        ];
        let vectorizer = Vectorizer::new().fit(&docs).unwrap();
        let vocab = vectorizer.vocabulary();
        let mut weights = vec![0.0; vectorizer.n_features()];
        for (term, w) in [
            ("argent", 4.0),
            ("gratuit", 4.0),
            ("salut", -4.0),
            ("demain", -4.0),
            ("voit", -4.0),
        ] {
            weights[vocab.get(term).unwrap() as usize] = w;
        }
        SpamDetector::from_parts(LogisticModel::from_parts(weights, -0.1), vectorizer).unwrap()
    }

    fn probabilities(p: &Prediction) -> (f64, f64) {
        match p.outcome {
            Outcome::Scored {
                spam_probability,
                ham_probability,
                ..
            } => (spam_probability, ham_probability),
            Outcome::Failed { .. } => panic!("expected a scored prediction: {:?}", p),
        }
    }

    #[test]
    fn test_end_to_end_labels() {
        let d = detector();
        let spam = d.predict("Gagnez de l'argent gratuit maintenant");
        assert_eq!(spam.is_spam(), Some(true));
        assert_eq!(spam.label(), Some("SPAM"));

        let ham = d.predict("Salut, on se voit demain ?");
        assert_eq!(ham.is_spam(), Some(false));
        assert_eq!(ham.label(), Some("HAM"));
    }

    #[test]
    fn test_prediction_invariants() {
        let d = detector();
        for text in ["argent gratuit", "salut demain", "merci beaucoup", "xyz abc"] {
            let p = d.predict(text);
            let (spam, ham) = probabilities(&p);
            assert!((spam + ham - 1.0).abs() < 1e-6);
            let confidence = p.confidence().unwrap();
            assert!((0.0..=1.0).contains(&confidence));
            assert_eq!(p.is_spam(), Some(spam > ham));
            let expected = if spam > ham { spam } else { ham };
            assert_eq!(confidence, expected);
        }
    }

    #[test]
    fn test_predict_is_deterministic() {
        let d = detector();
        assert_eq!(d.predict("argent gratuit demain"), d.predict("argent gratuit demain"));
    }

    #[test]
    fn test_out_of_vocabulary_uses_intercept() {
        let d = detector();
        let p = d.predict("zèbre xylophone quantique");
        assert!(!p.is_error());
        assert_eq!(p.label(), Some("HAM"));
    }

    #[test]
    fn test_degraded_mode() {
        let dir = TempDir::new().unwrap();
        let d = SpamDetector::load(&ArtifactPaths::in_dir(&dir.path().join("missing")));
        assert!(!d.is_loaded());
        assert!(d.load_error().is_some());
        assert_eq!(d.vocabulary_size(), None);

        let p = d.predict("argent gratuit");
        assert_eq!(p.is_spam(), None);
        assert_eq!(p.error(), Some(MODEL_NOT_LOADED));
        let json = serde_json::to_value(&p).unwrap();
        assert!(json["is_spam"].is_null());
        assert!(json["confidence"].is_null());
        assert_eq!(json["message"], "argent gratuit");
    }

    #[test]
    fn test_batch_independence() {
        let d = detector();
        let results = d.batch_predict(&["valid text", ""]);
        assert_eq!(results.len(), 2);
        assert!(!results[0].is_error());
        assert!(results[1].is_error());
        assert_eq!(results[0], d.predict("valid text"));
    }

    #[test]
    fn test_oversized_text_is_rejected() {
        let d = detector();
        let text = "a".repeat(config::MAX_TEXT_LEN + 1);
        assert!(d.predict(&text).is_error());
    }

    #[test]
    fn test_scored_json_shape() {
        let json = serde_json::to_value(detector().predict("argent gratuit")).unwrap();
        for key in [
            "message",
            "is_spam",
            "label",
            "confidence",
            "confidence_percent",
            "spam_probability",
            "ham_probability",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json.get("error").is_none());
        assert_eq!(json["label"], "SPAM");
    }

    #[test]
    fn test_load_from_disk() {
        let dir = TempDir::new().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        let d = detector();
        let artifacts = d.artifacts.as_ref().unwrap();
        storage::save_artifacts(&paths, &artifacts.model, &artifacts.vectorizer).unwrap();

        let loaded = SpamDetector::load(&paths);
        assert!(loaded.is_loaded());
        assert_eq!(loaded.vocabulary_size(), d.vocabulary_size());
        assert_eq!(loaded.predict("argent gratuit"), d.predict("argent gratuit"));
    }

    #[test]
    fn test_from_parts_rejects_mismatch() {
        let vectorizer = Vectorizer::new()
            .fit(&[
                "argent gratuit",
                "argent gratuit",
                "salut demain",
                "salut demain",
                "merci ami",
                "merci ami",
            ])
            .unwrap();
        let model = LogisticModel::from_parts(vec![0.0; vectorizer.n_features() + 2], 0.0);
        assert!(SpamDetector::from_parts(model, vectorizer).is_err());
    }
}
