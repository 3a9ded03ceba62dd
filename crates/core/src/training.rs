//! Offline training workflow.
//!
//! One run walks the stages of [`TrainingStage`] in order, with no retries:
//! load the dataset, split it, fit the vectorizer on the train texts,
//! transform both sides, fit the classifier, evaluate on the test side, and
//! persist the artifact pair. Nothing is written before the final stage, so a
//! failed run leaves any previously persisted pair untouched.

use crate::classifier::{LogisticModel, LogisticRegression};
use crate::config;
use crate::dataset::{self, Label, LabelDistribution, LabeledMessage};
use crate::error::Result;
use crate::evaluation::{self, Evaluation};
use crate::storage::{self, ArtifactPaths};
use crate::vectorize::{FittedVectorizer, Vectorizer, VectorizerConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Training hyper-parameters.
#[derive(Debug, Clone)]
pub struct TrainingOptions {
    pub vectorizer: VectorizerConfig,
    pub classifier: LogisticRegression,
    /// Share of rows held out for evaluation.
    pub test_size: f64,
    /// Split seed.
    pub seed: u64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            vectorizer: VectorizerConfig::default(),
            classifier: LogisticRegression::default(),
            test_size: config::TEST_SIZE,
            seed: config::RANDOM_STATE,
        }
    }
}

/// Workflow stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum TrainingStage {
    Loaded,
    Split,
    VectorizerFitted,
    FeaturesTransformed,
    ModelFitted,
    Evaluated,
    Persisted,
}

/// Summary of a training run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub dataset: LabelDistribution,
    pub train_size: usize,
    pub test_size: usize,
    pub n_features: usize,
    pub iterations: usize,
    pub converged: bool,
    /// `None` when evaluation failed; the artifacts are still produced.
    pub evaluation: Option<Evaluation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vectorizer_path: Option<PathBuf>,
}

/// A fitted artifact pair, not yet persisted.
#[derive(Debug, Clone)]
pub struct TrainedPipeline {
    pub model: LogisticModel,
    pub vectorizer: FittedVectorizer,
    pub report: TrainingReport,
}

fn enter(stage: TrainingStage) {
    tracing::info!(stage = ?stage, "Training stage reached");
}

/// Runs every stage except loading and persistence.
pub fn train(messages: &[LabeledMessage], options: &TrainingOptions) -> Result<TrainedPipeline> {
    let distribution = LabelDistribution::of(messages.iter().map(|m| &m.label));
    tracing::info!(
        total = distribution.total(),
        spam = distribution.spam,
        ham = distribution.ham,
        "Dataset label distribution"
    );

    let split = dataset::stratified_split(messages, options.test_size, options.seed)?;
    enter(TrainingStage::Split);
    tracing::info!(
        train = split.train.len(),
        test = split.test.len(),
        seed = options.seed,
        "Stratified train/test split"
    );

    let train_texts: Vec<&str> = split.train.iter().map(|m| m.text.as_str()).collect();
    let train_labels: Vec<Label> = split.train.iter().map(|m| m.label).collect();
    let (vectorizer, x_train) =
        Vectorizer::with_config(options.vectorizer.clone()).fit_transform(&train_texts)?;
    enter(TrainingStage::VectorizerFitted);
    tracing::info!(features = vectorizer.n_features(), "Vocabulary built");

    let test_texts: Vec<&str> = split.test.iter().map(|m| m.text.as_str()).collect();
    let x_test = vectorizer.transform(&test_texts)?;
    enter(TrainingStage::FeaturesTransformed);

    let model = options.classifier.fit(&x_train, &train_labels)?;
    enter(TrainingStage::ModelFitted);

    let evaluation = match evaluate_model(&model, &x_test, &split.test) {
        Ok(e) => {
            enter(TrainingStage::Evaluated);
            tracing::info!(
                accuracy = e.accuracy,
                precision = e.precision,
                recall = e.recall,
                f1 = e.f1,
                tn = e.confusion.tn,
                fp = e.confusion.fp,
                fn_ = e.confusion.fn_,
                tp = e.confusion.tp,
                "Held-out evaluation"
            );
            Some(e)
        }
        Err(e) => {
            tracing::warn!("Evaluation failed, continuing without metrics: {}", e);
            None
        }
    };

    let report = TrainingReport {
        dataset: distribution,
        train_size: split.train.len(),
        test_size: split.test.len(),
        n_features: vectorizer.n_features(),
        iterations: model.iterations(),
        converged: model.converged(),
        evaluation,
        model_path: None,
        vectorizer_path: None,
    };
    Ok(TrainedPipeline {
        model,
        vectorizer,
        report,
    })
}

fn evaluate_model(
    model: &LogisticModel,
    x_test: &[crate::vectorize::SparseVector],
    test: &[LabeledMessage],
) -> Result<Evaluation> {
    let y_pred = x_test
        .iter()
        .map(|row| model.predict(row))
        .collect::<Result<Vec<_>>>()?;
    let y_true: Vec<Label> = test.iter().map(|m| m.label).collect();
    evaluation::evaluate(&y_true, &y_pred)
}

/// Full workflow: load `dataset_path`, train, and persist to `paths`.
pub fn run_training(
    dataset_path: &Path,
    paths: &ArtifactPaths,
    options: &TrainingOptions,
) -> Result<TrainingReport> {
    let messages = dataset::load_dataset(dataset_path)?;
    enter(TrainingStage::Loaded);

    let TrainedPipeline {
        model,
        vectorizer,
        mut report,
    } = train(&messages, options)?;

    storage::save_artifacts(paths, &model, &vectorizer)?;
    enter(TrainingStage::Persisted);

    report.model_path = Some(paths.model.clone());
    report.vectorizer_path = Some(paths.vectorizer.clone());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpamError;
    use std::fs;
    use tempfile::TempDir;

    const SPAM: &[&str] = &[
        "Gagnez de l'argent gratuit maintenant",
        "Argent gratuit pour vous, cliquez ici",
        "Offre gratuite : gagnez un iPhone gratuit",
        "Cadeau gratuit, réclamez votre argent maintenant",
        "Gagnez argent facile et rapide",
        "Crédit gratuit, argent immédiat",
        "Vous avez gagné de l'argent, cliquez ici",
        "Promotion exceptionnelle : argent gratuit",
        "Gagnez un voyage gratuit maintenant",
        "Argent gratuit sans effort, cliquez",
        "Bonus gratuit : gagnez maintenant",
        "Recevez de l'argent gratuit aujourd'hui",
        "Gagnez des cadeaux gratuits, cliquez ici",
        "Loterie : argent gratuit à gagner",
        "Offre limitée, argent gratuit maintenant",
    ];

    const HAM: &[&str] = &[
        "Salut, on se voit demain ?",
        "Salut, tu viens demain au café ?",
        "On se voit demain soir chez Paul",
        "Merci pour hier, à demain",
        "Salut, je suis en retard, on se voit demain",
        "Tu peux m'appeler demain matin ?",
        "Salut Marie, réunion demain à midi",
        "On voit ça demain au bureau",
        "Salut, bon anniversaire !",
        "Je te rappelle demain, bisous",
        "Salut, le dîner est prêt",
        "Rendez-vous demain devant la gare",
        "Salut, tu as vu le match hier ?",
        "On se voit samedi pour le film",
        "Salut, demain je passe te voir",
    ];

    fn corpus() -> Vec<LabeledMessage> {
        SPAM.iter()
            .map(|t| LabeledMessage::new(*t, Label::Spam))
            .chain(HAM.iter().map(|t| LabeledMessage::new(*t, Label::Ham)))
            .collect()
    }

    fn write_csv(path: &Path, messages: &[LabeledMessage]) {
        let mut writer = csv::Writer::from_path(path).unwrap();
        writer.write_record(["text", "labels"]).unwrap();
        for m in messages {
            writer
                .write_record([m.text.as_str(), m.label.to_string().as_str()])
                .unwrap();
        }
        writer.flush().unwrap();
    }

    #[test]
    fn test_train_end_to_end() {
        let trained = train(&corpus(), &TrainingOptions::default()).unwrap();
        assert_eq!(trained.report.test_size, 6);
        assert_eq!(trained.report.train_size, 24);
        assert_eq!(trained.report.dataset, LabelDistribution { spam: 15, ham: 15 });
        assert!(trained.vectorizer.vocabulary().contains("argent"));
        assert!(trained.vectorizer.vocabulary().contains("gratuit"));
        assert!(trained.report.evaluation.is_some());

        let predict = |text: &str| {
            let x = trained.vectorizer.transform_one(text).unwrap();
            trained.model.predict(&x).unwrap()
        };
        assert_eq!(predict("Gagnez de l'argent gratuit maintenant"), Label::Spam);
        assert_eq!(predict("Salut, on se voit demain ?"), Label::Ham);
    }

    #[test]
    fn test_training_is_reproducible() {
        let a = train(&corpus(), &TrainingOptions::default()).unwrap();
        let b = train(&corpus(), &TrainingOptions::default()).unwrap();
        assert_eq!(a.model, b.model);
        assert_eq!(a.vectorizer, b.vectorizer);
        assert_eq!(a.report, b.report);
    }

    #[test]
    fn test_run_training_persists_pair() {
        let dir = TempDir::new().unwrap();
        let dataset = dir.path().join("dataset_french.csv");
        write_csv(&dataset, &corpus());
        let paths = ArtifactPaths::in_dir(&dir.path().join("models"));

        let report = run_training(&dataset, &paths, &TrainingOptions::default()).unwrap();
        assert_eq!(report.model_path.as_deref(), Some(paths.model.as_path()));
        let (model, vectorizer) = storage::load_artifacts(&paths).unwrap();
        assert_eq!(model.n_features(), report.n_features);
        assert_eq!(vectorizer.n_features(), report.n_features);
    }

    #[test]
    fn test_dataset_error_keeps_previous_artifacts() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.csv");
        write_csv(&good, &corpus());
        let paths = ArtifactPaths::in_dir(dir.path());
        run_training(&good, &paths, &TrainingOptions::default()).unwrap();
        let before = fs::read(&paths.model).unwrap();

        let bad = dir.path().join("bad.csv");
        fs::write(&bad, "text,lang\nbonjour,french\n").unwrap();
        let err = run_training(&bad, &paths, &TrainingOptions::default()).unwrap_err();
        assert!(matches!(err, SpamError::MissingColumn(_)));
        assert_eq!(fs::read(&paths.model).unwrap(), before);

        let missing = run_training(&dir.path().join("nope.csv"), &paths, &TrainingOptions::default());
        assert!(missing.is_err());
        assert_eq!(fs::read(&paths.model).unwrap(), before);
    }

    #[test]
    fn test_single_class_dataset_fails() {
        let only_ham: Vec<_> = HAM.iter().map(|t| LabeledMessage::new(*t, Label::Ham)).collect();
        assert!(train(&only_ham, &TrainingOptions::default()).is_err());
    }

    #[test]
    fn test_stages_are_ordered() {
        assert!(TrainingStage::Loaded < TrainingStage::Split);
        assert!(TrainingStage::Evaluated < TrainingStage::Persisted);
    }
}
