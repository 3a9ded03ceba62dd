//! TF-IDF stage: smoothed inverse document frequency and L2 row normalisation.
//!
//! `idf(t) = ln((1 + n) / (1 + df(t))) + 1`, where `n` is the number of
//! training documents. Transformed rows are `tf * idf` scaled to unit length.

use crate::error::{Result, SpamError};
use crate::vectorize::sparse::SparseVector;
use serde::{Deserialize, Serialize};

/// Fitted TF-IDF stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfStage {
    idf: Vec<f64>,
}

impl TfidfStage {
    /// Learns IDF weights from the count rows of the training corpus.
    pub(crate) fn fit(counts: &[SparseVector], n_features: usize) -> Result<Self> {
        let mut df = vec![0usize; n_features];
        for row in counts {
            if row.dim() != n_features {
                return Err(SpamError::vectorizer(format!(
                    "count row has {} features, expected {}",
                    row.dim(),
                    n_features
                )));
            }
            for (i, v) in row.iter() {
                if v > 0.0 {
                    df[i as usize] += 1;
                }
            }
        }
        let n = counts.len() as f64;
        let idf = df
            .into_iter()
            .map(|d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();
        Ok(Self { idf })
    }

    /// Creates a stage from known IDF weights.
    pub fn from_idf(idf: Vec<f64>) -> Result<Self> {
        let stage = Self { idf };
        stage.validate()?;
        Ok(stage)
    }

    /// Reweights one count row.
    pub fn transform(&self, mut counts: SparseVector) -> Result<SparseVector> {
        if counts.dim() != self.idf.len() {
            return Err(SpamError::vectorizer(format!(
                "count row has {} features, expected {}",
                counts.dim(),
                self.idf.len()
            )));
        }
        counts.scale_each(|i| self.idf[i as usize]);
        counts.l2_normalize();
        if counts.values().iter().any(|v| !v.is_finite()) {
            return Err(SpamError::vectorizer("non-finite TF-IDF weight"));
        }
        Ok(counts)
    }

    /// IDF weight per feature index.
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.idf.len()
    }

    /// Returns `true` if the stage has no features.
    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    /// Every smoothed IDF weight is finite and at least 1.
    pub(crate) fn validate(&self) -> Result<()> {
        if let Some((i, w)) = self
            .idf
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 1.0)
        {
            return Err(SpamError::vectorizer(format!(
                "invalid IDF weight {} at feature {}",
                w, i
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<SparseVector> {
        vec![
            SparseVector::from_dense(&[1.0, 1.0, 0.0]),
            SparseVector::from_dense(&[2.0, 0.0, 0.0]),
            SparseVector::from_dense(&[1.0, 0.0, 1.0]),
        ]
    }

    #[test]
    fn test_fit_smoothed_idf() {
        let stage = TfidfStage::fit(&rows(), 3).unwrap();
        let idf = stage.idf();
        // df = [3, 1, 1], n = 3
        assert!((idf[0] - 1.0).abs() < 1e-12);
        assert!((idf[1] - ((4.0f64 / 2.0).ln() + 1.0)).abs() < 1e-12);
        assert_eq!(idf[1], idf[2]);
    }

    #[test]
    fn test_transform_is_unit_length() {
        let stage = TfidfStage::fit(&rows(), 3).unwrap();
        let out = stage.transform(rows()[0].clone()).unwrap();
        assert!((out.norm() - 1.0).abs() < 1e-12);
        // The rarer term outweighs the ubiquitous one.
        assert!(out.get(1) > out.get(0));
    }

    #[test]
    fn test_transform_zero_row_stays_zero() {
        let stage = TfidfStage::fit(&rows(), 3).unwrap();
        let out = stage.transform(SparseVector::zeros(3)).unwrap();
        assert!(out.is_zero());
        assert_eq!(out.dim(), 3);
    }

    #[test]
    fn test_transform_rejects_wrong_dimension() {
        let stage = TfidfStage::fit(&rows(), 3).unwrap();
        assert!(stage.transform(SparseVector::zeros(2)).is_err());
    }

    #[test]
    fn test_from_idf_validates() {
        assert!(TfidfStage::from_idf(vec![1.0, 2.5]).is_ok());
        assert!(TfidfStage::from_idf(vec![0.5]).is_err());
        assert!(TfidfStage::from_idf(vec![f64::NAN]).is_err());
    }
}
