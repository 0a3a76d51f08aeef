//! Classification of variants from the delta of Evo2 likelihood scores.
//!
//! A more negative delta means the model finds the variant sequence less likely
//! than the reference, which we read as evidence for a functionally disruptive
//! variant.  The confidence is the distance from the decision threshold in units
//! of the standard deviation of the predicted class, clamped to `[0, 1]`.  It is
//! a heuristic and not a calibrated probability.

use std::path::Path;

use crate::error::{Error, Result};

/// Decision threshold and per-class spread, fit offline by `vareon calibrate`.
#[derive(
    Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize, utoipa::ToSchema,
)]
pub struct CalibrationParameters {
    /// Delta score below which a variant is called pathogenic.
    pub threshold: f64,
    /// Standard deviation of delta scores of loss-of-function variants.
    pub lof_std: f64,
    /// Standard deviation of delta scores of functional / intermediate variants.
    pub func_std: f64,
}

impl Default for CalibrationParameters {
    /// Parameters fit with `evo2_7b` over the first 500 BRCA1 SNVs of Findlay et al. (2018).
    fn default() -> Self {
        Self {
            threshold: -0.0009178519,
            lof_std: 0.0015140239,
            func_std: 0.0009016589,
        }
    }
}

impl CalibrationParameters {
    /// Load parameters from a JSON file as written by `vareon calibrate`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let reader = crate::common::io::open_read_maybe_gz(path.as_ref())?;
        let params: Self = serde_json::from_reader(reader)?;
        params.validate()?;
        Ok(params)
    }

    /// Check that the threshold is finite.
    ///
    /// Degenerate standard deviations are accepted, see [`classify`].
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() {
            return Err(Error::Calibration(format!(
                "threshold must be finite, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// The predicted class of a variant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
    utoipa::ToSchema,
)]
pub enum Prediction {
    #[strum(serialize = "Likely Pathogenic")]
    #[serde(rename = "Likely Pathogenic")]
    LikelyPathogenic,
    #[strum(serialize = "Likely Benign")]
    #[serde(rename = "Likely Benign")]
    LikelyBenign,
}

/// Result of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Classification {
    /// Variant score minus reference score.
    pub delta_score: f64,
    pub prediction: Prediction,
    /// Heuristic confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Classify a variant from its reference and variant scores.
///
/// A delta exactly at the threshold is called `LikelyBenign`.  With a zero,
/// negative or non-finite standard deviation the confidence is `1.0` for any
/// non-zero distance from the threshold and `0.0` at the threshold.
pub fn classify(
    reference_score: f64,
    variant_score: f64,
    params: &CalibrationParameters,
) -> Classification {
    let delta_score = variant_score - reference_score;
    let (prediction, std) = if delta_score < params.threshold {
        (Prediction::LikelyPathogenic, params.lof_std)
    } else {
        (Prediction::LikelyBenign, params.func_std)
    };

    Classification {
        delta_score,
        prediction,
        confidence: confidence((delta_score - params.threshold).abs(), std),
    }
}

fn confidence(distance: f64, std: f64) -> f64 {
    if distance.is_nan() {
        0.0
    } else if std > 0.0 && std.is_finite() {
        (distance / std).min(1.0)
    } else if distance > 0.0 {
        1.0
    } else {
        0.0
    }
}
