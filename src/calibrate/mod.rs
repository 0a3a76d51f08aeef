//! Offline calibration of the decision threshold on labeled BRCA1 SNVs.
//!
//! Every labeled variant is scored against a locally loaded reference chromosome.
//! The threshold is the point on the ROC curve of the negated delta scores that
//! maximizes Youden's J statistic, with loss-of-function variants as positives.

use std::io::Write as _;
use std::path::PathBuf;

use base64::Engine as _;
use indexmap::IndexSet;

use crate::classify::CalibrationParameters;
use crate::common::cli::ScorerArgs;
use crate::common::io::open_write_maybe_gz;
use crate::error::{Error, Result};
use crate::scoring::{LikelihoodScorer, RemoteScorer};
use crate::sequence::{fasta::FastaChromosome, LocalWindow, DEFAULT_WINDOW_SIZE};
use crate::variant::Variant;

pub mod labels;
pub mod plot;
pub mod roc;

use labels::{read_labeled_variants, BinaryClass, LabeledVariant};
use roc::{sample_std, RocCurve};

/// A labeled variant together with its delta score.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoredVariant {
    #[serde(flatten)]
    pub variant: LabeledVariant,
    pub evo2_delta_score: f64,
}

/// Everything produced by a calibration run.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationReport {
    pub variants: Vec<ScoredVariant>,
    /// Base64-encoded PNG strip plot; missing if rendering failed.
    pub plot: Option<String>,
    pub auroc: f64,
    pub parameters: CalibrationParameters,
}

/// Compute the delta score of each labeled variant.
///
/// Identical reference windows are scored only once.  Fails on the first record
/// whose declared reference does not match the chromosome.
pub fn score_variants(
    records: &[LabeledVariant],
    chromosome: &FastaChromosome,
    scorer: &dyn LikelihoodScorer,
    window_size: u64,
) -> Result<Vec<f64>> {
    let mut ref_windows = IndexSet::new();
    let mut ref_indexes = Vec::with_capacity(records.len());
    let mut var_windows = Vec::with_capacity(records.len());

    for record in records {
        if record.position == 0 || record.position as usize > chromosome.len() {
            return Err(Error::Calibration(format!(
                "position {} outside of reference {} of length {}",
                record.position,
                &chromosome.name,
                chromosome.len()
            )));
        }
        let window = LocalWindow::new(chromosome.len(), record.position, window_size);
        let ref_seq = &chromosome.sequence[window.start..window.end];
        let var_seq = Variant {
            reference: record.reference,
            alternative: record.alternative,
            offset: window.offset,
        }
        .apply(ref_seq)?;

        let (idx, _) = ref_windows.insert_full(ref_seq.to_string());
        ref_indexes.push(idx);
        var_windows.push(var_seq);
    }

    let ref_windows = ref_windows.into_iter().collect::<Vec<_>>();
    tracing::info!(
        "Scoring likelihoods of {} reference sequences with Evo 2...",
        ref_windows.len()
    );
    let ref_scores = scorer.score_sequences(&ref_windows)?;
    tracing::info!(
        "Scoring likelihoods of {} variant sequences with Evo 2...",
        var_windows.len()
    );
    let var_scores = scorer.score_sequences(&var_windows)?;
    if ref_scores.len() != ref_windows.len() || var_scores.len() != var_windows.len() {
        return Err(Error::Scorer(format!(
            "expected {} + {} scores, got {} + {}",
            ref_windows.len(),
            var_windows.len(),
            ref_scores.len(),
            var_scores.len()
        )));
    }

    Ok(var_scores
        .iter()
        .zip(ref_indexes.iter())
        .map(|(var_score, idx)| var_score - ref_scores[*idx])
        .collect())
}

/// Fit threshold and per-class spreads; returns the parameters and the AUROC.
///
/// # Errors
///
/// If any delta is not finite, a class has fewer than two members, or the best
/// ROC point is the trivial one at infinity.
pub fn fit_calibration(
    deltas: &[f64],
    classes: &[BinaryClass],
) -> Result<(CalibrationParameters, f64)> {
    if deltas.len() != classes.len() {
        return Err(Error::Calibration(format!(
            "{} delta scores for {} labels",
            deltas.len(),
            classes.len()
        )));
    }
    if let Some(bad) = deltas.iter().find(|d| !d.is_finite()) {
        return Err(Error::Calibration(format!("non-finite delta score {}", bad)));
    }

    let of_class = |class: BinaryClass| {
        deltas
            .iter()
            .zip(classes.iter())
            .filter(|(_, c)| **c == class)
            .map(|(d, _)| *d)
            .collect::<Vec<_>>()
    };
    let std_of = |class: BinaryClass| {
        let values = of_class(class);
        sample_std(&values).ok_or_else(|| {
            Error::Calibration(format!(
                "need at least two {} variants, got {}",
                class,
                values.len()
            ))
        })
    };
    let lof_std = std_of(BinaryClass::Lof)?;
    let func_std = std_of(BinaryClass::FuncInt)?;

    let labels = classes
        .iter()
        .map(|c| *c == BinaryClass::Lof)
        .collect::<Vec<_>>();
    let negated = deltas.iter().map(|d| -d).collect::<Vec<_>>();
    let roc = RocCurve::new(&labels, &negated)
        .ok_or_else(|| Error::Calibration("ROC curve needs both classes".into()))?;

    let threshold = -roc.thresholds[roc.youden_index()];
    if !threshold.is_finite() {
        return Err(Error::Calibration(
            "scores do not separate the classes".into(),
        ));
    }

    Ok((
        CalibrationParameters {
            threshold,
            lof_std,
            func_std,
        },
        roc.auc(),
    ))
}

/// Score the records, fit the parameters and render the plot.
pub fn run_calibration(
    records: &[LabeledVariant],
    chromosome: &FastaChromosome,
    scorer: &dyn LikelihoodScorer,
    window_size: u64,
) -> Result<CalibrationReport> {
    let deltas = score_variants(records, chromosome, scorer, window_size)?;
    let classes = records.iter().map(|r| r.class).collect::<Vec<_>>();

    let (parameters, auroc) = fit_calibration(&deltas, &classes)?;
    tracing::info!("Confidence Parameters: {:?}", &parameters);
    tracing::info!("AUROC: {:.2}", auroc);

    let plot = match plot::render_base64(&deltas, &classes) {
        Ok(plot) => Some(plot),
        Err(e) => {
            tracing::warn!("could not render plot: {}", e);
            None
        }
    };

    let variants = records
        .iter()
        .cloned()
        .zip(deltas)
        .map(|(variant, evo2_delta_score)| ScoredVariant {
            variant,
            evo2_delta_score,
        })
        .collect();

    Ok(CalibrationReport {
        variants,
        plot,
        auroc,
        parameters,
    })
}

/// Command line arguments for `calibrate` sub command.
#[derive(clap::Parser, Debug)]
#[command(about = "Fit classification threshold on labeled SNVs", long_about = None)]
pub struct Args {
    /// Path to the labeled variant table (`.xlsx`, `.csv` or `.tsv`).
    #[arg(long)]
    pub path_labels: PathBuf,

    /// Path to the reference chromosome FASTA, may be gzip-compressed.
    #[arg(long)]
    pub path_reference: PathBuf,

    /// Number of variants to use from the top of the table.
    #[arg(long, default_value_t = 500)]
    pub max_variants: usize,

    /// Number of bases around each variant.
    #[arg(long, default_value_t = DEFAULT_WINDOW_SIZE)]
    pub window_size: u64,

    /// Model host settings.
    #[command(flatten)]
    pub scorer: ScorerArgs,

    /// Path to the JSON report.
    #[arg(long)]
    pub path_output_report: PathBuf,

    /// Path to write the parameters to, for `server run --path-calibration`.
    #[arg(long)]
    pub path_output_params: Option<PathBuf>,

    /// Path to write the PNG plot to.
    #[arg(long)]
    pub path_output_plot: Option<PathBuf>,
}

fn write_outputs(report: &CalibrationReport, args: &Args) -> anyhow::Result<()> {
    tracing::info!("Writing report to {}", args.path_output_report.display());
    let mut writer = open_write_maybe_gz(&args.path_output_report)?;
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;

    if let Some(path) = &args.path_output_params {
        tracing::info!("Writing parameters to {}", path.display());
        let mut writer = open_write_maybe_gz(path)?;
        serde_json::to_writer_pretty(&mut writer, &report.parameters)?;
        writer.flush()?;
    }

    if let Some(path) = &args.path_output_plot {
        match &report.plot {
            Some(plot) => {
                tracing::info!("Writing plot to {}", path.display());
                let png = base64::engine::general_purpose::STANDARD.decode(plot)?;
                std::fs::write(path, png)?;
            }
            None => tracing::warn!("no plot rendered, not writing {}", path.display()),
        }
    }

    Ok(())
}

/// Main entry point for `calibrate` sub command.
///
/// # Errors
///
/// If the inputs cannot be read, the model host fails, or the fit is degenerate.
pub fn run(args_common: &crate::common::Args, args: &Args) -> anyhow::Result<()> {
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let records = read_labeled_variants(&args.path_labels, Some(args.max_variants))?;
    let chromosome = FastaChromosome::from_path(&args.path_reference)?;
    let scorer = RemoteScorer::load(&args.scorer.to_config())?;

    let before_scoring = std::time::Instant::now();
    let report = run_calibration(&records, &chromosome, &scorer, args.window_size)?;
    tracing::info!("... done calibrating in {:?}", before_scoring.elapsed());

    write_outputs(&report, args)
}
