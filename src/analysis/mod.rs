//! Pathogenicity analysis of a single SNV.
//!
//! Fetches the reference window around the variant, builds the variant window,
//! scores both with the model and classifies the delta.

use std::path::PathBuf;

use crate::classify::{classify, CalibrationParameters, Classification, Prediction};
use crate::common::cli::{ScorerArgs, UcscArgs};
use crate::error::{Error, Result};
use crate::scoring::{LikelihoodScorer, RemoteScorer};
use crate::sequence::{
    fasta::FastaChromosome, fetch_window, ucsc::UcscClient, GenomicCoordinate, SequenceSource,
    DEFAULT_WINDOW_SIZE,
};
use crate::variant::{build_variant_sequence, parse_base};

/// Settings shared by all single-variant analyses.
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(pattern = "immutable")]
pub struct AnalysisConfig {
    /// Number of bases around the variant passed to the model.
    #[builder(default = "DEFAULT_WINDOW_SIZE")]
    pub window_size: u64,
    /// Threshold and class spreads used for classification.
    #[builder(default)]
    pub calibration: CalibrationParameters,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            calibration: CalibrationParameters::default(),
        }
    }
}

/// A single SNV to analyse.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct VariantRequest {
    /// 1-based position of the variant.
    pub variant_position: u64,
    /// Alternative base.
    pub alternative: String,
    /// Genome assembly as named by UCSC, e.g., `hg38`.
    pub genome: String,
    /// Chromosome name, e.g., `chr17`.
    pub chromosome: String,
    /// Optional reference base; checked against the genome if given.
    #[serde(default)]
    pub reference: Option<String>,
}

/// Result of analysing a single SNV.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct VariantAnalysis {
    /// Reference base as found in the genome.
    pub reference: String,
    /// Alternative base.
    pub alternative: String,
    /// Variant score minus reference score.
    pub delta_score: f64,
    /// The predicted class.
    pub prediction: Prediction,
    /// Heuristic confidence in `[0, 1]`.
    pub classification_confidence: f64,
    /// 1-based position of the variant.
    pub position: u64,
}

/// Score a reference window and its variant at `offset` and classify the delta.
pub fn analyse_variant(
    scorer: &dyn LikelihoodScorer,
    sequence: &str,
    reference: char,
    alternative: char,
    offset: usize,
    params: &CalibrationParameters,
) -> Result<Classification> {
    let variant_sequence = build_variant_sequence(sequence, alternative, offset)?;
    tracing::debug!(
        "scoring {} > {} at window offset {}",
        reference,
        alternative,
        offset
    );

    let scores = scorer.score_sequences(&[sequence.to_string(), variant_sequence])?;
    let (reference_score, variant_score) = match scores.as_slice() {
        [r, v] => (*r, *v),
        _ => {
            return Err(Error::Scorer(format!(
                "expected 2 scores, got {}",
                scores.len()
            )))
        }
    };

    Ok(classify(reference_score, variant_score, params))
}

/// Run the full single-variant analysis.
///
/// # Errors
///
/// Client errors (invalid bases, a position outside the fetched window, a declared
/// reference that does not match the genome) and upstream failures of the sequence
/// service or the model.
pub fn analyse_single_mutation(
    source: &dyn SequenceSource,
    scorer: &dyn LikelihoodScorer,
    config: &AnalysisConfig,
    request: &VariantRequest,
) -> Result<VariantAnalysis> {
    tracing::info!(
        "Genome: {}, Chromosome: {}, Variant Position: {}, Variant Alternative: {}",
        &request.genome,
        &request.chromosome,
        request.variant_position,
        &request.alternative
    );
    let alternative = parse_base(&request.alternative)?;
    let declared_reference = request.reference.as_deref().map(parse_base).transpose()?;

    let coord = GenomicCoordinate::new(
        request.genome.as_str(),
        request.chromosome.as_str(),
        request.variant_position,
    );
    let window = fetch_window(source, &coord, config.window_size)?;
    tracing::debug!(
        "Fetched genome sequence window at {}, first 100 bases: {}",
        window.start,
        &window.sequence[..window.sequence.len().min(100)]
    );

    let offset = window.relative_offset(coord.position)?;
    let reference = window.base_at(offset).ok_or(Error::OffsetOutOfRange {
        offset,
        len: window.sequence.len(),
    })?;
    tracing::info!("Reference is: {}", reference);

    if let Some(expected) = declared_reference {
        if expected != reference {
            return Err(Error::ReferenceMismatch {
                position: coord.position,
                expected,
                found: reference,
            });
        }
    }

    let classification = analyse_variant(
        scorer,
        &window.sequence,
        reference,
        alternative,
        offset,
        &config.calibration,
    )?;

    Ok(VariantAnalysis {
        reference: reference.to_string(),
        alternative: alternative.to_string(),
        delta_score: classification.delta_score,
        prediction: classification.prediction,
        classification_confidence: classification.confidence,
        position: coord.position,
    })
}

/// Command line arguments for `analyse` sub command.
#[derive(clap::Parser, Debug)]
#[command(about = "Predict pathogenicity of a single SNV", long_about = None)]
pub struct Args {
    /// Genome assembly as named by UCSC.
    #[arg(long, default_value = "hg38")]
    pub genome: String,

    /// Chromosome name.
    #[arg(long)]
    pub chromosome: String,

    /// 1-based position of the variant.
    #[arg(long)]
    pub position: u64,

    /// Alternative base.
    #[arg(long)]
    pub alternative: String,

    /// Expected reference base; checked against the genome if given.
    #[arg(long)]
    pub reference: Option<String>,

    /// Number of bases around the variant.
    #[arg(long, default_value_t = DEFAULT_WINDOW_SIZE)]
    pub window_size: u64,

    /// Path to calibration parameters as written by `vareon calibrate`.
    #[arg(long)]
    pub path_calibration: Option<PathBuf>,

    /// Read the window from this FASTA chromosome instead of the UCSC API.
    #[arg(long)]
    pub path_reference: Option<PathBuf>,

    /// Genome assembly of `--path-reference`, e.g., `hg19`.
    #[arg(long, requires = "path_reference")]
    pub reference_genome: Option<String>,

    /// Model host settings.
    #[command(flatten)]
    pub scorer: ScorerArgs,

    /// UCSC API settings.
    #[command(flatten)]
    pub ucsc: UcscArgs,
}

impl Args {
    fn request(&self) -> VariantRequest {
        VariantRequest {
            variant_position: self.position,
            alternative: self.alternative.clone(),
            genome: self.genome.clone(),
            chromosome: self.chromosome.clone(),
            reference: self.reference.clone(),
        }
    }

    fn config(&self) -> anyhow::Result<AnalysisConfig> {
        let calibration = match &self.path_calibration {
            Some(path) => CalibrationParameters::from_path(path)?,
            None => CalibrationParameters::default(),
        };
        Ok(AnalysisConfigBuilder::default()
            .window_size(self.window_size)
            .calibration(calibration)
            .build()?)
    }
}

/// Main entry point for `analyse` sub command; prints the result as JSON.
///
/// # Errors
///
/// If the variant is invalid or the sequence service or model host fail.
pub fn run(args_common: &crate::common::Args, args: &Args) -> anyhow::Result<()> {
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let config = args.config()?;
    let source: Box<dyn SequenceSource> = match &args.path_reference {
        Some(path) => Box::new(
            FastaChromosome::from_path(path)?.with_genome(args.reference_genome.clone()),
        ),
        None => Box::new(UcscClient::new(args.ucsc.to_config())?),
    };
    let scorer = RemoteScorer::load(&args.scorer.to_config())?;

    let result = analyse_single_mutation(source.as_ref(), &scorer, &config, &args.request())?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

#[cfg(test)]
mod test {
    use std::sync::atomic::Ordering;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::scoring::test::WeightScorer;
    use crate::sequence::test::InMemorySource;

    fn request(position: u64, alternative: &str) -> VariantRequest {
        VariantRequest {
            variant_position: position,
            alternative: alternative.into(),
            genome: "hg38".into(),
            chromosome: "chr17".into(),
            reference: None,
        }
    }

    #[test]
    fn brca1_scenario() -> Result<()> {
        let position = 43119628;
        let source = InMemorySource::synthetic(43_200_000);
        let scorer = WeightScorer::new([0.0, 0.0, 0.0, 0.0]);

        let result = analyse_single_mutation(
            &source,
            &scorer,
            &AnalysisConfig::default(),
            &request(position, "G"),
        )?;

        assert_eq!(
            source.calls.lock().unwrap().as_slice(),
            &[(position - 1 - 4096, position + 4096)]
        );
        let expected_reference =
            source.chromosome.as_bytes()[position as usize - 1].to_ascii_uppercase() as char;
        assert_eq!(result.reference, expected_reference.to_string());
        assert_eq!(result.alternative, "G");
        assert_eq!(result.position, position);
        assert_eq!(result.delta_score, 0.0);
        assert_eq!(result.prediction, Prediction::LikelyBenign);
        assert_eq!(scorer.scored.load(Ordering::SeqCst), 2);

        Ok(())
    }

    #[test]
    fn deleterious_substitution_is_pathogenic() -> Result<()> {
        // Every base but the alternative scores zero, so the substitution lowers the
        // variant score by weight / window length.
        let source = InMemorySource::new("ACGT".repeat(5_000));
        let scorer = WeightScorer::new([0.0, 0.0, 0.0, 100.0]);
        let config = AnalysisConfigBuilder::default()
            .window_size(1000)
            .build()
            .expect("valid config");

        // Position 10_001 holds A (0-based 10_000).
        let result = analyse_single_mutation(&source, &scorer, &config, &request(10_001, "T"))?;

        assert_eq!(result.reference, "A");
        assert!(result.delta_score < config.calibration.threshold);
        assert_eq!(result.prediction, Prediction::LikelyPathogenic);
        assert_eq!(result.classification_confidence, 1.0);

        Ok(())
    }

    #[test]
    fn declared_reference_is_checked() {
        let source = InMemorySource::new("ACGT".repeat(5_000));
        let scorer = WeightScorer::new([0.0; 4]);
        let mut req = request(10_001, "T");
        req.reference = Some("C".into());

        let err = analyse_single_mutation(&source, &scorer, &AnalysisConfig::default(), &req)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::ReferenceMismatch {
                position: 10_001,
                expected: 'C',
                found: 'A'
            }
        ));
        assert!(err.is_client_error());
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn position_beyond_chromosome_end() {
        let source = InMemorySource::new("ACGT".repeat(100));
        let scorer = WeightScorer::new([0.0; 4]);

        let err = analyse_single_mutation(
            &source,
            &scorer,
            &AnalysisConfig::default(),
            &request(1_000, "T"),
        )
        .unwrap_err();

        assert!(matches!(err, Error::PositionOutOfWindow { position: 1_000, .. }));
    }

    #[test]
    fn position_at_integer_limit() {
        let source = InMemorySource::new("ACGT".repeat(100));
        let scorer = WeightScorer::new([0.0; 4]);

        let err = analyse_single_mutation(
            &source,
            &scorer,
            &AnalysisConfig::default(),
            &request(u64::MAX, "T"),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            Error::PositionOutOfWindow {
                position: u64::MAX,
                ..
            }
        ));
        assert!(err.is_client_error());
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn refseq_named_fasta_reference() -> anyhow::Result<()> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("GRCh37.p13_chr17.fna");
        let sequence = "ACGT".repeat(5_000);
        std::fs::write(
            &path,
            format!(">NC_000017.10 Homo sapiens chromosome 17\n{}\n", &sequence),
        )?;
        let source = FastaChromosome::from_path(&path)?.with_genome(Some("hg19".into()));
        let scorer = WeightScorer::new([0.0; 4]);
        let config = AnalysisConfigBuilder::default().window_size(1000).build()?;
        let mut req = request(10_001, "T");
        req.genome = "hg19".into();

        let result = analyse_single_mutation(&source, &scorer, &config, &req)?;
        assert_eq!(result.reference, "A");

        req.chromosome = "chr1".into();
        let err = analyse_single_mutation(&source, &scorer, &config, &req).unwrap_err();
        assert!(matches!(err, Error::ChromosomeNotAvailable { .. }));
        assert!(err.is_client_error());
        Ok(())
    }

    #[rstest::rstest]
    #[case("N")]
    #[case("GA")]
    #[case("")]
    fn invalid_alternative(#[case] alternative: &str) {
        let source = InMemorySource::new("ACGT".repeat(100));
        let scorer = WeightScorer::new([0.0; 4]);

        let result = analyse_single_mutation(
            &source,
            &scorer,
            &AnalysisConfig::default(),
            &request(10, alternative),
        );

        assert!(matches!(result, Err(Error::InvalidBase(_))));
        assert!(source.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn cli_args_to_request() -> anyhow::Result<()> {
        use clap::Parser as _;

        let args = Args::try_parse_from([
            "analyse",
            "--chromosome",
            "chr17",
            "--position",
            "43119628",
            "--alternative",
            "G",
        ])?;

        assert_eq!(args.request(), request(43119628, "G"));
        let config = args.config()?;
        assert_eq!(config.window_size, DEFAULT_WINDOW_SIZE);
        assert_eq!(config.calibration, CalibrationParameters::default());
        Ok(())
    }

    #[test]
    fn request_json() -> anyhow::Result<()> {
        let req: VariantRequest = serde_json::from_str(
            r#"{"variant_position": 43119628, "alternative": "G", "genome": "hg38", "chromosome": "chr17"}"#,
        )?;
        assert_eq!(req, request(43119628, "G"));
        Ok(())
    }
}
