//! Locally loaded reference chromosome, e.g., `GRCh37.p13_chr17.fna.gz`.

use std::path::Path;

use crate::common::io::open_read_maybe_gz;
use crate::error::{Error, Result};

use super::SequenceSource;

/// A single chromosome held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaChromosome {
    /// Name from the FASTA definition line (up to the first whitespace).
    pub name: String,
    /// Upper-cased sequence.
    pub sequence: String,
    /// Genome assembly the file belongs to, e.g., `hg19`, if known.
    pub genome: Option<String>,
}

impl FastaChromosome {
    /// Load the first record of a plain or gzip-compressed FASTA file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        tracing::info!("Reading reference sequence from {}", path.as_ref().display());
        let mut reader = noodles::fasta::io::Reader::new(open_read_maybe_gz(path.as_ref())?);
        let record = reader.records().next().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("no FASTA record in {}", path.as_ref().display()),
            ))
        })??;

        let name = String::from_utf8_lossy(record.name().as_ref()).to_string();
        let sequence = String::from_utf8_lossy(record.sequence().as_ref()).to_uppercase();
        tracing::info!("... loaded {} with {} bases", &name, sequence.len());

        Ok(Self {
            name,
            sequence,
            genome: None,
        })
    }

    /// Record the genome assembly of the file; requests for other assemblies are logged.
    pub fn with_genome(mut self, genome: Option<String>) -> Self {
        self.genome = genome;
        self
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Whether `chromosome` refers to this record.
    ///
    /// A `chr` prefix is ignored and RefSeq accessions such as `NC_000017.10` are
    /// treated as their chromosome number.
    pub fn matches(&self, chromosome: &str) -> bool {
        canonical_name(&self.name) == canonical_name(chromosome)
    }
}

/// Normalize `chr17`, `17` and `NC_000017.10` to `17`; `chrM` and `NC_012920.1` to `MT`.
fn canonical_name(name: &str) -> String {
    let name = name.strip_prefix("chr").unwrap_or(name);
    if let Some(accession) = name.strip_prefix("NC_") {
        let number = accession.split('.').next().unwrap_or_default();
        match number.parse::<u32>() {
            Ok(n @ 1..=22) => return n.to_string(),
            Ok(23) => return "X".to_string(),
            Ok(24) => return "Y".to_string(),
            Ok(12920) => return "MT".to_string(),
            _ => (),
        }
    }
    match name.to_ascii_uppercase().as_str() {
        "M" => "MT".to_string(),
        other => other.to_string(),
    }
}

impl SequenceSource for FastaChromosome {
    fn fetch(&self, genome: &str, chromosome: &str, start: u64, end: u64) -> Result<String> {
        if !self.matches(chromosome) {
            return Err(Error::ChromosomeNotAvailable {
                requested: chromosome.to_string(),
                available: self.name.clone(),
            });
        }
        if let Some(reference_genome) = &self.genome {
            if !reference_genome.eq_ignore_ascii_case(genome) {
                tracing::warn!(
                    "requested genome {} but the local reference is {}",
                    genome,
                    reference_genome
                );
            }
        }
        let len = self.sequence.len();
        let start = (start as usize).min(len);
        let end = (end as usize).clamp(start, len);
        Ok(self.sequence[start..end].to_string())
    }
}
