//! Retrieval of reference sequence windows around genomic positions.
//!
//! Two sources are supported: the UCSC REST API for online requests (see
//! [`ucsc::UcscClient`]) and a locally loaded chromosome for batch calibration
//! (see [`fasta::FastaChromosome`]).

use crate::error::{Error, Result};

pub mod fasta;
pub mod ucsc;

/// Default number of bases around the variant used for scoring.
pub const DEFAULT_WINDOW_SIZE: u64 = 8192;

/// A position on a chromosome of a given genome assembly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenomicCoordinate {
    /// Genome assembly identifier as understood by the sequence service, e.g., `hg38`.
    pub genome: String,
    /// Chromosome name, e.g., `chr17`.
    pub chromosome: String,
    /// 1-based position.
    pub position: u64,
}

impl GenomicCoordinate {
    pub fn new(genome: impl Into<String>, chromosome: impl Into<String>, position: u64) -> Self {
        Self {
            genome: genome.into(),
            chromosome: chromosome.into(),
            position,
        }
    }
}

/// Half-open, 0-based interval requested from the sequence service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub start: u64,
    pub end: u64,
}

impl WindowBounds {
    /// Symmetric interval of `window_size + 1` bases centered on the 1-based `position`.
    ///
    /// The start is clamped at zero, so windows close to the chromosome start are shorter.
    /// The end saturates at `u64::MAX`.
    pub fn around(position: u64, window_size: u64) -> Self {
        let half = window_size / 2;
        let zero_based = position.saturating_sub(1);
        Self {
            start: zero_based.saturating_sub(half),
            end: zero_based.saturating_add(half).saturating_add(1),
        }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Interval and SNV offset for the batch path over a fully loaded chromosome.
///
/// The window is `[max(0, p - W/2), min(len, p + W/2))` for the 0-based position
/// `p`, and the SNV sits at offset `min(W/2, p)` within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalWindow {
    pub start: usize,
    pub end: usize,
    pub offset: usize,
}

impl LocalWindow {
    pub fn new(chrom_len: usize, position: u64, window_size: u64) -> Self {
        let half = usize::try_from(window_size / 2).unwrap_or(usize::MAX);
        let p = usize::try_from(position.saturating_sub(1)).unwrap_or(usize::MAX);
        Self {
            start: p.saturating_sub(half),
            end: chrom_len.min(p.saturating_add(half)),
            offset: half.min(p),
        }
    }
}

/// A stretch of reference sequence together with its 0-based start offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceWindow {
    /// 0-based, inclusive start of the window on the chromosome.
    pub start: u64,
    /// The upper-cased sequence.
    pub sequence: String,
    /// The window size that was requested.
    pub window_size: u64,
}

impl SequenceWindow {
    /// 0-based, exclusive end as implied by the actually returned sequence.
    pub fn end(&self) -> u64 {
        self.start + self.sequence.len() as u64
    }

    /// Offset of the 1-based genomic `position` within the window.
    ///
    /// # Errors
    ///
    /// `Error::PositionOutOfWindow` if the position is not covered by the returned sequence.
    pub fn relative_offset(&self, position: u64) -> Result<usize> {
        position
            .checked_sub(1)
            .and_then(|p| p.checked_sub(self.start))
            .filter(|offset| *offset < self.sequence.len() as u64)
            .map(|offset| offset as usize)
            .ok_or(Error::PositionOutOfWindow {
                position,
                start: self.start + 1,
                end: self.end(),
            })
    }

    /// The base at the 0-based window `offset`.
    pub fn base_at(&self, offset: usize) -> Option<char> {
        self.sequence.as_bytes().get(offset).map(|b| *b as char)
    }
}

/// A service that returns the reference bases of a half-open interval.
pub trait SequenceSource: Send + Sync {
    /// Fetch the bases of `[start, end)` on `chromosome` in `genome`.
    fn fetch(&self, genome: &str, chromosome: &str, start: u64, end: u64) -> Result<String>;
}

/// Fetch the window of `window_size + 1` bases centered on `coord`.
///
/// A returned sequence shorter than requested (e.g., at the chromosome end) is
/// accepted with a warning; use [`SequenceWindow::start`] for position arithmetic.
pub fn fetch_window(
    source: &dyn SequenceSource,
    coord: &GenomicCoordinate,
    window_size: u64,
) -> Result<SequenceWindow> {
    let bounds = WindowBounds::around(coord.position, window_size);
    tracing::info!(
        "Fetching: {}bp window around position {} from sequence service. {}: {} - {} ({})",
        window_size,
        coord.position,
        &coord.chromosome,
        bounds.start,
        bounds.end,
        &coord.genome
    );

    let sequence = source
        .fetch(&coord.genome, &coord.chromosome, bounds.start, bounds.end)?
        .to_uppercase();

    if sequence.len() as u64 != bounds.len() {
        tracing::warn!(
            "received sequence length ({}) different from expected ({})",
            sequence.len(),
            bounds.len()
        );
    }
    tracing::info!(
        "Loaded reference genome sequence window (length: {} bases)",
        sequence.len()
    );

    Ok(SequenceWindow {
        start: bounds.start,
        sequence,
        window_size,
    })
}

#[cfg(test)]
pub(crate) mod test {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;

    /// In-memory sequence source over a single synthetic chromosome.
    pub(crate) struct InMemorySource {
        pub chromosome: String,
        pub calls: Mutex<Vec<(u64, u64)>>,
    }

    impl InMemorySource {
        pub fn new(chromosome: impl Into<String>) -> Self {
            Self {
                chromosome: chromosome.into(),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Deterministic ACGT chromosome of the given length, lower-cased like soft-masked data.
        pub fn synthetic(len: usize) -> Self {
            let bases = b"acgt";
            let chromosome = (0..len)
                .map(|i| bases[(i * 7 + i / 3) % 4] as char)
                .collect::<String>();
            Self::new(chromosome)
        }
    }

    impl SequenceSource for InMemorySource {
        fn fetch(&self, _genome: &str, _chromosome: &str, start: u64, end: u64) -> Result<String> {
            self.calls.lock().unwrap().push((start, end));
            let len = self.chromosome.len() as u64;
            let (start, end) = (start.min(len) as usize, end.min(len) as usize);
            Ok(self.chromosome[start..end].to_string())
        }
    }

    #[rstest::rstest]
    #[case(43119628, 8192, 43119628 - 1 - 4096, 43119628 + 4096)]
    #[case(100, 8192, 0, 100 + 4096)]
    #[case(1, 10, 0, 6)]
    #[case(11, 10, 5, 16)]
    fn window_bounds(
        #[case] position: u64,
        #[case] window_size: u64,
        #[case] start: u64,
        #[case] end: u64,
    ) {
        assert_eq!(
            WindowBounds::around(position, window_size),
            WindowBounds { start, end }
        );
    }

    #[test]
    fn window_bounds_saturate_at_integer_limit() {
        let bounds = WindowBounds::around(u64::MAX, 8192);
        assert_eq!(bounds.end, u64::MAX);
        assert_eq!(bounds.start, u64::MAX - 1 - 4096);
        assert_eq!(bounds.len(), 4097);

        let local = LocalWindow::new(20_000, u64::MAX, 8192);
        assert_eq!(local.end, 20_000);
        assert!(local.start > local.end);
    }

    #[test]
    fn window_bounds_len_far_from_start() {
        for window_size in [2, 10, 100, 8192] {
            let bounds = WindowBounds::around(1_000_000, window_size);
            assert_eq!(bounds.len(), window_size + 1);
        }
    }

    #[rstest::rstest]
    #[case(20_000, 10_001, 8192, 5904, 14096, 4096)]
    #[case(20_000, 11, 8192, 0, 4106, 10)]
    #[case(10_050, 10_001, 8192, 5904, 10_050, 4096)]
    fn local_window(
        #[case] chrom_len: usize,
        #[case] position: u64,
        #[case] window_size: u64,
        #[case] start: usize,
        #[case] end: usize,
        #[case] offset: usize,
    ) {
        assert_eq!(
            LocalWindow::new(chrom_len, position, window_size),
            LocalWindow { start, end, offset }
        );
    }

    #[test]
    fn fetch_window_centers_variant() -> Result<()> {
        let source = InMemorySource::synthetic(50_000);
        let coord = GenomicCoordinate::new("hg38", "chr17", 20_000);

        let window = fetch_window(&source, &coord, 8192)?;

        assert_eq!(window.start, 20_000 - 1 - 4096);
        assert_eq!(window.sequence.len(), 8193);
        assert_eq!(window.relative_offset(20_000)?, 4096);
        let expected = source.chromosome.as_bytes()[19_999].to_ascii_uppercase() as char;
        assert_eq!(window.base_at(4096), Some(expected));
        assert!(window.sequence.chars().all(|c| c.is_ascii_uppercase()));

        Ok(())
    }

    #[test]
    fn fetch_window_near_chromosome_start() -> Result<()> {
        let source = InMemorySource::synthetic(50_000);
        let coord = GenomicCoordinate::new("hg38", "chr17", 10);

        let window = fetch_window(&source, &coord, 8192)?;

        assert_eq!(window.start, 0);
        assert_eq!(window.relative_offset(10)?, 9);
        assert_eq!(window.sequence.len(), 10 + 4096);

        Ok(())
    }

    #[tracing_test::traced_test]
    #[test]
    fn fetch_window_short_sequence_warns() -> Result<()> {
        let source = InMemorySource::synthetic(1_000);
        let coord = GenomicCoordinate::new("hg38", "chrM", 900);

        let window = fetch_window(&source, &coord, 400)?;

        assert_eq!(window.start, 699);
        assert_eq!(window.sequence.len(), 1_000 - 699);
        assert!(logs_contain("different from expected"));

        Ok(())
    }

    #[test]
    fn relative_offset_out_of_window() {
        let window = SequenceWindow {
            start: 100,
            sequence: "ACGT".into(),
            window_size: 4,
        };
        assert_eq!(window.relative_offset(101).ok(), Some(0));
        assert_eq!(window.relative_offset(104).ok(), Some(3));
        assert!(matches!(
            window.relative_offset(105),
            Err(Error::PositionOutOfWindow {
                position: 105,
                start: 101,
                end: 104
            })
        ));
        assert!(window.relative_offset(100).is_err());
        assert!(window.relative_offset(0).is_err());
    }
}
