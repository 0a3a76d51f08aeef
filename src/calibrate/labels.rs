//! Reading of labeled SNV tables.
//!
//! The expected layout is that of the saturation genome editing supplement of
//! Findlay et al. (2018): an Excel sheet with two preamble rows, or a CSV/TSV
//! export of it.  Only the columns named in [`columns`] are used.

use std::path::Path;

use crate::common::io::open_read_maybe_gz;
use crate::error::{Error, Result};

/// Column names in the source table.
pub mod columns {
    pub const CHROMOSOME: &str = "chromosome";
    pub const POSITION: &str = "position (hg19)";
    pub const REFERENCE: &str = "reference";
    pub const ALTERNATIVE: &str = "alt";
    pub const SCORE: &str = "function.score.mean";
    pub const CLASS: &str = "func.class";
}

/// Functional class as assigned by the saturation genome editing assay.
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
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum FunctionalClass {
    /// Functional.
    Func,
    /// Intermediate.
    Int,
    /// Loss of function.
    Lof,
}

/// Two-class label used for calibration; intermediate variants count as functional.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum BinaryClass {
    #[strum(serialize = "FUNC/INT")]
    #[serde(rename = "FUNC/INT")]
    FuncInt,
    #[strum(serialize = "LOF")]
    #[serde(rename = "LOF")]
    Lof,
}

impl From<FunctionalClass> for BinaryClass {
    fn from(value: FunctionalClass) -> Self {
        match value {
            FunctionalClass::Func | FunctionalClass::Int => BinaryClass::FuncInt,
            FunctionalClass::Lof => BinaryClass::Lof,
        }
    }
}

/// One row of the labeled table.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LabeledVariant {
    #[serde(rename = "chrom")]
    pub chromosome: String,
    /// 1-based position.
    #[serde(rename = "pos")]
    pub position: u64,
    #[serde(rename = "ref")]
    pub reference: char,
    #[serde(rename = "alt")]
    pub alternative: char,
    /// Mean functional score from the assay, if present.
    pub score: Option<f64>,
    #[serde(rename = "class")]
    pub class: BinaryClass,
}

/// Read up to `limit` labeled variants from an Excel, CSV or TSV file.
///
/// The file type is chosen by extension (`.xlsx`/`.xls`, `.tsv`/`.txt`, anything
/// else is read as CSV; a trailing `.gz` is allowed for text files).
pub fn read_labeled_variants(
    path: impl AsRef<Path>,
    limit: Option<usize>,
) -> Result<Vec<LabeledVariant>> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let name = name.strip_suffix(".gz").unwrap_or(&name);

    tracing::info!("Reading labeled variants from {}", path.display());
    let rows = if name.ends_with(".xlsx") || name.ends_with(".xls") {
        read_excel_rows(path)?
    } else {
        let delimiter = if name.ends_with(".tsv") || name.ends_with(".txt") {
            b'\t'
        } else {
            b','
        };
        read_delimited_rows(path, delimiter)?
    };

    let variants = records_from_rows(rows, limit)?;
    tracing::info!("... read {} labeled variants", variants.len());
    Ok(variants)
}

fn cell_to_string(cell: &calamine::DataType) -> String {
    use calamine::DataType as Ct;
    match cell {
        Ct::String(s) => s.clone(),
        Ct::Empty => String::new(),
        Ct::Bool(b) => b.to_string(),
        Ct::Error(e) => format!("ERR({e:?})"),
        Ct::Float(n) | Ct::Duration(n) => n.to_string(),
        Ct::Int(i) => i.to_string(),
        Ct::DateTime(f) => f.to_string(),
        Ct::DateTimeIso(s) | Ct::DurationIso(s) => s.clone(),
    }
}

/// All rows of the first worksheet as strings.
fn read_excel_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    use calamine::{open_workbook_auto, Reader};

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| Error::LabelTable(format!("{}: {}", path.display(), e)))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::LabelTable(format!("{}: no worksheet", path.display())))?
        .map_err(|e| Error::LabelTable(format!("{}: {}", path.display(), e)))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

/// All rows of a delimited text file as strings, header included.
fn read_delimited_rows(path: &Path, delimiter: u8) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(open_read_maybe_gz(path)?);

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .map_err(|e| Error::LabelTable(e.to_string()))
        })
        .collect()
}

/// Locate the header row (skipping preamble rows) and convert the following rows.
pub(crate) fn records_from_rows(
    rows: Vec<Vec<String>>,
    limit: Option<usize>,
) -> Result<Vec<LabeledVariant>> {
    let header_idx = rows
        .iter()
        .position(|row| row.iter().any(|cell| cell.trim() == columns::CLASS))
        .ok_or_else(|| Error::LabelTable(format!("no header with column {:?}", columns::CLASS)))?;
    let header = &rows[header_idx];
    let column = |name: &str| {
        header
            .iter()
            .position(|cell| cell.trim() == name)
            .ok_or_else(|| Error::LabelTable(format!("missing column {:?}", name)))
    };
    let idx_chrom = column(columns::CHROMOSOME)?;
    let idx_pos = column(columns::POSITION)?;
    let idx_ref = column(columns::REFERENCE)?;
    let idx_alt = column(columns::ALTERNATIVE)?;
    let idx_score = column(columns::SCORE)?;
    let idx_class = column(columns::CLASS)?;

    let data_rows = rows[header_idx + 1..]
        .iter()
        .enumerate()
        .filter(|(_, row)| row.iter().any(|cell| !cell.trim().is_empty()));
    let data_rows: Box<dyn Iterator<Item = (usize, &Vec<String>)>> = match limit {
        Some(limit) => Box::new(data_rows.take(limit)),
        None => Box::new(data_rows),
    };

    data_rows
        .map(|(i, row)| {
            let line = header_idx + i + 2;
            let cell = |idx: usize| row.get(idx).map(|s| s.trim()).unwrap_or_default();
            let invalid = |what: &str, value: &str| {
                Error::LabelTable(format!("row {}: invalid {} {:?}", line, what, value))
            };

            let position =
                parse_position(cell(idx_pos)).ok_or_else(|| invalid("position", cell(idx_pos)))?;
            let reference = crate::variant::parse_base(cell(idx_ref))
                .map_err(|_| invalid("reference", cell(idx_ref)))?;
            let alternative = crate::variant::parse_base(cell(idx_alt))
                .map_err(|_| invalid("alternative", cell(idx_alt)))?;
            let score = match cell(idx_score) {
                "" | "NA" | "nan" => None,
                value => Some(value.parse::<f64>().map_err(|_| invalid("score", value))?),
            };
            let class = cell(idx_class)
                .parse::<FunctionalClass>()
                .map_err(|_| invalid("class", cell(idx_class)))?;

            Ok(LabeledVariant {
                chromosome: cell(idx_chrom).to_string(),
                position,
                reference,
                alternative,
                score,
                class: class.into(),
            })
        })
        .collect()
}

/// Parse a position that Excel may have stored as a float, e.g., `41276044.0`.
fn parse_position(value: &str) -> Option<u64> {
    value.parse::<u64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && *f >= 1.0 && f.fract() == 0.0)
            .map(|f| f as u64)
    })
}
