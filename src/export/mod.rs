//! Writes a converted batch to CSV, JSON and a PNG chart

pub mod chart;
pub mod json_file;
pub mod tabular;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs::{File, Permissions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::core::{ConvertedProduct, Currency, FileWriteError};

pub const CSV_FILE_NAME: &str = "products_with_converted_prices.csv";
pub const JSON_FILE_NAME: &str = "products_with_converted_prices.json";
pub const CHART_FILE_NAME: &str = "price_comparison.png";

/// One exported row. CSV columns follow the field order.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRecord {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub original_price: Decimal,
    pub original_currency: Currency,
    #[serde(with = "rust_decimal::serde::float")]
    pub converted_price: Decimal,
    pub target_currency: Currency,
    pub rating: u8,
    pub availability: &'static str,
    pub converted_at: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub exchange_rate: Decimal,
    pub detail_url: String,
}

impl From<&ConvertedProduct> for ExportRecord {
    fn from(p: &ConvertedProduct) -> Self {
        ExportRecord {
            name: p.product.name.clone(),
            original_price: p.product.price,
            original_currency: p.product.price_currency,
            converted_price: p.converted_price,
            target_currency: p.target_currency,
            rating: p.product.rating,
            availability: p.availability_label(),
            converted_at: p.converted_at,
            exchange_rate: p.exchange_rate,
            detail_url: p.product.detail_url.clone(),
        }
    }
}

impl ExportRecord {
    pub const COLUMNS: [&'static str; 10] = [
        "name",
        "original_price",
        "original_currency",
        "converted_price",
        "target_currency",
        "rating",
        "availability",
        "converted_at",
        "exchange_rate",
        "detail_url",
    ];
}

pub fn to_records(products: &[ConvertedProduct]) -> Vec<ExportRecord> {
    products.iter().map(ExportRecord::from).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Csv,
    Json,
    Chart,
}

impl Artifact {
    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::Csv => CSV_FILE_NAME,
            Artifact::Json => JSON_FILE_NAME,
            Artifact::Chart => CHART_FILE_NAME,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Artifact::Csv => "CSV",
            Artifact::Json => "JSON",
            Artifact::Chart => "Chart",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub directory: PathBuf,
    pub chart_max_products: usize,
    pub chart_font: Option<PathBuf>,
}

#[derive(Debug)]
pub struct ExportResult {
    pub artifact: Artifact,
    pub outcome: Result<PathBuf, FileWriteError>,
}

/// Writes `path` through a temporary sibling file that is renamed into place
/// only after `write` succeeds.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<PathBuf, FileWriteError>
where
    F: FnOnce(&mut BufWriter<&File>) -> anyhow::Result<()>,
{
    let tmp = output_tempfile(path, "")?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        write(&mut writer).map_err(|e| FileWriteError::new(path, e))?;
        writer.flush().map_err(|e| FileWriteError::new(path, e))?;
    }
    tmp.persist(path)
        .map_err(|e| FileWriteError::new(path, e.error))?;
    debug!("Wrote {}", path.display());
    Ok(path.to_path_buf())
}

/// Mode for a finished artifact: that of the file being replaced, or the
/// usual `rw-r--r--` for a new one.
#[cfg(unix)]
fn output_permissions(path: &Path) -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path)
        .ok()
        .filter(|m| m.is_file())
        .map_or(0o644, |m| m.permissions().mode() & 0o777);
    Some(Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn output_permissions(_path: &Path) -> Option<Permissions> {
    None
}

/// Creates the temporary sibling that will be renamed onto `path`.
pub(crate) fn output_tempfile(path: &Path, suffix: &str) -> Result<NamedTempFile, FileWriteError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".tmp").suffix(suffix);
    if let Some(permissions) = output_permissions(path) {
        builder.permissions(permissions);
    }
    builder
        .tempfile_in(parent_dir(path))
        .map_err(|e| FileWriteError::new(path, e))
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Attempts every artifact; a failure in one never prevents the others.
pub fn export_all(products: &[ConvertedProduct], options: &ExportOptions) -> Vec<ExportResult> {
    let records = to_records(products);
    let dir = &options.directory;

    let mut results = vec![
        ExportResult {
            artifact: Artifact::Csv,
            outcome: tabular::write_csv(&records, &dir.join(CSV_FILE_NAME)),
        },
        ExportResult {
            artifact: Artifact::Json,
            outcome: json_file::write_json(&records, &dir.join(JSON_FILE_NAME)),
        },
    ];

    let chart_options = chart::ChartOptions {
        max_products: options.chart_max_products,
        font: options.chart_font.clone(),
    };
    results.push(ExportResult {
        artifact: Artifact::Chart,
        outcome: chart::write_chart(products, &dir.join(CHART_FILE_NAME), &chart_options),
    });

    for result in &results {
        if let Err(e) = &result.outcome {
            warn!(artifact = result.artifact.label(), error = %e, "Export failed");
        }
    }
    results
}
