use std::path::{Path, PathBuf};

use super::{ExportRecord, write_atomically};
use crate::core::FileWriteError;

/// Writes the batch as CSV with a header row, replacing any previous file.
pub fn write_csv(records: &[ExportRecord], path: &Path) -> Result<PathBuf, FileWriteError> {
    write_atomically(path, |out| {
        let mut writer = csv::Writer::from_writer(out);
        if records.is_empty() {
            writer.write_record(ExportRecord::COLUMNS)?;
        }
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    })
}
