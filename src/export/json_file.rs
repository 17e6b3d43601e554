use std::path::{Path, PathBuf};

use super::{ExportRecord, write_atomically};
use crate::core::FileWriteError;

/// Writes the batch as one pretty-printed JSON array.
pub fn write_json(records: &[ExportRecord], path: &Path) -> Result<PathBuf, FileWriteError> {
    write_atomically(path, |out| {
        serde_json::to_writer_pretty(&mut *out, records)?;
        Ok(())
    })
}
