use anyhow::{Context, Result};
use parquet::{
    arrow::ArrowWriter,
    basic::{BrotliLevel, Compression},
    file::properties::WriterProperties,
};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};
use tracing::debug;

use super::arrow::to_record_batch;
use crate::process::{table::ParsedTable, Dataset};

pub const DESCR_FILE: &str = "DESCR.txt";

fn writer_props() -> Result<WriterProperties> {
    Ok(WriterProperties::builder()
        .set_compression(Compression::BROTLI(BrotliLevel::try_new(5)?))
        .set_dictionary_enabled(true)
        .build())
}

/// Write one table to `path` as Parquet. The file is written to a `.tmp`
/// sibling first and renamed into place.
pub fn write_table(table: &ParsedTable, path: &Path) -> Result<()> {
    let batch = to_record_batch(table)?;
    let temp_path = path.with_extension("tmp");

    let file = File::create(&temp_path)
        .with_context(|| format!("creating {}", temp_path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(writer_props()?))
        .with_context(|| format!("opening parquet writer for `{}`", table.title))?;
    writer.write(&batch)?;
    writer.close()?;

    fs::rename(&temp_path, path)
        .with_context(|| format!("renaming {} -> {}", temp_path.display(), path.display()))?;
    debug!(title = %table.title, rows = batch.num_rows(), path = %path.display(), "wrote table");
    Ok(())
}

/// Write every table of `dataset` as `<dir>/<key>.parquet` plus the
/// description as `<dir>/DESCR.txt`. Returns the paths written.
pub fn write_dataset(dataset: &Dataset, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut written = Vec::with_capacity(dataset.len() + 1);
    for (key, table) in dataset.iter() {
        let path = dir.join(format!("{}.parquet", key));
        write_table(table, &path)?;
        written.push(path);
    }

    let descr = dir.join(DESCR_FILE);
    fs::write(&descr, &dataset.description)
        .with_context(|| format!("writing {}", descr.display()))?;
    written.push(descr);
    Ok(written)
}
