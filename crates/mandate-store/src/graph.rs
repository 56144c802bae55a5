//! Linked-graph export: one row per document, as Parquet and JSON.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, StringArray};
use arrow::record_batch::RecordBatch;
use mandate_core::schema::graph;
use mandate_core::{DocType, GraphEntry, GraphLink, LinkMethod, LinkedDocument};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tempfile::NamedTempFile;
use tracing::info;

use crate::StoreError;

pub const JSON_FILE: &str = "linked.json";
pub const PARQUET_FILE: &str = "linked.parquet";

/// Build one Arrow batch from graph entries.
pub fn entries_to_batch(entries: &[GraphEntry]) -> Result<RecordBatch, StoreError> {
    let schema = Arc::new(graph::linked_document_schema());
    let link = |f: fn(&GraphLink) -> String| -> StringArray {
        entries.iter().map(|e| e.link.as_ref().map(f)).collect()
    };

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(entries.iter().map(|e| e.symbol.as_str()))),
        Arc::new(StringArray::from_iter_values(entries.iter().map(|e| e.doc_type.as_str()))),
        Arc::new(StringArray::from_iter_values(entries.iter().map(|e| e.title.as_str()))),
        Arc::new(entries.iter().map(|e| e.base_symbol.as_deref()).collect::<StringArray>()),
        Arc::new(link(|l| l.target.clone())),
        Arc::new(link(|l| l.method.as_str().to_string())),
        Arc::new(
            entries
                .iter()
                .map(|e| e.link.as_ref().map(|l| l.confidence))
                .collect::<Float64Array>(),
        ),
        Arc::new(entries.iter().map(|e| Some(e.adopted)).collect::<BooleanArray>()),
    ];

    Ok(RecordBatch::try_new(schema, columns)?)
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T, StoreError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| StoreError::Schema(format!("missing or mistyped column {name:?}")))
}

fn opt_string(col: &StringArray, row: usize) -> Option<String> {
    (!col.is_null(row)).then(|| col.value(row).to_string())
}

/// Decode graph entries from a batch with the linked-graph schema.
pub fn batch_to_entries(batch: &RecordBatch) -> Result<Vec<GraphEntry>, StoreError> {
    let symbol = column::<StringArray>(batch, "symbol")?;
    let doc_type = column::<StringArray>(batch, "doc_type")?;
    let title = column::<StringArray>(batch, "title")?;
    let base_symbol = column::<StringArray>(batch, "base_symbol")?;
    let link_target = column::<StringArray>(batch, "link_target")?;
    let link_method = column::<StringArray>(batch, "link_method")?;
    let link_confidence = column::<Float64Array>(batch, "link_confidence")?;
    let adopted = column::<BooleanArray>(batch, "adopted")?;

    let mut entries = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let doc_type: DocType = doc_type.value(row).parse().map_err(StoreError::Schema)?;
        let link = match (opt_string(link_target, row), opt_string(link_method, row)) {
            (Some(target), Some(method)) => Some(GraphLink {
                target,
                method: method.parse::<LinkMethod>().map_err(StoreError::Schema)?,
                confidence: if link_confidence.is_null(row) {
                    0.0
                } else {
                    link_confidence.value(row)
                },
            }),
            _ => None,
        };
        entries.push(GraphEntry {
            symbol: symbol.value(row).to_string(),
            doc_type,
            title: title.value(row).to_string(),
            base_symbol: opt_string(base_symbol, row),
            link,
            adopted: !adopted.is_null(row) && adopted.value(row),
        });
    }
    Ok(entries)
}

/// Write `contents` to `path` through a temp file in the same directory.
fn write_atomic(
    path: &Path,
    contents: impl FnOnce(&mut BufWriter<&mut NamedTempFile>) -> Result<(), StoreError>,
) -> Result<(), StoreError> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir).map_err(StoreError::io(dir))?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(StoreError::io(dir))?;
    {
        let mut writer = BufWriter::new(&mut tmp);
        contents(&mut writer)?;
        writer.flush().map_err(StoreError::io(path))?;
    }
    tmp.as_file().sync_all().map_err(StoreError::io(path))?;
    tmp.persist(path).map_err(|e| StoreError::io(path)(e.error))?;
    Ok(())
}

pub fn write_parquet(path: &Path, entries: &[GraphEntry]) -> Result<(), StoreError> {
    let batch = entries_to_batch(entries)?;
    write_atomic(path, |w| {
        let mut writer = ArrowWriter::try_new(w, batch.schema(), None)?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(())
    })?;
    info!(path = %path.display(), rows = entries.len(), "wrote parquet");
    Ok(())
}

pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
    if !path.exists() {
        return Err(StoreError::FileNotFound(path.to_path_buf()));
    }
    let file = File::open(path).map_err(StoreError::io(path))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches: Result<Vec<RecordBatch>, _> = reader.collect();
    Ok(batches?)
}

pub fn write_json(path: &Path, entries: &[GraphEntry]) -> Result<(), StoreError> {
    write_atomic(path, |w| {
        serde_json::to_writer_pretty(&mut *w, entries)?;
        w.write_all(b"\n").map_err(StoreError::io(path))?;
        Ok(())
    })?;
    info!(path = %path.display(), rows = entries.len(), "wrote json");
    Ok(())
}

pub fn read_json(path: &Path) -> Result<Vec<GraphEntry>, StoreError> {
    if !path.exists() {
        return Err(StoreError::FileNotFound(path.to_path_buf()));
    }
    let file = File::open(path).map_err(StoreError::io(path))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// The export directory: `linked.parquet` and `linked.json` side by side.
#[derive(Debug, Clone)]
pub struct GraphStore {
    dir: PathBuf,
}

impl GraphStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn parquet_path(&self) -> PathBuf {
        self.dir.join(PARQUET_FILE)
    }

    pub fn json_path(&self) -> PathBuf {
        self.dir.join(JSON_FILE)
    }

    /// Replace both exports with `documents`.
    pub fn export(&self, documents: &[LinkedDocument]) -> Result<(), StoreError> {
        let entries: Vec<GraphEntry> = documents.iter().map(LinkedDocument::to_entry).collect();
        write_parquet(&self.parquet_path(), &entries)?;
        write_json(&self.json_path(), &entries)?;
        Ok(())
    }

    /// All rows of the Parquet export.
    pub fn load(&self) -> Result<Vec<GraphEntry>, StoreError> {
        let mut entries = Vec::new();
        for batch in read_parquet(&self.parquet_path())? {
            entries.extend(batch_to_entries(&batch)?);
        }
        Ok(entries)
    }

    /// One row by symbol, case-insensitive.
    pub fn find(&self, symbol: &str) -> Result<GraphEntry, StoreError> {
        let wanted = symbol.trim();
        self.load()?
            .into_iter()
            .find(|e| e.symbol.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| StoreError::NoResults(wanted.to_string()))
    }

    /// Documents whose outgoing link targets `symbol`.
    pub fn incoming(&self, symbol: &str) -> Result<Vec<GraphEntry>, StoreError> {
        let wanted = symbol.trim();
        Ok(self
            .load()?
            .into_iter()
            .filter(|e| {
                e.link
                    .as_ref()
                    .is_some_and(|l| l.target.eq_ignore_ascii_case(wanted))
            })
            .collect())
    }
}
