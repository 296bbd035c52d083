//! Data loading and saving utilities

use crate::error::{PipelineError, Result};
use crate::schema;
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// CSV loader for stage inputs
pub struct DataLoader {
    /// Rows sampled for dtype inference
    infer_schema_length: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: Some(100),
        }
    }

    /// Load a CSV file with a header row
    pub fn load_csv(&self, path: &Path) -> Result<DataFrame> {
        let file = File::open(path)
            .map_err(|e| PipelineError::DataError(format!("{}: {}", path.display(), e)))?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| PipelineError::DataError(format!("{}: {}", path.display(), e)))?;

        debug!(path = %path.display(), rows = df.height(), cols = df.width(), "Loaded CSV");
        Ok(df)
    }

    /// Load a stage input, failing with [`PipelineError::MissingInput`] when absent
    ///
    /// Legacy headers are renamed to their canonical names.
    pub fn load_stage_input(&self, path: &Path, hint: &str) -> Result<DataFrame> {
        if !path.is_file() {
            return Err(PipelineError::missing_input(path, hint));
        }
        let mut df = self.load_csv(path)?;
        schema::normalize_columns(&mut df)?;
        Ok(df)
    }
}

/// Writes stage outputs
///
/// Output goes to a temporary file next to the destination which is then
/// renamed over it, so readers never observe a half-written file.
pub struct DataSaver;

impl DataSaver {
    /// Save a frame as CSV
    pub fn save_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
        Self::write_atomic(path, |file| {
            CsvWriter::new(file)
                .include_header(true)
                .finish(df)
                .map_err(|e| PipelineError::DataError(e.to_string()))
        })
    }

    /// Save any serializable value as pretty-printed JSON
    pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
        Self::write_atomic(path, |file| {
            serde_json::to_writer_pretty(&mut *file, value)?;
            file.write_all(b"\n")?;
            Ok(())
        })
    }

    fn write_atomic<F>(path: &Path, write: F) -> Result<()>
    where
        F: FnOnce(&mut File) -> Result<()>,
    {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".staging-")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        write(tmp.as_file_mut())?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(path).map_err(|e| PipelineError::IoError(e.error))?;

        debug!(path = %path.display(), "Wrote output");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn create_test_csv(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("raw.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Year,R&D_Trillion_Yen,Equipment_Trillion_Yen").unwrap();
        writeln!(file, "2015,3.0,5.0").unwrap();
        writeln!(file, "2016,3.5,5.2").unwrap();
        writeln!(file, "2017,3.8,5.6").unwrap();
        path
    }

    #[test]
    fn test_load_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_test_csv(dir.path());

        let df = DataLoader::new().load_csv(&path).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn test_load_stage_input_normalizes_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_test_csv(dir.path());

        let df = DataLoader::new().load_stage_input(&path, "hint").unwrap();
        assert_eq!(
            schema::column_names(&df),
            vec!["year", "rd_investment", "equipment_investment"]
        );
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = DataLoader::new()
            .load_stage_input(&dir.path().join("absent.csv"), "run build first")
            .unwrap_err();
        assert!(err.is_missing_input());
        assert!(err.to_string().contains("run build first"));
    }

    #[test]
    fn test_save_csv_replaces_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "stale").unwrap();

        let mut df = DataFrame::new(vec![
            Column::new("a".into(), &[1i64, 2, 3]),
            Column::new("b".into(), &[4.5, 5.5, 6.5]),
        ])
        .unwrap();
        DataSaver::save_csv(&mut df, &path).unwrap();

        let loaded = DataLoader::new().load_csv(&path).unwrap();
        assert_eq!(loaded.height(), 3);
        assert_eq!(loaded.width(), 2);

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "staging file left behind");
    }

    #[test]
    fn test_save_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        DataSaver::save_json(&serde_json::json!({"rows": 3}), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["rows"], 3);
    }
}
