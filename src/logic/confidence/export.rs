//! Low-confidence exemplar export
//!
//! Writes captured samples as JSONL, one record per line, so they can be
//! inspected or relabelled offline.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::tracker::LowConfidenceSample;
use crate::error::Result;

/// One exported line
#[derive(Debug, Serialize)]
struct ExemplarRecord<'a, S> {
    exported_at: DateTime<Utc>,
    sequence: u64,
    confidence: f32,
    sample: &'a S,
}

pub struct LowConfidenceWriter {
    path: PathBuf,
}

impl LowConfidenceWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write all samples (truncates any previous export)
    pub fn write_all<'a, S, I>(&self, samples: I) -> Result<usize>
    where
        S: Serialize + 'a,
        I: IntoIterator<Item = &'a LowConfidenceSample<S>>,
    {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = BufWriter::new(File::create(&self.path)?);
        let exported_at = Utc::now();
        let mut count = 0;

        for captured in samples {
            let record = ExemplarRecord {
                exported_at,
                sequence: captured.sequence,
                confidence: captured.confidence,
                sample: &captured.sample,
            };
            let json = serde_json::to_string(&record)?;
            writeln!(writer, "{}", json)?;
            count += 1;
        }

        writer.flush()?;
        log::info!("Exported {} low-confidence samples to {:?}", count, self.path);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_export_jsonl() {
        let dir = tempdir().unwrap();
        let writer = LowConfidenceWriter::new(dir.path().join("nested").join("low.jsonl"));

        let samples = vec![
            LowConfidenceSample { sequence: 4, confidence: 31.5, sample: vec![0.0f32, 1.0] },
            LowConfidenceSample { sequence: 9, confidence: 12.0, sample: vec![0.5f32, 0.5] },
        ];

        let count = writer.write_all(&samples).unwrap();
        assert_eq!(count, 2);

        let content = fs::read_to_string(writer.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["sequence"], 4);
        assert_eq!(first["confidence"], 31.5);
        assert_eq!(first["sample"], serde_json::json!([0.0, 1.0]));
    }

    #[test]
    fn test_export_empty_creates_file() {
        let dir = tempdir().unwrap();
        let writer = LowConfidenceWriter::new(dir.path().join("low.jsonl"));
        let samples: Vec<LowConfidenceSample<u8>> = Vec::new();

        assert_eq!(writer.write_all(&samples).unwrap(), 0);
        assert!(writer.path().exists());
    }
}
