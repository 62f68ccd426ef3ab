//! JSONL sample source
//!
//! One `{"sample": [...], "label": n}` object per line. Blank lines are
//! skipped, malformed lines fail the source.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::de::DeserializeOwned;

use super::{LabeledSample, SampleSource};
use crate::error::{MonitorError, Result};

pub struct JsonlSource<R, S> {
    reader: R,
    line_no: u64,
    buf: String,
    _sample: std::marker::PhantomData<S>,
}

impl<S> JsonlSource<BufReader<File>, S> {
    pub fn open(path: &Path) -> Result<Self> {
        log::info!("Reading samples from: {}", path.display());
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead, S> JsonlSource<R, S> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
            _sample: std::marker::PhantomData,
        }
    }
}

impl<R: BufRead, S: DeserializeOwned> SampleSource for JsonlSource<R, S> {
    type Sample = S;

    fn next_sample(&mut self) -> Result<Option<LabeledSample<S>>> {
        loop {
            self.buf.clear();
            let read = self
                .reader
                .read_line(&mut self.buf)
                .map_err(|e| MonitorError::Source(format!("read failed: {}", e)))?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }

            let sample = serde_json::from_str(line).map_err(|e| {
                MonitorError::Source(format!("line {}: {}", self.line_no, e))
            })?;
            return Ok(Some(sample));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_until_eof() {
        let data = "{\"sample\": [0.1, 0.2], \"label\": 3}\n\n{\"sample\": [0.5, 0.5]}\n";
        let mut source: JsonlSource<_, Vec<f32>> = JsonlSource::new(Cursor::new(data));

        let first = source.next_sample().unwrap().unwrap();
        assert_eq!(first.label, Some(3));

        let second = source.next_sample().unwrap().unwrap();
        assert_eq!(second.sample, vec![0.5, 0.5]);
        assert_eq!(second.label, None);

        assert!(source.next_sample().unwrap().is_none());
    }

    #[test]
    fn test_malformed_line_is_source_error() {
        let data = "{\"sample\": [1.0]}\nnot json\n";
        let mut source: JsonlSource<_, Vec<f32>> = JsonlSource::new(Cursor::new(data));

        assert!(source.next_sample().unwrap().is_some());
        let err = source.next_sample().unwrap_err();
        assert!(matches!(err, MonitorError::Source(ref msg) if msg.starts_with("line 2")));
    }
}
