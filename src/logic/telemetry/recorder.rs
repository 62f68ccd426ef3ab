//! Telemetry Recorder
//!
//! Append-only JSONL writer for published stats. One file per run, rotated
//! when it would grow past the size limit (50 MB by default).

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Datelike, Timelike, Utc};
use uuid::Uuid;

use super::event::{Stat, TelemetryEvent};
use super::TelemetrySink;
use crate::constants;
use crate::error::{MonitorError, Result};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default file size before rotation (50 MB)
const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Log file extension
const LOG_EXT: &str = ".jsonl";

// ============================================================================
// RECORDER
// ============================================================================

pub struct JsonlRecorder {
    writer: Option<BufWriter<File>>,
    current_file: Option<PathBuf>,
    current_size: u64,
    max_file_size: u64,
    base_dir: PathBuf,
    session_id: String,
    events_recorded: u64,
    started_at: Option<chrono::DateTime<Utc>>,
}

impl JsonlRecorder {
    /// Recorder writing under `base_dir`; files are opened on `init`
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            writer: None,
            current_file: None,
            current_size: 0,
            max_file_size: MAX_FILE_SIZE,
            base_dir,
            session_id: Uuid::new_v4().to_string(),
            events_recorded: 0,
            started_at: None,
        }
    }

    /// Rotate once a file would grow past `bytes`
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Open a new log file with timestamp
    fn open_new_file(base_dir: &Path) -> std::io::Result<(PathBuf, File)> {
        let now = Utc::now();
        let filename = format!(
            "telemetry_{}_{:02}_{:02}_{:02}{:02}{:02}_{:09}{}",
            now.year(),
            now.month(),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
            now.nanosecond(),
            LOG_EXT
        );
        let file_path = base_dir.join(&filename);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;

        log::info!("Opened telemetry log: {:?}", file_path);
        Ok((file_path, file))
    }

    fn write_event(&mut self, event: &TelemetryEvent) -> Result<()> {
        let line = event.to_jsonl();
        let bytes = line.as_bytes();

        if self.current_size + bytes.len() as u64 > self.max_file_size {
            self.rotate()?;
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| MonitorError::Telemetry("recorder not initialized".to_string()))?;

        writer.write_all(bytes)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        self.current_size += bytes.len() as u64 + 1;
        self.events_recorded += 1;
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }

        let (new_path, new_file) = Self::open_new_file(&self.base_dir)?;
        log::info!("Rotated from {:?} to {:?}", self.current_file, new_path);

        self.writer = Some(BufWriter::new(new_file));
        self.current_file = Some(new_path);
        self.current_size = 0;
        Ok(())
    }
}

impl TelemetrySink for JsonlRecorder {
    fn init(&mut self) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        self.rotate()?;
        self.started_at = Some(Utc::now());

        let start = Stat::marker(
            "run_start",
            serde_json::json!({
                "app": constants::APP_NAME,
                "version": constants::APP_VERSION,
                "platform": std::env::consts::OS,
            }),
        );
        self.publish(&start)
    }

    fn publish(&mut self, stat: &Stat) -> Result<()> {
        let event = TelemetryEvent::new(&self.session_id, stat.clone());
        self.write_event(&event)
    }

    fn done(&mut self) -> Result<()> {
        if self.writer.is_none() {
            return Ok(());
        }

        let uptime_secs = self
            .started_at
            .map(|t| (Utc::now() - t).num_seconds().max(0))
            .unwrap_or(0);
        let stop = Stat::marker("run_stop", serde_json::json!({ "uptime_secs": uptime_secs }));
        let result = self.publish(&stop);

        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        log::info!("Telemetry recorder shutdown. Total events: {}", self.events_recorded);
        result
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use tempfile::TempDir;

    fn read_events(file_path: &Path) -> Result<Vec<TelemetryEvent>> {
        let reader = BufReader::new(File::open(file_path)?);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if !line.is_empty() {
                events.push(serde_json::from_str::<TelemetryEvent>(&line)?);
            }
        }
        Ok(events)
    }

    #[test]
    fn test_init_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut recorder = JsonlRecorder::new(temp_dir.path().join("telemetry"));
        recorder.init().unwrap();

        assert!(recorder.current_file.as_deref().unwrap().exists());
        assert_eq!(recorder.events_recorded, 1);
    }

    #[test]
    fn test_publish_before_init_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut recorder = JsonlRecorder::new(temp_dir.path().to_path_buf());
        let err = recorder.publish(&Stat::scalar("x", 1.0)).unwrap_err();
        assert!(matches!(err, MonitorError::Telemetry(_)));
    }

    #[test]
    fn test_jsonl_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let mut recorder = JsonlRecorder::new(temp_dir.path().to_path_buf());
        recorder.init().unwrap();

        for i in 0..3 {
            recorder.publish(&Stat::scalar("Predictions Count", i as f64)).unwrap();
        }
        let path = recorder.current_file.as_deref().unwrap().to_path_buf();
        recorder.done().unwrap();

        let events = read_events(&path).unwrap();
        // start marker + 3 stats + stop marker
        assert_eq!(events.len(), 5);
        assert!(events.iter().all(|e| e.session_id == recorder.session_id));
        assert_eq!(events[1].stat, Stat::scalar("Predictions Count", 0.0));
        assert_eq!(events[4].stat.name(), "run_stop");
    }

    #[test]
    fn test_done_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let mut recorder = JsonlRecorder::new(temp_dir.path().to_path_buf());
        recorder.init().unwrap();
        recorder.done().unwrap();
        recorder.done().unwrap();
        assert_eq!(recorder.events_recorded, 2);
    }

    #[test]
    fn test_rotates_past_max_size() {
        let temp_dir = TempDir::new().unwrap();
        let mut recorder =
            JsonlRecorder::new(temp_dir.path().to_path_buf()).with_max_file_size(1024);
        recorder.init().unwrap();
        let first_file = recorder.current_file.as_deref().unwrap().to_path_buf();

        for i in 0..20 {
            recorder.publish(&Stat::scalar("Predictions Count", i as f64)).unwrap();
        }
        assert_ne!(recorder.current_file.as_deref().unwrap(), first_file.as_path());
        recorder.done().unwrap();

        let files: Vec<PathBuf> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert!(files.len() > 1);

        let mut total_events = 0;
        for file in &files {
            assert!(std::fs::metadata(file).unwrap().len() <= 1024);
            total_events += read_events(file).unwrap().len();
        }
        // start marker + 20 stats + stop marker, none lost across files
        assert_eq!(total_events, 22);
    }
}
