//! Prediction output - append-only, one class index per line

use std::io::{self, Write};

/// Owns the output sink for the duration of a run.
///
/// The sink is closed when this value is dropped, so every exit path of the
/// driver closes it exactly once.
pub struct PredictionWriter<W: Write> {
    inner: W,
    lines: u64,
}

impl<W: Write> PredictionWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, lines: 0 }
    }

    /// Append one prediction
    pub fn append(&mut self, predicted_class: usize) -> io::Result<()> {
        writeln!(self.inner, "{}", predicted_class)?;
        self.lines += 1;
        Ok(())
    }

    /// Flush and close the sink
    pub fn finish(mut self) -> io::Result<u64> {
        self.inner.flush()?;
        Ok(self.lines)
    }
}
