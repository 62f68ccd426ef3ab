//! Telemetry Module
//!
//! Publishing of run statistics to an external monitoring system.
//! The core decides values and cadence; sinks decide delivery.
//!
//! ## Structure
//! - `event.rs` - `Stat` (scalar / table / bar graph / alert) + event wrapper
//! - `recorder.rs` - Append-only JSONL sink
//! - `webhook.rs` - Decorator forwarding alerts to a webhook
//!
//! ## Usage
//! ```ignore
//! let mut recorder = JsonlRecorder::new(dir);
//! let mut session = TelemetrySession::begin(&mut recorder)?; // init
//! session.publish(Stat::scalar(PREDICTIONS_COUNT, 100.0));
//! session.finish()?;                                          // done
//! ```

pub mod event;
pub mod recorder;
pub mod webhook;

pub use event::{Stat, TableRow, TelemetryEvent};
pub use recorder::JsonlRecorder;
pub use webhook::WebhookAlerts;

use crate::error::Result;

// ============================================================================
// SINK TRAIT
// ============================================================================

/// Destination for published stats
pub trait TelemetrySink {
    /// Called once before the first publish
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn publish(&mut self, stat: &Stat) -> Result<()>;

    /// Called once after the last publish, on every exit path
    fn done(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for Box<T> {
    fn init(&mut self) -> Result<()> {
        (**self).init()
    }

    fn publish(&mut self, stat: &Stat) -> Result<()> {
        (**self).publish(stat)
    }

    fn done(&mut self) -> Result<()> {
        (**self).done()
    }
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for &mut T {
    fn init(&mut self) -> Result<()> {
        (**self).init()
    }

    fn publish(&mut self, stat: &Stat) -> Result<()> {
        (**self).publish(stat)
    }

    fn done(&mut self) -> Result<()> {
        (**self).done()
    }
}

// ============================================================================
// SCOPED SESSION
// ============================================================================

/// `init` on begin, `done` on finish or drop.
///
/// Publish failures are logged and counted, never propagated: delivery is
/// the sink's concern, not the inference loop's.
pub struct TelemetrySession<'a, T: TelemetrySink + ?Sized> {
    sink: &'a mut T,
    failures: u64,
    finished: bool,
}

impl<'a, T: TelemetrySink + ?Sized> TelemetrySession<'a, T> {
    pub fn begin(sink: &'a mut T) -> Result<Self> {
        sink.init()?;
        Ok(Self {
            sink,
            failures: 0,
            finished: false,
        })
    }

    pub fn publish(&mut self, stat: Stat) {
        if let Err(e) = self.sink.publish(&stat) {
            self.failures += 1;
            log::warn!("Telemetry publish failed for '{}': {}", stat.name(), e);
        }
    }

    /// Publish failures so far
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// End the session, surfacing a `done` failure
    pub fn finish(mut self) -> Result<()> {
        self.finished = true;
        self.sink.done()
    }
}

impl<T: TelemetrySink + ?Sized> Drop for TelemetrySession<'_, T> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.sink.done() {
            log::error!("Telemetry shutdown failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MonitorError;

    #[derive(Default)]
    struct CountingSink {
        inits: u32,
        dones: u32,
        published: Vec<Stat>,
        fail_publish: bool,
    }

    impl TelemetrySink for CountingSink {
        fn init(&mut self) -> Result<()> {
            self.inits += 1;
            Ok(())
        }

        fn publish(&mut self, stat: &Stat) -> Result<()> {
            if self.fail_publish {
                return Err(MonitorError::Telemetry("offline".to_string()));
            }
            self.published.push(stat.clone());
            Ok(())
        }

        fn done(&mut self) -> Result<()> {
            self.dones += 1;
            Ok(())
        }
    }

    #[test]
    fn test_finish_runs_done_once() {
        let mut sink = CountingSink::default();
        let mut session = TelemetrySession::begin(&mut sink).unwrap();
        session.publish(Stat::scalar("a", 1.0));
        session.finish().unwrap();

        assert_eq!((sink.inits, sink.dones), (1, 1));
        assert_eq!(sink.published.len(), 1);
    }

    #[test]
    fn test_drop_runs_done() {
        let mut sink = CountingSink::default();
        {
            let _session = TelemetrySession::begin(&mut sink).unwrap();
        }
        assert_eq!(sink.dones, 1);
    }

    #[test]
    fn test_publish_failures_counted() {
        let mut sink = CountingSink { fail_publish: true, ..Default::default() };
        let mut session = TelemetrySession::begin(&mut sink).unwrap();
        session.publish(Stat::scalar("a", 1.0));
        session.publish(Stat::scalar("b", 2.0));
        assert_eq!(session.failures(), 2);
        drop(session);
        assert_eq!(sink.dones, 1);
    }

    #[test]
    fn test_boxed_sink() {
        let mut sink: Box<dyn TelemetrySink> = Box::new(CountingSink::default());
        let session = TelemetrySession::begin(&mut sink).unwrap();
        assert!(session.finish().is_ok());
    }
}
