//! Confidence Tracker
//!
//! Counts low-confidence predictions per reporting interval and decides
//! whether the interval is degraded enough to raise an alert. Optionally
//! keeps low-confidence samples in a capture ring.

use serde::Serialize;

use super::ring::RingBuffer;
use crate::logic::config::TrackerConfig;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Per-interval counters + recent confidence values
#[derive(Debug, Clone)]
pub struct ConfidenceWindow {
    recent: RingBuffer<f32>,
    low_count: u64,
    total_count: u64,
}

impl ConfidenceWindow {
    fn new(size: usize) -> Self {
        Self {
            recent: RingBuffer::new(size),
            low_count: 0,
            total_count: 0,
        }
    }

    pub fn low_count(&self) -> u64 {
        self.low_count
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }
}

/// A captured low-confidence sample
#[derive(Debug, Clone, Serialize)]
pub struct LowConfidenceSample<S> {
    /// 1-based position of the prediction in the run
    pub sequence: u64,
    pub confidence: f32,
    pub sample: S,
}

/// Result of one interval evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlertDecision {
    pub should_alert: bool,
    /// `low_count / total_count`, `None` when nothing was counted
    pub low_fraction: Option<f64>,
    pub low_count: u64,
    pub total_count: u64,
}

impl AlertDecision {
    /// No alert, nothing evaluated
    pub fn quiet() -> Self {
        Self {
            should_alert: false,
            low_fraction: None,
            low_count: 0,
            total_count: 0,
        }
    }

    pub fn low_percent(&self) -> Option<f64> {
        self.low_fraction.map(|f| f * 100.0)
    }
}

// ============================================================================
// TRACKER
// ============================================================================

#[derive(Debug, Clone)]
struct ActiveTracker<S> {
    config: TrackerConfig,
    window: ConfidenceWindow,
    captured: Option<RingBuffer<LowConfidenceSample<S>>>,
    seen: u64,
}

#[derive(Debug, Clone)]
enum TrackerState<S> {
    Disabled,
    Active(ActiveTracker<S>),
}

/// Confidence tracker. State (`Disabled` / `Active`) is fixed at construction.
#[derive(Debug, Clone)]
pub struct ConfidenceTracker<S> {
    config: TrackerConfig,
    state: TrackerState<S>,
}

impl<S> ConfidenceTracker<S> {
    pub fn new(config: TrackerConfig) -> Self {
        let state = if config.enabled {
            let captured = config
                .capture_low_confidence_samples
                .then(|| RingBuffer::new(config.capture_capacity));

            TrackerState::Active(ActiveTracker {
                window: ConfidenceWindow::new(config.window_size()),
                captured,
                seen: 0,
                config: config.clone(),
            })
        } else {
            TrackerState::Disabled
        };

        Self { config, state }
    }

    /// Tracker that ignores everything
    pub fn disabled() -> Self {
        Self::new(TrackerConfig::default())
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.state, TrackerState::Active(_))
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Record one prediction's confidence (percent)
    pub fn update(&mut self, confidence: f32, sample: S) {
        let TrackerState::Active(active) = &mut self.state else {
            return;
        };

        active.seen += 1;
        active.window.total_count += 1;
        active.window.recent.push(confidence);

        if confidence < active.config.threshold {
            active.window.low_count += 1;

            if let Some(ring) = active.captured.as_mut() {
                ring.push(LowConfidenceSample {
                    sequence: active.seen,
                    confidence,
                    sample,
                });
            }
        }
    }

    /// Evaluate the current interval and reset its counters.
    ///
    /// The capture ring is left untouched.
    pub fn evaluate_and_reset(&mut self, report_interval: u64) -> AlertDecision {
        let TrackerState::Active(active) = &mut self.state else {
            return AlertDecision::quiet();
        };

        let low_count = active.window.low_count;
        let total_count = active.window.total_count;
        active.window.low_count = 0;
        active.window.total_count = 0;

        if total_count == 0 {
            log::debug!("No predictions since last report, skipping confidence evaluation");
            return AlertDecision::quiet();
        }

        let low_percent = low_count as f64 * 100.0 / total_count as f64;
        let should_alert = low_percent >= f64::from(active.config.degradation_percent);

        log::info!(
            "{} of the last {} predictions had confidence below {}%",
            low_count,
            report_interval,
            active.config.threshold
        );

        if should_alert {
            log::warn!(
                "[CONFIDENCE ALERT] {:.1}% of predictions below {}% confidence (limit {}%)",
                low_percent,
                active.config.threshold,
                active.config.degradation_percent
            );
        }

        AlertDecision {
            should_alert,
            low_fraction: Some(low_count as f64 / total_count as f64),
            low_count,
            total_count,
        }
    }

    /// Current interval counters, `None` when disabled
    pub fn window(&self) -> Option<&ConfidenceWindow> {
        match &self.state {
            TrackerState::Active(active) => Some(&active.window),
            TrackerState::Disabled => None,
        }
    }

    /// Captured samples, oldest first
    pub fn captured(&self) -> impl Iterator<Item = &LowConfidenceSample<S>> + '_ {
        let ring = match &self.state {
            TrackerState::Active(active) => active.captured.as_ref(),
            TrackerState::Disabled => None,
        };
        ring.into_iter().flat_map(|r| r.iter())
    }

    pub fn captured_count(&self) -> usize {
        match &self.state {
            TrackerState::Active(active) => active.captured.as_ref().map_or(0, |r| r.len()),
            TrackerState::Disabled => 0,
        }
    }

    /// Mean of the recent-confidence window, `None` when disabled or empty
    pub fn mean_recent_confidence(&self) -> Option<f32> {
        let window = self.window()?;
        if window.recent.is_empty() {
            return None;
        }
        let sum: f32 = window.recent.iter().sum();
        Some(sum / window.recent.len() as f32)
    }
}

// ============================================================================
// TESTS
// ============================================================================
