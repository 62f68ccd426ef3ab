//! Inference Driver - the batch loop
//!
//! pull sample -> infer -> derive prediction -> persist -> histogram ->
//! confidence tracker -> (every `report_interval` predictions) report.
//!
//! The loop ends cleanly when the source runs dry. Model, source and
//! invalid-class errors abort the run; the output sink and the telemetry
//! session are released on every exit path.


use std::io::Write;
use std::num::NonZeroU64;

use serde::Serialize;

use crate::error::Result;
use crate::logic::confidence::{AlertDecision, ConfidenceTracker};
use crate::logic::histogram::ClassHistogram;
use crate::logic::model::{Classifier, PredictionEvent};
use crate::logic::output::PredictionWriter;
use crate::logic::source::{LabeledSample, SampleSource};
use crate::logic::telemetry::event::{
    CONFIDENCE_ALERT, DISTRIBUTION_BAR_GRAPH, DISTRIBUTION_TABLE, LOW_CONFIDENCE_COUNT,
    MEAN_RECENT_CONFIDENCE, PREDICTIONS_COUNT,
};
use crate::logic::telemetry::{Stat, TableRow, TelemetrySession, TelemetrySink};

/// What a finished run did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub processed: u64,
    pub reports: u64,
    pub alerts: u64,
    pub captured: usize,
    pub telemetry_failures: u64,
}

pub struct InferenceDriver<M: Classifier, T> {
    model: M,
    telemetry: T,
    report_interval: NonZeroU64,
    tracker: ConfidenceTracker<M::Input>,
    histogram: ClassHistogram,
    start_stats: Vec<Stat>,
}

impl<M: Classifier, T: TelemetrySink> InferenceDriver<M, T> {
    pub fn new(
        model: M,
        telemetry: T,
        report_interval: NonZeroU64,
        tracker: ConfidenceTracker<M::Input>,
        histogram: ClassHistogram,
    ) -> Self {
        Self {
            model,
            telemetry,
            report_interval,
            tracker,
            histogram,
            start_stats: Vec::new(),
        }
    }

    /// Queue a stat to publish right after telemetry init
    pub fn publish_on_start(&mut self, stat: Stat) {
        self.start_stats.push(stat);
    }

    /// Run until the source is exhausted.
    ///
    /// `sink` is owned by the run and closed exactly once, whatever the
    /// outcome. A trailing partial interval is not reported.
    pub fn run<S, W>(&mut self, source: &mut S, sink: W) -> Result<RunSummary>
    where
        S: SampleSource<Sample = M::Input> + ?Sized,
        W: Write,
    {
        let mut output = PredictionWriter::new(sink);
        let mut telemetry = TelemetrySession::begin(&mut self.telemetry)?;

        for stat in self.start_stats.drain(..) {
            telemetry.publish(stat);
        }

        let interval = self.report_interval.get();
        let mut summary = RunSummary::default();

        while let Some(LabeledSample { sample, .. }) = source.next_sample()? {
            let probabilities = self.model.infer(&sample)?;
            let event = PredictionEvent::derive(&probabilities, sample)?;

            output.append(event.predicted_class)?;
            self.histogram.record(event.predicted_class)?;
            self.tracker.update(event.confidence, event.sample);

            summary.processed += 1;

            if summary.processed % interval == 0 {
                let decision = emit_report(
                    &mut telemetry,
                    &self.histogram,
                    &mut self.tracker,
                    summary.processed,
                    interval,
                );
                summary.reports += 1;
                if decision.should_alert {
                    summary.alerts += 1;
                }
            }
        }

        log::info!("Reached end of input");

        let written = output.finish()?;
        log::info!("Wrote {} predictions", written);
        summary.captured = self.tracker.captured_count();
        summary.telemetry_failures = telemetry.failures();
        telemetry.finish()?;

        Ok(summary)
    }

    pub fn tracker(&self) -> &ConfidenceTracker<M::Input> {
        &self.tracker
    }

    pub fn histogram(&self) -> &ClassHistogram {
        &self.histogram
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }
}

/// Publish distribution stats + the tracker's interval report.
///
/// The table stat carries only this report's row; sinks append it to the
/// rows they already hold.
fn emit_report<T, I>(
    telemetry: &mut TelemetrySession<'_, T>,
    histogram: &ClassHistogram,
    tracker: &mut ConfidenceTracker<I>,
    processed: u64,
    interval: u64,
) -> AlertDecision
where
    T: TelemetrySink + ?Sized,
{
    for (label, count) in histogram.iter() {
        log::info!("category: {} predictions: {}", label, count);
    }

    let snapshot = histogram.snapshot();
    let row = TableRow {
        key: processed.to_string(),
        values: snapshot.clone(),
    };

    telemetry.publish(Stat::scalar(PREDICTIONS_COUNT, interval as f64));
    telemetry.publish(Stat::table(DISTRIBUTION_TABLE, histogram.labels(), vec![row]));
    telemetry.publish(Stat::bar_graph(DISTRIBUTION_BAR_GRAPH, histogram.labels(), snapshot));

    let decision = tracker.evaluate_and_reset(interval);
    if !tracker.is_enabled() {
        return decision;
    }

    telemetry.publish(Stat::scalar(LOW_CONFIDENCE_COUNT, decision.low_count as f64));

    if let Some(mean) = tracker.mean_recent_confidence() {
        log::info!("Mean confidence of recent predictions: {:.1}%", mean);
        telemetry.publish(Stat::scalar(MEAN_RECENT_CONFIDENCE, f64::from(mean)));
    }

    if decision.should_alert {
        let percent = decision.low_percent().unwrap_or(0.0);
        telemetry.publish(Stat::alert(
            CONFIDENCE_ALERT,
            format!(
                "{:.1}% of the last {} predictions had confidence below {}% (limit {}%)",
                percent,
                decision.total_count,
                tracker.config().threshold,
                tracker.config().degradation_percent
            ),
        ));
    }

    decision
}
