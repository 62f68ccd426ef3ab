//! Inference Monitor - Main Entry Point
//!
//! Streams samples through a classifier, writes one prediction per line and
//! publishes distribution / confidence stats every `--report-interval`
//! predictions.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use inference_monitor::constants;
use inference_monitor::logic::config::{MonitorConfig, TrackerConfig};
use inference_monitor::logic::confidence::{ConfidenceTracker, LowConfidenceWriter};
use inference_monitor::logic::driver::InferenceDriver;
use inference_monitor::logic::histogram::ClassHistogram;
use inference_monitor::logic::model::{Classifier, OnnxClassifier, RemoteClassifier, ServingConfig};
use inference_monitor::logic::source::idx::pixel_bin_labels;
use inference_monitor::logic::source::{IdxDataset, JsonlSource, SampleSource, StreamInput};
use inference_monitor::logic::telemetry::event::INPUT_DISTRIBUTION;
use inference_monitor::logic::telemetry::{JsonlRecorder, Stat, TelemetrySink, WebhookAlerts};

type BoxedModel = Box<dyn Classifier<Input = Vec<f32>>>;
type BoxedSource = Box<dyn SampleSource<Sample = Vec<f32>>>;

/// Batch inference with prediction-distribution and confidence monitoring
#[derive(Parser, Debug)]
#[command(name = constants::APP_NAME, version = constants::APP_VERSION)]
struct Args {
    /// Predictions per report
    #[arg(long, alias = "stats-interval", env = "MONITOR_REPORT_INTERVAL",
          default_value_t = constants::DEFAULT_REPORT_INTERVAL)]
    report_interval: u64,

    /// Track prediction confidence and alert on degradation
    #[arg(long, env = "MONITOR_TRACK_CONF")]
    track_conf: bool,

    /// Confidence (percent) below which a prediction counts as low
    #[arg(long, env = "MONITOR_CONF_THRESH", default_value_t = constants::DEFAULT_CONF_THRESHOLD)]
    conf_thresh: f32,

    /// Percent of low-confidence predictions per interval that raises an alert
    #[arg(long, env = "MONITOR_CONF_PERCENT", default_value_t = constants::DEFAULT_CONF_PERCENT)]
    conf_percent: f32,

    /// Capture low-confidence samples and export them after the run
    #[arg(long, env = "MONITOR_OUTPUT_LOW_CONF", requires = "track_conf")]
    output_low_conf: bool,

    /// How many low-confidence samples to keep (oldest evicted first)
    #[arg(long, env = "MONITOR_LOW_CONF_CAPACITY",
          default_value_t = constants::DEFAULT_CAPTURE_CAPACITY)]
    low_conf_capacity: usize,

    /// Where captured low-confidence samples are written
    #[arg(long, env = "MONITOR_LOW_CONF_FILE", value_name = "FILE")]
    low_conf_file: Option<PathBuf>,

    /// Prediction output, one class index per line
    #[arg(long, env = "MONITOR_OUTPUT_FILE", value_name = "FILE")]
    output_file: Option<PathBuf>,

    /// Directory holding MNIST IDX test files
    #[arg(long, env = "MONITOR_INPUT_DIR", value_name = "DIR")]
    input_dir: Option<PathBuf>,

    /// JSONL samples (`{"sample":[...],"label":n}`), used instead of --input-dir
    #[arg(long, env = "MONITOR_INPUT_FILE", value_name = "FILE", conflicts_with = "input_dir")]
    input_file: Option<PathBuf>,

    /// Records to stream from the IDX dataset
    #[arg(long, env = "MONITOR_TOTAL_RECORDS", default_value_t = constants::DEFAULT_TOTAL_RECORDS)]
    total_records: u64,

    /// Pick IDX records at random instead of in order
    #[arg(long, env = "MONITOR_RANDOMIZE_INPUT")]
    randomize_input: bool,

    /// Seed for --randomize-input
    #[arg(long, env = "MONITOR_SEED", requires = "randomize_input")]
    seed: Option<u64>,

    /// ONNX model file, or a directory containing model.onnx
    #[arg(long, env = "MONITOR_MODEL", value_name = "PATH")]
    model: Option<PathBuf>,

    /// Remote serving endpoint, used instead of --model
    #[arg(long, env = "MONITOR_SERVING_URL", value_name = "URL", conflicts_with = "model")]
    serving_url: Option<String>,

    /// Model name on the serving endpoint
    #[arg(long, env = "MONITOR_MODEL_NAME", default_value = constants::DEFAULT_MODEL_NAME)]
    model_name: String,

    /// Signature name on the serving endpoint
    #[arg(long, env = "MONITOR_SIG_NAME", default_value = constants::DEFAULT_SIGNATURE_NAME)]
    sig_name: String,

    /// Number of classes the model predicts
    #[arg(long, env = "MONITOR_NUM_CLASSES", default_value_t = constants::DEFAULT_NUM_CLASSES)]
    num_classes: usize,

    /// Telemetry JSONL directory
    #[arg(long, env = "MONITOR_TELEMETRY_DIR", value_name = "DIR")]
    telemetry_dir: Option<PathBuf>,

    /// Webhook that receives confidence alerts
    #[arg(long, env = "MONITOR_ALERT_WEBHOOK", value_name = "URL")]
    alert_webhook: Option<String>,
}

impl Args {
    fn monitor_config(&self) -> Result<MonitorConfig> {
        let mut tracker = if self.track_conf {
            TrackerConfig::enabled(self.conf_thresh, self.conf_percent)
        } else {
            TrackerConfig::default()
        };
        if self.output_low_conf {
            tracker = tracker.with_capture(self.low_conf_capacity);
        }

        let defaults = MonitorConfig::default();
        Ok(MonitorConfig {
            report_interval: MonitorConfig::report_interval_from(self.report_interval)?,
            tracker,
            output_file: self.output_file.clone().unwrap_or(defaults.output_file),
            telemetry_dir: self.telemetry_dir.clone().unwrap_or(defaults.telemetry_dir),
            low_confidence_file: self
                .low_conf_file
                .clone()
                .unwrap_or(defaults.low_confidence_file),
            class_labels: constants::default_class_labels(self.num_classes),
        })
    }
}

fn load_model(args: &Args) -> Result<BoxedModel> {
    if let Some(url) = &args.serving_url {
        let mut serving = ServingConfig::new(url, args.num_classes);
        serving.model_name = args.model_name.clone();
        serving.signature_name = args.sig_name.clone();
        return Ok(Box::new(RemoteClassifier::new(serving)));
    }

    let Some(model) = &args.model else {
        log::error!("No model found. Exiting.");
        bail!("no --model or --serving-url given");
    };

    let path = match OnnxClassifier::resolve_path(model) {
        Ok(path) => path,
        Err(e) => {
            log::error!("No model found. Exiting.");
            return Err(e.into());
        }
    };
    let classifier = OnnxClassifier::load(&path, args.num_classes)
        .with_context(|| format!("loading model {}", path.display()))?;
    Ok(Box::new(classifier))
}

/// Pick the sample source; IDX input also yields its pixel-value distribution
fn open_source(args: &Args) -> Result<(BoxedSource, Option<Stat>)> {
    if let Some(path) = &args.input_file {
        let source: JsonlSource<_, Vec<f32>> = JsonlSource::open(path)
            .with_context(|| format!("opening input file {}", path.display()))?;
        return Ok((Box::new(source), None));
    }

    let dir = args.input_dir.clone().unwrap_or_else(constants::default_input_dir);
    let dataset = IdxDataset::load_dir(&dir)
        .with_context(|| format!("loading IDX dataset from {}", dir.display()))?;
    let distribution = Stat::bar_graph(
        INPUT_DISTRIBUTION,
        &pixel_bin_labels(constants::DEFAULT_PIXEL_BINS),
        dataset.pixel_histogram(constants::DEFAULT_PIXEL_BINS),
    );

    let mut stream = StreamInput::new(dataset, args.total_records);
    if args.randomize_input {
        stream = stream.randomized(args.seed);
    }
    Ok((Box::new(stream), Some(distribution)))
}

fn open_telemetry(config: &MonitorConfig, webhook: Option<&str>) -> Box<dyn TelemetrySink> {
    let recorder = JsonlRecorder::new(config.telemetry_dir.clone());
    match webhook {
        Some(url) => {
            log::info!("Confidence alerts forwarded to {}", url);
            Box::new(WebhookAlerts::new(recorder, url))
        }
        None => Box::new(recorder),
    }
}

fn open_output(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    log::info!("Writing predictions to {}", path.display());
    Ok(BufWriter::new(file))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Starting {} v{}", constants::APP_NAME, constants::APP_VERSION);

    let config = args.monitor_config()?;
    let model = load_model(&args)?;
    config
        .validate(model.num_classes())
        .context("invalid configuration")?;

    let (mut source, input_distribution) = open_source(&args)?;
    let telemetry = open_telemetry(&config, args.alert_webhook.as_deref());

    let mut driver = InferenceDriver::new(
        model,
        telemetry,
        config.report_interval,
        ConfidenceTracker::new(config.tracker.clone()),
        ClassHistogram::with_labels(config.class_labels.clone()),
    );

    if let Some(stat) = input_distribution {
        driver.publish_on_start(stat);
    }

    let output = open_output(&config.output_file)?;
    let summary = driver
        .run(source.as_mut(), output)
        .context("inference run failed")?;

    if config.tracker.capture_low_confidence_samples {
        let writer = LowConfidenceWriter::new(config.low_confidence_file.clone());
        writer
            .write_all(driver.tracker().captured())
            .with_context(|| format!("exporting to {}", writer.path().display()))?;
    }

    if let Some(stats) = driver.model().stats() {
        log::info!(
            "[{}] {} inferences, avg latency {:.2} ms",
            stats.backend,
            stats.inference_count,
            stats.avg_latency_ms
        );
    }

    if summary.telemetry_failures > 0 {
        log::warn!("{} telemetry publishes failed", summary.telemetry_failures);
    }

    log::info!(
        "Processed {} predictions, {} reports, {} confidence alerts",
        summary.processed,
        summary.reports,
        summary.alerts
    );
    log::info!("Inference batch complete");
    Ok(())
}
