//! Webhook alert forwarding
//!
//! Wraps another sink: every stat goes to the inner sink, alerts are also
//! POSTed as JSON to a webhook URL.

use serde::Serialize;

use super::event::Stat;
use super::TelemetrySink;
use crate::constants;
use crate::error::{MonitorError, Result};

#[derive(Debug, Serialize)]
struct AlertPayload<'a> {
    source: &'a str,
    title: &'a str,
    message: &'a str,
    timestamp: i64,
}

pub struct WebhookAlerts<T> {
    inner: T,
    url: String,
    alerts_sent: u64,
}

impl<T: TelemetrySink> WebhookAlerts<T> {
    pub fn new(inner: T, url: &str) -> Self {
        Self {
            inner,
            url: url.to_string(),
            alerts_sent: 0,
        }
    }

    fn format_payload(title: &str, message: &str) -> String {
        let payload = AlertPayload {
            source: constants::APP_NAME,
            title,
            message,
            timestamp: chrono::Utc::now().timestamp(),
        };
        serde_json::to_string(&payload).unwrap_or_default()
    }

    fn send(&mut self, title: &str, message: &str) -> Result<()> {
        let response = ureq::post(&self.url)
            .set("Content-Type", "application/json")
            .send_string(&Self::format_payload(title, message));

        match response {
            Ok(resp) => {
                self.alerts_sent += 1;
                log::info!("Alert sent to webhook ({})", resp.status());
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to send alert to webhook: {}", e);
                Err(MonitorError::Telemetry(format!("webhook: {}", e)))
            }
        }
    }
}

impl<T: TelemetrySink> TelemetrySink for WebhookAlerts<T> {
    fn init(&mut self) -> Result<()> {
        self.inner.init()
    }

    fn publish(&mut self, stat: &Stat) -> Result<()> {
        let recorded = self.inner.publish(stat);
        if let Stat::Alert { title, description } = stat {
            self.send(title, description)?;
        }
        recorded
    }

    fn done(&mut self) -> Result<()> {
        log::info!("Webhook alerts sent this run: {}", self.alerts_sent);
        self.inner.done()
    }
}
