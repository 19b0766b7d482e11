//! Low-throughput alerts raised after each completed cycle.

use log::{debug, warn};

use crate::error::NotifyError;
use crate::record::MeasurementRecord;

pub const APP_NAME: &str = "Network Health Monitor";

const LOW_DOWNLOAD_MBPS: f64 = 5.0;
const LOW_UPLOAD_MBPS: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub app_name: &'static str,
}

impl Alert {
    fn low_download(mbps: f64) -> Self {
        Self {
            title: "Low Download Speed".to_string(),
            message: format!("Download speed is {mbps:.2} Mbps"),
            app_name: APP_NAME,
        }
    }

    fn low_upload(mbps: f64) -> Self {
        Self {
            title: "Low Upload Speed".to_string(),
            message: format!("Upload speed is {mbps:.2} Mbps"),
            app_name: APP_NAME,
        }
    }
}

/// Delivers alerts to the user.
pub trait NotificationSink: Send {
    fn notify(&self, alert: &Alert) -> Result<(), NotifyError>;
}

/// Writes alerts to the log.
#[derive(Debug, Default, Clone)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        warn!("[{}] {}: {}", alert.app_name, alert.title, alert.message);
        Ok(())
    }
}

/// Windows toast notifications
#[cfg(windows)]
#[derive(Debug, Default, Clone)]
pub struct ToastSink;

#[cfg(windows)]
impl NotificationSink for ToastSink {
    fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        use winrt_notification::{Duration, Sound, Toast};

        // PowerShell's AUMID stands in until the app is registered with its own.
        Toast::new(Toast::POWERSHELL_APP_ID)
            .title(&alert.title)
            .text1(&alert.message)
            .text2(alert.app_name)
            .sound(Some(Sound::Default))
            .duration(Duration::Short)
            .show()
            .map_err(|e| NotifyError(e.to_string()))
    }
}

/// The sink native to the current platform.
pub fn default_sink() -> Box<dyn NotificationSink> {
    #[cfg(windows)]
    {
        Box::new(ToastSink)
    }
    #[cfg(not(windows))]
    {
        Box::new(LogSink)
    }
}

/// Alerts warranted by a record. Each threshold is checked independently.
pub fn check(record: &MeasurementRecord) -> Vec<Alert> {
    let mut alerts = Vec::new();
    if record.throughput.download < LOW_DOWNLOAD_MBPS {
        alerts.push(Alert::low_download(record.throughput.download));
    }
    if record.throughput.upload < LOW_UPLOAD_MBPS {
        alerts.push(Alert::low_upload(record.throughput.upload));
    }
    alerts
}

pub struct Notifier {
    sink: Box<dyn NotificationSink>,
}

impl Notifier {
    pub fn new(sink: Box<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Check a record and hand every alert to the sink. Delivery failures are
    /// logged and otherwise ignored.
    pub fn inspect(&self, record: &MeasurementRecord) -> Vec<Alert> {
        let alerts = check(record);
        for alert in &alerts {
            match self.sink.notify(alert) {
                Ok(()) => debug!("Notification shown: {} - {}", alert.title, alert.message),
                Err(e) => warn!("Failed to show notification: {e}"),
            }
        }
        alerts
    }
}
