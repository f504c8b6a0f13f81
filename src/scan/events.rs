use serde::Serialize;
use tokio::sync::mpsc;

use super::ScanState;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NavigationIntent {
    Dashboard,
}

/// Everything the scan controller tells the outside world.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ScanEvent {
    StateChanged { state: ScanState },
    Notice { level: NoticeLevel, message: String },
    Navigate { intent: NavigationIntent },
}

/// Receives controller events (toasts, navigation, state changes).
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ScanEvent);
}

/// Writes notices to the log; drops state changes.
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: ScanEvent) {
        match event {
            ScanEvent::Notice { level, message } => match level {
                NoticeLevel::Error => log::error!("{message}"),
                NoticeLevel::Warning => log::warn!("{message}"),
                NoticeLevel::Info | NoticeLevel::Success => log::info!("{message}"),
            },
            ScanEvent::Navigate { intent } => log::info!("navigate to {intent:?}"),
            ScanEvent::StateChanged { .. } => {}
        }
    }
}

/// Forwards every event over an unbounded channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ScanEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ScanEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: ScanEvent) {
        let _ = self.tx.send(event);
    }
}
