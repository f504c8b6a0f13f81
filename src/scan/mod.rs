pub mod browser;
pub mod controller;
pub mod events;
pub mod state;

pub use browser::BrowserKind;
pub use controller::{ScanController, ScanOptions};
pub use events::{ChannelSink, EventSink, LogSink, NavigationIntent, NoticeLevel, ScanEvent};
pub use state::{ScanPhase, ScanResult, ScanState};
