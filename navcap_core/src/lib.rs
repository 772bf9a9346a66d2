pub mod capture;
pub mod config;
pub mod control;
pub mod describe;
pub mod element;
pub mod error;
pub mod event_log;
pub mod export;
pub mod gate;
pub mod interceptors;
pub mod label;
pub mod page;
pub mod record;
pub mod runtime;
pub mod storage;

pub use capture::Capture;
pub use config::{CaptureConfig, RetryPolicy, ViewChangeMode};
pub use control::{control_channel, ControlAck, ControlClient, ControlCommand, ControlHandler};
pub use element::ElementSnapshot;
pub use error::{CaptureError, ConfigError, Result};
pub use event_log::{BoundedLog, EventLogWriter};
pub use gate::{GateState, TrackingGate};
pub use interceptors::BrowserSignal;
pub use page::{Page, ReadyState, StaticPage};
pub use record::{EventContext, EventRecord, EventType};
pub use runtime::CaptureRuntime;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
