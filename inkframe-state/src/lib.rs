//! InkFrame device state
//!
//! The device side of the InkFrame poll/reconcile protocol: what the panel
//! should show, how server instructions are merged, and when to ask again.
//!
//! # Architecture
//!
//! ```text
//! InputEvent ─┐
//!             ├─> DisplayLoop ─> ModeStateMachine ─> DeviceApi (server)
//! Scheduler ──┘                        │
//!                                      └─> ImageBuffer ─> FramePresenter
//! ```
//!
//! [`ModeStateMachine`] is the single owner of [`DeviceState`] and the
//! displayed [`ImageBuffer`]. A frame only replaces the current one once it
//! has been received in full, so a failed download never shows up on the
//! panel.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::time::{Duration, Instant};
//! use api_client::{ClientConfig, InkframeClient};
//! use inkframe_state::{DisplayLoop, LoopOptions, StaticDeviceId};
//!
//! let identity = StaticDeviceId("a1b2c3d4".to_string());
//! let client = InkframeClient::new(ClientConfig::default(), identity.0.clone());
//! let mut display = DisplayLoop::new(client, presenter, &identity, LoopOptions::default());
//!
//! display.startup(Instant::now());
//! loop {
//!     display.tick(Instant::now(), None);
//!     std::thread::sleep(Duration::from_millis(50));
//! }
//! ```

pub mod api;
pub mod buffer;
pub mod error;
pub mod machine;
pub mod model;
pub mod runtime;
pub mod scheduler;

// Logging infrastructure
pub mod logging;

// ============================================================================
// Re-exports
// ============================================================================

pub use api::{DeviceApi, DeviceIdProvider, FramePresenter, StaticDeviceId};
pub use buffer::{DisplayGeometry, ImageBuffer};
pub use error::{BufferError, PresentError};
pub use machine::{ModeStateMachine, Outcome, Reconciliation};
pub use model::{DeviceState, Instruction, DEFAULT_POLL_INTERVAL_SECS};
pub use runtime::{DisplayLoop, InputEvent, LoopOptions, TickReport};
pub use scheduler::{is_due, PollScheduler};

pub use logging::{
    init_logging, init_logging_from_env, is_initialized, LoggingError, LoggingMode,
};
