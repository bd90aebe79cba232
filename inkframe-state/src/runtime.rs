//! The cooperative control loop
//!
//! Each tick handles at most one input event, then checks the scheduler,
//! then polls if due. Network calls block the tick for up to their
//! timeouts; nothing runs in the background. Anything produced on another
//! thread (button presses, signals) must reach the loop as an
//! [`InputEvent`] rather than by touching the state directly.

use std::time::Instant;

use api_client::{ClientError, Registration};
use tracing::{debug, info, warn};

use crate::api::{DeviceApi, DeviceIdProvider, FramePresenter};
use crate::buffer::DisplayGeometry;
use crate::machine::{ModeStateMachine, Outcome, Reconciliation};
use crate::scheduler::PollScheduler;

/// A local trigger from the device's input hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Switch between dashboard and photos
    Toggle,
    /// Show the next photo
    Advance,
}

/// Startup settings for [`DisplayLoop`]
#[derive(Debug, Clone)]
pub struct LoopOptions {
    /// Panel dimensions
    /// Default: 200x200
    pub geometry: DisplayGeometry,

    /// Panel identifier sent at registration
    /// Default: "154_BW"
    pub display_type: String,

    /// Firmware version sent at registration
    /// Default: this crate's version
    pub firmware_version: String,

    /// Whether to register the device during startup
    /// Default: true
    pub register_on_startup: bool,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            geometry: DisplayGeometry::default(),
            display_type: "154_BW".to_string(),
            firmware_version: env!("CARGO_PKG_VERSION").to_string(),
            register_on_startup: true,
        }
    }
}

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// A poll request was issued
    pub polled: bool,
    /// A new frame was presented
    pub presented: bool,
}

/// Drives the state machine from input events and the poll schedule
pub struct DisplayLoop<A, P> {
    api: A,
    presenter: P,
    machine: ModeStateMachine,
    scheduler: PollScheduler,
    device_id: String,
    options: LoopOptions,
}

impl<A: DeviceApi, P: FramePresenter> DisplayLoop<A, P> {
    pub fn new(
        api: A,
        presenter: P,
        identity: &dyn DeviceIdProvider,
        options: LoopOptions,
    ) -> Self {
        Self {
            api,
            presenter,
            machine: ModeStateMachine::new(options.geometry),
            scheduler: PollScheduler::new(),
            device_id: identity.device_id(),
            options,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn machine(&self) -> &ModeStateMachine {
        &self.machine
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Bring the device online: register, load settings, run the first poll
    ///
    /// Every step is best effort. If the first poll does not refresh the
    /// display, the dashboard is fetched so the panel shows something. The
    /// next regular poll is due one interval after `now`.
    pub fn startup(&mut self, now: Instant) {
        if self.options.register_on_startup {
            self.register();
        }

        match self.api.image_info() {
            Ok(info) => self.machine.apply_image_info(&info),
            Err(e) => warn!(error = %e, "failed to fetch image settings"),
        }

        info!("initial server poll");
        let refreshed = match self.machine.poll_cycle(&self.api) {
            Ok(Reconciliation::Refreshed(outcome)) => {
                self.present_if(outcome.frame_changed());
                true
            }
            Ok(Reconciliation::Synced) | Err(_) => false,
        };

        if !refreshed {
            let outcome = self.machine.show_dashboard(&self.api);
            self.present_if(outcome.frame_changed());
        }

        self.scheduler.record_poll(now);
    }

    fn register(&self) {
        match self.api.health_check() {
            Ok(()) => debug!("server reachable"),
            Err(ClientError::Transport(e)) => {
                warn!(error = %e, "server unreachable, skipping registration");
                return;
            }
            Err(e) => warn!(error = %e, "health check failed"),
        }

        let registration = Registration {
            device_id: self.device_id.clone(),
            display_type: self.options.display_type.clone(),
            firmware_version: self.options.firmware_version.clone(),
        };
        if let Err(e) = self.api.register(&registration) {
            warn!(error = %e, "device registration failed");
        }
    }

    /// Run one iteration: input first, then the scheduled poll
    pub fn tick(&mut self, now: Instant, input: Option<InputEvent>) -> TickReport {
        let mut report = TickReport::default();

        match input {
            Some(InputEvent::Toggle) => {
                let outcome = self.machine.toggle(&self.api);
                report.presented |= self.present_if(outcome.frame_changed());
                self.scheduler.force_immediate();
            }
            Some(InputEvent::Advance) => {
                let outcome = self.machine.advance_image(&self.api);
                report.presented |=
                    self.present_if(outcome.is_some_and(|o: Outcome| o.frame_changed()));
            }
            None => {}
        }

        if self
            .scheduler
            .is_due(now, self.machine.state().poll_interval_secs)
        {
            report.polled = true;
            if let Ok(reconciliation) = self.machine.poll_cycle(&self.api) {
                report.presented |= self.present_if(reconciliation.frame_changed());
            }
            self.scheduler.record_poll(now);
        }

        report
    }

    fn present_if(&mut self, changed: bool) -> bool {
        if !changed {
            return false;
        }

        match self.presenter.present(self.machine.frame()) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to present frame");
                false
            }
        }
    }
}
