//! Display mode state machine
//!
//! Owns the [`DeviceState`] and the [`ImageBuffer`], merges server
//! instructions, and decides which bitmap to fetch. Image content that
//! cannot be shown, whether because the fetch failed or the device has no
//! images, falls back to the dashboard. When the dashboard fails too, the
//! previous frame stays on screen.

use std::time::Duration;

use api_client::{ClientError, ContentDescriptor, DisplayMode, FetchError, ImageInfo};
use tracing::{debug, info, warn};

use crate::api::DeviceApi;
use crate::buffer::{DisplayGeometry, ImageBuffer};
use crate::model::{self, DeviceState, Instruction};

/// What a content acquisition ended up doing to the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The requested content was fetched and committed
    Committed(ContentDescriptor),
    /// Image content was unavailable, so the mode dropped to the dashboard
    FellBack {
        /// Whether the dashboard fetch succeeded and was committed
        dashboard_committed: bool,
    },
    /// Nothing was committed; the previous frame remains
    Retained,
}

impl Outcome {
    /// Whether a new frame was committed and should be presented
    pub fn frame_changed(&self) -> bool {
        match self {
            Outcome::Committed(_) => true,
            Outcome::FellBack {
                dashboard_committed,
            } => *dashboard_committed,
            Outcome::Retained => false,
        }
    }
}

/// Result of merging one poll response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// State merged, no content requested
    Synced,
    /// The display was refreshed
    Refreshed(Outcome),
}

impl Reconciliation {
    pub fn frame_changed(&self) -> bool {
        match self {
            Reconciliation::Synced => false,
            Reconciliation::Refreshed(outcome) => outcome.frame_changed(),
        }
    }
}

/// Where a fetch was triggered from; decides how the bitmap's total-count
/// hint is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// A poll response just set the total, and it wins
    Poll,
    /// No fresher source exists, so the hint is merged
    Local,
}

/// Single owner of device state and the displayed frame
#[derive(Debug, Clone)]
pub struct ModeStateMachine {
    state: DeviceState,
    buffer: ImageBuffer,
    rotate_interval: Duration,
}

impl ModeStateMachine {
    pub fn new(geometry: DisplayGeometry) -> Self {
        Self::with_state(geometry, DeviceState::default())
    }

    /// Start from a known state; the invariants are enforced on entry
    pub fn with_state(geometry: DisplayGeometry, mut state: DeviceState) -> Self {
        state.enforce_invariants();
        Self {
            state,
            buffer: ImageBuffer::new(geometry),
            rotate_interval: Duration::from_secs(3600),
        }
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn frame(&self) -> &ImageBuffer {
        &self.buffer
    }

    /// Photo rotation interval from the legacy settings channel
    pub fn rotate_interval(&self) -> Duration {
        self.rotate_interval
    }

    /// Poll the server and merge its answer
    ///
    /// Errors leave the state untouched.
    pub fn poll_cycle<A: DeviceApi + ?Sized>(
        &mut self,
        api: &A,
    ) -> Result<Reconciliation, ClientError> {
        let response = match api.poll(&self.state) {
            Ok(response) => response,
            Err(ClientError::NotFound) => {
                warn!("device not found on server");
                return Err(ClientError::NotFound);
            }
            Err(e) => {
                warn!(error = %e, "poll failed");
                return Err(e);
            }
        };

        debug!(?response, "poll result");
        Ok(self.reconcile(api, &Instruction::from(&response)))
    }

    /// Merge a validated server instruction and refresh if needed
    ///
    /// Version, interval and total are always adopted, even when nothing
    /// needs to be fetched.
    pub fn reconcile<A: DeviceApi + ?Sized>(
        &mut self,
        api: &A,
        instruction: &Instruction,
    ) -> Reconciliation {
        self.state.refresh_version = instruction.version;
        self.state.poll_interval_secs = instruction.poll_interval_secs;
        self.state.total_images = instruction.total;

        let mode_changed = instruction.mode != self.state.mode;
        let index_changed = instruction.index != self.state.image_index;
        self.state.image_index = instruction.index;

        if !(instruction.should_refresh || mode_changed || index_changed) {
            if self.state.enforce_invariants() {
                debug!("no images on server, mode reset to dashboard");
            }
            return Reconciliation::Synced;
        }

        info!(
            refresh = instruction.should_refresh,
            mode_changed,
            index_changed,
            mode = instruction.mode.as_wire(),
            index = instruction.index,
            "refreshing display"
        );

        self.state.mode = instruction.mode;
        let outcome = self.acquire(api, Trigger::Poll, false);
        if let Outcome::FellBack { .. } = outcome {
            notify_mode(api, DisplayMode::Dashboard);
        }

        Reconciliation::Refreshed(outcome)
    }

    /// Flip between dashboard and image mode
    ///
    /// Content for the new mode is fetched immediately with the usual
    /// fallback, and the server is told which mode the device ended up in.
    /// The image fetch is attempted even with a local total of zero since
    /// that total may be stale. The photo is only kept if the response's
    /// total hint shows images exist; otherwise the device falls back to
    /// the dashboard like any other image mode without images.
    pub fn toggle<A: DeviceApi + ?Sized>(&mut self, api: &A) -> Outcome {
        let target = self.state.mode.toggled();
        info!(mode = target.as_wire(), "toggling mode");

        self.state.mode = target;
        let outcome = self.acquire(api, Trigger::Local, true);
        notify_mode(api, self.state.mode);
        outcome
    }

    /// Step to the next photo
    ///
    /// Returns `None` when there is nothing to advance to. The server is
    /// told about the step; the new photo is fetched only in image mode and
    /// a failed fetch keeps the previous frame.
    pub fn advance_image<A: DeviceApi + ?Sized>(&mut self, api: &A) -> Option<Outcome> {
        if self.state.total_images <= 1 {
            return None;
        }

        self.state.image_index = (self.state.image_index + 1) % self.state.total_images;
        info!(
            index = self.state.image_index,
            total = self.state.total_images,
            "advancing image"
        );

        if let Err(e) = api.next_image() {
            warn!(error = %e, "failed to notify server of next image");
        }

        if self.state.mode != DisplayMode::Image {
            return Some(Outcome::Retained);
        }

        let descriptor = ContentDescriptor::photo(self.state.image_index);
        if self.try_fetch(api, descriptor, Trigger::Local) {
            Some(Outcome::Committed(descriptor))
        } else {
            Some(Outcome::Retained)
        }
    }

    /// Switch to the dashboard and fetch it, without notifying the server
    pub fn show_dashboard<A: DeviceApi + ?Sized>(&mut self, api: &A) -> Outcome {
        self.state.mode = DisplayMode::Dashboard;
        self.acquire(api, Trigger::Local, false)
    }

    /// Merge the legacy image-info settings
    pub fn apply_image_info(&mut self, info: &ImageInfo) {
        self.state.apply_image_info(info);
        self.rotate_interval = model::rotate_interval(info);
        info!(
            total = self.state.total_images,
            index = self.state.image_index,
            rotate_secs = self.rotate_interval.as_secs(),
            "image settings applied"
        );
    }

    /// Fetch content for the current mode, falling back to the dashboard
    fn acquire<A: DeviceApi + ?Sized>(
        &mut self,
        api: &A,
        trigger: Trigger,
        try_without_images: bool,
    ) -> Outcome {
        if self.state.mode == DisplayMode::Dashboard {
            let descriptor = ContentDescriptor::dashboard();
            return if self.try_fetch(api, descriptor, trigger) {
                Outcome::Committed(descriptor)
            } else {
                Outcome::Retained
            };
        }

        if self.state.total_images > 0 || try_without_images {
            let descriptor = ContentDescriptor::photo(self.state.image_index);
            if let Some(staged) = self.stage(api, descriptor, trigger) {
                if self.state.total_images > 0 {
                    return self.commit(descriptor, staged);
                }
                debug!("photo served but server reports no images");
            }
        } else {
            debug!("no images available");
        }

        info!("image content unavailable, falling back to dashboard");
        self.state.mode = DisplayMode::Dashboard;
        self.state.enforce_invariants();

        let dashboard_committed = self.try_fetch(api, ContentDescriptor::dashboard(), trigger);
        if !dashboard_committed {
            warn!("dashboard unavailable, keeping previous frame");
        }

        Outcome::FellBack {
            dashboard_committed,
        }
    }

    /// Fetch one bitmap and commit it, returning whether the frame changed
    fn try_fetch<A: DeviceApi + ?Sized>(
        &mut self,
        api: &A,
        descriptor: ContentDescriptor,
        trigger: Trigger,
    ) -> bool {
        match self.stage(api, descriptor, trigger) {
            Some(staged) => self.commit(descriptor, staged).frame_changed(),
            None => false,
        }
    }

    /// Fetch one full-length bitmap and merge its metadata
    ///
    /// Nothing is committed; the frame stays staged with the caller.
    fn stage<A: DeviceApi + ?Sized>(
        &mut self,
        api: &A,
        descriptor: ContentDescriptor,
        trigger: Trigger,
    ) -> Option<Vec<u8>> {
        let bitmap = match api.fetch_bitmap(descriptor, self.buffer.frame_len()) {
            Ok(bitmap) => bitmap,
            Err(FetchError::NoContentAvailable) => {
                warn!(mode = descriptor.query_mode(), "no content available on server");
                self.state.adopt_total(0);
                return None;
            }
            Err(e) => {
                warn!(
                    mode = descriptor.query_mode(),
                    index = descriptor.index,
                    error = %e,
                    "bitmap fetch failed"
                );
                return None;
            }
        };

        if bitmap.bytes.len() != self.buffer.frame_len() {
            warn!(
                expected = self.buffer.frame_len(),
                actual = bitmap.bytes.len(),
                "rejected bitmap"
            );
            return None;
        }

        if let Some(total) = bitmap.meta.total {
            match trigger {
                Trigger::Local if total > 0 => self.state.adopt_total(total),
                _ => debug!(
                    hint = total,
                    total = self.state.total_images,
                    "ignoring bitmap total hint"
                ),
            }
        }

        Some(bitmap.bytes)
    }

    fn commit(&mut self, descriptor: ContentDescriptor, staged: Vec<u8>) -> Outcome {
        match self.buffer.commit(staged) {
            Ok(()) => {
                debug!(
                    mode = descriptor.query_mode(),
                    index = descriptor.index,
                    generation = self.buffer.generation(),
                    "frame committed"
                );
                Outcome::Committed(descriptor)
            }
            Err(e) => {
                warn!(error = %e, "rejected bitmap");
                Outcome::Retained
            }
        }
    }
}

fn notify_mode<A: DeviceApi + ?Sized>(api: &A, mode: DisplayMode) {
    if let Err(e) = api.set_mode(mode) {
        warn!(mode = mode.as_wire(), error = %e, "failed to update server mode");
    }
}
