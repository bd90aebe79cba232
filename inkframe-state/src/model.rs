//! Device state and validated server instructions

use std::time::Duration;

use api_client::{ContentDescriptor, DisplayMode, ImageInfo, PollRequest, PollResponse};

/// Poll interval used until the server says otherwise
pub const DEFAULT_POLL_INTERVAL_SECS: u32 = 30;

/// Everything the device knows about what it should be showing
///
/// Owned by [`ModeStateMachine`](crate::ModeStateMachine); everyone else
/// gets a shared reference.
///
/// Invariants: with no images the mode is `Dashboard` and the index is 0;
/// otherwise `image_index < total_images`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    pub mode: DisplayMode,
    pub image_index: u32,
    pub total_images: u32,
    pub refresh_version: i64,
    pub poll_interval_secs: u32,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            mode: DisplayMode::Dashboard,
            image_index: 0,
            total_images: 0,
            refresh_version: 0,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl DeviceState {
    /// The query the server diffs against
    pub fn poll_request(&self) -> PollRequest {
        PollRequest {
            version: self.refresh_version,
            mode: self.mode,
            index: self.image_index,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.poll_interval_secs))
    }

    /// Content matching the current mode and index
    pub fn descriptor(&self) -> ContentDescriptor {
        ContentDescriptor::for_mode(self.mode, self.image_index)
    }

    pub fn is_consistent(&self) -> bool {
        if self.total_images == 0 {
            self.mode == DisplayMode::Dashboard && self.image_index == 0
        } else {
            self.image_index < self.total_images
        }
    }

    /// Set the image total, pulling the index back into range
    pub(crate) fn adopt_total(&mut self, total: u32) {
        self.total_images = total;
        self.image_index = clamp_index(i64::from(self.image_index), total);
    }

    /// Restore the invariants, returning whether the mode had to change
    pub(crate) fn enforce_invariants(&mut self) -> bool {
        self.image_index = clamp_index(i64::from(self.image_index), self.total_images);
        if self.total_images == 0 && self.mode == DisplayMode::Image {
            self.mode = DisplayMode::Dashboard;
            return true;
        }
        false
    }

    /// Merge the legacy image-info settings
    pub(crate) fn apply_image_info(&mut self, info: &ImageInfo) {
        let total = clamp_u32(info.total, 0);
        self.total_images = total;
        self.image_index = clamp_index(info.current_index, total);
        self.enforce_invariants();
    }
}

fn clamp_u32(value: i64, min: u32) -> u32 {
    value.clamp(i64::from(min), i64::from(u32::MAX)) as u32
}

fn clamp_index(index: i64, total: u32) -> u32 {
    if total == 0 {
        0
    } else {
        index.clamp(0, i64::from(total) - 1) as u32
    }
}

/// A [`PollResponse`] with every field pulled into the range DeviceState
/// accepts
///
/// Negative totals and indices become 0, a non-positive interval becomes 1
/// second, and the index is clamped below the total. The mode is left as
/// sent; an image mode without images is resolved by the fallback rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub should_refresh: bool,
    pub mode: DisplayMode,
    pub version: i64,
    pub poll_interval_secs: u32,
    pub index: u32,
    pub total: u32,
}

impl From<&PollResponse> for Instruction {
    fn from(response: &PollResponse) -> Self {
        let total = clamp_u32(response.total, 0);
        Self {
            should_refresh: response.should_refresh,
            mode: response.mode,
            version: response.version,
            poll_interval_secs: clamp_u32(response.poll_interval_secs, 1),
            index: clamp_index(response.index, total),
            total,
        }
    }
}

/// Minutes between automatic photo rotations from image-info, or 60 when
/// the server sends a non-positive value
pub(crate) fn rotate_interval(info: &ImageInfo) -> Duration {
    let minutes = if info.rotate_minutes > 0 {
        info.rotate_minutes as u64
    } else {
        60
    };
    Duration::from_secs(minutes * 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn response(index: i64, total: i64, interval: i64) -> PollResponse {
        PollResponse {
            should_refresh: false,
            mode: DisplayMode::Image,
            version: 1,
            poll_interval_secs: interval,
            index,
            total,
        }
    }

    #[test]
    fn test_default_state() {
        let state = DeviceState::default();
        assert_eq!(state.mode, DisplayMode::Dashboard);
        assert_eq!(state.poll_interval_secs, 30);
        assert!(state.is_consistent());
        assert_eq!(state.descriptor(), ContentDescriptor::dashboard());
    }

    #[rstest]
    #[case(2, 5, 30, 2, 5, 30)]
    #[case(-1, 5, 30, 0, 5, 30)]
    #[case(9, 5, 30, 4, 5, 30)]
    #[case(3, 0, 30, 0, 0, 30)]
    #[case(0, -4, 0, 0, 0, 1)]
    #[case(0, 1, -30, 0, 1, 1)]
    fn test_instruction_clamping(
        #[case] index: i64,
        #[case] total: i64,
        #[case] interval: i64,
        #[case] want_index: u32,
        #[case] want_total: u32,
        #[case] want_interval: u32,
    ) {
        let instruction = Instruction::from(&response(index, total, interval));
        assert_eq!(instruction.index, want_index);
        assert_eq!(instruction.total, want_total);
        assert_eq!(instruction.poll_interval_secs, want_interval);
        assert_eq!(instruction.mode, DisplayMode::Image);
    }

    #[test]
    fn test_enforce_invariants() {
        let mut state = DeviceState {
            mode: DisplayMode::Image,
            image_index: 3,
            total_images: 0,
            ..Default::default()
        };
        assert!(state.enforce_invariants());
        assert_eq!(state.mode, DisplayMode::Dashboard);
        assert_eq!(state.image_index, 0);
        assert!(state.is_consistent());

        assert!(!state.enforce_invariants());
    }

    #[test]
    fn test_adopt_total_clamps_index() {
        let mut state = DeviceState {
            mode: DisplayMode::Image,
            image_index: 6,
            total_images: 8,
            ..Default::default()
        };
        state.adopt_total(4);
        assert_eq!(state.image_index, 3);
        assert_eq!(state.total_images, 4);
    }

    #[test]
    fn test_apply_image_info() {
        let mut state = DeviceState::default();
        state.apply_image_info(&ImageInfo {
            total: 7,
            current_index: 3,
            rotate_minutes: 15,
        });
        assert_eq!(state.total_images, 7);
        assert_eq!(state.image_index, 3);

        state.apply_image_info(&ImageInfo {
            total: -2,
            current_index: 3,
            rotate_minutes: 15,
        });
        assert_eq!(state.total_images, 0);
        assert_eq!(state.image_index, 0);
    }

    #[test]
    fn test_rotate_interval() {
        let info = |rotate_minutes| ImageInfo {
            total: 0,
            current_index: 0,
            rotate_minutes,
        };
        assert_eq!(rotate_interval(&info(15)), Duration::from_secs(900));
        assert_eq!(rotate_interval(&info(0)), Duration::from_secs(3600));
    }

    #[test]
    fn test_poll_request() {
        let state = DeviceState {
            mode: DisplayMode::Image,
            image_index: 2,
            total_images: 5,
            refresh_version: 9,
            poll_interval_secs: 30,
        };
        let request = state.poll_request();
        assert_eq!(request.version, 9);
        assert_eq!(request.mode, DisplayMode::Image);
        assert_eq!(request.index, 2);
    }
}
