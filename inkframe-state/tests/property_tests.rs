//! Property-based tests for reconciliation and scheduling

mod common;

use std::time::{Duration, Instant};

use api_client::DisplayMode;
use common::{response, FakeApi, Serve};
use inkframe_state::{is_due, DeviceState, DisplayGeometry, ModeStateMachine};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

const PANEL: DisplayGeometry = DisplayGeometry::new(200, 200);
const FRAME_LEN: usize = 5000;

fn mode_strategy() -> impl Strategy<Value = DisplayMode> {
    prop_oneof![Just(DisplayMode::Dashboard), Just(DisplayMode::Image)]
}

/// Any bitmap answer that must not reach the screen
fn failing_serve_strategy() -> impl Strategy<Value = Serve> {
    prop_oneof![
        (0usize..FRAME_LEN).prop_map(Serve::Truncated),
        Just(Serve::NotFound),
        Just(Serve::Fail),
    ]
}

fn serve_strategy() -> impl Strategy<Value = Serve> {
    prop_oneof![any::<u8>().prop_map(Serve::Frame), failing_serve_strategy()]
}

/// A state that satisfies the image-count invariants
fn state_strategy() -> impl Strategy<Value = DeviceState> {
    (0u32..20, mode_strategy(), any::<i64>(), 1u32..600).prop_flat_map(
        |(total, mode, version, interval)| {
            let upper = total.max(1);
            (0..upper).prop_map(move |image_index| DeviceState {
                mode: if total == 0 { DisplayMode::Dashboard } else { mode },
                image_index,
                total_images: total,
                refresh_version: version,
                poll_interval_secs: interval,
            })
        },
    )
}

// ============================================================================
// Scheduler
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// A poll is due exactly when more than the interval has elapsed
    #[test]
    fn prop_due_after_interval(interval in 0u32..7200, elapsed_ms in 0u64..10_000_000) {
        let last = Instant::now();
        let now = last + Duration::from_millis(elapsed_ms);

        prop_assert_eq!(
            is_due(now, Some(last), interval),
            elapsed_ms > u64::from(interval) * 1000
        );
        prop_assert!(is_due(now, None, interval));
    }
}

// ============================================================================
// Reconciliation
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// A response that asks for nothing new never fetches, but its
    /// metadata is still adopted
    #[test]
    fn prop_noop_poll_never_fetches(
        state in state_strategy(),
        version in any::<i64>(),
        interval in -100i64..10_000,
        extra in 1i64..50,
    ) {
        let total = i64::from(state.image_index) + extra;
        let mut api = FakeApi::new(FRAME_LEN);
        api.poll = Some(response(
            false,
            state.mode,
            version,
            interval,
            i64::from(state.image_index),
            total,
        ));

        let mut machine = ModeStateMachine::with_state(PANEL, state.clone());
        machine.poll_cycle(&api).unwrap();

        prop_assert!(api.fetches().is_empty());
        prop_assert_eq!(machine.state().refresh_version, version);
        prop_assert_eq!(i64::from(machine.state().poll_interval_secs), interval.max(1));
        prop_assert_eq!(i64::from(machine.state().total_images), total);
        prop_assert_eq!(machine.state().mode, state.mode);
        prop_assert_eq!(machine.state().image_index, state.image_index);
    }

    /// Fetches that do not deliver a complete frame never touch the buffer
    #[test]
    fn prop_failed_fetch_leaves_buffer(
        state in state_strategy(),
        photo in failing_serve_strategy(),
        dashboard in failing_serve_strategy(),
        mode in mode_strategy(),
        index in -5i64..30,
        total in -5i64..30,
    ) {
        let mut api = FakeApi::new(FRAME_LEN);
        api.dashboard = Serve::Frame(0x81);

        let mut machine = ModeStateMachine::with_state(PANEL, state);
        machine.show_dashboard(&api);
        let committed = machine.frame().as_bytes().to_vec();
        let generation = machine.frame().generation();

        api.photo = photo;
        api.dashboard = dashboard;
        api.poll = Some(response(true, mode, 1, 30, index, total));

        machine.poll_cycle(&api).unwrap();
        machine.toggle(&api);
        machine.advance_image(&api);

        prop_assert_eq!(machine.frame().generation(), generation);
        prop_assert_eq!(machine.frame().as_bytes(), committed.as_slice());
    }

    /// Whatever the server sends and however the fetches go, the state
    /// stays within its invariants
    #[test]
    fn prop_state_stays_consistent(
        state in state_strategy(),
        refresh in any::<bool>(),
        mode in mode_strategy(),
        index in -5i64..30,
        total in -5i64..30,
        interval in -10i64..120,
        photo in serve_strategy(),
        dashboard in serve_strategy(),
        toggle in any::<bool>(),
    ) {
        let mut api = FakeApi::new(FRAME_LEN);
        api.poll = Some(response(refresh, mode, 3, interval, index, total));
        api.photo = photo;
        api.dashboard = dashboard;

        let mut machine = ModeStateMachine::with_state(PANEL, state);
        machine.poll_cycle(&api).unwrap();
        prop_assert!(machine.state().is_consistent(), "after poll: {:?}", machine.state());
        prop_assert!(machine.state().poll_interval_secs >= 1);

        if toggle {
            machine.toggle(&api);
            prop_assert!(machine.state().is_consistent(), "after toggle: {:?}", machine.state());
        }

        machine.advance_image(&api);
        prop_assert!(machine.state().is_consistent(), "after advance: {:?}", machine.state());
    }
}
