use super::*;
use crate::events::tests::{MockApplications, MockCapture, MockOverlayView, Timeline};

const BOUND: [&str; 5] = ["Safari", "Mail", "Notes", "Finder", "Terminal"];
const RUNNING: [&str; 3] = ["Xcode", "Slack", "Music"];

struct Fixture {
    timeline: Timeline,
    session: OverlaySession,
    capture: MockCapture,
    start: Instant,
}

fn fixture_with(bound: &[&str], running: &[&str]) -> Fixture {
    let timeline = Timeline::default();
    let session = OverlaySession::new(
        Arc::new(MockOverlayView::new(&timeline)),
        Arc::new(MockApplications::new(&timeline, bound, running)),
    );
    Fixture {
        capture: MockCapture::new(&timeline),
        timeline,
        session,
        start: Instant::now(),
    }
}

fn fixture() -> Fixture {
    fixture_with(&BOUND, &RUNNING)
}

impl Fixture {
    fn show(&mut self) {
        self.session.on_trigger_pressed_at(&mut self.capture, self.start);
    }

    fn at(&self, ms: u64) -> Instant {
        self.start + Duration::from_millis(ms)
    }
}

#[test]
fn test_initial_state_is_hidden_bound_zero() {
    let f = fixture();
    assert!(!f.session.is_visible());
    assert_eq!(f.session.mode(), ViewMode::Bound);
    assert_eq!(f.session.selected_index(), 0);
    assert!(f.timeline.entries().is_empty());
}

#[test]
fn test_press_shows_bound_view_and_arms_capture() {
    let mut f = fixture();
    f.show();

    assert!(f.session.is_visible());
    assert_eq!(f.session.mode(), ViewMode::Bound);
    assert_eq!(f.session.selected_index(), 0);
    assert!(f.capture.is_capturing_keys());
    assert_eq!(
        f.timeline.entries(),
        vec!["capture:start", "view:bound[Safari,Mail,Notes,Finder,Terminal]@0"]
    );
    assert_eq!(f.session.last_trigger_edge(), Some(f.start));
}

#[test]
fn test_second_press_while_visible_is_ignored() {
    let mut f = fixture();
    f.show();
    f.session.set_selection(KeySlot(2));
    f.timeline.clear();

    f.session.on_trigger_pressed_at(&mut f.capture, f.start + Duration::from_millis(500));

    assert_eq!(f.session.selected_index(), 2);
    assert!(f.timeline.entries().is_empty());
}

#[test]
fn test_select_then_release_commits() {
    let mut f = fixture();
    f.show();
    assert!(f.session.set_selection(KeySlot(2)));

    let committed = f.session.on_trigger_released_at(&mut f.capture, f.start + Duration::from_millis(300));

    assert_eq!(committed, Some(ApplicationHandle::named("Notes")));
    assert!(!f.session.is_visible());
    assert!(!f.capture.is_capturing_keys());
    assert_eq!(
        f.timeline.entries()[2..].to_vec(),
        vec!["view:select@2", "capture:stop", "view:hide", "switch:Notes"]
    );
}

#[test]
fn test_release_resets_state() {
    let mut f = fixture();
    f.show();
    f.session.toggle_mode_at(f.at(0));
    f.session.set_selection(KeySlot(1));

    f.session.on_trigger_released_at(&mut f.capture, f.start + Duration::from_millis(100));

    assert_eq!(f.session.mode(), ViewMode::Bound);
    assert_eq!(f.session.selected_index(), 0);
    assert!(f.session.applications().is_empty());
    assert_eq!(f.timeline.matching("switch:"), vec!["switch:Slack"]);
}

#[test]
fn test_release_while_hidden_does_nothing() {
    let mut f = fixture();
    assert_eq!(f.session.on_trigger_released_at(&mut f.capture, f.start), None);
    assert!(f.timeline.entries().is_empty());
}

#[test]
fn test_escape_hides_without_commit() {
    let mut f = fixture();
    f.show();
    f.session.set_selection(KeySlot(3));

    f.session.cancel(&mut f.capture);

    assert!(!f.session.is_visible());
    assert_eq!(f.session.selected_index(), 0);
    assert!(f.timeline.matching("switch:").is_empty());
    assert!(!f.capture.is_capturing_keys());
}

#[test]
fn test_release_with_empty_lists_does_not_commit() {
    let mut f = fixture_with(&[], &[]);
    f.show();
    assert_eq!(f.session.on_trigger_released_at(&mut f.capture, f.start + Duration::from_millis(10)), None);
    assert!(f.timeline.matching("switch:").is_empty());
    assert_eq!(f.timeline.matching("view:hide").len(), 1);
}

#[test]
fn test_empty_bound_list_falls_back_to_running() {
    let mut f = fixture_with(&[], &RUNNING);
    f.show();

    assert_eq!(f.session.mode(), ViewMode::Bound);
    assert_eq!(f.session.applications().len(), 3);
    assert_eq!(f.timeline.matching("view:"), vec!["view:bound[Xcode,Slack,Music]@0"]);

    f.session.set_selection(KeySlot(1));
    f.session.on_trigger_released_at(&mut f.capture, f.start + Duration::from_millis(10));
    assert_eq!(f.timeline.matching("switch:"), vec!["switch:Slack"]);
}

#[test]
fn test_tab_flips_mode_and_resets_selection() {
    let mut f = fixture();
    f.show();
    f.session.set_selection(KeySlot(2));

    assert!(f.session.toggle_mode_at(f.at(250)));

    assert_eq!(f.session.mode(), ViewMode::Running);
    assert_eq!(f.session.selected_index(), 0);
    assert_eq!(
        f.timeline.entries().last().map(String::as_str),
        Some("view:running[Xcode,Slack,Music]@0")
    );
}

#[test]
fn test_tab_is_debounced() {
    let mut f = fixture();
    f.show();

    assert!(f.session.toggle_mode_at(f.at(0)));
    assert!(!f.session.toggle_mode_at(f.at(150)));
    assert_eq!(f.session.mode(), ViewMode::Running);

    assert!(f.session.toggle_mode_at(f.at(200)));
    assert_eq!(f.session.mode(), ViewMode::Bound);
    assert_eq!(f.session.applications().len(), 5);
}

#[test]
fn test_tab_while_hidden_is_ignored() {
    let mut f = fixture();
    assert!(!f.session.toggle_mode_at(f.start));
    assert_eq!(f.session.mode(), ViewMode::Bound);
}

#[test]
fn test_out_of_range_slot_is_ignored() {
    let mut f = fixture();
    f.show();
    f.session.set_selection(KeySlot(1));

    assert!(!f.session.set_selection(KeySlot(5)));
    assert!(!f.session.set_selection(KeySlot(40)));
    assert_eq!(f.session.selected_index(), 1);
}

#[test]
fn test_selection_while_hidden_is_ignored() {
    let mut f = fixture();
    assert!(!f.session.set_selection(KeySlot(0)));
    assert!(f.timeline.entries().is_empty());
}

#[test]
fn test_navigation_wraps() {
    let mut f = fixture();
    f.show();

    f.session.set_selection(KeySlot(4));
    f.session.move_right();
    assert_eq!(f.session.selected_index(), 0);

    f.session.move_left();
    assert_eq!(f.session.selected_index(), 4);

    f.session.move_left();
    assert_eq!(f.session.selected_index(), 3);
}

#[test]
fn test_navigation_with_empty_list_is_noop() {
    let mut f = fixture_with(&[], &[]);
    f.show();
    f.session.move_left();
    f.session.move_right();
    assert_eq!(f.session.selected_index(), 0);
    assert!(f.timeline.matching("view:select").is_empty());
}

#[test]
fn test_commit_index_from_ui() {
    let mut f = fixture();
    f.show();

    let committed = f.session.commit_index(&mut f.capture, 3);

    assert_eq!(committed, Some(ApplicationHandle::named("Finder")));
    assert!(!f.session.is_visible());
}

#[test]
fn test_commit_index_out_of_range_hides_without_switch() {
    let mut f = fixture();
    f.show();

    assert_eq!(f.session.commit_index(&mut f.capture, 9), None);
    assert!(!f.session.is_visible());
    assert!(f.timeline.matching("switch:").is_empty());
}

#[test]
fn test_capture_failure_still_shows_overlay() {
    let mut f = fixture();
    f.capture.fail_start = true;
    f.show();

    assert!(f.session.is_visible());
    assert!(!f.capture.is_capturing_keys());
}

#[test]
fn test_snapshot_reflects_state() {
    let mut f = fixture();
    f.show();
    f.session.set_selection(KeySlot(1));

    let snapshot = f.session.snapshot();
    assert!(snapshot.visible);
    assert_eq!(snapshot.mode, ViewMode::Bound);
    assert_eq!(snapshot.selected_index, 1);
    assert_eq!(snapshot.applications.len(), 5);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["selectedIndex"], 1);
    assert_eq!(json["mode"], "bound");
}
