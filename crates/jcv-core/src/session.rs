//! The editing session: an explicit owner for the document pair.
//!
//! Each side keeps its raw source (the last externally loaded, unfiltered
//! text) separately from the displayed text, so sort and key-filter
//! transforms are always re-derived from an unmodified source instead of
//! compounding. A trailing-edge debouncer coalesces rapid changes into one
//! snapshot write.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::diff::ChangeSummary;
use crate::normalize::{remove_keys, sort_keys, to_pretty_string};
use crate::store::Snapshot;
use crate::FormatError;

/// Identifies one side of the comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// The original document.
    Left,
    /// The modified document.
    Right,
}

/// The rendering seam: whatever surface displays the two buffers.
///
/// Stands in for the embedded diff-editor widget of the original tool; the
/// session pushes buffer contents through it and receives edits back.
pub trait DiffSurface {
    /// Replaces the left buffer's displayed text.
    fn set_left(&mut self, text: &str);
    /// Replaces the right buffer's displayed text.
    fn set_right(&mut self, text: &str);
}

#[derive(Clone, Debug, Default)]
struct DocumentBuffer {
    /// Last externally loaded text, prior to any transform.
    raw: String,
    /// Currently displayed text (possibly sorted/filtered).
    text: String,
    label: String,
}

impl DocumentBuffer {
    fn load(&mut self, label: &str, text: &str) {
        self.label = label.to_string();
        self.raw = text.to_string();
        self.text = text.to_string();
    }

    fn parse_raw(&self) -> Result<Value, FormatError> {
        Ok(serde_json::from_str(&self.raw)?)
    }
}

/// Trailing-edge debouncer: rapid triggers coalesce into one firing after a
/// quiet period.
///
/// Driven by explicit instants so callers own the clock.
///
/// ```
/// use std::time::{Duration, Instant};
/// use jcv_core::session::Debouncer;
///
/// let mut debouncer = Debouncer::new(Duration::from_millis(100));
/// let start = Instant::now();
/// debouncer.trigger(start);
/// debouncer.trigger(start + Duration::from_millis(50));
/// assert!(!debouncer.fire(start + Duration::from_millis(100)));
/// assert!(debouncer.fire(start + Duration::from_millis(150)));
/// ```
#[derive(Clone, Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    /// Creates a debouncer with the given quiet period.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    /// Records a triggering event, rescheduling the pending firing.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Whether a firing is pending (triggered and not yet fired or flushed).
    #[must_use]
    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fires if the quiet period has elapsed, consuming the pending state.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Consumes any pending firing immediately, elapsed or not.
    pub fn flush(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}

/// Owns the document pair and the autosave debouncer for one editing
/// session.
pub struct Session {
    left: DocumentBuffer,
    right: DocumentBuffer,
    autosave: Debouncer,
}

impl Session {
    /// Creates an empty session with the given autosave quiet period.
    #[must_use]
    pub fn new(autosave_delay: Duration) -> Self {
        Self {
            left: DocumentBuffer::default(),
            right: DocumentBuffer::default(),
            autosave: Debouncer::new(autosave_delay),
        }
    }

    /// Restores a session from a persisted snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot, autosave_delay: Duration) -> Self {
        let mut session = Self::new(autosave_delay);
        session.load(Side::Left, &snapshot.left_label, &snapshot.original);
        session.load(Side::Right, &snapshot.right_label, &snapshot.modified);
        session
    }

    fn buffer(&self, side: Side) -> &DocumentBuffer {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn buffer_mut(&mut self, side: Side) -> &mut DocumentBuffer {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    fn touch(&mut self) {
        self.autosave.trigger(Instant::now());
    }

    /// Replaces one side wholesale with newly loaded content.
    pub fn load(&mut self, side: Side, label: &str, text: &str) {
        self.buffer_mut(side).load(label, text);
        self.touch();
    }

    /// Applies a user edit to one side. An edit is new unfiltered content,
    /// so it replaces the raw source as well.
    pub fn edit(&mut self, side: Side, text: &str) {
        let buffer = self.buffer_mut(side);
        buffer.raw = text.to_string();
        buffer.text = text.to_string();
        self.touch();
    }

    /// Displayed text of one side.
    #[must_use]
    pub fn text(&self, side: Side) -> &str {
        &self.buffer(side).text
    }

    /// Raw (last loaded, unfiltered) text of one side.
    #[must_use]
    pub fn raw(&self, side: Side) -> &str {
        &self.buffer(side).raw
    }

    /// Display label of one side.
    #[must_use]
    pub fn label(&self, side: Side) -> &str {
        &self.buffer(side).label
    }

    /// Exchanges the two sides, labels included.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.left, &mut self.right);
        self.touch();
    }

    /// Empties both sides and their labels.
    pub fn clear(&mut self) {
        self.left = DocumentBuffer::default();
        self.right = DocumentBuffer::default();
        self.touch();
    }

    /// Re-derives one side's displayed text from its raw source with keys
    /// sorted and 4-space formatting. A side whose raw source fails to
    /// parse is left intact.
    pub fn format_side(&mut self, side: Side) -> Result<(), FormatError> {
        let value = self.buffer(side).parse_raw()?;
        self.buffer_mut(side).text = to_pretty_string(&sort_keys(value));
        self.touch();
        Ok(())
    }

    /// Re-derives one side's displayed text from its raw source with every
    /// listed key removed (and keys sorted, so the filter composes with
    /// formatting). The raw source is untouched, so the filter never
    /// compounds.
    pub fn filter_side(
        &mut self,
        side: Side,
        keys: &BTreeSet<String>,
    ) -> Result<(), FormatError> {
        let value = self.buffer(side).parse_raw()?;
        self.buffer_mut(side).text = to_pretty_string(&sort_keys(remove_keys(value, keys)));
        self.touch();
        Ok(())
    }

    /// Computes the structural change summary for the displayed pair.
    ///
    /// Both sides must currently hold valid JSON.
    pub fn summary(&self) -> Result<ChangeSummary, FormatError> {
        let original: Value = serde_json::from_str(&self.left.text)?;
        let modified: Value = serde_json::from_str(&self.right.text)?;
        Ok(ChangeSummary::between(&original, &modified))
    }

    /// Captures the current state for persistence.
    #[must_use]
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            original: self.left.raw.clone(),
            modified: self.right.raw.clone(),
            left_label: self.left.label.clone(),
            right_label: self.right.label.clone(),
        }
    }

    /// Returns a snapshot when the autosave quiet period has elapsed.
    pub fn autosave(&mut self, now: Instant) -> Option<Snapshot> {
        self.autosave.fire(now).then(|| self.to_snapshot())
    }

    /// Returns a snapshot for any pending autosave, elapsed or not. Called
    /// on session exit so the last change is never lost.
    pub fn flush_autosave(&mut self) -> Option<Snapshot> {
        self.autosave.flush().then(|| self.to_snapshot())
    }

    /// Pushes both displayed buffers to a rendering surface.
    pub fn present<S: DiffSurface>(&self, surface: &mut S) {
        surface.set_left(&self.left.text);
        surface.set_right(&self.right.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> Session {
        Session::new(Duration::from_millis(10))
    }

    #[test]
    fn load_replaces_raw_and_text_wholesale() {
        let mut session = session();
        session.load(Side::Left, "a.json", "{\"b\":1,\"a\":2}");
        assert_eq!(session.raw(Side::Left), "{\"b\":1,\"a\":2}");
        assert_eq!(session.text(Side::Left), "{\"b\":1,\"a\":2}");
        assert_eq!(session.label(Side::Left), "a.json");
    }

    #[test]
    fn format_is_derived_from_raw_and_idempotent() {
        let mut session = session();
        session.load(Side::Left, "a.json", "{\"b\":1,\"a\":2}");
        session.format_side(Side::Left).unwrap();
        let once = session.text(Side::Left).to_string();
        session.format_side(Side::Left).unwrap();
        assert_eq!(session.text(Side::Left), once);
        // Raw source is untouched by formatting.
        assert_eq!(session.raw(Side::Left), "{\"b\":1,\"a\":2}");
    }

    #[test]
    fn failed_format_leaves_the_buffer_intact() {
        let mut session = session();
        session.load(Side::Right, "bad.json", "{broken");
        assert!(session.format_side(Side::Right).is_err());
        assert_eq!(session.text(Side::Right), "{broken");
    }

    #[test]
    fn filter_recomputes_from_raw_instead_of_compounding() {
        let mut session = session();
        session.load(Side::Left, "a.json", r#"{"keep":1,"secret":2}"#);
        let secret: BTreeSet<String> = ["secret".to_string()].into();
        let keep: BTreeSet<String> = ["keep".to_string()].into();

        session.filter_side(Side::Left, &secret).unwrap();
        assert!(!session.text(Side::Left).contains("secret"));

        // A different filter applies to the raw source, so "secret" is back.
        session.filter_side(Side::Left, &keep).unwrap();
        assert!(session.text(Side::Left).contains("secret"));
        assert!(!session.text(Side::Left).contains("keep"));
    }

    #[test]
    fn swap_exchanges_text_and_labels() {
        let mut session = session();
        session.load(Side::Left, "left.json", "{\"l\":1}");
        session.load(Side::Right, "right.json", "{\"r\":2}");
        session.swap();
        assert_eq!(session.label(Side::Left), "right.json");
        assert_eq!(session.text(Side::Left), "{\"r\":2}");
        assert_eq!(session.label(Side::Right), "left.json");
    }

    #[test]
    fn clear_empties_both_sides() {
        let mut session = session();
        session.load(Side::Left, "a", "{}");
        session.load(Side::Right, "b", "{}");
        session.clear();
        assert_eq!(session.text(Side::Left), "");
        assert_eq!(session.label(Side::Right), "");
    }

    #[test]
    fn summary_compares_the_displayed_texts() {
        let mut session = session();
        session.load(Side::Left, "a", r#"{"x": 1}"#);
        session.load(Side::Right, "b", r#"{"x": 1, "y": 2}"#);
        let summary = session.summary().unwrap();
        assert_eq!(summary.added.len(), 1);
        assert_eq!(summary.added[0].new_value, Some(json!(2)));
    }

    #[test]
    fn summary_requires_valid_json_on_both_sides() {
        let mut session = session();
        session.load(Side::Left, "a", "{}");
        session.load(Side::Right, "b", "not json");
        assert!(session.summary().is_err());
    }

    #[test]
    fn snapshot_round_trips_through_a_restored_session() {
        let mut session = session();
        session.load(Side::Left, "a.json", "{\"x\":1}");
        session.load(Side::Right, "b.json", "{\"x\":2}");
        let snapshot = session.to_snapshot();
        let restored = Session::from_snapshot(&snapshot, Duration::from_millis(10));
        assert_eq!(restored.text(Side::Left), "{\"x\":1}");
        assert_eq!(restored.label(Side::Right), "b.json");
    }

    #[test]
    fn debouncer_coalesces_rapid_triggers() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let start = Instant::now();
        debouncer.trigger(start);
        debouncer.trigger(start + Duration::from_millis(80));
        // The first deadline was superseded by the second trigger.
        assert!(!debouncer.fire(start + Duration::from_millis(120)));
        assert!(debouncer.fire(start + Duration::from_millis(180)));
        // Fired state is consumed.
        assert!(!debouncer.fire(start + Duration::from_millis(300)));
    }

    #[test]
    fn timed_autosave_produces_one_snapshot_after_the_delay() {
        let mut session = Session::new(Duration::from_millis(100));
        session.load(Side::Left, "a.json", "{\"x\":1}");
        let armed = Instant::now();

        // Still inside the quiet period.
        assert!(session.autosave(armed).is_none());

        let snapshot = session
            .autosave(armed + Duration::from_secs(1))
            .expect("quiet period elapsed");
        assert_eq!(snapshot.original, "{\"x\":1}");
        assert_eq!(snapshot.left_label, "a.json");

        // The firing was consumed; nothing further is pending.
        assert!(session.autosave(armed + Duration::from_secs(2)).is_none());
        assert!(session.flush_autosave().is_none());
    }

    #[test]
    fn flush_consumes_a_pending_firing_early() {
        let mut debouncer = Debouncer::new(Duration::from_secs(60));
        assert!(!debouncer.flush());
        debouncer.trigger(Instant::now());
        assert!(debouncer.pending());
        assert!(debouncer.flush());
        assert!(!debouncer.pending());
    }

    #[test]
    fn flush_autosave_captures_the_latest_state() {
        let mut session = session();
        session.load(Side::Left, "a", "{\"x\":1}");
        let snapshot = session.flush_autosave().expect("load marked the session dirty");
        assert_eq!(snapshot.original, "{\"x\":1}");
        // Nothing pending after the flush.
        assert!(session.flush_autosave().is_none());
    }

    #[derive(Default)]
    struct RecordingSurface {
        left: String,
        right: String,
    }

    impl DiffSurface for RecordingSurface {
        fn set_left(&mut self, text: &str) {
            self.left = text.to_string();
        }

        fn set_right(&mut self, text: &str) {
            self.right = text.to_string();
        }
    }

    #[test]
    fn present_pushes_both_buffers_to_the_surface() {
        let mut session = session();
        session.load(Side::Left, "a", "{\"l\":1}");
        session.load(Side::Right, "b", "{\"r\":2}");
        let mut surface = RecordingSurface::default();
        session.present(&mut surface);
        assert_eq!(surface.left, "{\"l\":1}");
        assert_eq!(surface.right, "{\"r\":2}");
    }
}
