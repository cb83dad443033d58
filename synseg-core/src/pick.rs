//! Screen-pick resolution.
//!
//! The rendering stage reads back the color under the cursor from the
//! encoded label volume; this module turns that read-back plus a
//! press/release gesture into at most one status transition.

use crate::{ReviewSession, SegmentStatus};

/// Screen-space cursor position in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenPos {
    /// Horizontal position.
    pub x: i32,
    /// Vertical position.
    pub y: i32,
}

impl ScreenPos {
    /// Creates a new screen position.
    #[inline]
    #[must_use]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Result of resolving a release event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    /// Press and release positions differ; classification untouched.
    Drag,
    /// No pick: background color, stale identity, or no press recorded.
    Background,
    /// The segment exists but its override has been retired; no write.
    NotClickable {
        /// Decoded segment identity.
        id: u32,
    },
    /// Exactly one status write occurred.
    Toggled {
        /// Decoded segment identity.
        id: u32,
        /// Status after the click-cycle transition.
        status: SegmentStatus,
    },
}

/// Press/release gesture state for pick-and-click confirmation.
#[derive(Debug, Default)]
pub struct PickResolver {
    press: Option<ScreenPos>,
}

impl PickResolver {
    /// Creates an idle resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a button press at a screen position.
    pub fn press(&mut self, pos: ScreenPos) {
        self.press = Some(pos);
    }

    /// Decodes a per-frame hover read-back without any gesture logic.
    /// Returns 0 for background.
    #[must_use]
    pub fn resolve(session: &ReviewSession, color: [u8; 3]) -> u32 {
        session.codec().decode(color)
    }

    /// Resolves a button release. A release at a position other than
    /// the press is a drag and never triggers a classification change;
    /// a confirmed click dispatches exactly one transition.
    pub fn release(
        &mut self,
        pos: ScreenPos,
        color: [u8; 3],
        session: &mut ReviewSession,
    ) -> PickOutcome {
        let Some(press) = self.press.take() else {
            return PickOutcome::Background;
        };
        if press != pos {
            return PickOutcome::Drag;
        }
        let id = Self::resolve(session, color);
        if id == 0 || id as usize > session.len() {
            return PickOutcome::Background;
        }
        let index = (id - 1) as usize;
        match session.click(index) {
            Some(status) => PickOutcome::Toggled { id, status },
            None => PickOutcome::NotClickable { id },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataRange, MeasureColumns, SegmentBatch, VoxelCoord};

    fn session(n: usize) -> ReviewSession {
        let mut batch = SegmentBatch::with_capacity(MeasureColumns::Two, n);
        for i in 0..n {
            batch
                .push(VoxelCoord::new(i as i32, 0, 0), &[1.0, 1.0])
                .unwrap();
        }
        ReviewSession::new(batch, DataRange::new(0.0, 10.0)).unwrap()
    }

    #[test]
    fn test_click_toggles_once() {
        let mut s = session(4);
        let mut picker = PickResolver::new();
        let pos = ScreenPos::new(40, 60);

        picker.press(pos);
        let outcome = picker.release(pos, s.codec().encode(3), &mut s);
        assert_eq!(
            outcome,
            PickOutcome::Toggled {
                id: 3,
                status: SegmentStatus::OverrideOffClickable
            }
        );
        assert_eq!(s.status(2), SegmentStatus::OverrideOffClickable);
        assert_eq!(s.pending_len(), 1);
    }

    #[test]
    fn test_drag_never_mutates() {
        let mut s = session(4);
        let mut picker = PickResolver::new();

        picker.press(ScreenPos::new(40, 60));
        let outcome = picker.release(ScreenPos::new(41, 60), s.codec().encode(3), &mut s);
        assert_eq!(outcome, PickOutcome::Drag);
        assert_eq!(s.status(2), SegmentStatus::Default);
        assert_eq!(s.pending_len(), 0);
    }

    #[test]
    fn test_background_pick_is_noop() {
        let mut s = session(4);
        let mut picker = PickResolver::new();
        let pos = ScreenPos::new(0, 0);

        picker.press(pos);
        assert_eq!(picker.release(pos, [0, 0, 0], &mut s), PickOutcome::Background);
        assert_eq!(s.pending_len(), 0);
    }

    #[test]
    fn test_stale_identity_is_background() {
        let mut s = session(4);
        let mut picker = PickResolver::new();
        let pos = ScreenPos::new(0, 0);

        // Identity 200 decodes fine but no such segment is live.
        picker.press(pos);
        assert_eq!(picker.release(pos, [200, 0, 0], &mut s), PickOutcome::Background);
    }

    #[test]
    fn test_release_without_press_is_noop() {
        let mut s = session(4);
        let mut picker = PickResolver::new();
        let outcome = picker.release(ScreenPos::new(5, 5), s.codec().encode(1), &mut s);
        assert_eq!(outcome, PickOutcome::Background);
    }

    #[test]
    fn test_retired_segment_reports_not_clickable() {
        let mut s = session(4);
        let mut picker = PickResolver::new();
        let pos = ScreenPos::new(10, 10);

        picker.press(pos);
        picker.release(pos, s.codec().encode(1), &mut s);
        s.retire();

        picker.press(pos);
        let outcome = picker.release(pos, s.codec().encode(1), &mut s);
        assert_eq!(outcome, PickOutcome::NotClickable { id: 1 });
        assert_eq!(s.status(0), SegmentStatus::OverrideOff);
    }
}
