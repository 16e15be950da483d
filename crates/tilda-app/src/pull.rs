//! Pull state and slide animation frames

use tilda_ui::traits::PullDirection;

/// Number of resize steps in a slide
pub const SLIDE_FRAMES: usize = 16;

/// Visibility of the drop-down window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullState {
    /// Hidden
    Up,
    /// Shown at full size
    Down,
    /// Sliding towards the given direction
    Pulling(PullDirection),
}

impl PullState {
    /// Resolve `Toggle` against the current state; `None` while sliding
    pub fn target(self, direction: PullDirection) -> Option<PullDirection> {
        match (self, direction) {
            (PullState::Pulling(_), _) => None,
            (PullState::Up, PullDirection::Toggle) => Some(PullDirection::Down),
            (PullState::Down, PullDirection::Toggle) => Some(PullDirection::Up),
            (PullState::Up, PullDirection::Up) | (PullState::Down, PullDirection::Down) => None,
            (_, direction) => Some(direction),
        }
    }
}

/// Window heights for each step of a slide in `direction`
///
/// Sliding down ends at `max_height`; sliding up ends at a single pixel row.
pub fn slide_frames(max_height: i32, direction: PullDirection) -> Vec<i32> {
    let max_height = max_height.max(1) as i64;
    let steps = SLIDE_FRAMES as i64;

    (0..steps)
        .map(|i| {
            let filled = match direction {
                PullDirection::Up => steps - 1 - i,
                _ => i + 1,
            };
            (max_height * filled / steps).max(1) as i32
        })
        .collect()
}
