//! Game-over detection
//!
//! Only settled balls count: a ball must be live and older than the quiet
//! window since its last drop/merge, so balls still bouncing near the drop
//! line after spawning do not end the round.

use glam::Vec2;

use super::state::{BallId, Roster};

/// Thresholds for the scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameOverRule {
    /// Y of the drop line (screen coordinates, smaller is higher)
    pub drop_line_y: f32,
    /// Minimum age (ms) since last topology change
    pub quiet_window_ms: f64,
}

impl GameOverRule {
    /// First settled ball whose top edge is above the drop line, if any
    pub fn offender<F>(&self, roster: &Roster, now_ms: f64, position_of: F) -> Option<BallId>
    where
        F: Fn(BallId) -> Option<Vec2>,
    {
        roster
            .iter()
            .filter(|ball| ball.is_live())
            .filter(|ball| {
                ball.age_ms(now_ms)
                    .is_some_and(|age| age > self.quiet_window_ms)
            })
            .find(|ball| {
                position_of(ball.id).is_some_and(|pos| pos.y - ball.radius < self.drop_line_y)
            })
            .map(|ball| ball.id)
    }
}
