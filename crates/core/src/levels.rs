//! Gravity speed policy
//!
//! The engine itself has no timers; the caller drives gravity by invoking
//! [`Matrix::move_down`](crate::Matrix::move_down) on its own schedule.
//! This table answers "how often" using the SNES frame counts per level.

/// Reference frame rate the frame counts are defined against
pub const FPS: u32 = 60;

/// SNES frames per gravity step, sparse over levels; lookups walk down to
/// the nearest defined level.
const SNES_LEVELS_AND_FRAMES: [(u32, u32); 15] = [
    (0, 48),
    (1, 43),
    (2, 38),
    (3, 33),
    (4, 28),
    (5, 23),
    (6, 18),
    (7, 13),
    (8, 8),
    (9, 6),
    (10, 5),
    (13, 4),
    (16, 3),
    (19, 2),
    (29, 1),
];

/// Frames between gravity steps at the given level
pub fn frames_per_drop(level: u32) -> u32 {
    let max_level = SNES_LEVELS_AND_FRAMES[SNES_LEVELS_AND_FRAMES.len() - 1].0;
    let mut level = level.min(max_level);
    loop {
        if let Some(&(_, frames)) = SNES_LEVELS_AND_FRAMES
            .iter()
            .find(|&&(entry, _)| entry == level)
        {
            return frames;
        }
        level -= 1;
    }
}

/// Milliseconds between gravity steps at the given level
pub fn drop_interval_ms(level: u32) -> u32 {
    frames_per_drop(level) * 1000 / FPS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defined_levels() {
        assert_eq!(frames_per_drop(0), 48);
        assert_eq!(frames_per_drop(9), 6);
        assert_eq!(frames_per_drop(29), 1);
    }

    #[test]
    fn test_gap_levels_fall_back_downward() {
        // 11 and 12 reuse level 10's speed; 14 reuses 13's.
        assert_eq!(frames_per_drop(11), 5);
        assert_eq!(frames_per_drop(12), 5);
        assert_eq!(frames_per_drop(14), 4);
        assert_eq!(frames_per_drop(20), 2);
    }

    #[test]
    fn test_levels_past_table_clamp() {
        assert_eq!(frames_per_drop(30), 1);
        assert_eq!(frames_per_drop(999), 1);
    }

    #[test]
    fn test_drop_interval_ms() {
        assert_eq!(drop_interval_ms(0), 800);
        assert_eq!(drop_interval_ms(29), 16);
    }
}
