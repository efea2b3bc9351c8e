//! Experience required per level.

pub const MAX_LEVEL: u32 = 100;

/// Level at which the wrong answer review test unlocks.
pub const REVIEW_MIN_LEVEL: u32 = 3;

/// (last level of the band, exp needed for each level in it)
const EXP_TABLE: [(u32, u32); 10] = [
    (10, 30),
    (20, 60),
    (30, 90),
    (40, 150),
    (50, 250),
    (60, 400),
    (70, 600),
    (80, 900),
    (90, 1300),
    (100, 1800),
];

const FALLBACK_EXP: u32 = 1800;

/// Experience needed to clear `level`.
pub fn exp_for_level(level: u32) -> u32 {
    EXP_TABLE
        .iter()
        .find(|(last, _)| level <= *last)
        .map(|(_, exp)| *exp)
        .unwrap_or(FALLBACK_EXP)
}

/// Progress toward the next level, 0-100. Max level is always complete.
pub fn progress_percent(level: u32, exp: u32) -> f64 {
    if level >= MAX_LEVEL {
        return 100.0;
    }
    let required = exp_for_level(level) as f64;
    (exp as f64 / required * 100.0).clamp(0.0, 100.0)
}

pub fn review_unlocked(level: u32) -> bool {
    level >= REVIEW_MIN_LEVEL
}
