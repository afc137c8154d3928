use serde::{Deserialize, Serialize};

/// Characters per word when converting typed characters to WPM.
pub const CHARS_PER_WORD: f64 = 5.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub wpm: u32,
    /// Percentage in `[0, 100]`, one decimal place.
    pub accuracy: f64,
}

impl Metrics {
    pub const ZERO: Metrics = Metrics {
        wpm: 0,
        accuracy: 0.0,
    };
}

/// Positions where the typed character equals the target character.
pub fn correct_count(typed: &[char], target: &[char]) -> usize {
    typed
        .iter()
        .zip(target.iter())
        .filter(|(t, e)| t == e)
        .count()
}

pub fn accuracy(typed: &[char], target: &[char]) -> f64 {
    if typed.is_empty() {
        return 0.0;
    }
    let pct = correct_count(typed, target) as f64 / typed.len() as f64 * 100.0;
    round_to_tenth(pct).clamp(0.0, 100.0)
}

pub fn wpm(typed_len: usize, elapsed_secs: u32) -> u32 {
    if elapsed_secs == 0 {
        return 0;
    }
    let words = typed_len as f64 / CHARS_PER_WORD;
    (words / elapsed_secs as f64 * 60.0).round() as u32
}

/// Live and final metrics both go through here.
pub fn compute(typed: &[char], target: &[char], elapsed_secs: u32) -> Metrics {
    Metrics {
        wpm: wpm(typed.len(), elapsed_secs),
        accuracy: accuracy(typed, target),
    }
}

fn round_to_tenth(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
