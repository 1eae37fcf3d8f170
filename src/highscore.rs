//! Best score persistence
//!
//! A single non-negative integer kept in LocalStorage as a plain decimal string.

use crate::platform;

/// Best completed-run score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighScore {
    best: u32,
}

impl HighScore {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "dino-high-score";

    #[cfg(test)]
    fn new(best: u32) -> Self {
        Self { best }
    }

    pub fn best(&self) -> u32 {
        self.best
    }

    /// Parse a stored value; anything unreadable counts as no record
    pub fn parse(raw: &str) -> Self {
        let best = raw
            .trim()
            .parse::<i64>()
            .ok()
            .map(|v| v.clamp(0, u32::MAX as i64) as u32)
            .unwrap_or(0);
        Self { best }
    }

    /// Record a completed run. Returns true if it set a new best.
    pub fn submit(&mut self, score: u32) -> bool {
        if score > self.best {
            self.best = score;
            true
        } else {
            false
        }
    }

    /// Record a completed run and persist it if it beat the stored best
    pub fn submit_and_save(&mut self, score: u32) -> bool {
        let is_new = self.submit(score);
        if is_new {
            self.save();
        }
        is_new
    }

    /// Load the stored best (0 if none)
    pub fn load() -> Self {
        match platform::storage_get(Self::STORAGE_KEY) {
            Some(raw) => {
                let score = Self::parse(&raw);
                log::info!("Loaded high score {}", score.best);
                score
            }
            None => {
                log::info!("No high score found, starting fresh");
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        if platform::storage_set(Self::STORAGE_KEY, &self.best.to_string()) {
            log::info!("High score saved ({})", self.best);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stored_values() {
        assert_eq!(HighScore::parse("1234").best(), 1234);
        assert_eq!(HighScore::parse(" 77\n").best(), 77);
        assert_eq!(HighScore::parse("").best(), 0);
        assert_eq!(HighScore::parse("abc").best(), 0);
        assert_eq!(HighScore::parse("-5").best(), 0);
    }

    #[test]
    fn test_submit_only_raises() {
        let mut hs = HighScore::new(100);
        assert!(!hs.submit(50));
        assert!(!hs.submit(100));
        assert_eq!(hs.best(), 100);
        assert!(hs.submit(101));
        assert_eq!(hs.best(), 101);
    }

    #[test]
    fn test_first_run_sets_record() {
        let mut hs = HighScore::default();
        assert!(!hs.submit(0));
        assert!(hs.submit(1));
    }
}
