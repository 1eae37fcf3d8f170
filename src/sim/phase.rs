//! Evolution phases
//!
//! The environment changes look as the score climbs. Which phase is current is
//! a pure function of the score; the state only remembers the last announced
//! phase so a transition is reported once.

/// A 24-bit sRGB colour (0xRRGGBB)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u32);

impl Rgb {
    /// Normalized channels for GPU upload
    pub fn to_f32(self) -> [f32; 3] {
        let r = ((self.0 >> 16) & 0xff) as f32 / 255.0;
        let g = ((self.0 >> 8) & 0xff) as f32 / 255.0;
        let b = (self.0 & 0xff) as f32 / 255.0;
        [r, g, b]
    }

    /// CSS hex notation
    pub fn to_css(self) -> String {
        format!("#{:06x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bg: Rgb,
    pub ground: Rgb,
    pub accent: Rgb,
    pub player: Rgb,
    pub obstacle: Rgb,
    pub secondary: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Phase {
    /// Minimum score at which this phase applies
    pub threshold: u32,
    pub name: &'static str,
    pub palette: Palette,
    /// Per-frame probability of drawing a glitch band
    pub glitch_intensity: f32,
}

/// Phase table, ordered by ascending threshold. The first entry has threshold 0.
pub const EVOLUTION_PHASES: [Phase; 4] = [
    Phase {
        threshold: 0,
        name: "NEON_WAVE",
        palette: Palette {
            bg: Rgb(0x050505),
            ground: Rgb(0x111111),
            accent: Rgb(0x00f2ff),
            player: Rgb(0x00f2ff),
            obstacle: Rgb(0xff0055),
            secondary: Rgb(0xff0055),
        },
        glitch_intensity: 0.01,
    },
    Phase {
        threshold: 500,
        name: "VIRTUAL_VOID",
        palette: Palette {
            bg: Rgb(0x0a001a),
            ground: Rgb(0x1a0033),
            accent: Rgb(0xbc13fe),
            player: Rgb(0xbc13fe),
            obstacle: Rgb(0x00ff41),
            secondary: Rgb(0x00ff41),
        },
        glitch_intensity: 0.05,
    },
    Phase {
        threshold: 1500,
        name: "DATA_HAZARD",
        palette: Palette {
            bg: Rgb(0x1a0500),
            ground: Rgb(0x330a00),
            accent: Rgb(0xffaa00),
            player: Rgb(0xffaa00),
            obstacle: Rgb(0xff0000),
            secondary: Rgb(0xffffff),
        },
        glitch_intensity: 0.12,
    },
    Phase {
        threshold: 3000,
        name: "CORE_PROTOCOL",
        palette: Palette {
            bg: Rgb(0x000800),
            ground: Rgb(0x001a00),
            accent: Rgb(0x00ff00),
            player: Rgb(0x00ff00),
            obstacle: Rgb(0xffffff),
            secondary: Rgb(0x00ff00),
        },
        glitch_intensity: 0.2,
    },
];

/// Index of the highest-threshold phase whose threshold is <= `score`
pub fn phase_index_for_score(score: f64, phases: &[Phase]) -> usize {
    phases
        .iter()
        .rposition(|p| score >= p.threshold as f64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_ascending() {
        assert_eq!(EVOLUTION_PHASES[0].threshold, 0);
        for pair in EVOLUTION_PHASES.windows(2) {
            assert!(pair[0].threshold < pair[1].threshold);
        }
    }

    #[test]
    fn test_phase_lookup_boundaries() {
        let table = &EVOLUTION_PHASES;
        assert_eq!(phase_index_for_score(0.0, table), 0);
        assert_eq!(phase_index_for_score(499.9, table), 0);
        assert_eq!(phase_index_for_score(500.0, table), 1);
        assert_eq!(phase_index_for_score(1499.0, table), 1);
        assert_eq!(phase_index_for_score(1500.0, table), 2);
        assert_eq!(phase_index_for_score(2999.99, table), 2);
        assert_eq!(phase_index_for_score(3000.0, table), 3);
        assert_eq!(phase_index_for_score(1.0e9, table), 3);
    }

    #[test]
    fn test_rgb_conversion() {
        assert_eq!(Rgb(0xff0000).to_f32(), [1.0, 0.0, 0.0]);
        assert_eq!(Rgb(0x00f2ff).to_css(), "#00f2ff");
    }
}
