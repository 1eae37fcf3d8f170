//! Game settings and preferences
//!
//! Persisted separately from the high score in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::platform;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    /// Whether to render the parallax grid
    pub fn grid_enabled(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }

    /// Number of floating dust specks
    pub fn dust_count(&self) -> u32 {
        match self {
            QualityPreset::Low => 0,
            QualityPreset::Medium => 10,
            QualityPreset::High => 24,
        }
    }
}

/// Text-generation endpoint used for milestone narration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationSettings {
    /// Request narration at score milestones
    pub enabled: bool,
    /// Base URL of the generative language API
    pub endpoint: String,
    pub model: String,
    /// API key; requests are skipped when absent
    pub api_key: Option<String>,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-3-flash-preview".to_string(),
            api_key: option_env!("DINO_VERSE_API_KEY").map(str::to_string),
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Audio ===
    pub muted: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Background drone during runs
    pub ambient: bool,

    // === Accessibility ===
    /// Reduced motion (no glitch bands)
    pub reduced_motion: bool,

    pub narration: NarrationSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            muted: false,
            master_volume: 1.0,
            sfx_volume: 1.0,
            ambient: true,
            reduced_motion: false,
            narration: NarrationSettings::default(),
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "dino_verse_settings";

    /// Glitch probability actually used by the renderer
    pub fn effective_glitch(&self, phase_intensity: f32) -> f32 {
        if self.reduced_motion {
            0.0
        } else {
            phase_intensity
        }
    }

    /// Load settings from LocalStorage, falling back to defaults
    pub fn load() -> Self {
        if let Some(json) = platform::storage_get(Self::STORAGE_KEY) {
            match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring unreadable settings: {}", e),
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage
    pub fn save(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            if platform::storage_set(Self::STORAGE_KEY, &json) {
                log::info!("Settings saved");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_render_features() {
        assert!(!QualityPreset::Low.grid_enabled());
        assert!(QualityPreset::Medium.grid_enabled());
        assert_eq!(QualityPreset::Low.dust_count(), 0);
        assert!(QualityPreset::High.dust_count() > QualityPreset::Medium.dust_count());
    }

    #[test]
    fn test_settings_json_roundtrip() {
        let mut settings = Settings::default();
        settings.muted = true;
        settings.quality = QualityPreset::Low;
        settings.narration.api_key = Some("k".to_string());

        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let back: Settings = serde_json::from_str(r#"{"muted":true}"#).unwrap();
        assert!(back.muted);
        assert_eq!(back.quality, QualityPreset::Medium);
        assert!(back.narration.enabled);
        assert_eq!(back.narration.model, "gemini-3-flash-preview");
    }

    #[test]
    fn test_reduced_motion_disables_glitch() {
        let mut settings = Settings::default();
        assert_eq!(settings.effective_glitch(0.2), 0.2);
        settings.reduced_motion = true;
        assert_eq!(settings.effective_glitch(0.2), 0.0);
    }
}
