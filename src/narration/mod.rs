//! Milestone narration
//!
//! Every hundred points the shell asks a text-generation service for a short
//! "AI overseer" line. The client never fails: offline, error and empty
//! responses all map to fixed strings.

pub mod gemini;

use std::future::Future;

use crate::consts::NARRATION_MILESTONE;
use crate::sim::PowerUpKind;

pub const INTRO_MESSAGE: &str = "INITIALIZING DINO-VERSE PROTOCOL...";
pub const RUN_START_MESSAGE: &str = "NEURAL LINK ESTABLISHED. ESCAPE STARTING.";
pub const GAME_OVER_MESSAGE: &str = "SYSTEM CRITICAL. SIMULATION TERMINATED.";
pub const OFFLINE_MESSAGE: &str =
    "OFFLINE MODE: AI OVERSEER DISCONNECTED. PROCEED WITH CAUTION.";
pub const FALLBACK_MESSAGE: &str = "Neural link jittering... stay on track.";
pub const STABLE_MESSAGE: &str = "Simulation integrity stable. Proceeding...";

/// Sampling parameters for one request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

pub const NARRATION_CONFIG: GenerationConfig = GenerationConfig {
    temperature: 0.8,
    max_output_tokens: 50,
};

pub const POWER_UP_NAME_CONFIG: GenerationConfig = GenerationConfig {
    temperature: 0.9,
    max_output_tokens: 20,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NarrationError {
    #[error("no network connection")]
    Offline,
    #[error("no API key configured")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Request(String),
    #[error("service answered with HTTP {0}")]
    Status(u16),
    #[error("unreadable response: {0}")]
    Decode(String),
    #[error("response contained no text")]
    Empty,
}

/// Something that can turn a prompt into generated text
pub trait NarrationTransport {
    fn generate(
        &self,
        prompt: &str,
        config: GenerationConfig,
    ) -> impl Future<Output = Result<String, NarrationError>>;
}

pub fn narration_prompt(score: u32) -> String {
    format!(
        "The player has reached a score of {score} in a cyberpunk dinosaur escape game. \
         The dino is running through a glitching digital wasteland. \
         Generate a very short (max 12 words), epic, atmospheric narration or \"system message\" \
         from an AI overseer. Keep it cool, techy, and slightly mysterious."
    )
}

pub fn power_up_prompt(kind: PowerUpKind) -> String {
    format!(
        "Generate a cool cyberpunk name for a power-up of type: {}. Max 2 words.",
        kind.label()
    )
}

/// Overseer line for a score milestone
///
/// When `online` is false the transport is never called.
pub async fn narrate<T: NarrationTransport>(transport: &T, online: bool, score: u32) -> String {
    if !online {
        return OFFLINE_MESSAGE.to_string();
    }

    match transport
        .generate(&narration_prompt(score), NARRATION_CONFIG)
        .await
    {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) | Err(NarrationError::Empty) => STABLE_MESSAGE.to_string(),
        Err(e) => {
            log::warn!("Narration failed at score {}: {}", score, e);
            FALLBACK_MESSAGE.to_string()
        }
    }
}

/// Flashy display name for a collected power-up, or its plain label
pub async fn power_up_name<T: NarrationTransport>(
    transport: &T,
    online: bool,
    kind: PowerUpKind,
) -> String {
    if !online {
        return kind.label().to_string();
    }

    match transport
        .generate(&power_up_prompt(kind), POWER_UP_NAME_CONFIG)
        .await
    {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => kind.label().to_string(),
        Err(e) => {
            log::warn!("Power-up naming failed: {}", e);
            kind.label().to_string()
        }
    }
}

/// Decides when to request narration and holds the line on display
///
/// At most one request is in flight; a new one starts only once the score has
/// moved more than one milestone past the last request.
#[derive(Debug, Clone)]
pub struct NarrationGate {
    last_milestone: u32,
    pending: bool,
    text: String,
}

impl Default for NarrationGate {
    fn default() -> Self {
        Self {
            last_milestone: 0,
            pending: false,
            text: INTRO_MESSAGE.to_string(),
        }
    }
}

impl NarrationGate {
    pub fn text(&self) -> &str {
        &self.text
    }

    #[cfg(test)]
    fn is_pending(&self) -> bool {
        self.pending
    }

    /// Returns true if a request should start now for `score`
    pub fn try_begin(&mut self, score: u32) -> bool {
        if self.pending || score <= self.last_milestone + NARRATION_MILESTONE {
            return false;
        }
        self.last_milestone = score;
        self.pending = true;
        true
    }

    /// Store a resolved line and allow the next request
    pub fn finish(&mut self, text: String) {
        self.text = text;
        self.pending = false;
    }

    /// Replace the displayed line without touching the request state
    pub fn announce(&mut self, text: &str) {
        self.text = text.to_string();
    }

    /// New run: milestones count from zero again
    ///
    /// A request still in flight keeps the gate closed until it resolves.
    pub fn start_run(&mut self) {
        self.last_milestone = 0;
        self.text = RUN_START_MESSAGE.to_string();
    }
}
