//! Generative Language API wire format and browser transport
//!
//! Only the slice of `generateContent` the game needs: one text prompt in,
//! the first candidate's text out.

use serde::{Deserialize, Serialize};

use super::{GenerationConfig, NarrationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireGenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub generation_config: WireGenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Content,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateRequest {
    pub fn new(prompt: &str, config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: WireGenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
            },
        }
    }
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    pub fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        Some(text)
    }
}

/// `generateContent` URL for a model under an API base
pub fn endpoint_url(base: &str, model: &str) -> String {
    format!(
        "{}/models/{}:generateContent",
        base.trim_end_matches('/'),
        model
    )
}

/// Serialize a request body
pub fn encode_request(prompt: &str, config: GenerationConfig) -> Result<String, NarrationError> {
    serde_json::to_string(&GenerateRequest::new(prompt, config))
        .map_err(|e| NarrationError::Decode(e.to_string()))
}

/// Extract the generated text from a response body
pub fn decode_response(body: &str) -> Result<String, NarrationError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| NarrationError::Decode(e.to_string()))?;
    match response.text() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(NarrationError::Empty),
    }
}

#[cfg(target_arch = "wasm32")]
pub use fetch::FetchTransport;

#[cfg(target_arch = "wasm32")]
mod fetch {
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

    use super::{decode_response, encode_request, endpoint_url};
    use crate::narration::{GenerationConfig, NarrationError, NarrationTransport};
    use crate::settings::NarrationSettings;

    /// Posts requests through `window.fetch`
    pub struct FetchTransport {
        settings: NarrationSettings,
    }

    impl FetchTransport {
        pub fn new(settings: NarrationSettings) -> Self {
            Self { settings }
        }

        async fn post(&self, prompt: &str, config: GenerationConfig) -> Result<String, NarrationError> {
            let key = self
                .settings
                .api_key
                .as_deref()
                .ok_or(NarrationError::MissingApiKey)?;
            let window = web_sys::window().ok_or(NarrationError::Offline)?;

            let headers = Headers::new().map_err(js_err)?;
            headers
                .set("Content-Type", "application/json")
                .map_err(js_err)?;
            headers.set("x-goog-api-key", key).map_err(js_err)?;

            let opts = RequestInit::new();
            opts.set_method("POST");
            opts.set_mode(RequestMode::Cors);
            opts.set_headers(&headers);
            opts.set_body(&JsValue::from_str(&encode_request(prompt, config)?));

            let url = endpoint_url(&self.settings.endpoint, &self.settings.model);
            let request = Request::new_with_str_and_init(&url, &opts).map_err(js_err)?;

            let response: Response = JsFuture::from(window.fetch_with_request(&request))
                .await
                .map_err(js_err)?
                .dyn_into()
                .map_err(js_err)?;
            if !response.ok() {
                return Err(NarrationError::Status(response.status()));
            }

            let body = JsFuture::from(response.text().map_err(js_err)?)
                .await
                .map_err(js_err)?
                .as_string()
                .ok_or_else(|| NarrationError::Decode("body is not text".to_string()))?;
            decode_response(&body)
        }
    }

    impl NarrationTransport for FetchTransport {
        async fn generate(
            &self,
            prompt: &str,
            config: GenerationConfig,
        ) -> Result<String, NarrationError> {
            self.post(prompt, config).await
        }
    }

    fn js_err(e: JsValue) -> NarrationError {
        NarrationError::Request(format!("{:?}", e))
    }
}
