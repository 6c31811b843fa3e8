//! `GenerateOptions`: the whole of the configuration surface the core exposes
//! (spec.md §3, §6). All fields are optional; unspecified means provider default.

/// Sampling/generation knobs forwarded one-to-one to the model adapter when present.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GenerateOptions {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
    /// Adapter-specific: forces streaming on (thinking is a stream-only capability, spec.md §4.2).
    pub enable_thinking: Option<bool>,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if thinking was requested; implies the adapter must stream (spec.md §4.2).
    pub fn requires_streaming(&self) -> bool {
        self.enable_thinking.unwrap_or(false)
    }
}
