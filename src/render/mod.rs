pub mod synthetic;

pub use synthetic::SyntheticRenderer;

use serde_json::json;

use crate::config::Config;
use crate::error::{ChunkcastError, Result};
use crate::project::{ProjectSettings, RenderParams};

/// Sampling parameters understood by the speech renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct TtsOptions {
    pub cfg_scale: f64,
    pub diffusion_steps: u32,
    pub use_sampling: bool,
    pub temperature: f64,
    pub top_p: f64,
}

impl Default for TtsOptions {
    fn default() -> Self {
        Self {
            cfg_scale: 1.3,
            diffusion_steps: 20,
            use_sampling: false,
            temperature: 0.95,
            top_p: 0.95,
        }
    }
}

impl TtsOptions {
    /// Read options from a parameter map; missing or mistyped keys fall back
    /// to the defaults.
    pub fn from_params(params: &RenderParams) -> Self {
        let defaults = Self::default();
        let f64_or = |key: &str, fallback: f64| {
            params.get(key).and_then(|v| v.as_f64()).unwrap_or(fallback)
        };

        Self {
            cfg_scale: f64_or("cfg_scale", defaults.cfg_scale),
            diffusion_steps: params
                .get("diffusion_steps")
                .and_then(|v| v.as_u64())
                .map(|v| v as u32)
                .unwrap_or(defaults.diffusion_steps),
            use_sampling: params
                .get("use_sampling")
                .and_then(|v| v.as_bool())
                .unwrap_or(defaults.use_sampling),
            temperature: f64_or("temperature", defaults.temperature),
            top_p: f64_or("top_p", defaults.top_p),
        }
    }

    pub fn as_params(&self) -> RenderParams {
        let mut params = RenderParams::new();
        params.insert("cfg_scale".to_string(), json!(self.cfg_scale));
        params.insert("diffusion_steps".to_string(), json!(self.diffusion_steps));
        params.insert("use_sampling".to_string(), json!(self.use_sampling));
        params.insert("temperature".to_string(), json!(self.temperature));
        params.insert("top_p".to_string(), json!(self.top_p));
        params
    }

    pub fn with_overrides(&self, overrides: &ParamOverrides) -> Self {
        Self {
            cfg_scale: overrides.cfg_scale.unwrap_or(self.cfg_scale),
            diffusion_steps: overrides.diffusion_steps.unwrap_or(self.diffusion_steps),
            use_sampling: overrides.use_sampling.unwrap_or(self.use_sampling),
            temperature: overrides.temperature.unwrap_or(self.temperature),
            top_p: overrides.top_p.unwrap_or(self.top_p),
        }
    }
}

/// Per-call replacements for individual [`TtsOptions`] fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamOverrides {
    pub cfg_scale: Option<f64>,
    pub diffusion_steps: Option<u32>,
    pub use_sampling: Option<bool>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
}

impl ParamOverrides {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Text-to-speech backend that turns one chunk of text into mono audio at
/// the project sample rate.
pub trait Renderer: Send + Sync {
    fn render(
        &self,
        text: &str,
        seed: u64,
        options: &TtsOptions,
        settings: &ProjectSettings,
    ) -> Result<Vec<f32>>;

    fn name(&self) -> &'static str;
}

/// Pick the renderer selected by configuration.
///
/// Only the synthetic renderer ships with this crate; neural backends are
/// injected by embedding applications through [`Renderer`].
pub fn create_renderer(config: &Config) -> Result<Box<dyn Renderer>> {
    if config.mock_tts {
        return Ok(Box::new(SyntheticRenderer));
    }

    Err(ChunkcastError::Render(
        "No neural renderer is linked into this build. Set CHUNKCAST_MOCK_TTS=1 to use synthetic audio."
            .to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = TtsOptions::default();
        assert_eq!(options.cfg_scale, 1.3);
        assert_eq!(options.diffusion_steps, 20);
        assert!(!options.use_sampling);
        assert_eq!(options.temperature, 0.95);
        assert_eq!(options.top_p, 0.95);
    }

    #[test]
    fn test_params_round_trip() {
        let options = TtsOptions {
            cfg_scale: 2.0,
            diffusion_steps: 30,
            use_sampling: true,
            temperature: 0.7,
            top_p: 0.8,
        };
        assert_eq!(TtsOptions::from_params(&options.as_params()), options);
    }

    #[test]
    fn test_from_params_missing_keys() {
        let mut params = RenderParams::new();
        params.insert("diffusion_steps".to_string(), json!(8));
        params.insert("temperature".to_string(), json!("hot"));

        let options = TtsOptions::from_params(&params);
        assert_eq!(options.diffusion_steps, 8);
        assert_eq!(options.temperature, 0.95);
        assert_eq!(options.cfg_scale, 1.3);
    }

    #[test]
    fn test_overrides() {
        let overrides = ParamOverrides {
            cfg_scale: Some(3.0),
            use_sampling: Some(true),
            ..Default::default()
        };
        assert!(!overrides.is_empty());
        assert!(ParamOverrides::default().is_empty());

        let options = TtsOptions::default().with_overrides(&overrides);
        assert_eq!(options.cfg_scale, 3.0);
        assert!(options.use_sampling);
        assert_eq!(options.diffusion_steps, 20);
    }

    #[test]
    fn test_create_renderer() {
        let mut config = Config::default();
        assert!(create_renderer(&config).is_err());

        config.mock_tts = true;
        assert_eq!(create_renderer(&config).unwrap().name(), "synthetic");
    }
}
