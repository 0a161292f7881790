use crate::error::{ChunkcastError, Result};
use crate::project::ProjectSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings applied to newly generated projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectDefaults {
    pub sample_rate: u32,
    pub loudness_lufs: f64,
    pub model_name: String,
    pub attention_type: String,
    pub global_seed: u64,
    pub crossfade_ms: u64,
}

impl Default for ProjectDefaults {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            loudness_lufs: -16.0,
            model_name: "VibeVoice-Large".to_string(),
            attention_type: "auto".to_string(),
            global_seed: 42,
            crossfade_ms: 40,
        }
    }
}

impl ProjectDefaults {
    pub fn to_settings(&self) -> ProjectSettings {
        ProjectSettings {
            sample_rate: self.sample_rate,
            loudness_lufs: self.loudness_lufs,
            model_name: self.model_name.clone(),
            attention_type: self.attention_type.clone(),
            global_seed: self.global_seed,
            crossfade_ms: self.crossfade_ms,
            ..ProjectSettings::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Working directory for models, inputs, outputs and temp files.
    pub base_dir: PathBuf,
    /// Use the synthetic renderer instead of the neural one.
    pub mock_tts: bool,
    pub max_words_per_chunk: usize,
    pub defaults: ProjectDefaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            mock_tts: false,
            max_words_per_chunk: 80,
            defaults: ProjectDefaults::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                if let Ok(file_config) = toml::from_str::<Config>(&contents) {
                    config = file_config;
                }
            }
        }

        // Override with environment variables
        if let Ok(dir) = std::env::var("CHUNKCAST_BASE_DIR") {
            if !dir.trim().is_empty() {
                config.base_dir = PathBuf::from(dir);
            }
        }
        if let Ok(value) = std::env::var("CHUNKCAST_MOCK_TTS") {
            config.mock_tts = is_truthy(&value);
        }
        if let Ok(max_words) = std::env::var("CHUNKCAST_MAX_WORDS") {
            if let Ok(n) = max_words.parse() {
                config.max_words_per_chunk = n;
            }
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_words_per_chunk == 0 {
            return Err(ChunkcastError::Config(
                "max_words_per_chunk must be greater than 0".to_string(),
            ));
        }

        if self.defaults.sample_rate == 0 {
            return Err(ChunkcastError::Config(
                "Sample rate must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn models_dir(&self) -> PathBuf {
        self.base_dir.join("models")
    }

    pub fn input_dir(&self) -> PathBuf {
        self.base_dir.join("input")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.base_dir.join("output")
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.base_dir.join("temp")
    }

    /// Create the working directory tree under `base_dir`.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            self.models_dir(),
            self.input_dir(),
            self.output_dir(),
            self.temp_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Expand `{repo}` and `${repo}` placeholders against `base_dir`.
    pub fn expand_placeholders(&self, value: &str) -> String {
        let base = self.base_dir.to_string_lossy();
        value.replace("${repo}", &base).replace("{repo}", &base)
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("chunkcast").join("config.toml"))
    }
}

fn default_base_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| Path::new(".").to_path_buf())
        .join("chunkcast")
}

/// Anything except "", "0", "false" and "off" turns a switch on.
pub fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "" | "0" | "false" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.mock_tts);
        assert_eq!(config.max_words_per_chunk, 80);
        assert_eq!(config.defaults.sample_rate, 24_000);
        assert_eq!(config.defaults.crossfade_ms, 40);
        assert_eq!(config.defaults.global_seed, 42);
        assert!(config.base_dir.ends_with("chunkcast"));
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("1"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("TRUE"));
        assert!(!is_truthy(""));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("False"));
        assert!(!is_truthy("OFF"));
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.max_words_per_chunk = 0;
        assert!(config.validate().is_err());

        config.max_words_per_chunk = 10;
        config.defaults.sample_rate = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            "mock_tts = true\n[defaults]\ncrossfade_ms = 100\n",
        )
        .unwrap();
        assert!(config.mock_tts);
        assert_eq!(config.defaults.crossfade_ms, 100);
        assert_eq!(config.defaults.sample_rate, 24_000);
        assert_eq!(config.max_words_per_chunk, 80);
    }

    #[test]
    fn test_ensure_dirs() {
        let temp = TempDir::new().unwrap();
        let config = Config {
            base_dir: temp.path().join("base"),
            ..Default::default()
        };
        config.ensure_dirs().unwrap();
        assert!(config.models_dir().is_dir());
        assert!(config.input_dir().is_dir());
        assert!(config.output_dir().is_dir());
        assert!(config.temp_dir().is_dir());
    }

    #[test]
    fn test_expand_placeholders() {
        let config = Config {
            base_dir: PathBuf::from("/data/cc"),
            ..Default::default()
        };
        assert_eq!(
            config.expand_placeholders("{repo}/scripts/a.txt"),
            "/data/cc/scripts/a.txt"
        );
        assert_eq!(
            config.expand_placeholders("${repo}/b.txt"),
            "/data/cc/b.txt"
        );
    }

    #[test]
    fn test_defaults_to_settings() {
        let settings = ProjectDefaults::default().to_settings();
        assert_eq!(settings.sample_rate, 24_000);
        assert_eq!(settings.chunks_dir, "chunks");
        assert!(settings.default_params.is_empty());
    }
}
