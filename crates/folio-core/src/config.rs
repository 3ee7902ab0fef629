//! Engine configuration.
//!
//! ## Learning: Serde for Serialization
//!
//! `#[serde(default)]` on every section means a config file only needs to
//! mention what it changes:
//!
//! ```toml
//! [typewriter]
//! phrases = ["Ada Lovelace", "Analytical Engineer"]
//! pause_ms = 3000
//!
//! [delivery]
//! service_id = "service_abc"
//! ```
//!
//! All timing values are plain milliseconds in the file and exposed as
//! `Duration` through accessor methods.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use folio_delivery::DeliveryConfig;

/// Main engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Typewriter timings and phrases
    pub typewriter: TypewriterConfig,

    /// Scroll tracking thresholds
    pub scroll: ScrollConfig,

    /// Navigation offsets
    pub nav: NavConfig,

    /// Contact form behavior
    pub form: FormConfig,

    /// Decorative particles
    pub particles: ParticleConfig,

    /// Theme persistence
    pub theme: ThemeConfig,

    /// Message delivery identifiers
    pub delivery: DeliveryConfig,

    /// Content registry location
    pub content: ContentConfig,
}

impl Config {
    /// Loads config from the default location.
    pub fn load() -> Self {
        match Self::load_from_default_path() {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Falling back to default config: {}", err);
                Self::default()
            }
        }
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads from the default config path.
    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("folio").join("config.toml"))
    }

    /// Saves the config to the given path.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Typewriter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TypewriterConfig {
    /// Phrases cycled through, in order
    pub phrases: Vec<String>,

    /// Delay between typed characters (ms)
    pub type_interval_ms: u64,

    /// Delay between deleted characters (ms)
    pub delete_interval_ms: u64,

    /// Pause on a fully typed phrase (ms)
    pub pause_ms: u64,
}

impl TypewriterConfig {
    pub fn type_interval(&self) -> Duration {
        Duration::from_millis(self.type_interval_ms)
    }

    pub fn delete_interval(&self) -> Duration {
        Duration::from_millis(self.delete_interval_ms)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            phrases: vec!["Folio Owner".to_string(), "Frontend Developer".to_string()],
            type_interval_ms: 80,
            delete_interval_ms: 40,
            pause_ms: 2500,
        }
    }
}

/// Scroll tracking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Scroll offset (px) above which the navigation chrome turns solid
    pub solid_threshold: f64,

    /// Landmark region whose visibility hides the scroll-to-top control
    pub hero_region: String,

    /// Top root margin (px) applied while observing the hero region.
    /// Negative values shrink the viewport from the top.
    pub hero_root_margin_top: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            solid_threshold: 20.0,
            hero_region: "home".to_string(),
            hero_root_margin_top: -80.0,
        }
    }
}

/// Navigation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Viewport width (px) below which the mobile layout applies
    pub mobile_breakpoint: f64,

    /// Space (px) left above a section when scrolling to it on mobile
    pub mobile_offset: f64,

    /// Space (px) left above a section when scrolling to it on desktop
    pub desktop_offset: f64,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint: 768.0,
            mobile_offset: 70.0,
            desktop_offset: 100.0,
        }
    }
}

/// Contact form configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Duration of the invalid-attempt pulse (ms)
    pub invalid_pulse_ms: u64,

    /// Notice shown when delivery fails
    pub failure_notice: String,
}

impl FormConfig {
    pub fn invalid_pulse(&self) -> Duration {
        Duration::from_millis(self.invalid_pulse_ms)
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            invalid_pulse_ms: 500,
            failure_notice: "Submission failed. Try again.".to_string(),
        }
    }
}

/// Particle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Number of particles per view
    pub count: usize,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self { count: 30 }
    }
}

/// Theme persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Key the preference is stored under
    pub storage_key: String,

    /// Preference file; platform data directory when unset
    pub storage_path: Option<PathBuf>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            storage_key: "theme".to_string(),
            storage_path: None,
        }
    }
}

/// Content registry configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// TOML file with skills, projects and links; built-in set when unset
    pub path: Option<PathBuf>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
