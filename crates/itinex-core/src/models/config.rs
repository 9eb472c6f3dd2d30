//! Configuration structures for the extraction engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Main configuration for the extraction engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Regex-tier extraction configuration.
    pub extraction: ExtractionConfig,

    /// AI-tier configuration.
    pub ai: AiTierConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            ai: AiTierConfig::default(),
        }
    }
}

/// Regex-tier extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// How many lines above a flight-number anchor to scan when
    /// reconstructing a multi-line carrier name.
    pub max_carrier_lookback: usize,

    /// Currency assumed when a fare amount carries no code.
    pub default_currency: Option<String>,

    /// Per-format overrides for the phrases that identify a format and
    /// delimit its segment blocks, keyed by source system tag.
    pub format_overrides: BTreeMap<String, FormatOverride>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_carrier_lookback: 3,
            default_currency: None,
            format_overrides: BTreeMap::new(),
        }
    }
}

/// Overrides for one format's detection markers and block delimiters.
///
/// Empty lists mean "keep the parser's built-in defaults".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOverride {
    /// Phrases whose presence identifies the format.
    pub markers: Vec<String>,

    /// Phrases that delimit one segment block from the next.
    pub segment_delimiters: Vec<String>,
}

/// AI-tier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTierConfig {
    /// Whether the AI tier is attempted at all.
    pub enabled: bool,

    /// Model identifier passed to the completion backend.
    pub model: String,

    /// Completion endpoint, without the `/chat/completions` suffix.
    pub endpoint: String,

    /// Request timeout in seconds. The engine does not retry; on timeout it
    /// falls back to the regex tier immediately.
    pub timeout_secs: u64,

    /// Maximum tokens the completion may generate.
    pub max_tokens: usize,
}

impl Default for AiTierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gpt-4o-mini".to_string(),
            endpoint: "https://api.openai.com/v1".to_string(),
            timeout_secs: 30,
            max_tokens: 2048,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}
