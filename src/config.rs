use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Label substrings recognized by the labeled-line parser, matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub symbol: Vec<String>,
    pub direction: Vec<String>,
    pub entries: Vec<String>,
    pub stoploss: Vec<String>,
    pub targets: Vec<String>,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            symbol: strings(&["symbol:"]),
            direction: strings(&["signaltype:", "signal type:"]),
            entries: strings(&["entries:"]),
            stoploss: strings(&["stoploss:"]),
            targets: strings(&["targets:"]),
        }
    }
}

/// Ordered regex lists for the cascade. First match wins; group 1 is the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub symbol: Vec<String>,
    pub direction: Vec<String>,
    pub entries: Vec<String>,
    pub targets: Vec<String>,
    pub stoploss: Vec<String>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            symbol: strings(&[
                r"symbol[:\s]*([A-Z]{3,10})\b",
                r"coin[:\s]*([A-Z]{3,10})\b",
                r"pair[:\s]*([A-Z]{3,10})\b",
                r"([A-Z]{2,10}USDT)",
                r"\b([A-Z]{3,10})/USDT",
                r"symbol[:\s]*(\w+)",
                r"\b([A-Z]{3,10})\s",
            ]),
            direction: strings(&[
                r"\b(LONG|SHORT|BUY|SELL)\b",
                r"signal[:\s]*(LONG|SHORT|BUY|SELL)",
                r"type[:\s]*(LONG|SHORT|BUY|SELL)",
            ]),
            entries: strings(&[
                r"entries[:\s]*\$?([0-9.,\s-]+)",
                r"entry[:\s]*\$?([0-9.,\s-]+)",
                r"entr(?:y|ies)[:\s]*\$?([0-9.,\s-]+)",
                r"buy\s*zone[:\s]*\$?([0-9.,\s-]+)",
                r"enter[:\s]*\$?([0-9.,\s-]+)",
                r"(\$[0-9]+\.?[0-9]*\s*-\s*\$[0-9]+\.?[0-9]*)",
                r"([0-9]+\.?[0-9]*\s*-\s*[0-9]+\.?[0-9]*)",
            ]),
            targets: strings(&[
                r"targets[:\s]*\$?([0-9.,\s-]+)",
                r"target[:\s]*\$?([0-9.,\s-]+)",
                r"\btp[:\s]*\$?([0-9.,\s-]+)",
                r"take\s*profit[:\s]*\$?([0-9.,\s-]+)",
                r"(\$[0-9]+\.?[0-9]*(?:\s*-\s*\$[0-9]+\.?[0-9]*)*)",
            ]),
            stoploss: strings(&[
                r"stoploss[:\s]*\$?([0-9.,]+)",
                r"stop\s*loss[:\s]*\$?([0-9.,]+)",
                r"\bsl[:\s]*\$?([0-9.,]+)",
            ]),
        }
    }
}

/// A symbol token containing `garbled` is replaced wholesale by `corrected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrCorrection {
    pub garbled: String,
    pub corrected: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub labels: LabelConfig,
    pub patterns: PatternConfig,
    pub ocr_corrections: Vec<OcrCorrection>,
    /// Lines scanned after a bare `targets:` label by the labeled parser.
    pub targets_lookahead: usize,
    /// Same, for the cascade's secondary targets scan.
    pub fallback_targets_lookahead: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            labels: LabelConfig::default(),
            patterns: PatternConfig::default(),
            ocr_corrections: vec![
                OcrCorrection {
                    garbled: "SOLUSOT".into(),
                    corrected: "SOLUSDT".into(),
                },
                // Cyrillic capital Te in place of the trailing T
                OcrCorrection {
                    garbled: "SOLUSO\u{0422}".into(),
                    corrected: "SOLUSDT".into(),
                },
            ],
            targets_lookahead: 4,
            fallback_targets_lookahead: 2,
        }
    }
}

/// Apply the first matching OCR correction to an upper-cased symbol token.
pub fn correct_symbol(corrections: &[OcrCorrection], token: &str) -> String {
    corrections
        .iter()
        .find(|c| token.contains(c.garbled.as_str()))
        .map(|c| c.corrected.clone())
        .unwrap_or_else(|| token.to_string())
}

/// Load a JSON config file. Missing keys fall back to the built-in defaults.
pub fn load(path: &Path) -> Result<ParserConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: ParserConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse config JSON at: {}", path.display()))?;
    info!(path = %path.display(), "Loaded parser config");
    Ok(config)
}

pub fn to_json(config: &ParserConfig) -> Result<String> {
    serde_json::to_string_pretty(config).context("Failed to serialize parser config")
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
