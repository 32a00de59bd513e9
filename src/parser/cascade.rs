use std::sync::Arc;

use anyhow::{bail, Context, Result};
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use super::labeled::{compile_labels, scan_targets};
use super::price::normalize_price;
use super::validate::is_valid_symbol;
use crate::config::{correct_symbol, ParserConfig};
use crate::record::{Field, FieldSet};

/// Turns a raw capture into a field value, or rejects it so the next rule runs.
pub type Normalizer = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

pub struct Rule {
    pub pattern: Regex,
    pub normalize: Normalizer,
}

/// Ordered rules for one field. Evaluation stops at the first accepted capture.
pub struct Cascade {
    pub field: Field,
    pub rules: Vec<Rule>,
}

impl Cascade {
    pub fn new(field: Field, patterns: &[String], normalize: Normalizer) -> Result<Self> {
        let rules = patterns
            .iter()
            .map(|p| {
                let pattern = RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .with_context(|| format!("Invalid {field} pattern: {p}"))?;
                if pattern.captures_len() < 2 {
                    bail!("{field} pattern has no capture group: {p}");
                }
                Ok(Rule {
                    pattern,
                    normalize: Arc::clone(&normalize),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { field, rules })
    }

    /// Index of the winning rule and its normalized value.
    pub fn first_match(&self, text: &str) -> Option<(usize, String)> {
        self.rules.iter().enumerate().find_map(|(idx, rule)| {
            let caps = rule.pattern.captures(text)?;
            let raw = caps.get(1)?.as_str();
            match (rule.normalize)(raw) {
                Some(v) => Some((idx, v)),
                None => {
                    debug!(field = %self.field, rule = idx, raw, "Capture rejected");
                    None
                }
            }
        })
    }
}

/// Regex fallback for text without usable labels.
pub struct CascadeExtractor {
    pub(crate) symbol: Cascade,
    pub(crate) direction: Cascade,
    pub(crate) entries: Cascade,
    pub(crate) targets: Cascade,
    pub(crate) stoploss: Cascade,
    targets_labels: Vec<Regex>,
    targets_lookahead: usize,
}

impl CascadeExtractor {
    pub fn new(config: &ParserConfig) -> Result<Self> {
        let p = &config.patterns;
        let corrections = config.ocr_corrections.clone();
        let symbol: Normalizer = Arc::new(move |raw: &str| {
            let token = correct_symbol(&corrections, &raw.trim().to_uppercase());
            is_valid_symbol(&token).then_some(token)
        });
        let price: Normalizer = Arc::new(|raw: &str| Some(normalize_price(raw)).filter(|v| !v.is_empty()));

        Ok(Self {
            symbol: Cascade::new(Field::Symbol, &p.symbol, symbol)?,
            direction: Cascade::new(Field::Direction, &p.direction, Arc::new(normalize_direction))?,
            entries: Cascade::new(Field::Entries, &p.entries, Arc::clone(&price))?,
            targets: Cascade::new(Field::Targets, &p.targets, Arc::clone(&price))?,
            stoploss: Cascade::new(Field::StopLoss, &p.stoploss, price)?,
            targets_labels: compile_labels(&config.labels.targets)?,
            targets_lookahead: config.fallback_targets_lookahead,
        })
    }

    /// Build a field set from scratch. Any unresolved field aborts the whole record.
    pub fn extract(&self, text: &str) -> Option<FieldSet> {
        let upper = text.to_uppercase();
        let mut fields = FieldSet::default();

        for cascade in [&self.symbol, &self.direction, &self.entries, &self.targets, &self.stoploss] {
            let found = cascade.first_match(&upper).or_else(|| {
                if cascade.field == Field::Targets {
                    self.targets_after_label(&upper).map(|v| (cascade.rules.len(), v))
                } else {
                    None
                }
            });

            match found {
                Some((rule, value)) => {
                    debug!(field = %cascade.field, rule, value = %value, "Cascade matched");
                    fields.set(cascade.field, value);
                }
                None => {
                    warn!(field = %cascade.field, "No {} found in text", cascade.field);
                    return None;
                }
            }
        }

        Some(fields)
    }

    /// Values listed on the lines under a bare targets label.
    fn targets_after_label(&self, text: &str) -> Option<String> {
        let lines: Vec<&str> = text.lines().collect();
        lines
            .iter()
            .enumerate()
            .filter(|(_, line)| self.targets_labels.iter().any(|re| re.is_match(line)))
            .find_map(|(i, _)| {
                let line = scan_targets(&lines, i, self.targets_lookahead)?;
                Some(normalize_price(line)).filter(|v| !v.is_empty())
            })
    }
}

fn normalize_direction(raw: &str) -> Option<String> {
    match raw.trim().to_uppercase().as_str() {
        "LONG" | "BUY" => Some("LONG".into()),
        "SHORT" | "SELL" => Some("SHORT".into()),
        _ => None,
    }
}
