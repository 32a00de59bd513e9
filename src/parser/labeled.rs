use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use tracing::debug;

use super::validate::is_valid_symbol;
use crate::config::{correct_symbol, LabelConfig, OcrCorrection, ParserConfig};
use crate::record::{Field, FieldSet};

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());
static DIRECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(LONG|SHORT)").unwrap());
static DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\.\d+").unwrap());

/// Line-by-line parser for screenshots that kept their field labels.
pub struct LabeledParser {
    symbol: Vec<Regex>,
    direction: Vec<Regex>,
    entries: Vec<Regex>,
    stoploss: Vec<Regex>,
    targets: Vec<Regex>,
    corrections: Vec<OcrCorrection>,
    lookahead: usize,
}

impl LabeledParser {
    pub fn new(config: &ParserConfig) -> Result<Self> {
        let LabelConfig {
            symbol,
            direction,
            entries,
            stoploss,
            targets,
        } = &config.labels;

        Ok(Self {
            symbol: compile_labels(symbol)?,
            direction: compile_labels(direction)?,
            entries: compile_labels(entries)?,
            stoploss: compile_labels(stoploss)?,
            targets: compile_labels(targets)?,
            corrections: config.ocr_corrections.clone(),
            lookahead: config.targets_lookahead,
        })
    }

    /// Returns the field set only when all five fields were captured.
    pub fn parse(&self, text: &str) -> Option<FieldSet> {
        let lines: Vec<&str> = text.lines().collect();
        let mut fields = FieldSet::default();

        for (i, raw) in lines.iter().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(rest) = after_label(&self.symbol, line) {
                if let Some(tok) = TOKEN_RE.find(rest) {
                    let symbol = correct_symbol(&self.corrections, &tok.as_str().to_uppercase());
                    if is_valid_symbol(&symbol) {
                        fields.set(Field::Symbol, symbol);
                    } else {
                        debug!(token = %symbol, "Labeled symbol rejected");
                    }
                }
            }

            if let Some(rest) = after_label(&self.direction, line) {
                if let Some(caps) = DIRECTION_RE.captures(rest) {
                    fields.set(Field::Direction, caps[1].to_uppercase());
                }
            }

            if let Some(value) = after_label(&self.entries, line).and_then(non_empty) {
                fields.set(Field::Entries, value.to_string());
            }

            if let Some(value) = after_label(&self.stoploss, line).and_then(non_empty) {
                fields.set(Field::StopLoss, value.to_string());
            }

            if let Some(rest) = after_label(&self.targets, line) {
                let value = non_empty(rest).or_else(|| scan_targets(&lines, i, self.lookahead));
                if let Some(v) = value {
                    fields.set(Field::Targets, v.to_string());
                }
            }
        }

        match fields.first_missing() {
            None => Some(fields),
            Some(field) => {
                debug!(%field, "Labeled parse incomplete");
                None
            }
        }
    }
}

/// First line within `lookahead` lines after `label_idx` that looks like a price.
pub(crate) fn scan_targets<'a>(lines: &[&'a str], label_idx: usize, lookahead: usize) -> Option<&'a str> {
    lines
        .iter()
        .copied()
        .skip(label_idx + 1)
        .take(lookahead)
        .map(str::trim)
        .find(|l| !l.is_empty() && looks_like_price(l))
}

pub(crate) fn looks_like_price(line: &str) -> bool {
    line.contains('$') || DECIMAL_RE.is_match(line)
}

pub(crate) fn compile_labels(labels: &[String]) -> Result<Vec<Regex>> {
    labels
        .iter()
        .map(|label| {
            RegexBuilder::new(&regex::escape(label))
                .case_insensitive(true)
                .build()
                .with_context(|| format!("Invalid label: {label}"))
        })
        .collect()
}

/// Text after the first label occurring in the line, with leading `:`/space stripped.
fn after_label<'a>(labels: &[Regex], line: &'a str) -> Option<&'a str> {
    labels.iter().find_map(|re| re.find(line)).map(|m| {
        line[m.end()..].trim_start_matches(|c: char| c == ':' || c.is_whitespace())
    })
}

fn non_empty(s: &str) -> Option<&str> {
    let t = s.trim();
    (!t.is_empty()).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> LabeledParser {
        LabeledParser::new(&ParserConfig::default()).unwrap()
    }

    #[test]
    fn full_labeled_block() {
        let text = "Symbol: BTC\nSignalType: LONG\nEntries: 60000-61000\nStopLoss: 58000\nTargets: 63000 65000";
        let f = parser().parse(text).unwrap();
        assert_eq!(f.symbol.as_deref(), Some("BTC"));
        assert_eq!(f.direction.as_deref(), Some("LONG"));
        assert_eq!(f.entries.as_deref(), Some("60000-61000"));
        assert_eq!(f.targets.as_deref(), Some("63000 65000"));
        assert_eq!(f.stoploss.as_deref(), Some("58000"));
    }

    #[test]
    fn case_insensitive_labels() {
        let text = "SYMBOL: eth\nsignal type: short\nENTRIES: 3000\nstoploss: 3200\ntargets: 2800";
        let f = parser().parse(text).unwrap();
        assert_eq!(f.symbol.as_deref(), Some("ETH"));
        assert_eq!(f.direction.as_deref(), Some("SHORT"));
    }

    #[test]
    fn targets_lookahead_first_line_only() {
        let text = "Symbol: BTC\nSignalType: LONG\nEntries: 1\nStopLoss: 0.5\nTargets:\n$70000\n$72000";
        let f = parser().parse(text).unwrap();
        assert_eq!(f.targets.as_deref(), Some("$70000"));
    }

    #[test]
    fn targets_lookahead_skips_non_price_lines() {
        let lines = ["Targets:", "", "TP zone", "1.25 1.30", "$9"];
        assert_eq!(scan_targets(&lines, 0, 4), Some("1.25 1.30"));
    }

    #[test]
    fn targets_lookahead_window_bounded() {
        let lines = ["Targets:", "a", "b", "c", "d", "$1"];
        assert_eq!(scan_targets(&lines, 0, 4), None);
        assert_eq!(scan_targets(&lines, 0, 5), Some("$1"));
    }

    #[test]
    fn bare_colon_uses_lookahead() {
        let text = "Symbol: BTC\nSignalType: LONG\nEntries: 1\nStopLoss: 0.5\nTargets: :\n2.5";
        let f = parser().parse(text).unwrap();
        assert_eq!(f.targets.as_deref(), Some("2.5"));
    }

    #[test]
    fn buy_not_accepted_on_labeled_path() {
        let text = "Symbol: BTC\nSignalType: BUY\nEntries: 1\nStopLoss: 0.5\nTargets: 2";
        assert!(parser().parse(text).is_none());
    }

    #[test]
    fn ocr_symbol_correction() {
        let text = "Symbol: SOLUSOT\nSignalType: LONG\nEntries: 150\nStopLoss: 140\nTargets: 170";
        let f = parser().parse(text).unwrap();
        assert_eq!(f.symbol.as_deref(), Some("SOLUSDT"));
    }

    #[test]
    fn short_symbol_rejected() {
        let text = "Symbol: xx\nSignalType: LONG\nEntries: 1\nStopLoss: 0.5\nTargets: 2";
        assert!(parser().parse(text).is_none());
    }

    #[test]
    fn four_of_five_is_none() {
        let text = "Symbol: BTC\nSignalType: LONG\nEntries: 60000\nTargets: 63000";
        assert!(parser().parse(text).is_none());
    }

    #[test]
    fn entries_label_without_value_not_captured() {
        let text = "Symbol: BTC\nSignalType: LONG\nEntries:\n60000\nStopLoss: 1\nTargets: 2";
        assert!(parser().parse(text).is_none());
    }

    #[test]
    fn custom_labels() {
        let mut cfg = ParserConfig::default();
        cfg.labels.symbol = vec!["coin:".into()];
        cfg.labels.stoploss = vec!["sl:".into()];
        let p = LabeledParser::new(&cfg).unwrap();
        let text = "Coin: DOGE\nSignal Type: LONG\nEntries: 0.1\nSL: 0.09\nTargets: 0.2";
        let f = p.parse(text).unwrap();
        assert_eq!(f.symbol.as_deref(), Some("DOGE"));
        assert_eq!(f.stoploss.as_deref(), Some("0.09"));
    }
}
