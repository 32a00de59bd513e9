use std::fmt;

use serde::{Deserialize, Serialize};

/// Trade stance of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        }
    }

    /// Canonical tokens only. `BUY`/`SELL` are mapped by the cascade, not here.
    pub fn from_canonical(s: &str) -> Option<Direction> {
        match s {
            "LONG" => Some(Direction::Long),
            "SHORT" => Some(Direction::Short),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated trading signal. Only built through [`FieldSet::into_record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub symbol: String,
    pub direction: Direction,
    pub entries: String,
    pub targets: String,
    pub stoploss: String,
}

/// The five required fields, in extraction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Symbol,
    Direction,
    Entries,
    Targets,
    StopLoss,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Symbol,
        Field::Direction,
        Field::Entries,
        Field::Targets,
        Field::StopLoss,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Symbol => "symbol",
            Field::Direction => "direction",
            Field::Entries => "entries",
            Field::Targets => "targets",
            Field::StopLoss => "stoploss",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Loose accumulator of raw field strings, filled by either extraction stage
/// or deserialized from a record assembled elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSet {
    pub symbol: Option<String>,
    #[serde(alias = "signal_type")]
    pub direction: Option<String>,
    pub entries: Option<String>,
    pub targets: Option<String>,
    pub stoploss: Option<String>,
}

impl FieldSet {
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Symbol => self.symbol.as_deref(),
            Field::Direction => self.direction.as_deref(),
            Field::Entries => self.entries.as_deref(),
            Field::Targets => self.targets.as_deref(),
            Field::StopLoss => self.stoploss.as_deref(),
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Symbol => &mut self.symbol,
            Field::Direction => &mut self.direction,
            Field::Entries => &mut self.entries,
            Field::Targets => &mut self.targets,
            Field::StopLoss => &mut self.stoploss,
        };
        *slot = Some(value);
    }

    /// First required field that is absent, in extraction order.
    pub fn first_missing(&self) -> Option<Field> {
        Field::ALL.into_iter().find(|f| self.get(*f).is_none())
    }

    /// Validate and convert. Any missing, empty or non-canonical field yields `None`.
    pub fn into_record(self) -> Option<SignalRecord> {
        if !crate::parser::validate::validate_fields(&self) {
            return None;
        }
        Some(SignalRecord {
            symbol: self.symbol?,
            direction: Direction::from_canonical(self.direction.as_deref()?)?,
            entries: self.entries?,
            targets: self.targets?,
            stoploss: self.stoploss?,
        })
    }
}

impl From<&SignalRecord> for FieldSet {
    fn from(r: &SignalRecord) -> Self {
        FieldSet {
            symbol: Some(r.symbol.clone()),
            direction: Some(r.direction.as_str().to_string()),
            entries: Some(r.entries.clone()),
            targets: Some(r.targets.clone()),
            stoploss: Some(r.stoploss.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> FieldSet {
        FieldSet {
            symbol: Some("BTC".into()),
            direction: Some("SHORT".into()),
            entries: Some("60000".into()),
            targets: Some("58000".into()),
            stoploss: Some("61000".into()),
        }
    }

    #[test]
    fn into_record_complete() {
        let r = full().into_record().unwrap();
        assert_eq!(r.direction, Direction::Short);
        assert_eq!(r.symbol, "BTC");
    }

    #[test]
    fn into_record_rejects_partial() {
        for field in Field::ALL {
            let mut fs = full();
            match field {
                Field::Symbol => fs.symbol = None,
                Field::Direction => fs.direction = None,
                Field::Entries => fs.entries = None,
                Field::Targets => fs.targets = None,
                Field::StopLoss => fs.stoploss = None,
            }
            assert_eq!(fs.first_missing(), Some(field));
            assert!(fs.into_record().is_none(), "{} missing but record built", field);
        }
    }

    #[test]
    fn legacy_signal_type_key() {
        let json = r#"{"symbol":"ETH","signal_type":"LONG","entries":"1","targets":"2","stoploss":"0.5"}"#;
        let fs: FieldSet = serde_json::from_str(json).unwrap();
        assert_eq!(fs.direction.as_deref(), Some("LONG"));
    }

    #[test]
    fn direction_serializes_uppercase() {
        let r = full().into_record().unwrap();
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains(r#""direction":"SHORT""#));
    }
}
