pub mod cascade;
pub mod labeled;
pub mod price;
pub mod validate;

use std::panic::{self, AssertUnwindSafe};

use anyhow::Result;
use tracing::{debug, error, info};

use crate::config::ParserConfig;
use crate::record::SignalRecord;
use cascade::CascadeExtractor;
use labeled::LabeledParser;

/// Which strategy produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Labeled,
    Cascade,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub record: SignalRecord,
    pub stage: Stage,
}

/// Two-stage pipeline: labeled lines → regex cascade → validation.
///
/// Built once from an immutable [`ParserConfig`]; extraction holds no state
/// between calls, so a single parser can be shared across threads.
pub struct SignalParser {
    config: ParserConfig,
    labeled: LabeledParser,
    cascade: CascadeExtractor,
}

impl SignalParser {
    /// Compiles every label and pattern up front; a bad regex fails here.
    pub fn new(config: ParserConfig) -> Result<Self> {
        let labeled = LabeledParser::new(&config)?;
        let cascade = CascadeExtractor::new(&config)?;
        Ok(Self {
            config,
            labeled,
            cascade,
        })
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Extract a validated record from OCR text. `None` is the only failure signal.
    pub fn parse_signal(&self, text: &str) -> Option<SignalRecord> {
        self.extract(text).map(|e| e.record)
    }

    /// Same as [`parse_signal`](Self::parse_signal), also reporting the stage that succeeded.
    pub fn extract(&self, text: &str) -> Option<Extraction> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.run(text))) {
            Ok(result) => result,
            Err(_) => {
                error!("Internal fault while parsing signal; treating as no record");
                None
            }
        }
    }

    fn run(&self, text: &str) -> Option<Extraction> {
        debug!(text, "OCR input");

        // A complete labeled result wins outright; partial ones are discarded, not merged.
        let (fields, stage) = match self.labeled.parse(text) {
            Some(fields) => (fields, Stage::Labeled),
            None => (self.cascade.extract(text)?, Stage::Cascade),
        };

        let record = fields.into_record()?;
        info!(?stage, symbol = %record.symbol, direction = %record.direction, "Parsed signal data");
        Some(Extraction { record, stage })
    }
}

impl Default for SignalParser {
    fn default() -> Self {
        // Built-in patterns are fixed literals covered by tests.
        Self::new(ParserConfig::default()).expect("default parser config compiles")
    }
}
