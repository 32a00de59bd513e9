pub mod config;
pub mod format;
pub mod parser;
pub mod record;

pub use config::ParserConfig;
pub use parser::{Extraction, SignalParser, Stage};
pub use record::{Direction, Field, FieldSet, SignalRecord};
