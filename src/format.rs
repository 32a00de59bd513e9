use crate::record::{Direction, SignalRecord};

const CONFIRM_PROMPT: &str = "📋 Confirm posting this signal?";

/// Render the channel message for a validated record.
pub fn render(record: &SignalRecord) -> String {
    let symbol = record.symbol.to_uppercase();
    let symbol = if symbol.starts_with('$') {
        symbol
    } else {
        format!("${}", symbol)
    };

    let header = match record.direction {
        Direction::Long => "🟢LONG X5",
        Direction::Short => "🔴SHORT X5",
    };

    format!(
        "{symbol}\n{header}\n📊VOL 0.5%\n🎯Entry : {}\n⛔SL : {}\n🏆TP : {}",
        record.entries, record.stoploss, record.targets
    )
}

/// Rendered message followed by the confirmation prompt.
pub fn confirmation(record: &SignalRecord) -> String {
    format!("{}\n\n{}", render(record), CONFIRM_PROMPT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(direction: Direction) -> SignalRecord {
        SignalRecord {
            symbol: "btc".into(),
            direction,
            entries: "60000-61000".into(),
            targets: "63000 65000".into(),
            stoploss: "58000".into(),
        }
    }

    #[test]
    fn long_template() {
        let msg = render(&record(Direction::Long));
        assert_eq!(
            msg,
            "$BTC\n🟢LONG X5\n📊VOL 0.5%\n🎯Entry : 60000-61000\n⛔SL : 58000\n🏆TP : 63000 65000"
        );
    }

    #[test]
    fn short_template() {
        let msg = render(&record(Direction::Short));
        assert!(msg.starts_with("$BTC\n🔴SHORT X5\n"));
    }

    #[test]
    fn dollar_prefix_not_doubled() {
        let mut r = record(Direction::Long);
        r.symbol = "$ETH".into();
        assert!(render(&r).starts_with("$ETH\n"));
    }

    #[test]
    fn confirmation_appends_prompt() {
        let msg = confirmation(&record(Direction::Long));
        assert!(msg.ends_with(CONFIRM_PROMPT));
        assert!(msg.contains("\n\n📋"));
    }
}
