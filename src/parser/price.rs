use std::sync::LazyLock;

use regex::Regex;

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Clean a captured price substring for display.
///
/// Whitespace runs collapse to one space and spaces around dashes are dropped,
/// so `"10 - 20"` becomes `"10-20"`. Values are never reordered or deduplicated.
/// Returns an empty string when the input holds no digit at all.
pub fn normalize_price(raw: &str) -> String {
    let collapsed = WS_RE.replace_all(raw.trim(), " ");
    let cleaned = collapsed.replace(" -", "-").replace("- ", "-");

    if cleaned.chars().any(|c| c.is_ascii_digit()) {
        cleaned
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_spacing() {
        assert_eq!(normalize_price("10 - 20"), "10-20");
        assert_eq!(normalize_price("10- 20"), "10-20");
        assert_eq!(normalize_price("10 -20"), "10-20");
        assert_eq!(normalize_price("10  -   20"), "10-20");
    }

    #[test]
    fn whitespace_collapse() {
        assert_eq!(normalize_price("  63000 \n\t 65000 "), "63000 65000");
    }

    #[test]
    fn list_preserved() {
        assert_eq!(normalize_price("1.2, 1.3, 1.4"), "1.2, 1.3, 1.4");
        assert_eq!(normalize_price("$70000-$72000"), "$70000-$72000");
    }

    #[test]
    fn no_digit_is_empty() {
        assert_eq!(normalize_price(""), "");
        assert_eq!(normalize_price(" , . - "), "");
        assert_eq!(normalize_price("$"), "");
    }

    #[test]
    fn idempotent() {
        for raw in ["10 - 20", "0.5 ,0.6", "  3000-3100 ", "$1.25 - $1.30 $1.40"] {
            let once = normalize_price(raw);
            assert_eq!(normalize_price(&once), once);
        }
    }
}
