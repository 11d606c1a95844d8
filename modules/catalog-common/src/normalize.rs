//! String normalization for raw discovery fields.

use regex::Regex;
use std::sync::LazyLock;

const CATEGORY_DELIMITER: &str = "_outer_";

/// Length of the id suffix the storefront appends to the minor category
/// segment of `source_module`.
const MINOR_SUFFIX_LEN: usize = 7;

static MAJOR_CATEGORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"clp_([a-zA-Z0-9_]+?)_([0-9]+)").unwrap());

/// Strip the currency prefix and thousands separators: `"Rp1.000.000"` → `"1000000"`.
pub fn normalize_price(price: Option<&str>) -> Option<String> {
    price.map(|p| p.replace("Rp", "").replace('.', "").trim().to_string())
}

/// Turn a `source_module` string into `"major|minor"`.
///
/// `clp_electronics_12345_outer_smartphones_123456` → `electronics|smartphones`.
/// Either side may come out empty, but the separator is always present.
pub fn normalize_category(text: &str) -> String {
    let mut parts = text.split(CATEGORY_DELIMITER);
    let first = parts.next().unwrap_or_default();
    let second = parts.next().unwrap_or_default();

    let major = MAJOR_CATEGORY_RE
        .captures(first)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or_default();

    let char_count = second.chars().count();
    let minor: String = if char_count >= MINOR_SUFFIX_LEN {
        second.chars().take(char_count - MINOR_SUFFIX_LEN).collect()
    } else {
        second.to_string()
    };

    format!("{major}|{minor}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_with_both_parts() {
        assert_eq!(
            normalize_category("clp_electronics_12345_outer_smartphones_123456"),
            "electronics|smartphones"
        );
    }

    #[test]
    fn category_major_keeps_inner_underscores() {
        assert_eq!(
            normalize_category("clp_rumah_tangga_1234_outer_dekorasi_1234567"),
            "rumah_tangga|dekorasi_"
        );
    }

    #[test]
    fn category_without_delimiter_is_well_formed() {
        assert_eq!(normalize_category("clp_buku_3"), "buku|");
        assert_eq!(normalize_category("homepage_banner"), "|");
    }

    #[test]
    fn category_empty_input() {
        assert_eq!(normalize_category(""), "|");
    }

    #[test]
    fn category_short_minor_is_kept_whole() {
        assert_eq!(normalize_category("x_outer_abc"), "|abc");
    }

    #[test]
    fn category_minor_exactly_suffix_len_becomes_empty() {
        assert_eq!(normalize_category("clp_dapur_9_outer_1234567"), "dapur|");
    }

    #[test]
    fn category_extra_delimiters_are_ignored() {
        assert_eq!(
            normalize_category("clp_game_1_outer_konsol_123456_outer_ignored"),
            "game|konsol"
        );
    }

    #[test]
    fn price_strips_currency_and_separators() {
        assert_eq!(normalize_price(Some("Rp1.000.000")).as_deref(), Some("1000000"));
        assert_eq!(normalize_price(Some(" Rp 25.500 ")).as_deref(), Some("25500"));
    }

    #[test]
    fn price_absent_stays_absent() {
        assert_eq!(normalize_price(None), None);
    }

    #[test]
    fn price_is_idempotent() {
        let once = normalize_price(Some("Rp12.345")).unwrap();
        let twice = normalize_price(Some(&once)).unwrap();
        assert_eq!(once, twice);
    }
}
