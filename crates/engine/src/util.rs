//! Internal helpers for input validation and normalization.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every operation rejects bad input the same way, before any
//! row is written.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{EngineError, MoneyCents, ResultEngine};

pub(crate) const DEFAULT_CATEGORY_COLOR: &str = "#007bff";

/// Collapse inner whitespace and trim; rejects empty names.
pub(crate) fn normalize_display_name(value: &str, label: &str) -> ResultEngine<String> {
    let out = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if out.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(out)
}

/// Comparison key for names that must be unique per user.
///
/// Accents are stripped (NFKD + combining marks removed), letters are
/// lowercased and any run of non-alphanumeric characters becomes one space, so
/// `"Itaú"`, `"itau"` and `" ITAU "` collide.
pub(crate) fn normalize_name_key(value: &str, label: &str) -> ResultEngine<String> {
    let mut out = String::new();
    let mut prev_space = false;
    for ch in value.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    let normalized = out.trim();
    if normalized.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must contain letters or digits"
        )));
    }
    Ok(normalized.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Transaction descriptions are required and single-line.
pub(crate) fn normalize_description(value: &str) -> ResultEngine<String> {
    let out = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if out.is_empty() {
        return Err(EngineError::InvalidName(
            "description must not be empty".to_string(),
        ));
    }
    Ok(out)
}

pub(crate) fn ensure_positive_amount(amount_minor: i64) -> ResultEngine<()> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "amount_minor must be > 0".to_string(),
        ));
    }
    Ok(())
}

/// `a + b` in minor units; overflow is reported as an invalid amount.
pub(crate) fn add_minor(a: i64, b: i64) -> ResultEngine<i64> {
    MoneyCents::new(a)
        .checked_add(MoneyCents::new(b))
        .map(MoneyCents::cents)
        .ok_or_else(|| EngineError::InvalidAmount("amount out of range".to_string()))
}

pub(crate) fn validate_due_day(due_day: Option<u32>) -> ResultEngine<()> {
    if let Some(day) = due_day
        && !(1..=31).contains(&day)
    {
        return Err(EngineError::InvalidDate(format!(
            "due_day must be between 1 and 31, got {day}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_limit(limit_minor: Option<i64>) -> ResultEngine<()> {
    if let Some(limit) = limit_minor
        && limit < 0
    {
        return Err(EngineError::InvalidAmount(
            "limit must be >= 0".to_string(),
        ));
    }
    Ok(())
}

/// Accepts `#rgb` or `#rrggbb`; returns the lowercase form.
pub(crate) fn normalize_color(value: Option<&str>) -> ResultEngine<String> {
    let Some(raw) = normalize_optional_text(value) else {
        return Ok(DEFAULT_CATEGORY_COLOR.to_string());
    };
    let valid = raw
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid {
        return Err(EngineError::InvalidName(format!("invalid color: {raw}")));
    }
    Ok(raw.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_minor_rejects_overflow() {
        assert_eq!(add_minor(1_000, -250).unwrap(), 750);
        assert!(matches!(
            add_minor(i64::MAX, 1),
            Err(EngineError::InvalidAmount(_))
        ));
    }

    #[test]
    fn name_key_strips_accents_and_case() {
        assert_eq!(normalize_name_key("Itaú", "bank").unwrap(), "itau");
        assert_eq!(normalize_name_key("  ITAU ", "bank").unwrap(), "itau");
        assert_eq!(
            normalize_name_key("Caixa  Econômica-Federal", "bank").unwrap(),
            "caixa economica federal"
        );
        assert!(normalize_name_key(" -- ", "bank").is_err());
    }

    #[test]
    fn display_name_collapses_whitespace() {
        assert_eq!(
            normalize_display_name("  Nu   Bank ", "bank").unwrap(),
            "Nu Bank"
        );
        assert!(normalize_display_name("   ", "bank").is_err());
    }

    #[test]
    fn due_day_bounds() {
        assert!(validate_due_day(None).is_ok());
        assert!(validate_due_day(Some(1)).is_ok());
        assert!(validate_due_day(Some(31)).is_ok());
        assert!(validate_due_day(Some(0)).is_err());
        assert!(validate_due_day(Some(32)).is_err());
    }

    #[test]
    fn color_defaults_and_validates() {
        assert_eq!(normalize_color(None).unwrap(), DEFAULT_CATEGORY_COLOR);
        assert_eq!(normalize_color(Some("#FF00aa")).unwrap(), "#ff00aa");
        assert_eq!(normalize_color(Some("#abc")).unwrap(), "#abc");
        assert!(normalize_color(Some("red")).is_err());
        assert!(normalize_color(Some("#12345")).is_err());
    }
}
