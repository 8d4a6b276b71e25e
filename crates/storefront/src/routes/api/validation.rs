//! Field validation helpers shared by the write endpoints.
//!
//! Messages match what the frontend displays verbatim.

use rust_decimal::Decimal;

use crate::error::FieldErrors;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";

/// Maximum digits before the decimal point of a `NUMERIC(10,2)` column.
const MAX_WHOLE_DIGITS: u32 = 8;
const MAX_DECIMAL_PLACES: u32 = 2;

pub fn max_length_message(max: usize) -> String {
    format!("Ensure this field has no more than {max} characters.")
}

/// Trim a text field and check it is present, non-blank and within `max` chars.
///
/// `None` (absent) is only an error when `required`.
pub fn text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max: Option<usize>,
    required: bool,
) -> Option<String> {
    let Some(value) = value else {
        if required {
            errors.add(field, REQUIRED);
        }
        return None;
    };
    let trimmed = value.trim().to_string();
    if trimmed.is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    if let Some(max) = max
        && trimmed.chars().count() > max
    {
        errors.add(field, max_length_message(max));
        return None;
    }
    Some(trimmed)
}

/// Like [`text`] but blank is allowed and yields an empty string.
pub fn optional_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max: usize,
) -> Option<String> {
    let trimmed = value?.trim().to_string();
    if trimmed.chars().count() > max {
        errors.add(field, max_length_message(max));
        return None;
    }
    Some(trimmed)
}

/// Check a money amount fits `NUMERIC(10,2)` and is not negative.
pub fn money(errors: &mut FieldErrors, field: &str, value: Decimal) -> Option<Decimal> {
    let value = value.normalize();
    if value.is_sign_negative() && !value.is_zero() {
        errors.add(field, "Ensure this value is greater than or equal to 0.");
        return None;
    }
    if value.scale() > MAX_DECIMAL_PLACES {
        errors.add(
            field,
            format!("Ensure that there are no more than {MAX_DECIMAL_PLACES} decimal places."),
        );
        return None;
    }
    let whole_digits = value.trunc().abs().to_string().trim_start_matches('0').len();
    if whole_digits > MAX_WHOLE_DIGITS as usize {
        errors.add(
            field,
            format!(
                "Ensure that there are no more than {MAX_WHOLE_DIGITS} digits before the decimal point."
            ),
        );
        return None;
    }
    Some(value.round_dp(MAX_DECIMAL_PLACES))
}

/// Parse a choice field via `FromStr`, recording its error message.
pub fn choice<T>(errors: &mut FieldErrors, field: &str, value: Option<String>, required: bool) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = value else {
        if required {
            errors.add(field, REQUIRED);
        }
        return None;
    };
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            errors.add(field, e.to_string());
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use dental_com_core::ProductCategory;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_text_rules() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            text(&mut errors, "name", Some("  Floss  ".into()), Some(200), true).as_deref(),
            Some("Floss")
        );
        assert!(text(&mut errors, "title", None, None, true).is_none());
        assert!(text(&mut errors, "comment", Some("   ".into()), None, true).is_none());
        assert!(text(&mut errors, "name", Some("x".repeat(201)), Some(200), true).is_none());
        assert!(text(&mut errors, "image", None, None, false).is_none());

        assert_eq!(errors.get("title"), Some(&[REQUIRED.to_string()][..]));
        assert_eq!(errors.get("comment"), Some(&[BLANK.to_string()][..]));
        assert!(errors.get("name").unwrap()[0].contains("200"));
        assert!(!errors.contains("image"));
    }

    #[test]
    fn test_money_rules() {
        let mut errors = FieldErrors::new();
        assert_eq!(money(&mut errors, "price", dec("19.90")), Some(dec("19.9")));
        assert_eq!(money(&mut errors, "price", dec("0")), Some(dec("0")));
        assert!(money(&mut errors, "price", dec("-1")).is_none());
        assert!(money(&mut errors, "sale_price", dec("1.005")).is_none());
        assert!(money(&mut errors, "sale_price", dec("123456789")).is_none());
        assert_eq!(errors.get("price").map(<[String]>::len), Some(1));
        assert_eq!(errors.get("sale_price").map(<[String]>::len), Some(2));
    }

    #[test]
    fn test_choice_rules() {
        let mut errors = FieldErrors::new();
        let parsed: Option<ProductCategory> =
            choice(&mut errors, "category", Some("cosmetic".into()), true);
        assert_eq!(parsed, Some(ProductCategory::Cosmetic));
        let bad: Option<ProductCategory> =
            choice(&mut errors, "category", Some("teeth".into()), true);
        assert!(bad.is_none());
        assert_eq!(
            errors.get("category"),
            Some(&["\"teeth\" is not a valid choice.".to_string()][..])
        );
    }
}
