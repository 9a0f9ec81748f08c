//! # Validation Module
//!
//! Input validation for admin forms and checkout.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (TypeScript)                                        │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Services (Rust)                                              │
//! │  └── THIS MODULE: business rule validation before any storage call     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database constraints (NOT NULL, UNIQUE slug, CHECK stock)    │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::Localized;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a category slug.
///
/// ## Rules
/// - Must not be empty
/// - At most 60 characters
/// - Lowercase ASCII letters, digits, and hyphens only (it is a URL segment)
///
/// ## Example
/// ```rust
/// use oprema_core::validation::validate_slug;
///
/// assert!(validate_slug("maske-za-telefon").is_ok());
/// assert!(validate_slug("Maske Za Telefon").is_err());
/// ```
pub fn validate_slug(slug: &str) -> ValidationResult<()> {
    let slug = slug.trim();

    if slug.is_empty() {
        return Err(ValidationError::Required {
            field: "slug".to_string(),
        });
    }

    if slug.len() > 60 {
        return Err(ValidationError::TooLong {
            field: "slug".to_string(),
            max: 60,
        });
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "slug".to_string(),
            reason: "must contain only lowercase letters, digits, and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// Deliberately shallow: one `@` with non-empty local part and a dotted
/// domain. Real deliverability is the mail server's problem.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");

    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.ends_with('.') {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "expected name@domain.tld".to_string(),
        });
    }

    Ok(())
}

/// Validates a phone number.
///
/// Accepts digits, spaces, `+`, `-`, `/` and parentheses; requires at
/// least 6 digits (covers both local and +381 international forms).
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '/' | '(' | ')'));

    if digits < 6 || !allowed {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "expected at least 6 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates that a bilingual field has both translations.
///
/// The storefront renders both languages from day one; a half-translated
/// title shows up as a blank string on one of them.
pub fn validate_localized(field: &str, text: &Localized) -> ValidationResult<()> {
    if text.sr.trim().is_empty() {
        return Err(ValidationError::MissingTranslation {
            field: field.to_string(),
            lang: "sr".to_string(),
        });
    }
    if text.en.trim().is_empty() {
        return Err(ValidationError::MissingTranslation {
            field: field.to_string(),
            lang: "en".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in para. Zero-priced products are not sellable.
pub fn validate_price(field: &str, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a stock count (non-negative).
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock".to_string(),
        });
    }
    Ok(())
}

/// Validates a cart/order line quantity.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 1 || quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a promotion discount percentage.
pub fn validate_discount_percent(percent: i64) -> ValidationResult<()> {
    if !(1..=99).contains(&percent) {
        return Err(ValidationError::OutOfRange {
            field: "discountPercent".to_string(),
            min: 1,
            max: 99,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("punjaci").is_ok());
        assert!(validate_slug("maske-za-telefon-15").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("Velika Slova").is_err());
        assert!(validate_slug("šđčć").is_err());
        assert!(validate_slug(&"a".repeat(61)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("kupac@example.com").is_ok());
        assert!(validate_email("kupac@example").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("kupac@example.").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+381 64 123-4567").is_ok());
        assert!(validate_phone("064/1234567").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("pozovi me").is_err());
    }

    #[test]
    fn test_validate_localized() {
        let complete = Localized::new("Punjači", "Chargers");
        assert!(validate_localized("name", &complete).is_ok());

        let half = Localized::new("Punjači", "");
        let err = validate_localized("name", &half).unwrap_err();
        assert_eq!(err.to_string(), "name is missing the en translation");
    }

    #[test]
    fn test_numeric_validators() {
        assert!(validate_price("price", 149_900).is_ok());
        assert!(validate_price("price", 0).is_err());
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-1).is_err());
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(100).is_err());
        assert!(validate_discount_percent(20).is_ok());
        assert!(validate_discount_percent(0).is_err());
        assert!(validate_discount_percent(100).is_err());
    }
}
