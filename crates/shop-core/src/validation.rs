//! # Validation Module
//!
//! Field-level input validation for Mini Shop.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractors (axum)                                       │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── Malformed JSON → 422                                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE + checkout::validate                             │
//! │  ├── Registration fields, catalog query parameters                     │
//! │  └── Identity, address, quantities                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0), CHECK (quantity > 0)                          │
//! │  ├── UNIQUE (users.email)                                              │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shop_core::validation::{validate_password, validate_page_size};
//!
//! validate_password("password123").unwrap();
//! assert_eq!(validate_page_size(None).unwrap(), 12);
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::ProductSort;
use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MIN_NAME_LEN, MIN_PASSWORD_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Registration
// =============================================================================

/// Validates a password at registration.
///
/// ## Rules
/// - At least [`MIN_PASSWORD_LEN`] characters
/// - Not trimmed: leading/trailing spaces are part of the password
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    Ok(())
}

/// Validates a display name and returns it trimmed.
///
/// ## Example
/// ```rust
/// use shop_core::validation::validate_display_name;
///
/// assert_eq!(validate_display_name("  Demo User ").unwrap(), "Demo User");
/// assert!(validate_display_name("A").is_err());
/// ```
pub fn validate_display_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() < MIN_NAME_LEN {
        return Err(ValidationError::TooShort {
            field: "name".to_string(),
            min: MIN_NAME_LEN,
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(name.to_string())
}

// =============================================================================
// Catalog Query Parameters
// =============================================================================

/// Validates a 1-based page number, defaulting to 1.
pub fn validate_page(page: Option<i64>) -> ValidationResult<i64> {
    let page = page.unwrap_or(1);

    if page < 1 {
        return Err(ValidationError::OutOfRange {
            field: "page".to_string(),
            min: 1,
            max: i64::MAX,
        });
    }

    Ok(page)
}

/// Validates a page size, defaulting to [`DEFAULT_PAGE_SIZE`].
///
/// ## Rules
/// - Between 1 and [`MAX_PAGE_SIZE`] inclusive
pub fn validate_page_size(page_size: Option<i64>) -> ValidationResult<i64> {
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);

    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(ValidationError::OutOfRange {
            field: "page_size".to_string(),
            min: 1,
            max: MAX_PAGE_SIZE,
        });
    }

    Ok(page_size)
}

/// Validates a price bound used to filter the catalog.
pub fn validate_price_filter(field: &str, price: Option<Money>) -> ValidationResult<Option<Money>> {
    match price {
        Some(p) if p.is_negative() => Err(ValidationError::Negative {
            field: field.to_string(),
        }),
        other => Ok(other),
    }
}

/// Parses the `sort` query parameter.
///
/// Absent or empty means newest first.
pub fn validate_sort(sort: Option<&str>) -> ValidationResult<ProductSort> {
    match sort.map(str::trim) {
        None | Some("") => Ok(ProductSort::Newest),
        Some("price_asc") => Ok(ProductSort::PriceAsc),
        Some("price_desc") => Ok(ProductSort::PriceDesc),
        Some(_) => Err(ValidationError::NotAllowed {
            field: "sort".to_string(),
            allowed: ProductSort::ALLOWED.iter().map(|s| s.to_string()).collect(),
        }),
    }
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query, or `None` when it is blank.
pub fn validate_search_query(query: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) else {
        return Ok(None);
    };

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "q".to_string(),
            max: 100,
        });
    }

    Ok(Some(query.to_string()))
}

// =============================================================================
// Unit Tests
// =============================================================================
