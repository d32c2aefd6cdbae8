//! # Error Types
//!
//! Domain-specific error types for shop-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shop-core errors (this file)                                          │
//! │  ├── OrderError       - Checkout / order history failures              │
//! │  └── ValidationError  - Field-level input validation failures          │
//! │                                                                         │
//! │  shop-db errors (separate crate)                                       │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── PlaceOrderError  - Rejected(OrderError) | Db(DbError)             │
//! │                                                                         │
//! │  shop-api errors (in app)                                              │
//! │  └── ApiError         - What the HTTP client sees ({code, message})    │
//! │                                                                         │
//! │  Flow: ValidationError / OrderError / DbError → ApiError → HTTP status │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, client-supplied id)
//! 3. Never include database error text; that is logged, not returned
//! 4. Every [`OrderError`] belongs to exactly one [`ErrorKind`]

use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// Classification of checkout failures.
///
/// The HTTP layer maps kinds to status codes; the order service uses them to
/// decide whether an attempt may be retried.
///
/// ```text
/// ┌──────────────────┬──────────┬─────────────────────────────────────────┐
/// │ Kind             │ Status   │ Handling                                │
/// ├──────────────────┼──────────┼─────────────────────────────────────────┤
/// │ ClientInput      │ 422      │ never retried                           │
/// │ StateConflict    │ 400      │ client refreshes catalog and retries    │
/// │ TransientStore   │ 500      │ retried internally, then surfaced       │
/// │ Authentication   │ 401      │ client logs in or supplies an email     │
/// └──────────────────┴──────────┴─────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ClientInput,
    StateConflict,
    TransientStore,
    Authentication,
}

// =============================================================================
// Order Error
// =============================================================================

/// Errors produced while creating or listing orders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Neither a logged-in user nor a valid guest email was supplied.
    #[error("Login or a valid guest email is required")]
    IdentityRequired,

    /// Shipping address is shorter than the minimum after trimming.
    #[error("Shipping address must be at least {min} characters")]
    InvalidAddress { min: usize },

    /// The order has no line items.
    #[error("Order must contain at least one item")]
    EmptyOrder,

    /// A line item has a non-positive quantity, or its line total overflows.
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: i64, quantity: i64 },

    /// A referenced product does not exist.
    ///
    /// ## When This Occurs
    /// - The client sent an id that was never in the catalog
    /// - The product was removed between catalog fetch and checkout
    #[error("Product {product_id} not found")]
    ProductNotFound { product_id: i64 },

    /// Not enough stock to fulfil a line.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (qty: 100)
    ///      │
    ///      ▼
    /// Stock check: available=50
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Headphone Bluetooth", available: 50, requested: 100 }
    ///      │
    ///      ▼
    /// UI shows: "Insufficient stock for Headphone Bluetooth: available 50, requested 100"
    /// ```
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Order history was requested without a user or email.
    #[error("Login or email is required")]
    AuthenticationRequired,

    /// The store could not complete the order (lock contention that outlived
    /// every retry, or an unexpected database failure).
    #[error("Failed to create order")]
    OrderCreationFailed,
}

impl OrderError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::IdentityRequired
            | OrderError::InvalidAddress { .. }
            | OrderError::EmptyOrder
            | OrderError::InvalidQuantity { .. } => ErrorKind::ClientInput,
            OrderError::ProductNotFound { .. } | OrderError::InsufficientStock { .. } => {
                ErrorKind::StateConflict
            }
            OrderError::OrderCreationFailed => ErrorKind::TransientStore,
            OrderError::AuthenticationRequired => ErrorKind::Authentication,
        }
    }

    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            OrderError::IdentityRequired => "IDENTITY_REQUIRED",
            OrderError::InvalidAddress { .. } => "INVALID_ADDRESS",
            OrderError::EmptyOrder => "EMPTY_ORDER",
            OrderError::InvalidQuantity { .. } => "INVALID_QUANTITY",
            OrderError::ProductNotFound { .. } => "PRODUCT_NOT_FOUND",
            OrderError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            OrderError::AuthenticationRequired => "AUTHENTICATION_REQUIRED",
            OrderError::OrderCreationFailed => "ORDER_CREATION_FAILED",
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with OrderError.
pub type OrderResult<T> = Result<T, OrderError>;

// =============================================================================
// Unit Tests
// =============================================================================
