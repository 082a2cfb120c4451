pub mod clock;
pub mod error;
pub mod validation;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::ErrorKind;
pub use validation::{FieldErrors, NON_FIELD_ERRORS, is_valid_email};

/// Identifier of an authenticated principal.
pub type PrincipalId = i64;

/// Identifier of a stored record (patient, doctor or mapping).
pub type RecordId = i64;
