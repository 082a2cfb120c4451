//! SQL query implementations.
//!
//! - [`principals`]: principal lookup, registration and removal
//! - [`patients`]: owner-scoped patient rows
//! - [`doctors`]: the shared doctor directory
//! - [`mappings`]: patient/doctor assignments

pub mod doctors;
pub mod mappings;
pub mod patients;
pub mod principals;

use carelink_storage::StorageError;

/// Column list and ordering shared by every listing query.
pub(crate) const NEWEST_FIRST: &str = "ORDER BY created_at DESC, id DESC";

/// Converts a non-negative `INTEGER` column into an age.
pub(crate) fn age_from_db(age: i32) -> Result<u32, StorageError> {
    u32::try_from(age).map_err(|_| StorageError::invalid_record(format!("negative age {age}")))
}

/// Converts an age into an `INTEGER` bind value.
pub(crate) fn age_to_db(age: u32) -> Result<i32, StorageError> {
    i32::try_from(age).map_err(|_| StorageError::invalid_record(format!("age {age} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_conversion() {
        assert_eq!(age_from_db(45).unwrap(), 45);
        assert!(age_from_db(-1).is_err());
        assert_eq!(age_to_db(2_147_483_647).unwrap(), i32::MAX);
        assert!(age_to_db(u32::MAX).is_err());
    }
}
