//! Password policy and secret hashing.
//!
//! - [`policy`] - Composable validators run on registration
//! - [`hash`] - Argon2id hashing and verification

pub mod hash;
pub mod policy;

pub use hash::{hash_secret, hash_secret_blocking, verify_secret, verify_secret_blocking};
pub use policy::{
    CommonPasswordValidator, MinimumLengthValidator, NumericPasswordValidator, PasswordPolicy,
    PasswordValidator, UserAttributeSimilarityValidator, UserAttributes,
};
