//! Authentication primitives.
//!
//! - [`jwt`] -- JWT access-token generation, validation, and refresh-token helpers.
//! - [`otp`] -- Argon2id hashing and verification of one-time passcodes.

pub mod jwt;
pub mod otp;
