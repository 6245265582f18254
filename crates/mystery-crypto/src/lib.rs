//! Mystery Crypto Library
//!
//! Credential primitives for the identity store:
//! - Argon2id password hashing and verification
//! - Short-lived numeric verification codes issued at sign-up

pub mod code;
pub mod password;
