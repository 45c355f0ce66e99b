//! Fundament Types - Core type definitions for the Fundament governance engine.
//!
//! This crate provides the fundamental types used throughout the engine:
//! - Member identities (20-byte, Bech32m encoded)
//! - Chain position and amount aliases

pub mod error;
pub mod member;

#[cfg(feature = "serde")]
mod serialization;

pub use error::TypesError;
pub use member::MemberId;

/// Monotonic chain position supplied by the caller on every operation.
/// Serves as both the voting-window clock and the timelock clock.
pub type Height = u64;

/// Native-value amount in base units.
pub type Amount = u128;
