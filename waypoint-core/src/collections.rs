//! Hash collection aliases used throughout the workspace.
//!
//! FxHash is a fast, non-cryptographic hasher. All keys here are
//! short entity/location id strings, so DoS-resistant hashing buys
//! nothing.

pub use rustc_hash::{FxHashMap, FxHashSet};
