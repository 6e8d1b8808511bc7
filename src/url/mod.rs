//! URL handling module for kumo
//!
//! Canonical URL normalization: the normalized string is the deduplication
//! key for the frontier and the uniqueness key in storage.

mod normalize;

pub use normalize::normalize_url;
