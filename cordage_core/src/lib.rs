//! Core value types for cordage: immutable encoding tagged byte sequences
//! ("ropes"), the encodings and code ranges that classify them, and the
//! seeded content hashing the intern cache is built on.
#![deny(clippy::all)]
mod code_range;
mod encoding;
mod error;
mod hashing;
mod rope;

pub use code_range::CodeRange;
pub use encoding::Encoding;
pub use error::RopeError;
pub use hashing::Hashing;
pub use rope::Rope;
