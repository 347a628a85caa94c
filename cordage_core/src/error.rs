use crate::encoding::Encoding;
use thiserror::Error;

/// Errors raised while constructing rope values. The intern cache itself
/// defines no error kinds; anything here surfaces from the constructors
/// unchanged.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RopeError {
  #[error("character at byte {position} cannot be represented in {encoding}")]
  Unrepresentable {
    encoding: Encoding,
    position: usize,
  },
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn display() {
    let err = RopeError::Unrepresentable {
      encoding: Encoding::UsAscii,
      position: 3,
    };

    assert_eq!(
      err.to_string(),
      "character at byte 3 cannot be represented in US-ASCII"
    );
  }
}
