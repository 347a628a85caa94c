use crate::{code_range::CodeRange, encoding::Encoding, error::RopeError};
use std::fmt;
use std::sync::Arc;

/// An immutable byte sequence tagged with an encoding and a code range,
/// used as canonical string storage by the runtime. The byte buffer is
/// never mutated after construction and may be shared by several ropes
/// carrying different encoding tags.
///
/// ## Example
/// ```
/// use cordage_core::{CodeRange, Encoding, Rope};
///
/// let rope = Rope::new(b"example", Encoding::Utf8, CodeRange::Unknown);
///
/// assert_eq!(rope.bytes(), b"example");
/// assert_eq!(rope.code_range(), CodeRange::Ascii);
/// ```
pub struct Rope {
  buffer: Arc<[u8]>,
  encoding: Encoding,
  code_range: CodeRange,
}

impl Rope {
  /// Construct a rope from raw bytes, copying them into a fresh buffer.
  /// A declared code range is trusted; `Unknown` is resolved by scanning.
  pub fn new(bytes: &[u8], encoding: Encoding, code_range: CodeRange) -> Arc<Rope> {
    Arc::new(Rope {
      buffer: Arc::from(bytes),
      encoding,
      code_range: Rope::resolve_range(bytes, encoding, code_range),
    })
  }

  /// Construct a rope that shares `donor`'s exact byte buffer under a
  /// different encoding tag. Never copies.
  pub fn with_shared_buffer(
    donor: &Rope,
    encoding: Encoding,
    code_range: CodeRange,
  ) -> Arc<Rope> {
    Arc::new(Rope {
      code_range: Rope::resolve_range(&donor.buffer, encoding, code_range),
      buffer: Arc::clone(&donor.buffer),
      encoding,
    })
  }

  /// Construct a rope from text in the default UTF-8 encoding. Unlike
  /// [Rope::encode] this cannot fail: any `str` is already valid UTF-8.
  pub fn utf8(text: &str) -> Arc<Rope> {
    Rope::new(text.as_bytes(), Encoding::Utf8, CodeRange::Unknown)
  }

  /// Encode text into a rope carrying `encoding`. Fails when the target
  /// encoding cannot represent a character of the text.
  ///
  /// ## Example
  /// ```
  /// use cordage_core::{Encoding, Rope};
  ///
  /// let rope = Rope::encode("héllo", Encoding::Latin1).unwrap();
  /// assert_eq!(rope.len(), 5);
  ///
  /// assert!(Rope::encode("héllo", Encoding::UsAscii).is_err());
  /// ```
  pub fn encode(text: &str, encoding: Encoding) -> Result<Arc<Rope>, RopeError> {
    match encoding {
      Encoding::Utf8 => Ok(Rope::utf8(text)),
      Encoding::UsAscii => match text.bytes().position(|byte| !byte.is_ascii()) {
        Some(position) => Err(RopeError::Unrepresentable { encoding, position }),
        None => Ok(Rope::new(text.as_bytes(), encoding, CodeRange::Ascii)),
      },
      Encoding::Latin1 => {
        let mut bytes = Vec::with_capacity(text.len());

        for (position, ch) in text.char_indices() {
          let code_point = ch as u32;
          if code_point > 0xFF {
            return Err(RopeError::Unrepresentable { encoding, position });
          }
          bytes.push(code_point as u8);
        }

        let code_range = if bytes.iter().all(u8::is_ascii) {
          CodeRange::Ascii
        } else {
          CodeRange::Valid
        };

        Ok(Arc::new(Rope {
          buffer: Arc::from(bytes),
          encoding,
          code_range,
        }))
      },
      Encoding::Binary => Ok(Rope::new(text.as_bytes(), encoding, CodeRange::Unknown)),
    }
  }

  #[inline]
  pub fn bytes(&self) -> &[u8] {
    &self.buffer
  }

  /// The shared buffer itself, for identity checks and buffer reuse.
  #[inline]
  pub fn buffer(&self) -> &Arc<[u8]> {
    &self.buffer
  }

  #[inline]
  pub fn encoding(&self) -> Encoding {
    self.encoding
  }

  #[inline]
  pub fn code_range(&self) -> CodeRange {
    self.code_range
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.buffer.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  fn resolve_range(bytes: &[u8], encoding: Encoding, code_range: CodeRange) -> CodeRange {
    match code_range {
      CodeRange::Unknown => CodeRange::scan(bytes, encoding),
      declared => declared,
    }
  }
}

impl PartialEq for Rope {
  fn eq(&self, other: &Rope) -> bool {
    self.encoding == other.encoding && *self.buffer == *other.buffer
  }
}

impl Eq for Rope {}

impl fmt::Debug for Rope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Rope({:?}, {}, {:?})",
      String::from_utf8_lossy(&self.buffer),
      self.encoding,
      self.code_range
    )
  }
}

impl fmt::Display for Rope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&String::from_utf8_lossy(&self.buffer))
  }
}

#[cfg(test)]
mod test {
  use super::*;

  mod new {
    use super::*;

    #[test]
    fn scans_unknown_range() {
      let rope = Rope::new(&[0xC3, 0xA9], Encoding::Utf8, CodeRange::Unknown);

      assert_eq!(rope.code_range(), CodeRange::Valid);
      assert_eq!(rope.len(), 2);
    }

    #[test]
    fn trusts_declared_range() {
      let rope = Rope::new(b"plain", Encoding::Utf8, CodeRange::Valid);

      assert_eq!(rope.code_range(), CodeRange::Valid);
    }

    #[test]
    fn copies_content() {
      let source = b"example".to_vec();
      let rope = Rope::new(&source, Encoding::Utf8, CodeRange::Unknown);
      drop(source);

      assert_eq!(rope.bytes(), b"example");
    }
  }

  mod with_shared_buffer {
    use super::*;

    #[test]
    fn shares_the_exact_buffer() {
      let donor = Rope::new(b"shared", Encoding::UsAscii, CodeRange::Unknown);
      let rope = Rope::with_shared_buffer(&donor, Encoding::Utf8, CodeRange::Unknown);

      assert!(Arc::ptr_eq(donor.buffer(), rope.buffer()));
      assert_eq!(rope.encoding(), Encoding::Utf8);
    }
  }

  mod encode {
    use super::*;

    #[test]
    fn utf8_never_fails() {
      let rope = Rope::encode("héllo", Encoding::Utf8).unwrap();

      assert_eq!(rope.code_range(), CodeRange::Valid);
      assert_eq!(rope.len(), 6);
    }

    #[test]
    fn ascii_rejects_eight_bit_text() {
      let err = Rope::encode("héllo", Encoding::UsAscii).unwrap_err();

      assert_eq!(
        err,
        RopeError::Unrepresentable {
          encoding: Encoding::UsAscii,
          position: 1
        }
      );
    }

    #[test]
    fn latin1_transcodes_to_single_bytes() {
      let rope = Rope::encode("héllo", Encoding::Latin1).unwrap();

      assert_eq!(rope.bytes(), &[b'h', 0xE9, b'l', b'l', b'o']);
      assert_eq!(rope.code_range(), CodeRange::Valid);
    }

    #[test]
    fn latin1_rejects_wide_chars() {
      assert!(Rope::encode("日本", Encoding::Latin1).is_err());
    }

    #[test]
    fn binary_takes_raw_bytes() {
      let rope = Rope::encode("héllo", Encoding::Binary).unwrap();

      assert_eq!(rope.bytes(), "héllo".as_bytes());
      assert_eq!(rope.code_range(), CodeRange::Valid);
    }
  }

  #[test]
  fn equality_covers_content_and_encoding() {
    let utf8 = Rope::new(b"same", Encoding::Utf8, CodeRange::Unknown);
    let utf8_again = Rope::new(b"same", Encoding::Utf8, CodeRange::Unknown);
    let binary = Rope::new(b"same", Encoding::Binary, CodeRange::Unknown);

    assert_eq!(*utf8, *utf8_again);
    assert_ne!(*utf8, *binary);
  }
}
