use crate::encoding::Encoding;

/// Classification of byte content validity under its encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodeRange {
  /// Content is entirely 7 bit, valid under every supported encoding
  Ascii,
  /// Content is valid under its encoding but not 7 bit only
  Valid,
  /// Content is not a valid byte sequence for its encoding
  Broken,
  /// Content has not been scanned yet
  Unknown,
}

impl CodeRange {
  /// Scan `bytes` and classify them under `encoding`.
  ///
  /// ## Example
  /// ```
  /// use cordage_core::{CodeRange, Encoding};
  ///
  /// assert_eq!(CodeRange::scan(b"plain", Encoding::Utf8), CodeRange::Ascii);
  /// assert_eq!(CodeRange::scan("héllo".as_bytes(), Encoding::Utf8), CodeRange::Valid);
  /// assert_eq!(CodeRange::scan(&[0xFF], Encoding::Utf8), CodeRange::Broken);
  /// ```
  pub fn scan(bytes: &[u8], encoding: Encoding) -> CodeRange {
    if bytes.iter().all(u8::is_ascii) {
      return CodeRange::Ascii;
    }

    match encoding {
      Encoding::Utf8 => {
        if std::str::from_utf8(bytes).is_ok() {
          CodeRange::Valid
        } else {
          CodeRange::Broken
        }
      },
      Encoding::UsAscii => CodeRange::Broken,
      Encoding::Latin1 | Encoding::Binary => CodeRange::Valid,
    }
  }
}
