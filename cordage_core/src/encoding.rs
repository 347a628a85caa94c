use std::fmt;

/// The encodings the runtime tags string content with. `Utf8` is the
/// default source encoding; `Binary` treats content as raw bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
  #[default]
  Utf8,
  UsAscii,
  Latin1,
  Binary,
}

impl Encoding {
  /// The canonical name of this encoding.
  ///
  /// ## Example
  /// ```
  /// use cordage_core::Encoding;
  ///
  /// assert_eq!(Encoding::Utf8.name(), "UTF-8");
  /// assert_eq!(Encoding::Binary.name(), "ASCII-8BIT");
  /// ```
  pub const fn name(&self) -> &'static str {
    match self {
      Encoding::Utf8 => "UTF-8",
      Encoding::UsAscii => "US-ASCII",
      Encoding::Latin1 => "ISO-8859-1",
      Encoding::Binary => "ASCII-8BIT",
    }
  }
}

impl fmt::Display for Encoding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}
