use cordage_core::{Encoding, Hashing};
use hashbrown::Equivalent;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Two encoding tags match when they are equal or when either side is the
/// content only sentinel.
#[inline]
fn encodings_match(left: Option<Encoding>, right: Option<Encoding>) -> bool {
  match (left, right) {
    (Some(left), Some(right)) => left == right,
    _ => true,
  }
}

/// Cache key over byte content plus its encoding tag. The content hash is
/// seeded and computed once at construction; the hash deliberately covers
/// the bytes only, so a content only probe lands in the same bucket as
/// every key with equal bytes.
///
/// An encoding of `None` is the "no encoding" sentinel: it matches a key
/// with equal bytes under any encoding. Sentinel keys are only ever used
/// as probes during the buffer reuse search and are never stored.
#[derive(Clone, Debug)]
pub struct BytesKey {
  bytes: Arc<[u8]>,
  encoding: Option<Encoding>,
  hash: u64,
}

impl BytesKey {
  pub fn new(bytes: Arc<[u8]>, encoding: Option<Encoding>, hashing: &Hashing) -> Self {
    let hash = hashing.hash(&bytes);
    BytesKey {
      bytes,
      encoding,
      hash,
    }
  }

  /// Build a key around an already computed content hash.
  pub(crate) fn with_hash(bytes: Arc<[u8]>, encoding: Option<Encoding>, hash: u64) -> Self {
    BytesKey {
      bytes,
      encoding,
      hash,
    }
  }

  #[inline]
  pub fn bytes(&self) -> &[u8] {
    &self.bytes
  }

  #[inline]
  pub fn encoding(&self) -> Option<Encoding> {
    self.encoding
  }
}

impl PartialEq for BytesKey {
  fn eq(&self, other: &BytesKey) -> bool {
    encodings_match(self.encoding, other.encoding) && *self.bytes == *other.bytes
  }
}

impl Eq for BytesKey {}

impl Hash for BytesKey {
  #[inline]
  fn hash<H: Hasher>(&self, state: &mut H) {
    state.write_u64(self.hash);
  }
}

/// Borrowed probe form of [BytesKey], so lookups never copy content.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BytesProbe<'a> {
  pub bytes: &'a [u8],
  pub encoding: Option<Encoding>,
  pub hash: u64,
}

impl Hash for BytesProbe<'_> {
  #[inline]
  fn hash<H: Hasher>(&self, state: &mut H) {
    state.write_u64(self.hash);
  }
}

impl Equivalent<BytesKey> for BytesProbe<'_> {
  #[inline]
  fn equivalent(&self, key: &BytesKey) -> bool {
    encodings_match(self.encoding, key.encoding) && self.bytes == key.bytes()
  }
}

/// Cache key over raw text, with the same precomputed seeded hash scheme
/// as [BytesKey].
#[derive(Clone, Debug)]
pub struct StringKey {
  text: Box<str>,
  hash: u64,
}

impl StringKey {
  pub fn new(text: &str, hashing: &Hashing) -> Self {
    StringKey {
      hash: hashing.hash(text.as_bytes()),
      text: text.into(),
    }
  }

  pub(crate) fn with_hash(text: &str, hash: u64) -> Self {
    StringKey {
      text: text.into(),
      hash,
    }
  }

  #[inline]
  pub fn text(&self) -> &str {
    &self.text
  }
}

impl PartialEq for StringKey {
  fn eq(&self, other: &StringKey) -> bool {
    self.text == other.text
  }
}

impl Eq for StringKey {}

impl Hash for StringKey {
  #[inline]
  fn hash<H: Hasher>(&self, state: &mut H) {
    state.write_u64(self.hash);
  }
}

/// Borrowed probe form of [StringKey].
#[derive(Clone, Copy, Debug)]
pub(crate) struct StringProbe<'a> {
  pub text: &'a str,
  pub hash: u64,
}

impl Hash for StringProbe<'_> {
  #[inline]
  fn hash<H: Hasher>(&self, state: &mut H) {
    state.write_u64(self.hash);
  }
}

impl Equivalent<StringKey> for StringProbe<'_> {
  #[inline]
  fn equivalent(&self, key: &StringKey) -> bool {
    self.text == key.text()
  }
}
