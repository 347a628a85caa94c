use crate::key::{BytesKey, BytesProbe, StringKey, StringProbe};
use cordage_core::{CodeRange, Encoding, Hashing, Rope};
use fnv::FnvBuildHasher;
use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tracing::trace;

/// The interning cache for rope values. Given byte content plus an
/// encoding tag, returns a single shared canonical rope for that exact
/// content, so repeated equal strings do not duplicate memory and can be
/// compared by identity.
///
/// Entries are held weakly: the cache never keeps a rope alive on its
/// own, and a slot whose rope has been dropped is an ordinary miss. One
/// read/write lock guards both maps and the retention set; counters are
/// diagnostics only.
///
/// The cache is meant to be constructed once by the runtime context that
/// needs interning and passed to every call site, not held as a global.
///
/// ## Example
/// ```
/// use cordage_cache::RopeCache;
/// use std::sync::Arc;
///
/// let cache = RopeCache::new();
///
/// let first = cache.intern_str("example");
/// let second = cache.intern_str("example");
///
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
pub struct RopeCache {
  hashing: Hashing,

  state: RwLock<CacheState>,

  /// Times a rope with matching content under a different encoding let a
  /// new rope share an existing byte buffer
  byte_arrays_reused: AtomicUsize,

  /// Times an already installed rope satisfied an intern_bytes call
  ropes_reused: AtomicUsize,

  /// Bytes not duplicated thanks to either form of reuse
  bytes_saved: AtomicUsize,
}

#[derive(Default)]
struct CacheState {
  text_to_key: HashMap<StringKey, BytesKey, FnvBuildHasher>,
  key_to_rope: HashMap<BytesKey, Weak<Rope>, FnvBuildHasher>,

  /// Every key ever installed by intern_bytes, retained so content probes
  /// keep a stable target even after their slots die. Grows without bound;
  /// a retention scheme tied to rope lifetime has not been designed yet.
  keys: HashSet<BytesKey, FnvBuildHasher>,
}

impl CacheState {
  /// The live rope for this probe. A dead slot is an ordinary miss, left
  /// in place to be pruned under the write lock.
  fn live(&self, probe: &BytesProbe<'_>) -> Option<Arc<Rope>> {
    self.key_to_rope.get(probe).and_then(Weak::upgrade)
  }

  /// The live rope for this probe, removing the entry when its slot is
  /// discovered dead. Requires the exclusive lock.
  fn live_or_prune(&mut self, probe: &BytesProbe<'_>) -> Option<Arc<Rope>> {
    let dead = match self.key_to_rope.get(probe) {
      Some(slot) => match slot.upgrade() {
        Some(rope) => return Some(rope),
        None => true,
      },
      None => false,
    };

    if dead {
      self.key_to_rope.remove(probe);
    }

    None
  }

  fn install(&mut self, key: BytesKey, rope: &Arc<Rope>) {
    self.key_to_rope.insert(key.clone(), Arc::downgrade(rope));
    self.keys.insert(key);
  }
}

impl RopeCache {
  /// Create an empty cache with a fresh per process hash seed.
  pub fn new() -> Self {
    Self::with_hashing(Hashing::new())
  }

  /// Create an empty cache around an explicit hashing instance.
  pub fn with_hashing(hashing: Hashing) -> Self {
    RopeCache {
      hashing,
      state: RwLock::new(CacheState::default()),
      byte_arrays_reused: AtomicUsize::new(0),
      ropes_reused: AtomicUsize::new(0),
      bytes_saved: AtomicUsize::new(0),
    }
  }

  /// Intern text as a rope in the default UTF-8 encoding.
  ///
  /// This path deliberately leaves the reuse counters untouched even when
  /// it converges on an existing rope; only [RopeCache::intern_bytes]
  /// accounts reuse.
  pub fn intern_str(&self, text: &str) -> Arc<Rope> {
    let hash = self.hashing.hash(text.as_bytes());
    let probe = StringProbe { text, hash };

    {
      let state = self.state.read();

      if let Some(key) = state.text_to_key.get(&probe) {
        if let Some(rope) = state.key_to_rope.get(key).and_then(Weak::upgrade) {
          return rope;
        }
      }
    }

    let mut state = self.state.write();

    let candidate = Rope::utf8(text);

    // UTF-8 ropes carry the text's own bytes, so the content hash of the
    // candidate is the hash already computed for the probe.
    let key = match state.text_to_key.get(&probe) {
      Some(key) => key.clone(),
      None => {
        let key = BytesKey::with_hash(
          Arc::clone(candidate.buffer()),
          Some(Encoding::Utf8),
          hash,
        );
        state
          .text_to_key
          .insert(StringKey::with_hash(text, hash), key.clone());
        key
      },
    };

    match state.key_to_rope.get(&key).and_then(Weak::upgrade) {
      Some(existing) => existing,
      None => {
        state.key_to_rope.insert(key, Arc::downgrade(&candidate));
        trace!(len = candidate.len(), "installed rope for text");
        candidate
      },
    }
  }

  /// Intern byte content under `encoding`, returning the canonical rope
  /// for that exact (content, encoding) pair.
  ///
  /// When no direct match exists but some rope with equal content is
  /// installed under another encoding, the new rope shares that rope's
  /// byte buffer instead of copying.
  pub fn intern_bytes(
    &self,
    bytes: &[u8],
    encoding: Encoding,
    code_range: CodeRange,
  ) -> Arc<Rope> {
    let hash = self.hashing.hash(bytes);
    let probe = BytesProbe {
      bytes,
      encoding: Some(encoding),
      hash,
    };

    if let Some(rope) = self.state.read().live(&probe) {
      self.ropes_reused.fetch_add(1, Ordering::Relaxed);
      self.bytes_saved.fetch_add(rope.len(), Ordering::Relaxed);
      return rope;
    }

    let mut state = self.state.write();

    // Another caller may have installed the entry between the two locks.
    if let Some(rope) = state.live_or_prune(&probe) {
      return rope;
    }

    // No direct match. A rope with the same bytes under some other
    // encoding still allows identity optimizations on the buffer itself,
    // so search once more by content alone before building from scratch.
    // The sentinel probe runs against the already locked state rather
    // than re-entering the public path.
    let sentinel = BytesProbe {
      encoding: None,
      ..probe
    };

    let rope = match state.live(&sentinel) {
      Some(donor) => {
        let rope = Rope::with_shared_buffer(&donor, encoding, code_range);

        self.byte_arrays_reused.fetch_add(1, Ordering::Relaxed);
        self.bytes_saved.fetch_add(rope.len(), Ordering::Relaxed);
        trace!(
          len = rope.len(),
          encoding = %encoding,
          "reused byte buffer across encodings"
        );

        rope
      },
      None => Rope::new(bytes, encoding, code_range),
    };

    let key = BytesKey::with_hash(Arc::clone(rope.buffer()), Some(encoding), hash);
    state.install(key, &rope);
    trace!(len = rope.len(), encoding = %encoding, "installed rope");

    rope
  }

  /// Intern an existing rope's content and encoding.
  pub fn intern_rope(&self, rope: &Rope) -> Arc<Rope> {
    self.intern_bytes(rope.bytes(), rope.encoding(), rope.code_range())
  }

  /// Intern an existing rope's content and encoding under an overriding
  /// code range.
  pub fn intern_rope_with_range(&self, rope: &Rope, code_range: CodeRange) -> Arc<Rope> {
    self.intern_bytes(rope.bytes(), rope.encoding(), code_range)
  }

  /// Whether a live rope is installed for this rope's content and
  /// encoding.
  pub fn contains(&self, rope: &Rope) -> bool {
    let probe = BytesProbe {
      bytes: rope.bytes(),
      encoding: Some(rope.encoding()),
      hash: self.hashing.hash(rope.bytes()),
    };

    self.state.read().live(&probe).is_some()
  }

  /// Times a byte buffer was shared across encodings. Diagnostics only.
  pub fn byte_arrays_reused(&self) -> usize {
    self.byte_arrays_reused.load(Ordering::Relaxed)
  }

  /// Times an installed rope satisfied an intern_bytes call. Diagnostics
  /// only.
  pub fn ropes_reused(&self) -> usize {
    self.ropes_reused.load(Ordering::Relaxed)
  }

  /// Bytes not duplicated thanks to reuse. Diagnostics only.
  pub fn bytes_saved(&self) -> usize {
    self.bytes_saved.load(Ordering::Relaxed)
  }

  /// Current number of installed entries, live or not.
  pub fn len(&self) -> usize {
    self.state.read().key_to_rope.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl Default for RopeCache {
  fn default() -> Self {
    RopeCache::new()
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn cache() -> RopeCache {
    RopeCache::with_hashing(Hashing::with_seed(7))
  }

  mod intern_str {
    use super::*;

    #[test]
    fn returns_the_same_instance() {
      let cache = cache();

      let first = cache.intern_str("hello");
      let second = cache.intern_str("hello");

      assert!(Arc::ptr_eq(&first, &second));
      assert_eq!(cache.byte_arrays_reused(), 0);
    }

    #[test]
    fn leaves_reuse_counters_untouched() {
      let cache = cache();

      let _held = cache.intern_str("hello");
      cache.intern_str("hello");
      cache.intern_str("hello");

      assert_eq!(cache.ropes_reused(), 0);
      assert_eq!(cache.bytes_saved(), 0);
    }

    #[test]
    fn converges_with_intern_bytes() {
      let cache = cache();

      let from_bytes = cache.intern_bytes(b"hello", Encoding::Utf8, CodeRange::Unknown);
      let from_text = cache.intern_str("hello");

      assert!(Arc::ptr_eq(&from_bytes, &from_text));
    }

    #[test]
    fn reinstalls_after_expiration() {
      let cache = cache();

      let first = cache.intern_str("transient");
      drop(first);

      let second = cache.intern_str("transient");
      let third = cache.intern_str("transient");

      assert!(Arc::ptr_eq(&second, &third));
      assert_eq!(second.bytes(), b"transient");
    }
  }

  mod intern_bytes {
    use super::*;

    #[test]
    fn dedups_independent_buffers() {
      let cache = cache();

      let first_source = b"content".to_vec();
      let second_source = b"content".to_vec();

      let first = cache.intern_bytes(&first_source, Encoding::Utf8, CodeRange::Unknown);
      let second = cache.intern_bytes(&second_source, Encoding::Utf8, CodeRange::Unknown);

      assert!(Arc::ptr_eq(&first, &second));
      assert_eq!(cache.ropes_reused(), 1);
      assert_eq!(cache.bytes_saved(), b"content".len());
      assert_eq!(cache.len(), 1);
    }

    #[test]
    fn shares_buffers_across_encodings() {
      let cache = cache();

      let ascii = cache.intern_bytes(&[104, 105], Encoding::UsAscii, CodeRange::Ascii);
      let utf8 = cache.intern_bytes(&[104, 105], Encoding::Utf8, CodeRange::Ascii);

      assert!(!Arc::ptr_eq(&ascii, &utf8));
      assert!(Arc::ptr_eq(ascii.buffer(), utf8.buffer()));
      assert_eq!(cache.byte_arrays_reused(), 1);
      assert_eq!(cache.bytes_saved(), 2);
      assert_eq!(cache.len(), 2);
    }

    #[test]
    fn constructs_on_a_genuine_miss() {
      let cache = cache();

      let rope = cache.intern_bytes(b"fresh", Encoding::Utf8, CodeRange::Unknown);

      assert_eq!(rope.bytes(), b"fresh");
      assert_eq!(rope.code_range(), CodeRange::Ascii);
      assert_eq!(cache.byte_arrays_reused(), 0);
      assert_eq!(cache.ropes_reused(), 0);
    }

    #[test]
    fn prunes_a_dead_slot_on_the_next_install() {
      let cache = cache();

      let first = cache.intern_bytes(b"transient", Encoding::Utf8, CodeRange::Unknown);
      drop(first);
      assert_eq!(cache.len(), 1);

      let second = cache.intern_bytes(b"transient", Encoding::Utf8, CodeRange::Unknown);

      assert_eq!(cache.len(), 1);
      assert_eq!(second.bytes(), b"transient");
    }

    #[test]
    fn expired_donor_does_not_count_as_reuse() {
      let cache = cache();

      let donor = cache.intern_bytes(b"gone", Encoding::UsAscii, CodeRange::Ascii);
      drop(donor);

      cache.intern_bytes(b"gone", Encoding::Utf8, CodeRange::Ascii);

      assert_eq!(cache.byte_arrays_reused(), 0);
    }
  }

  mod intern_rope {
    use super::*;

    #[test]
    fn converges_on_the_installed_instance() {
      let cache = cache();

      let installed = cache.intern_bytes(b"shared", Encoding::Utf8, CodeRange::Unknown);
      let external = Rope::new(b"shared", Encoding::Utf8, CodeRange::Unknown);

      let interned = cache.intern_rope(&external);

      assert!(Arc::ptr_eq(&installed, &interned));
    }

    #[test]
    fn overriding_code_range() {
      let cache = cache();

      let external = Rope::new(&[0xC3, 0xA9], Encoding::Utf8, CodeRange::Unknown);
      let interned = cache.intern_rope_with_range(&external, CodeRange::Valid);

      assert_eq!(interned.code_range(), CodeRange::Valid);
    }
  }

  mod contains {
    use super::*;

    #[test]
    fn live_entries_only() {
      let cache = cache();

      let held = cache.intern_bytes(b"held", Encoding::Utf8, CodeRange::Unknown);
      let probe = Rope::new(b"held", Encoding::Utf8, CodeRange::Unknown);

      assert!(cache.contains(&probe));

      drop(held);
      assert!(!cache.contains(&probe));
    }

    #[test]
    fn encoding_is_part_of_the_key() {
      let cache = cache();

      let _held = cache.intern_bytes(b"held", Encoding::Utf8, CodeRange::Unknown);
      let probe = Rope::new(b"held", Encoding::Binary, CodeRange::Unknown);

      assert!(!cache.contains(&probe));
    }

    #[test]
    fn empty_cache() {
      let cache = cache();
      let probe = Rope::new(b"anything", Encoding::Utf8, CodeRange::Unknown);

      assert!(!cache.contains(&probe));
      assert!(cache.is_empty());
    }
  }
}
