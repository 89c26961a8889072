//! Content Hashing
//!
//! 128-bit content digests used as cache keys and as the basis for edit
//! compatibility checks. Hashes are accumulated with a streaming xxh3
//! state, so several sources (object content, geometry attributes, sample
//! times) can be appended into one key:
//!
//! ```text
//! ContentHasher::new()
//!     .append(object)         ─┐
//!     .append(attributes)      ├─► xxh3-128 ─► ContentHash
//!     .append_f32s(times)     ─┘
//! ```
//!
//! Equal hashes mean interchangeable compiled output. Collisions are treated
//! as cache hits.

use std::fmt;

use xxhash_rust::xxh3::Xxh3;

/// A 128-bit content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ContentHash(pub u128);

impl ContentHash {
    /// Hashes a single value.
    #[must_use]
    pub fn of<T: HashContent + ?Sized>(value: &T) -> Self {
        let mut hasher = ContentHasher::new();
        value.hash_content(&mut hasher);
        hasher.finish()
    }

    /// Low 64 bits, used for shard selection.
    #[inline]
    #[must_use]
    pub fn low(&self) -> u64 {
        self.0 as u64
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Streaming hasher producing a [`ContentHash`].
pub struct ContentHasher {
    state: Xxh3,
}

impl ContentHasher {
    #[must_use]
    pub fn new() -> Self {
        Self { state: Xxh3::new() }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.state.update(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.state.update(&[value]);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    pub fn write_i32(&mut self, value: i32) {
        self.state.update(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.state.update(&value.to_le_bytes());
    }

    pub fn write_u128(&mut self, value: u128) {
        self.state.update(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.state.update(&value.to_bits().to_le_bytes());
    }

    /// Length-prefixed so that adjacent strings cannot alias.
    pub fn write_str(&mut self, value: &str) {
        self.write_u64(value.len() as u64);
        self.state.update(value.as_bytes());
    }

    pub fn write_f32s(&mut self, values: &[f32]) {
        self.write_u64(values.len() as u64);
        for v in values {
            self.write_f32(*v);
        }
    }

    pub fn write_hash(&mut self, hash: ContentHash) {
        self.write_u128(hash.0);
    }

    /// Appends any hashable value.
    pub fn append<T: HashContent + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.hash_content(self);
        self
    }

    /// Appends a list of sample times.
    pub fn append_f32s(&mut self, values: &[f32]) -> &mut Self {
        self.write_f32s(values);
        self
    }

    #[must_use]
    pub fn finish(&self) -> ContentHash {
        ContentHash(self.state.digest128())
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Types whose content can be folded into a [`ContentHasher`].
pub trait HashContent {
    fn hash_content(&self, hasher: &mut ContentHasher);
}

impl HashContent for str {
    fn hash_content(&self, hasher: &mut ContentHasher) {
        hasher.write_str(self);
    }
}

impl HashContent for String {
    fn hash_content(&self, hasher: &mut ContentHasher) {
        hasher.write_str(self);
    }
}

impl<T: HashContent> HashContent for [T] {
    fn hash_content(&self, hasher: &mut ContentHasher) {
        hasher.write_u64(self.len() as u64);
        for item in self {
            item.hash_content(hasher);
        }
    }
}

impl<T: HashContent> HashContent for Vec<T> {
    fn hash_content(&self, hasher: &mut ContentHasher) {
        self.as_slice().hash_content(hasher);
    }
}

impl<T: HashContent + ?Sized> HashContent for std::sync::Arc<T> {
    fn hash_content(&self, hasher: &mut ContentHasher) {
        (**self).hash_content(hasher);
    }
}
