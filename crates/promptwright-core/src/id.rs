//! Identifier generation.
//!
//! Every record in the store is keyed by a version-4-UUID-shaped string.
//! Randomness comes from the operating system's cryptographic source when
//! it is available; otherwise a clock-seeded pseudo-random generator fills
//! the bytes. Generation never fails, it only degrades in entropy quality.

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use std::sync::Once;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);
static FALLBACK_WARNING: Once = Once::new();

/// Source of the 16 random bytes behind an identifier.
pub trait EntropySource: Send + Sync {
    /// Fills `bytes` with cryptographically strong randomness.
    ///
    /// Returns `false` when the source is unavailable.
    fn try_fill(&self, bytes: &mut [u8; 16]) -> bool;
}

/// The operating system's cryptographic random source.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn try_fill(&self, bytes: &mut [u8; 16]) -> bool {
        OsRng.try_fill_bytes(bytes).is_ok()
    }
}

/// Produces identifiers from an [`EntropySource`], falling back to a
/// pseudo-random fill when the source fails.
pub struct IdGenerator<E = OsEntropy> {
    entropy: E,
}

impl IdGenerator<OsEntropy> {
    pub fn new() -> Self {
        Self { entropy: OsEntropy }
    }
}

impl Default for IdGenerator<OsEntropy> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntropySource> IdGenerator<E> {
    /// Creates a generator over a custom entropy source.
    pub fn with_entropy(entropy: E) -> Self {
        Self { entropy }
    }

    /// Generates a new identifier.
    pub fn generate(&self) -> String {
        let mut bytes = [0u8; 16];
        if !self.entropy.try_fill(&mut bytes) {
            FALLBACK_WARNING.call_once(|| {
                tracing::warn!(
                    "Cryptographic random source unavailable; identifiers use a weaker pseudo-random fallback"
                );
            });
            fallback_fill(&mut bytes);
        }
        format_v4(bytes)
    }
}

/// Generates a new collision-resistant identifier.
///
/// # Examples
///
/// ```
/// let id = promptwright_core::id::create_id();
/// assert_eq!(id.len(), 36);
/// assert_eq!(&id[14..15], "4");
/// ```
pub fn create_id() -> String {
    IdGenerator::new().generate()
}

/// Fills `bytes` from a pseudo-random generator seeded by the wall clock,
/// a process-wide counter and the current thread.
///
/// Last resort only: the output is not suitable for anything that needs
/// unpredictability.
fn fallback_fill(bytes: &mut [u8; 16]) {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let counter = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut hasher = DefaultHasher::new();
    nanos.hash(&mut hasher);
    counter.hash(&mut hasher);
    std::thread::current().id().hash(&mut hasher);

    let mut rng = StdRng::seed_from_u64(hasher.finish());
    rng.fill_bytes(bytes);
}

/// Applies the RFC 4122 version and variant bits and formats the bytes as
/// hyphenated lowercase hex (8-4-4-4-12).
fn format_v4(mut bytes: [u8; 16]) -> String {
    // version 4: high nibble of byte 6 is 0100
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    // variant: high bits of byte 8 are 10
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    Uuid::from_bytes(bytes).hyphenated().to_string()
}
