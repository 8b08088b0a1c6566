//! Random data generators for testing.
use rand::distr::Alphanumeric;
use rand::Rng;

/// Returns a random alphanumeric string of a certain size.
///
/// It is useful for generating random passkeys.
#[must_use]
pub fn string(size: usize) -> String {
    rand::rng().sample_iter(&Alphanumeric).take(size).map(char::from).collect()
}

/// Returns a random 32-char passkey.
#[must_use]
pub fn passkey() -> String {
    string(32)
}

/// Returns 20 random bytes, the size of an info-hash and of a peer id.
#[must_use]
pub fn twenty_bytes() -> [u8; 20] {
    let mut bytes = [0u8; 20];
    rand::rng().fill(&mut bytes);
    bytes
}
