//! Session tokens, sent as the OAuth `state` parameter.

/// Length of every session token.
pub const LENGTH: usize = 16;

/// Characters a session token is made of.
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a lowercase alphanumeric token from `rng`.
///
/// This only has to be unguessable enough to tie a redirect to the
/// session which started it, so [`fastrand`] is plenty.
pub fn generate(rng: &mut fastrand::Rng) -> String {
    (0..LENGTH)
        .map(|_| char::from(ALPHABET[rng.usize(..ALPHABET.len())]))
        .collect()
}
