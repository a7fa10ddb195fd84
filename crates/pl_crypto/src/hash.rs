//! BLAKE3-based hash utilities
//!
//! Public key fingerprints for out-of-band comparison.

use pl_proto::PublicKeyBytes;

/// Human-readable fingerprint: BLAKE3 of the public key, truncated to
/// 20 bytes (160 bits), hex-encoded in groups of 4 for display.
///
/// Example: "a1b2 c3d4 e5f6 7890 abcd ef01 2345 6789 0abc def0"
pub fn fingerprint(public_key: &PublicKeyBytes) -> String {
    let hash = blake3::hash(&public_key.0);
    let hex = hex::encode(&hash.as_bytes()[..20]);
    hex.chars()
        .collect::<Vec<_>>()
        .chunks(4)
        .map(|c| c.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}
