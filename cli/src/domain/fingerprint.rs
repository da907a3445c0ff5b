//! Build fingerprint — SHA-256 over everything that feeds the image.

use sha2::{Digest, Sha256};

/// One hashed input: a stable label (relative path) and its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintInput {
    pub label: String,
    pub content: Vec<u8>,
}

impl FingerprintInput {
    #[must_use]
    pub fn new(label: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            label: label.into(),
            content: content.into(),
        }
    }
}

/// Hash `inputs` in label order, so discovery order never matters.
///
/// Labels and contents are length-prefixed: moving bytes from one file to a
/// neighbour changes the digest.
#[must_use]
pub fn fingerprint(inputs: &[FingerprintInput]) -> String {
    let mut sorted: Vec<&FingerprintInput> = inputs.iter().collect();
    sorted.sort_by(|a, b| a.label.cmp(&b.label));

    let mut hasher = Sha256::new();
    for input in sorted {
        hasher.update((input.label.len() as u64).to_le_bytes());
        hasher.update(input.label.as_bytes());
        hasher.update((input.content.len() as u64).to_le_bytes());
        hasher.update(&input.content);
    }
    hex_encode(&hasher.finalize())
}

/// Encode bytes as lowercase hexadecimal.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(char::from(HEX[(b >> 4) as usize]));
        out.push(char::from(HEX[(b & 0xf) as usize]));
    }
    out
}
