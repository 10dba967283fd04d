//! Digest algorithms and validated checksum literals.

use serde::{Deserialize, Deserializer, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Hash algorithm declared by a release revision.
///
/// Early muxy revisions publish SHA-1 digests, later ones SHA-256. The
/// revision in force decides; there is no fallback between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-1, 40 hex characters.
    Sha1,
    /// SHA-256, 64 hex characters.
    Sha256,
}

impl DigestAlgorithm {
    /// Length of a hex-encoded digest for this algorithm.
    pub fn hex_len(self) -> usize {
        match self {
            Self::Sha1 => 40,
            Self::Sha256 => 64,
        }
    }

    /// Lowercase algorithm name (`sha1` / `sha256`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }

    /// Start a streaming hasher for this algorithm.
    pub fn hasher(self) -> DigestHasher {
        match self {
            Self::Sha1 => DigestHasher::Sha1(Sha1::new()),
            Self::Sha256 => DigestHasher::Sha256(Sha256::new()),
        }
    }

    /// Hash a byte slice in one shot, returning lowercase hex.
    pub fn compute(self, data: &[u8]) -> String {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finalize_hex()
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DigestAlgorithm {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(Self::Sha1),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            _ => Err(DigestError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Incremental hasher over either supported algorithm.
#[derive(Debug, Clone)]
pub enum DigestHasher {
    /// SHA-1 state.
    Sha1(Sha1),
    /// SHA-256 state.
    Sha256(Sha256),
}

impl DigestHasher {
    /// Feed more bytes.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
        }
    }

    /// Consume the hasher and return the lowercase hex digest.
    pub fn finalize_hex(self) -> String {
        match self {
            Self::Sha1(h) => hex::encode(h.finalize()),
            Self::Sha256(h) => hex::encode(h.finalize()),
        }
    }
}

/// Errors raised while parsing a digest literal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// The literal has the wrong number of characters for its algorithm.
    #[error("Invalid {algorithm} digest: expected {expected} hex characters, got {actual} in '{value}'")]
    InvalidLength {
        /// Declared algorithm.
        algorithm: DigestAlgorithm,
        /// Required length.
        expected: usize,
        /// Observed length.
        actual: usize,
        /// Offending literal.
        value: String,
    },

    /// The literal contains characters outside `[0-9a-fA-F]`.
    #[error("Invalid {algorithm} digest: contains non-hex characters in '{value}'")]
    NonHex {
        /// Declared algorithm.
        algorithm: DigestAlgorithm,
        /// Offending literal.
        value: String,
    },

    /// An `algo:` prefix names an algorithm we do not support.
    #[error("Unknown digest algorithm: {0}")]
    UnknownAlgorithm(String),

    /// A bare hex literal whose length matches neither algorithm.
    #[error("Cannot infer digest algorithm from {0} hex characters")]
    Ambiguous(usize),
}

/// A strictly validated digest: algorithm plus lowercase hex.
///
/// Construction never trims or repairs input. Historic formula revisions
/// carried checksum literals with stray leading or trailing characters; those
/// are rejected here rather than silently accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Checksum {
    algorithm: DigestAlgorithm,
    hex: String,
}

impl Checksum {
    /// Validate `hex` for `algorithm`.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::InvalidLength`] or [`DigestError::NonHex`].
    pub fn new(algorithm: DigestAlgorithm, hex: &str) -> Result<Self, DigestError> {
        let expected = algorithm.hex_len();
        if hex.len() != expected {
            return Err(DigestError::InvalidLength {
                algorithm,
                expected,
                actual: hex.len(),
                value: hex.to_string(),
            });
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DigestError::NonHex {
                algorithm,
                value: hex.to_string(),
            });
        }
        Ok(Self {
            algorithm,
            hex: hex.to_ascii_lowercase(),
        })
    }

    /// Validate a SHA-1 literal.
    ///
    /// # Errors
    ///
    /// See [`Checksum::new`].
    pub fn sha1(hex: &str) -> Result<Self, DigestError> {
        Self::new(DigestAlgorithm::Sha1, hex)
    }

    /// Validate a SHA-256 literal.
    ///
    /// # Errors
    ///
    /// See [`Checksum::new`].
    pub fn sha256(hex: &str) -> Result<Self, DigestError> {
        Self::new(DigestAlgorithm::Sha256, hex)
    }

    /// Declared algorithm.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Lowercase hex digest.
    pub fn as_str(&self) -> &str {
        &self.hex
    }

    /// Compare against a computed hex digest (case-insensitive).
    pub fn matches(&self, actual_hex: &str) -> bool {
        self.hex.eq_ignore_ascii_case(actual_hex)
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

/// Parses `sha1:<hex>`, `sha256:<hex>`, or bare hex (algorithm inferred
/// from length).
impl std::str::FromStr for Checksum {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((algo, hex)) = s.split_once(':') {
            return Self::new(algo.parse()?, hex);
        }
        match s.len() {
            40 => Self::sha1(s),
            64 => Self::sha256(s),
            n => Err(DigestError::Ambiguous(n)),
        }
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            algorithm: DigestAlgorithm,
            hex: String,
        }
        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.algorithm, &raw.hex).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(
            DigestAlgorithm::Sha1.compute(b"abc"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            DigestAlgorithm::Sha256.compute(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn streaming_equals_one_shot() {
        let mut hasher = DigestAlgorithm::Sha256.hasher();
        hasher.update(b"hello ");
        hasher.update(b"world");
        assert_eq!(
            hasher.finalize_hex(),
            DigestAlgorithm::Sha256.compute(b"hello world")
        );
    }

    #[test]
    fn rejects_wrong_length() {
        // Extra trailing character, as seen in some hand-edited formulas.
        let err = Checksum::sha1("e09e2ab6f7fc39237b5b41f53aa5b2a815428cfc'").unwrap_err();
        assert!(matches!(
            err,
            DigestError::InvalidLength {
                expected: 40,
                actual: 41,
                ..
            }
        ));
        assert!(Checksum::sha256("abcd").is_err());
    }

    #[test]
    fn rejects_non_hex() {
        let bad = "z".repeat(64);
        assert!(matches!(
            Checksum::sha256(&bad),
            Err(DigestError::NonHex { .. })
        ));
    }

    #[test]
    fn normalizes_case() {
        let upper = "6D4AA05DFD0D94C98E93B6306BF660228E7254108C9F970E84932BE8087D93B5";
        let c = Checksum::sha256(upper).unwrap();
        assert_eq!(c.as_str(), upper.to_lowercase());
        assert!(c.matches(upper));
    }

    #[test]
    fn parses_prefixed_and_bare() {
        let c: Checksum = "sha1:64535683e7f261091629c5a96236263dc0856c63"
            .parse()
            .unwrap();
        assert_eq!(c.algorithm(), DigestAlgorithm::Sha1);

        let c: Checksum = "51c6b34846cb1a2913e36af9b4eefe29d71b1d5efe053a720a500ec2f52a0378"
            .parse()
            .unwrap();
        assert_eq!(c.algorithm(), DigestAlgorithm::Sha256);

        assert_eq!("abc".parse::<Checksum>(), Err(DigestError::Ambiguous(3)));
        assert!(matches!(
            "md5:abc".parse::<Checksum>(),
            Err(DigestError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn display_includes_algorithm() {
        let c = Checksum::sha1("e09e2ab6f7fc39237b5b41f53aa5b2a815428cfc").unwrap();
        assert_eq!(
            c.to_string(),
            "sha1:e09e2ab6f7fc39237b5b41f53aa5b2a815428cfc"
        );
    }

    #[test]
    fn deserialize_validates() {
        let ok = r#"{"algorithm":"sha1","hex":"e09e2ab6f7fc39237b5b41f53aa5b2a815428cfc"}"#;
        assert!(serde_json::from_str::<Checksum>(ok).is_ok());
        let bad = r#"{"algorithm":"sha256","hex":"e09e2ab6f7fc39237b5b41f53aa5b2a815428cfc"}"#;
        assert!(serde_json::from_str::<Checksum>(bad).is_err());
    }
}
