//! File Identity Codec
//!
//! Maps an original filename to the opaque identity used to key chunk
//! directories, artifacts and metadata sidecars, and back again.
//!
//! The encoding is unpadded URL-safe base64 over the UTF-8 bytes of the
//! name. Decoding is strict (no padding, no foreign characters, no stray
//! trailing bits), which makes the mapping a bijection: every filename has
//! exactly one identity. The alphabet never contains `/`, `\` or `.`, so an
//! identity is always a single path component and never collides with the
//! `.json`/`.part` names stored next to artifacts.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use super::types::{UploadError, MAX_IDENTITY_LEN};

/// Encode an original filename into its identity
pub fn encode(original_name: &str) -> String {
    URL_SAFE_NO_PAD.encode(original_name.as_bytes())
}

/// Decode an identity back into the original filename
pub fn decode(identity: &str) -> Result<String, UploadError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(identity)
        .map_err(|e| UploadError::InvalidIdentity(format!("{}: {}", identity, e)))?;

    String::from_utf8(bytes)
        .map_err(|_| UploadError::InvalidIdentity(format!("{}: not valid UTF-8", identity)))
}

/// A validated identity together with the filename it encodes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    encoded: String,
    display_name: String,
}

impl Identity {
    /// Validate an identity received from a client
    pub fn parse(encoded: &str) -> Result<Self, UploadError> {
        if encoded.is_empty() {
            return Err(UploadError::InvalidIdentity("empty identity".to_string()));
        }
        if encoded.len() > MAX_IDENTITY_LEN {
            return Err(UploadError::InvalidIdentity(format!(
                "identity is {} bytes (max: {})",
                encoded.len(),
                MAX_IDENTITY_LEN
            )));
        }

        let display_name = decode(encoded)?;

        Ok(Self {
            encoded: encoded.to_string(),
            display_name,
        })
    }

    /// Build the identity for an original filename
    pub fn from_display_name(name: &str) -> Result<Self, UploadError> {
        Self::parse(&encode(name))
    }

    /// The encoded form used in URLs and storage paths
    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    /// The original, human-readable filename
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let names = [
            "greeting.txt",
            "bảng giá 2024.xlsx",
            "résumé (final) [v2].pdf",
            "a/b\\c?.bin",
            "🎞️ holiday.mov",
            "no-extension",
            ".hidden",
        ];

        for name in names {
            let identity = encode(name);
            assert_eq!(decode(&identity).unwrap(), name);
        }
    }

    #[test]
    fn test_encoding_is_path_safe() {
        let identity = encode("../../etc/passwd??>>~~");
        assert!(!identity.contains('/'));
        assert!(!identity.contains('\\'));
        assert!(!identity.contains('.'));
        assert!(!identity.contains('='));
    }

    #[test]
    fn test_known_encoding() {
        assert_eq!(encode("greeting.txt"), "Z3JlZXRpbmcudHh0");
        assert_eq!(decode("Z3JlZXRpbmcudHh0").unwrap(), "greeting.txt");
    }

    #[test]
    fn test_rejects_malformed_input() {
        // Padding, standard-alphabet characters and garbage
        assert!(matches!(decode("QQ=="), Err(UploadError::InvalidIdentity(_))));
        assert!(matches!(decode("a+b/"), Err(UploadError::InvalidIdentity(_))));
        assert!(matches!(decode("!!!!"), Err(UploadError::InvalidIdentity(_))));
        // Impossible length
        assert!(matches!(decode("QUJDR"), Err(UploadError::InvalidIdentity(_))));
    }

    #[test]
    fn test_rejects_non_canonical_trailing_bits() {
        // "QQ" is the only encoding of "A"
        assert_eq!(decode("QQ").unwrap(), "A");
        assert!(matches!(decode("QR"), Err(UploadError::InvalidIdentity(_))));
    }

    #[test]
    fn test_rejects_non_utf8() {
        let identity = URL_SAFE_NO_PAD.encode([0xff, 0xfe, 0xfd]);
        assert!(matches!(decode(&identity), Err(UploadError::InvalidIdentity(_))));
    }

    #[test]
    fn test_identity_parse() {
        let identity = Identity::parse("Z3JlZXRpbmcudHh0").unwrap();
        assert_eq!(identity.as_str(), "Z3JlZXRpbmcudHh0");
        assert_eq!(identity.display_name(), "greeting.txt");
        assert_eq!(identity.to_string(), "Z3JlZXRpbmcudHh0");

        assert_eq!(
            Identity::from_display_name("greeting.txt").unwrap(),
            identity
        );
    }

    #[test]
    fn test_identity_limits() {
        assert!(Identity::parse("").is_err());
        assert!(Identity::from_display_name("").is_err());

        let long_name = "x".repeat(300);
        assert!(matches!(
            Identity::from_display_name(&long_name),
            Err(UploadError::InvalidIdentity(_))
        ));
    }

    #[test]
    fn test_identity_leaves_room_for_sidecar_names() {
        assert_eq!(MAX_IDENTITY_LEN, 245);

        // 183 bytes encode to 244 characters
        let fits = "x".repeat(183);
        assert_eq!(encode(&fits).len(), 244);
        assert!(Identity::from_display_name(&fits).is_ok());

        // 184 bytes encode to 246 characters
        let too_long = "x".repeat(184);
        assert_eq!(encode(&too_long).len(), 246);
        assert!(matches!(
            Identity::parse(&encode(&too_long)),
            Err(UploadError::InvalidIdentity(_))
        ));

        // No unpadded encoding is 245 characters long
        assert!(Identity::parse(&"A".repeat(245)).is_err());
    }
}
