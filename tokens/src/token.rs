//! Token values and their stored digests.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use skillswap_types::VerificationMethod;
use std::fmt;

type Blake2b256 = Blake2b<U32>;

/// A minted verification token. Exactly one kind, matching the trade's method.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "method", content = "value", rename_all = "lowercase")]
pub enum VerificationToken {
    Pin(String),
    Qr(String),
}

impl VerificationToken {
    pub fn method(&self) -> VerificationMethod {
        match self {
            Self::Pin(_) => VerificationMethod::Pin,
            Self::Qr(_) => VerificationMethod::Qr,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pin(v) | Self::Qr(v) => v,
        }
    }

    pub fn pin_code(&self) -> Option<&str> {
        match self {
            Self::Pin(v) => Some(v),
            Self::Qr(_) => None,
        }
    }

    pub fn qr_token(&self) -> Option<&str> {
        match self {
            Self::Qr(v) => Some(v),
            Self::Pin(_) => None,
        }
    }

    pub fn digest(&self) -> TokenDigest {
        TokenDigest::of(self.method(), self.as_str())
    }
}

/// Blake2b-256 over the method tag and the token text.
///
/// The registry stores only digests; a PIN never matches a QR token with the
/// same text because the tag differs.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenDigest([u8; 32]);

impl TokenDigest {
    pub fn of(method: VerificationMethod, presented: &str) -> Self {
        let tag: &[u8] = match method {
            VerificationMethod::Pin => b"pin:",
            VerificationMethod::Qr => b"qr:",
        };
        let mut hasher = Blake2b256::new();
        hasher.update(tag);
        hasher.update(presented.trim().as_bytes());
        let result = hasher.finalize();
        let mut output = [0u8; 32];
        output.copy_from_slice(&result);
        Self(output)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for TokenDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenDigest({})", hex::encode(&self.0[..4]))
    }
}
