//! Trade report forms shared by the wizard and the settlement backend.

use crate::amount::Credits;
use crate::error::TypesError;
use crate::ids::UserId;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// How demanding the exchanged skill was. Ordered `Simple < Standard < Advanced`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Standard,
    Advanced,
}

impl Complexity {
    pub const ALL: [Complexity; 3] = [Self::Simple, Self::Standard, Self::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Standard => "standard",
            Self::Advanced => "advanced",
        }
    }
}

impl FromStr for Complexity {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "standard" => Ok(Self::Standard),
            "advanced" => Ok(Self::Advanced),
            other => Err(TypesError::UnknownComplexity(other.to_string())),
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The initiator's side of the exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeRole {
    /// The initiator taught; the counterparty owes credits.
    Taught,
    /// The initiator learned; the initiator owes credits.
    Learned,
    /// Both sides taught each other; an even swap.
    Both,
}

impl FromStr for TradeRole {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "taught" => Ok(Self::Taught),
            "learned" => Ok(Self::Learned),
            "both" => Ok(Self::Both),
            other => Err(TypesError::UnknownRole(other.to_string())),
        }
    }
}

/// How the counterparty proves the trade happened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMethod {
    #[default]
    Qr,
    Pin,
}

impl FromStr for VerificationMethod {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qr" => Ok(Self::Qr),
            "pin" => Ok(Self::Pin),
            other => Err(TypesError::UnknownMethod(other.to_string())),
        }
    }
}

impl fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Qr => f.write_str("qr"),
            Self::Pin => f.write_str("pin"),
        }
    }
}

/// A file reference attached to a trade report (photos, certificates).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub uri: String,
}

/// Step 1 of the trade report: what happened, where, and for how long.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeDetailsForm {
    /// Required before submission.
    pub counterparty_id: Option<UserId>,
    pub skill: String,
    /// Set semantics; stored sorted so equality ignores insertion order.
    pub skill_tags: BTreeSet<String>,
    pub role: TradeRole,
    /// When the session started. `None` means "at submission time".
    pub started_at: Option<Timestamp>,
    pub duration_mins: u32,
    pub location: String,
    pub is_in_person: bool,
    pub complexity: Complexity,
    /// Derived from the calculator; user-overridable until the next recompute.
    pub credits_proposed: Credits,
    pub notes: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl Default for TradeDetailsForm {
    fn default() -> Self {
        Self {
            counterparty_id: None,
            skill: String::new(),
            skill_tags: BTreeSet::new(),
            role: TradeRole::Taught,
            started_at: None,
            duration_mins: 60,
            location: String::new(),
            is_in_person: true,
            complexity: Complexity::Standard,
            credits_proposed: Credits::ZERO,
            notes: None,
            attachments: Vec::new(),
        }
    }
}

impl TradeDetailsForm {
    /// Whether any photo/file evidence is attached.
    pub fn has_evidence(&self) -> bool {
        !self.attachments.is_empty()
    }
}

/// Step 2 of the trade report: how the counterparty will confirm.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeVerificationForm {
    pub method: VerificationMethod,
    pub escrow_enabled: bool,
    pub agree_to_terms: bool,
}

impl Default for TradeVerificationForm {
    fn default() -> Self {
        Self {
            method: VerificationMethod::Qr,
            escrow_enabled: true,
            agree_to_terms: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complexity_ordinal_order() {
        assert!(Complexity::Simple < Complexity::Standard);
        assert!(Complexity::Standard < Complexity::Advanced);
    }

    #[test]
    fn complexity_parses_case_insensitively() {
        assert_eq!("Advanced".parse::<Complexity>().unwrap(), Complexity::Advanced);
        assert!(matches!(
            "expert".parse::<Complexity>(),
            Err(TypesError::UnknownComplexity(_))
        ));
    }

    #[test]
    fn verification_defaults_to_qr_with_escrow() {
        let form = TradeVerificationForm::default();
        assert_eq!(form.method, VerificationMethod::Qr);
        assert!(form.escrow_enabled);
        assert!(!form.agree_to_terms);
    }

    #[test]
    fn skill_tags_ignore_insertion_order() {
        let mut a = TradeDetailsForm::default();
        let mut b = TradeDetailsForm::default();
        a.skill_tags.insert("rust".into());
        a.skill_tags.insert("async".into());
        b.skill_tags.insert("async".into());
        b.skill_tags.insert("rust".into());
        assert_eq!(a, b);
    }

    #[test]
    fn forms_serialize_with_lowercase_enums() {
        let json = serde_json::to_string(&TradeVerificationForm::default()).unwrap();
        assert!(json.contains("\"method\":\"qr\""));
    }
}
