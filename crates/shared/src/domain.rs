use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilySide {
    Bride,
    Groom,
}

impl FamilySide {
    pub const ALL: [FamilySide; 2] = [FamilySide::Bride, FamilySide::Groom];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bride => "bride",
            Self::Groom => "groom",
        }
    }

    /// Exact, case-sensitive match against the stored column value.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "bride" => Some(Self::Bride),
            "groom" => Some(Self::Groom),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Bride => "Bride",
            Self::Groom => "Groom",
        }
    }
}

impl fmt::Display for FamilySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One guest registration row.
///
/// `family_side` keeps the raw column value: rows written by other clients may
/// hold anything, and only the two recognized values are counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub phone: String,
    #[serde(default)]
    pub family_side: Option<String>,
}

impl RegistrationRecord {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        side: FamilySide,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            family_side: Some(side.as_str().to_string()),
        }
    }

    pub fn side(&self) -> Option<FamilySide> {
        self.family_side.as_deref().and_then(FamilySide::from_wire)
    }

    pub fn side_label(&self) -> &str {
        self.family_side.as_deref().unwrap_or_default()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Authenticated admin session issued by the hosted auth service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: SessionUser,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn display_email(&self) -> &str {
        self.user.email.as_deref().unwrap_or("admin")
    }
}

// Tokens stay out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_matching_is_case_sensitive() {
        assert_eq!(FamilySide::from_wire("bride"), Some(FamilySide::Bride));
        assert_eq!(FamilySide::from_wire("groom"), Some(FamilySide::Groom));
        assert_eq!(FamilySide::from_wire("Bride"), None);
        assert_eq!(FamilySide::from_wire(""), None);
    }

    #[test]
    fn null_text_columns_decode_as_empty() {
        let record: RegistrationRecord = serde_json::from_str(
            r#"{"id":4,"name":"Ada","email":null,"family_side":null,"created_at":"2026-01-01"}"#,
        )
        .expect("decode row");
        assert_eq!(record.name, "Ada");
        assert_eq!(record.email, "");
        assert_eq!(record.phone, "");
        assert_eq!(record.family_side, None);
        assert_eq!(record.side(), None);
    }

    #[test]
    fn new_record_serializes_lowercase_side() {
        let record = RegistrationRecord::new("Ada", "a@x.com", "123", FamilySide::Groom);
        let json = serde_json::to_value(&record).expect("encode");
        assert_eq!(json["family_side"], "groom");
        assert_eq!(record.side(), Some(FamilySide::Groom));
    }

    #[test]
    fn session_debug_hides_tokens() {
        let session = Session {
            access_token: "secret-access".into(),
            refresh_token: "secret-refresh".into(),
            expires_at: "2026-01-01T00:00:00Z".parse().expect("timestamp"),
            user: SessionUser {
                id: Uuid::nil(),
                email: Some("admin@example.com".into()),
            },
        };
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("admin@example.com"));
    }
}
