//! User model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// How a user is reached for their one-time passcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ContactType {
    #[default]
    Email,
    Phone,
}

impl ContactType {
    /// Best guess for a contact value with no declared type.
    pub fn infer(value: &str) -> Self {
        if value.contains('@') {
            Self::Email
        } else {
            Self::Phone
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
        }
    }
}

impl std::fmt::Display for ContactType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contact value awaiting passcode verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Contact {
    pub value: String,
    pub contact_type: ContactType,
}

impl Contact {
    /// Display form with most of the value hidden.
    ///
    /// Emails keep the first character of the local part and the domain;
    /// phones keep any non-digit prefix (e.g. `+`) and the last four characters.
    pub fn masked(&self) -> String {
        match self.contact_type {
            ContactType::Email => match self.value.split_once('@') {
                Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                    let mut chars = local.chars();
                    let first = chars.next().unwrap_or_default();
                    let hidden = "*".repeat(chars.count());
                    format!("{first}{hidden}@{domain}")
                }
                _ => self.value.clone(),
            },
            ContactType::Phone => {
                let prefix: String = self
                    .value
                    .chars()
                    .filter(|c| !c.is_ascii_digit())
                    .collect();
                let count = self.value.chars().count();
                let last_four: String = self.value.chars().skip(count.saturating_sub(4)).collect();
                format!("{prefix}****{last_four}")
            }
        }
    }
}

/// The logged-in user, stored under `currentUser`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    /// Random UUID assigned at verification
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Optional display name, kept as read from the persisted record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl User {
    /// A new user reachable through `contact`.
    pub fn for_contact(id: String, contact: &Contact) -> Self {
        let (email, phone) = match contact.contact_type {
            ContactType::Email => (Some(contact.value.clone()), None),
            ContactType::Phone => (None, Some(contact.value.clone())),
        };
        Self {
            id,
            email,
            phone,
            name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(value: &str, contact_type: ContactType) -> Contact {
        Contact {
            value: value.to_string(),
            contact_type,
        }
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(contact("jane@example.com", ContactType::Email).masked(), "j***@example.com");
        assert_eq!(contact("a@b.com", ContactType::Email).masked(), "a@b.com");
        assert_eq!(contact("no-at-sign", ContactType::Email).masked(), "no-at-sign");
    }

    #[test]
    fn test_mask_phone() {
        assert_eq!(contact("5551234567", ContactType::Phone).masked(), "****4567");
        assert_eq!(contact("+15551234567", ContactType::Phone).masked(), "+****4567");
    }

    #[test]
    fn test_user_for_contact() {
        let user = User::for_contact("id-1".to_string(), &contact("a@b.com", ContactType::Email));
        assert_eq!(user.email.as_deref(), Some("a@b.com"));
        assert!(user.phone.is_none());

        let user = User::for_contact("id-2".to_string(), &contact("5551234567", ContactType::Phone));
        assert_eq!(user.phone.as_deref(), Some("5551234567"));
        assert!(user.email.is_none());

        let json = serde_json::to_string(&user).unwrap();
        assert_eq!(json, r#"{"id":"id-2","phone":"5551234567"}"#);
    }

    #[test]
    fn test_contact_type_serde() {
        assert_eq!(serde_json::to_string(&ContactType::Phone).unwrap(), r#""phone""#);
        assert_eq!(ContactType::infer("a@b.com"), ContactType::Email);
        assert_eq!(ContactType::infer("5551234567"), ContactType::Phone);
    }
}
