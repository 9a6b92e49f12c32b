use serde::{Deserialize, Serialize};

/// Authenticated identity as returned by `GET /profile`
///
/// Also the shape of the cached snapshot kept in the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Server-assigned, stable identifier
    pub id: i64,
    pub email: String,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Pro entitlement; the only field mutated locally
    #[serde(default)]
    pub is_pro: bool,
}

impl User {
    /// Serialize for the credential store
    pub fn to_snapshot(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a cached snapshot. Callers treat `None` as "no cached identity".
    pub fn from_snapshot(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    /// Name to show in the shell, preferring the username
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.full_name)
    }
}

/// Body of `POST /login`
#[derive(Debug, Clone, Serialize)]
pub struct Credentials<'a> {
    pub identifier: &'a str,
    pub secret: &'a str,
}

/// Body of `POST /register`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration<'a> {
    pub email: &'a str,
    pub secret: &'a str,
    pub full_name: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_profile_wire_format() {
        let raw = r#"{"id":7,"email":"a@x.com","fullName":"A","isPro":true}"#;
        let user: User = serde_json::from_str(raw).unwrap();

        assert_eq!(
            user,
            User {
                id: 7,
                email: "a@x.com".to_string(),
                full_name: "A".to_string(),
                username: None,
                is_pro: true,
            }
        );
    }

    #[test]
    fn test_snapshot_keeps_username_and_pro_flag() {
        let user = User {
            id: 1,
            email: "a@x.com".to_string(),
            full_name: "A".to_string(),
            username: Some("ace".to_string()),
            is_pro: true,
        };

        let snapshot = user.to_snapshot().unwrap();
        assert!(snapshot.contains("\"username\":\"ace\""));
        assert_eq!(User::from_snapshot(&snapshot), Some(user));
    }

    #[test]
    fn test_malformed_snapshot_is_absent() {
        assert_eq!(User::from_snapshot("{not json"), None);
        assert_eq!(User::from_snapshot(r#"{"id":"one"}"#), None);
        assert_eq!(User::from_snapshot(""), None);
    }

    #[test]
    fn test_display_name() {
        let mut user = User {
            id: 1,
            email: "a@x.com".to_string(),
            full_name: "Alice Example".to_string(),
            username: None,
            is_pro: false,
        };
        assert_eq!(user.display_name(), "Alice Example");

        user.username = Some("alice".to_string());
        assert_eq!(user.display_name(), "alice");
    }

    #[test]
    fn test_registration_uses_camel_case() {
        let body = serde_json::to_value(Registration {
            email: "a@x.com",
            secret: "pw",
            full_name: "A",
        })
        .unwrap();

        assert_eq!(body["fullName"], "A");
        assert_eq!(body["secret"], "pw");
    }
}
