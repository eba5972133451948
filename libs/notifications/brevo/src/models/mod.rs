use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Template parameters, passed through to the template as-is
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Email address with an optional display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Recipient {
    /// Create a recipient without a display name
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Domain part of the address: everything after the last `@`, with all
    /// whitespace removed and lowercased. `None` when there is no `@` or
    /// nothing follows it.
    pub fn domain(&self) -> Option<String> {
        let compact: String = self
            .email
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        compact
            .rsplit_once('@')
            .map(|(_, domain)| domain.to_string())
            .filter(|domain| !domain.is_empty())
    }
}

impl From<&str> for Recipient {
    fn from(email: &str) -> Self {
        Self::new(email)
    }
}

impl From<String> for Recipient {
    fn from(email: String) -> Self {
        Self::new(email)
    }
}

/// Recipients as callers hand them over: a single address or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recipients {
    One(Recipient),
    Many(Vec<Recipient>),
}

impl Recipients {
    /// Normalize to a list
    pub fn into_vec(self) -> Vec<Recipient> {
        match self {
            Recipients::One(recipient) => vec![recipient],
            Recipients::Many(recipients) => recipients,
        }
    }
}

impl From<Recipient> for Recipients {
    fn from(recipient: Recipient) -> Self {
        Recipients::One(recipient)
    }
}

impl From<Vec<Recipient>> for Recipients {
    fn from(recipients: Vec<Recipient>) -> Self {
        Recipients::Many(recipients)
    }
}

impl From<&str> for Recipients {
    fn from(email: &str) -> Self {
        Recipients::One(Recipient::new(email))
    }
}

/// A templated transactional email, ready to be handed to the Brevo API.
///
/// `reply_to` and `headers` are left out of the serialized form when unset:
/// the API treats a missing key differently from `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    pub template_id: i64,
    pub to: Vec<Recipient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<Recipient>,
    #[serde(default)]
    pub params: Params,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_domain_is_normalized() {
        let domain = |email: &str| Recipient::new(email).domain();
        assert_eq!(domain("User@Example.COM").as_deref(), Some("example.com"));
        assert_eq!(domain(" user @ example.com ").as_deref(), Some("example.com"));
        assert_eq!(domain("a@b@Example.org").as_deref(), Some("example.org"));
        assert_eq!(domain("no-at-sign"), None);
        assert_eq!(domain("user@"), None);
        assert_eq!(domain("user@ "), None);
        assert_eq!(domain(""), None);
    }

    #[test]
    fn test_recipients_normalize_to_list() {
        let one: Recipients = Recipient::new("a@example.com").into();
        assert_eq!(one.into_vec(), vec![Recipient::new("a@example.com")]);

        let many: Recipients = vec![Recipient::new("a@x.io"), Recipient::new("b@y.io")].into();
        assert_eq!(many.into_vec().len(), 2);
    }

    #[test]
    fn test_recipients_deserialize_scalar_or_list() {
        let one: Recipients = serde_json::from_value(json!({"email": "a@x.io"})).unwrap();
        assert!(matches!(one, Recipients::One(_)));

        let many: Recipients =
            serde_json::from_value(json!([{"email": "a@x.io", "name": "A"}])).unwrap();
        assert!(matches!(many, Recipients::Many(ref r) if r[0].name.as_deref() == Some("A")));
    }

    #[test]
    fn test_email_request_omits_unset_keys() {
        let request = EmailRequest {
            template_id: 7,
            to: vec![Recipient::new("user@example.com")],
            reply_to: None,
            params: Params::new(),
            headers: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"templateId": 7, "to": [{"email": "user@example.com"}], "params": {}})
        );
    }
}
