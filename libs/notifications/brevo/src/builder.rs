//! Email request assembly

use crate::models::{EmailRequest, Params, Recipient, Recipients};

/// Assemble an email request from caller input.
///
/// `to` may be a single recipient or a list; it always comes out as a list.
/// No reply-to means no `replyTo` key at all, and `params` are passed through
/// untouched. Headers are the safety policy's business and start out unset.
pub fn build(
    template_id: i64,
    to: impl Into<Recipients>,
    reply_to: Option<Recipient>,
    params: Params,
) -> EmailRequest {
    EmailRequest {
        template_id,
        to: to.into().into_vec(),
        reply_to,
        params,
        headers: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: serde_json::Value) -> Params {
        match value {
            serde_json::Value::Object(map) => map,
            _ => Params::new(),
        }
    }

    #[test]
    fn test_build_without_reply_to() {
        let request = build(42, "user@example.com", None, Params::new());

        assert_eq!(request.template_id, 42);
        assert_eq!(request.to, vec![Recipient::new("user@example.com")]);
        assert!(request.reply_to.is_none());
        assert!(request.headers.is_none());

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("replyTo").is_none());
        assert!(value.get("headers").is_none());
    }

    #[test]
    fn test_build_with_reply_to() {
        let reply_to = Recipient::new("support@example.com").with_name("Support");
        let request = build(1, "user@example.com", Some(reply_to.clone()), Params::new());

        assert_eq!(request.reply_to, Some(reply_to));

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value["replyTo"],
            json!({"email": "support@example.com", "name": "Support"})
        );
    }

    #[test]
    fn test_build_keeps_recipient_order_and_params() {
        let to = vec![
            Recipient::new("b@example.com"),
            Recipient::new("a@example.com"),
        ];
        let params = params(json!({"name": "Ada", "items": [1, 2, 3]}));

        let request = build(3, to.clone(), None, params.clone());

        assert_eq!(request.to, to);
        assert_eq!(request.params, params);
    }
}
