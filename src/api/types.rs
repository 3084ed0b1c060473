//! ZenTao API payload types.
//!
//! The client passes response bodies through untouched; the only payloads
//! it decodes itself are the login exchange and the error envelope used to
//! spot expired tokens.

use serde::{Deserialize, Serialize};

/// The `errcode` ZenTao returns when a derived token is no longer accepted.
pub const TOKEN_EXPIRED_CODE: i64 = 405;

/// Lowercase fragments of error messages that mean the token is stale or invalid.
const TOKEN_EXPIRED_PHRASES: &[&str] = &[
    "token has expired",
    "token expired",
    "token is expired",
    "invalid token",
    "token is invalid",
    "token invalid",
];

/// Body of `POST /tokens`.
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    /// The user account.
    pub account: &'a str,
    /// The user password.
    pub password: &'a str,
}

impl std::fmt::Debug for LoginRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("account", &self.account)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response of `POST /tokens`.
#[derive(Deserialize)]
pub struct LoginResponse {
    /// The session token.
    #[serde(default)]
    pub token: Option<String>,
}

/// A numeric error code that some endpoints send as a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum ErrorCode {
    Number(i64),
    Text(String),
    Other(serde_json::Value),
}

impl ErrorCode {
    fn as_i64(&self) -> Option<i64> {
        match self {
            ErrorCode::Number(n) => Some(*n),
            ErrorCode::Text(s) => s.trim().parse().ok(),
            ErrorCode::Other(_) => None,
        }
    }
}

/// A message field; validation errors carry an object keyed by field name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MessageField {
    /// Plain text.
    Text(String),
    /// Any other JSON value.
    Other(serde_json::Value),
}

impl MessageField {
    /// The text, if the field is a string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageField::Text(text) => Some(text),
            MessageField::Other(_) => None,
        }
    }
}

/// The optional error fields ZenTao puts in a JSON response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    errcode: Option<ErrorCode>,
    /// The `errmsg` field.
    #[serde(default)]
    pub errmsg: Option<MessageField>,
    /// The `error` field.
    #[serde(default)]
    pub error: Option<MessageField>,
    /// The `message` field.
    #[serde(default)]
    pub message: Option<MessageField>,
}

impl ErrorEnvelope {
    /// The numeric error code, if present.
    pub fn code(&self) -> Option<i64> {
        self.errcode.as_ref().and_then(ErrorCode::as_i64)
    }

    fn messages(&self) -> impl Iterator<Item = &str> {
        [&self.errmsg, &self.error, &self.message]
            .into_iter()
            .filter_map(|m| m.as_ref().and_then(MessageField::as_text))
    }
}

/// Result of inspecting a response body for an error envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inspection {
    /// The body is a JSON object; absent fields are `None`.
    Decoded(ErrorEnvelope),
    /// The body is not a JSON object.
    Unparseable,
}

impl Inspection {
    /// Decode `body` into an error envelope.
    pub fn inspect(body: &[u8]) -> Self {
        // Derived struct decoding would also accept a JSON array.
        match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(value @ serde_json::Value::Object(_)) => serde_json::from_value(value)
                .map(Inspection::Decoded)
                .unwrap_or(Inspection::Unparseable),
            _ => Inspection::Unparseable,
        }
    }

    /// Whether the body says the token has expired or is invalid.
    ///
    /// Unparseable bodies never count as expired.
    pub fn is_token_expired(&self) -> bool {
        let Inspection::Decoded(envelope) = self else {
            return false;
        };

        if envelope.code() == Some(TOKEN_EXPIRED_CODE) {
            return true;
        }

        envelope.messages().any(|msg| {
            let msg = msg.to_lowercase();
            TOKEN_EXPIRED_PHRASES.iter().any(|phrase| msg.contains(phrase))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_by_code() {
        let inspection = Inspection::inspect(br#"{"errcode":405,"errmsg":"whatever"}"#);
        assert!(inspection.is_token_expired());
    }

    #[test]
    fn test_expired_by_code_as_string() {
        let inspection = Inspection::inspect(br#"{"errcode":"405"}"#);
        assert!(inspection.is_token_expired());
    }

    #[test]
    fn test_expired_by_message_case_insensitive() {
        assert!(Inspection::inspect(br#"{"errmsg":"Token Has Expired"}"#).is_token_expired());
        assert!(Inspection::inspect(br#"{"error":"INVALID TOKEN"}"#).is_token_expired());
        assert!(Inspection::inspect(br#"{"message":"the token is invalid"}"#).is_token_expired());
    }

    #[test]
    fn test_other_errors_not_expired() {
        let inspection = Inspection::inspect(br#"{"errcode":404,"errmsg":"Not found"}"#);
        assert!(matches!(inspection, Inspection::Decoded(_)));
        assert!(!inspection.is_token_expired());
    }

    #[test]
    fn test_success_payload_not_expired() {
        let inspection = Inspection::inspect(br#"{"status":"success","data":{"id":1}}"#);
        assert_eq!(inspection, Inspection::Decoded(ErrorEnvelope::default()));
        assert!(!inspection.is_token_expired());
    }

    #[test]
    fn test_unparseable_body_not_expired() {
        let bodies: [&[u8]; 4] = [b"<html>token expired</html>", b"", b"[1,2,3]", b"\"token expired\""];
        for body in bodies {
            let inspection = Inspection::inspect(body);
            assert_eq!(inspection, Inspection::Unparseable);
            assert!(!inspection.is_token_expired());
        }
    }

    #[test]
    fn test_expired_by_code_with_object_message() {
        let inspection = Inspection::inspect(
            br#"{"errcode":405,"errmsg":"Token has expired","data":{},"message":{"id":["x"]}}"#,
        );
        assert!(matches!(inspection, Inspection::Decoded(_)));
        assert!(inspection.is_token_expired());
    }

    #[test]
    fn test_non_string_message_is_decoded_but_not_matched() {
        let inspection = Inspection::inspect(br#"{"error":{"detail":"token expired"}}"#);
        let Inspection::Decoded(envelope) = &inspection else {
            panic!("Expected decoded envelope");
        };
        assert_eq!(envelope.error.as_ref().and_then(MessageField::as_text), None);
        assert!(!inspection.is_token_expired());
    }

    #[test]
    fn test_non_scalar_errcode_is_ignored() {
        let inspection = Inspection::inspect(br#"{"errcode":[405],"errmsg":"token expired"}"#);
        let Inspection::Decoded(envelope) = &inspection else {
            panic!("Expected decoded envelope");
        };
        assert_eq!(envelope.code(), None);
        assert!(inspection.is_token_expired());
    }

    #[test]
    fn test_envelope_code() {
        let Inspection::Decoded(envelope) = Inspection::inspect(br#"{"errcode":"abc"}"#) else {
            panic!("Expected decoded envelope");
        };
        assert_eq!(envelope.code(), None);
    }

    #[test]
    fn test_login_request_serialization() {
        let body = serde_json::to_value(LoginRequest {
            account: "admin",
            password: "pw",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"account": "admin", "password": "pw"}));
    }

    #[test]
    fn test_login_request_debug_redacts_password() {
        let debug_output = format!(
            "{:?}",
            LoginRequest {
                account: "admin",
                password: "hunter2"
            }
        );
        assert!(!debug_output.contains("hunter2"));
    }

    #[test]
    fn test_login_response_without_token() {
        let response: LoginResponse = serde_json::from_str(r#"{"error":"bad"}"#).unwrap();
        assert!(response.token.is_none());
    }
}
