use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;

/// One request/response pair mirrored to audit storage.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub timestamp: OffsetDateTime,
    pub user_id: String,
    pub model: String,
    pub request_json: String,
    pub response_json: String,
}

impl AuditRecord {
    /// Captures both payloads as pretty-printed JSON. A payload that fails to
    /// serialize is stored as an empty string.
    pub fn capture<Req, Resp>(
        user_id: impl Into<String>,
        model: impl Into<String>,
        request: &Req,
        response: &Resp,
    ) -> Self
    where
        Req: Serialize + ?Sized,
        Resp: Serialize + ?Sized,
    {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            user_id: user_id.into(),
            model: model.into(),
            request_json: pretty_json(request),
            response_json: pretty_json(response),
        }
    }
}

fn pretty_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// Best-effort destination for audit records.
///
/// Implementations must not block and must not fail the caller.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord);
}

#[derive(Debug, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _record: AuditRecord) {}
}

pub type SharedAuditSink = Arc<dyn AuditSink>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;
    use serde_json::json;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("cannot serialize"))
        }
    }

    #[test]
    fn captures_pretty_json() {
        let record = AuditRecord::capture(
            "alice",
            "gpt-4.1",
            &json!({"model": "gpt-4.1"}),
            &json!({"text": "hi"}),
        );
        assert_eq!(record.user_id, "alice");
        assert_eq!(record.request_json, "{\n  \"model\": \"gpt-4.1\"\n}");
        assert!(record.response_json.contains("\"text\": \"hi\""));
    }

    #[test]
    fn unserializable_field_becomes_empty() {
        let record = AuditRecord::capture("u", "m", &Unserializable, &json!({"ok": true}));
        assert_eq!(record.request_json, "");
        assert!(!record.response_json.is_empty());
    }
}
