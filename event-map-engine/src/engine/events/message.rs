use super::model::{EventInput, clamp_unit};
use constants::event_types::DEFAULT_EVENT_TYPE;
use serde_json::{Map, Value};
use thiserror::Error;

/// Reasons an inbound message is dropped.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("message is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message is not a JSON object")]
    NotAnObject,
    #[error("message has no camera_id")]
    MissingId,
    #[error("severity {0} is not a number")]
    InvalidSeverity(Value),
}

/// Parse a transport text frame into an event.
pub fn parse_event_message(text: &str) -> Result<EventInput, MessageError> {
    let value: Value = serde_json::from_str(text)?;
    event_from_value(value)
}

/// Coerce a decoded message: severity defaults to 1 and is clamped,
/// type defaults to `unknown`, payload defaults to an empty object.
pub fn event_from_value(value: Value) -> Result<EventInput, MessageError> {
    let Value::Object(mut fields) = value else {
        return Err(MessageError::NotAnObject);
    };

    let anchor_id = match fields.remove("camera_id") {
        Some(Value::String(id)) if !id.is_empty() => id,
        _ => return Err(MessageError::MissingId),
    };

    let severity = match fields.remove("severity") {
        None | Some(Value::Null) => 1.0,
        Some(raw) => coerce_number(&raw).ok_or(MessageError::InvalidSeverity(raw))? as f32,
    };

    let event_type = match fields.remove("type") {
        Some(Value::String(tag)) if !tag.is_empty() => tag,
        Some(Value::Number(n)) => n.to_string(),
        _ => DEFAULT_EVENT_TYPE.to_string(),
    };

    let payload = match fields.remove("payload") {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let source_ts = fields.get("ts").and_then(coerce_number);

    Ok(EventInput {
        anchor_id,
        severity: clamp_unit(severity),
        event_type,
        payload,
        source_ts,
    })
}

fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_message() {
        let event = parse_event_message(
            r#"{"camera_id":"CCTV_1","severity":0.4,"type":"smoke","payload":{"zone":"B"},"ts":1700000000}"#,
        )
        .unwrap();
        assert_eq!(event.anchor_id, "CCTV_1");
        assert_eq!(event.severity, 0.4);
        assert_eq!(event.event_type, "smoke");
        assert_eq!(event.payload.get("zone"), Some(&json!("B")));
        assert!(event.source_ts.is_some());
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let event = event_from_value(json!({"camera_id": "CCTV_2"})).unwrap();
        assert_eq!(event.severity, 1.0);
        assert_eq!(event.event_type, "unknown");
        assert!(event.payload.is_empty());
        assert_eq!(event.source_ts, None);
    }

    #[test]
    fn severity_is_coerced_and_clamped() {
        let event = event_from_value(json!({"camera_id": "a", "severity": "0.25"})).unwrap();
        assert_eq!(event.severity, 0.25);
        let event = event_from_value(json!({"camera_id": "a", "severity": 4})).unwrap();
        assert_eq!(event.severity, 1.0);
    }

    #[test]
    fn malformed_messages_are_rejected() {
        assert!(matches!(
            parse_event_message("not json"),
            Err(MessageError::Json(_))
        ));
        assert!(matches!(
            event_from_value(json!([1, 2])),
            Err(MessageError::NotAnObject)
        ));
        assert!(matches!(
            event_from_value(json!({"severity": 0.5})),
            Err(MessageError::MissingId)
        ));
        assert!(matches!(
            event_from_value(json!({"camera_id": ""})),
            Err(MessageError::MissingId)
        ));
        assert!(matches!(
            event_from_value(json!({"camera_id": "a", "severity": "high"})),
            Err(MessageError::InvalidSeverity(_))
        ));
    }
}
