//! Inbound request shapes.
//!
//! One line of JSON from the device is either a free-text query or a
//! structured vitals reading. Shapes are tried in a fixed order and
//! anything else fails closed as an unknown format.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::classifier::Vitals;
use crate::error::RequestError;

/// A decoded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundRequest {
    /// `{"user_message": "..."}`
    Text { message: String },
    /// `{"systolic": N, "diastolic": N, "heart_rate": N?}`
    Vitals(Vitals),
}

#[derive(Debug, Deserialize)]
struct VitalsQuery {
    systolic: i64,
    diastolic: i64,
    #[serde(default)]
    heart_rate: Option<i64>,
}

impl InboundRequest {
    /// Decode a request line.
    pub fn parse(line: &str) -> Result<Self, RequestError> {
        let value: Value = serde_json::from_str(line).map_err(RequestError::InvalidJson)?;
        let Value::Object(object) = value else {
            return Err(RequestError::UnknownFormat);
        };

        if let Some(message) = object.get("user_message") {
            let message = message.as_str().ok_or_else(|| RequestError::InvalidField {
                field: "user_message",
                detail: format!("expected a string, got {message}"),
            })?;
            return Ok(Self::Text {
                message: message.to_string(),
            });
        }

        if object.contains_key("systolic") && object.contains_key("diastolic") {
            return parse_vitals(object);
        }

        Err(RequestError::UnknownFormat)
    }
}

fn parse_vitals(object: Map<String, Value>) -> Result<InboundRequest, RequestError> {
    for field in ["systolic", "diastolic", "heart_rate"] {
        if let Some(value) = object.get(field) {
            if !(value.is_i64() || (field == "heart_rate" && value.is_null())) {
                return Err(RequestError::InvalidField {
                    field,
                    detail: format!("expected an integer, got {value}"),
                });
            }
        }
    }

    let query: VitalsQuery = serde_json::from_value(Value::Object(object))
        .map_err(|e| RequestError::Internal(e.to_string()))?;

    Ok(InboundRequest::Vitals(Vitals {
        systolic: query.systolic,
        diastolic: query.diastolic,
        heart_rate: query.heart_rate.unwrap_or(Vitals::DEFAULT_HEART_RATE),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_query() {
        let req = InboundRequest::parse(r#"{"user_message": "hello"}"#).unwrap();
        assert_eq!(
            req,
            InboundRequest::Text {
                message: "hello".into()
            }
        );
    }

    #[test]
    fn text_query_wins_over_vitals_fields() {
        let req =
            InboundRequest::parse(r#"{"systolic": 1, "diastolic": 2, "user_message": "x"}"#)
                .unwrap();
        assert!(matches!(req, InboundRequest::Text { .. }));
    }

    #[test]
    fn vitals_query_defaults_heart_rate() {
        let req = InboundRequest::parse(r#"{"systolic":120,"diastolic":80}"#).unwrap();
        assert_eq!(
            req,
            InboundRequest::Vitals(Vitals {
                systolic: 120,
                diastolic: 80,
                heart_rate: 75,
            })
        );

        let req =
            InboundRequest::parse(r#"{"systolic":120,"diastolic":80,"heart_rate":null}"#).unwrap();
        assert!(matches!(
            req,
            InboundRequest::Vitals(Vitals { heart_rate: 75, .. })
        ));
    }

    #[test]
    fn vitals_query_with_heart_rate() {
        let req =
            InboundRequest::parse(r#"{"systolic":140,"diastolic":95,"heart_rate":102}"#).unwrap();
        assert!(matches!(
            req,
            InboundRequest::Vitals(Vitals {
                systolic: 140,
                diastolic: 95,
                heart_rate: 102,
            })
        ));
    }

    #[test]
    fn malformed_json() {
        let err = InboundRequest::parse(r#"{"user_message":}"#).unwrap_err();
        assert!(matches!(err, RequestError::InvalidJson(_)));
        assert!(err.to_string().starts_with("Error: Invalid JSON format - "));
    }

    #[test]
    fn unknown_shape() {
        for line in [r#"{"foo":"bar"}"#, "[1, 2]", r#""text""#, "42"] {
            let err = InboundRequest::parse(line).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Error: Unknown message format. Expected 'user_message' or BP data."
            );
        }
    }

    #[test]
    fn partial_vitals_is_unknown_format() {
        for line in [r#"{"systolic":120}"#, r#"{"diastolic":80,"heart_rate":70}"#] {
            let err = InboundRequest::parse(line).unwrap_err();
            assert!(matches!(err, RequestError::UnknownFormat));
            assert_eq!(
                err.to_string(),
                "Error: Unknown message format. Expected 'user_message' or BP data."
            );
        }
    }

    #[test]
    fn wrong_field_types() {
        let err = InboundRequest::parse(r#"{"user_message": 5}"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: Invalid value for field 'user_message': expected a string, got 5"
        );

        let err = InboundRequest::parse(r#"{"systolic":"high","diastolic":80}"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: Invalid value for field 'systolic': expected an integer, got \"high\""
        );
    }
}
