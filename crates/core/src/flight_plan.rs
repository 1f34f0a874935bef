//! Flight-plan submission payload and its presence checks.
//!
//! A [`FlightPlanSubmission`] is what an operator posts; [`FlightPlanSubmission::validate`]
//! turns it into a [`FlightPlan`] whose required fields are known to be present.
//! The command body is never interpreted here.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const MSG_SATELLITE_REQUIRED: &str = "Satellite name is required";
pub const MSG_DATETIME_REQUIRED: &str = "Transmission datetime is required";
pub const MSG_DATETIME_INVALID: &str =
    "Transmission datetime must be an RFC 3339 timestamp with a timezone offset";
pub const MSG_GROUND_STATION_REQUIRED: &str = "Ground station id is required";

/// Raw flight-plan document as received from an operator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlightPlanSubmission {
    /// Structured command body, passed through uninterpreted.
    #[serde(default)]
    pub flight_plan: serde_json::Value,
    /// Target transmission time.
    #[serde(default)]
    pub datetime: Option<String>,
    /// Ground station the plan is destined for.
    #[serde(default)]
    pub gs_id: Option<String>,
    #[serde(default)]
    pub sat_name: Option<String>,
}

/// A flight plan whose required fields have been checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightPlan {
    pub flight_plan: serde_json::Value,
    /// Transmission time exactly as submitted; forwarded verbatim in frames.
    pub datetime: String,
    pub gs_id: String,
    pub sat_name: String,
    #[serde(skip)]
    pub scheduled_at: DateTime<FixedOffset>,
}

impl FlightPlanSubmission {
    /// Check required fields in order: satellite name, datetime, ground station.
    ///
    /// Blank strings count as missing. The first failing check wins.
    pub fn validate(self) -> Result<FlightPlan, CoreError> {
        let sat_name = require(self.sat_name, MSG_SATELLITE_REQUIRED)?
            .trim()
            .to_string();
        // Kept as submitted; only the parse ignores surrounding whitespace.
        let datetime = require(self.datetime, MSG_DATETIME_REQUIRED)?;
        let scheduled_at = parse_transmission_time(&datetime)?;
        let gs_id = require(self.gs_id, MSG_GROUND_STATION_REQUIRED)?
            .trim()
            .to_string();

        Ok(FlightPlan {
            flight_plan: self.flight_plan,
            datetime,
            gs_id,
            sat_name,
            scheduled_at,
        })
    }
}

/// Parse an RFC 3339 timestamp. The offset is mandatory.
pub fn parse_transmission_time(raw: &str) -> Result<DateTime<FixedOffset>, CoreError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map_err(|_| CoreError::Validation(MSG_DATETIME_INVALID.to_string()))
}

fn require(value: Option<String>, message: &str) -> Result<String, CoreError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(CoreError::Validation(message.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn complete() -> FlightPlanSubmission {
        FlightPlanSubmission {
            flight_plan: json!({"name": "commands", "body": [{"name": "gpio.set"}]}),
            datetime: Some("2025-01-01T12:00:00+01:00".into()),
            gs_id: Some("86c8a92b-571a-46cb-b306-e9be71959279".into()),
            sat_name: Some("SAT-1".into()),
        }
    }

    fn validation_message(submission: FlightPlanSubmission) -> String {
        match submission.validate() {
            Err(CoreError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn complete_submission_validates() {
        let plan = complete().validate().unwrap();
        assert_eq!(plan.sat_name, "SAT-1");
        assert_eq!(plan.datetime, "2025-01-01T12:00:00+01:00");
        assert_eq!(plan.scheduled_at.offset().local_minus_utc(), 3600);
        assert_eq!(plan.flight_plan["name"], "commands");
    }

    #[test]
    fn datetime_is_kept_verbatim() {
        let submission = FlightPlanSubmission {
            datetime: Some(" 2025-01-01T12:00:00+01:00\n".into()),
            sat_name: Some(" SAT-1 ".into()),
            ..complete()
        };
        let plan = submission.validate().unwrap();
        assert_eq!(plan.datetime, " 2025-01-01T12:00:00+01:00\n");
        assert_eq!(plan.scheduled_at.offset().local_minus_utc(), 3600);
        assert_eq!(plan.sat_name, "SAT-1");
    }

    #[test]
    fn missing_satellite_is_reported_first() {
        let submission = FlightPlanSubmission {
            sat_name: None,
            datetime: None,
            gs_id: None,
            ..complete()
        };
        assert_eq!(validation_message(submission), MSG_SATELLITE_REQUIRED);
    }

    #[test]
    fn blank_satellite_counts_as_missing() {
        let submission = FlightPlanSubmission {
            sat_name: Some("   ".into()),
            ..complete()
        };
        assert_eq!(validation_message(submission), MSG_SATELLITE_REQUIRED);
    }

    #[test]
    fn missing_datetime_is_rejected() {
        let submission = FlightPlanSubmission {
            datetime: None,
            gs_id: None,
            ..complete()
        };
        assert_eq!(validation_message(submission), MSG_DATETIME_REQUIRED);
    }

    #[test]
    fn datetime_without_offset_is_rejected() {
        let submission = FlightPlanSubmission {
            datetime: Some("2025-01-01T12:00:00".into()),
            ..complete()
        };
        assert_eq!(validation_message(submission), MSG_DATETIME_INVALID);
    }

    #[test]
    fn missing_ground_station_is_rejected() {
        let submission = FlightPlanSubmission {
            gs_id: Some(String::new()),
            ..complete()
        };
        assert_eq!(validation_message(submission), MSG_GROUND_STATION_REQUIRED);
    }

    #[test]
    fn missing_body_defaults_to_null() {
        let submission: FlightPlanSubmission = serde_json::from_value(json!({
            "datetime": "2025-01-01T12:00:00Z",
            "gs_id": "gs",
            "sat_name": "SAT-1",
        }))
        .unwrap();
        let plan = submission.validate();
        assert_matches!(plan, Ok(FlightPlan { ref flight_plan, .. }) if flight_plan.is_null());
    }

    #[test]
    fn serialized_plan_omits_parsed_timestamp() {
        let value = serde_json::to_value(complete().validate().unwrap()).unwrap();
        assert!(value.get("scheduled_at").is_none());
        assert_eq!(value["gs_id"], "86c8a92b-571a-46cb-b306-e9be71959279");
    }
}
