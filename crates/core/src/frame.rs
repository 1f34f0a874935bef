//! Transmission frames sent to ground stations.
//!
//! A frame is a JSON envelope with a `header` (message type plus
//! type-specific data) and an opaque `body`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header discriminator for a scheduled flight-plan transmission.
pub const FRAME_SCHEDULE_TRANSMISSION: &str = "schedule_transmission";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameHeader {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Correlation id, assigned by the transport just before sending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    pub header: FrameHeader,
    pub body: serde_json::Value,
}

impl Frame {
    /// Build a `schedule_transmission` frame carrying a compiled plan.
    pub fn schedule_transmission(
        time: &str,
        satellite: &str,
        compiled_plan: serde_json::Value,
    ) -> Self {
        Self {
            request_id: None,
            header: FrameHeader {
                kind: FRAME_SCHEDULE_TRANSMISSION.to_string(),
                data: serde_json::json!({
                    "time": time,
                    "satellite": satellite,
                }),
            },
            body: compiled_plan,
        }
    }

    /// Scheduled transmission time from the header, if present.
    pub fn time(&self) -> Option<&str> {
        self.header.data.get("time").and_then(|v| v.as_str())
    }

    /// Target satellite from the header, if present.
    pub fn satellite(&self) -> Option<&str> {
        self.header.data.get("satellite").and_then(|v| v.as_str())
    }
}
