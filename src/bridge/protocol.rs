//! Wire types of the bridge protocol.
//!
//! Every message is one JSON object on its own line, tagged by `type`:
//!
//! ```text
//! → {"type":"status"}
//! ← {"type":"status","accessories":[{...}]}
//! → {"type":"set","accessory":"Sunset","characteristic":"offset","value":-15}
//! ← {"type":"ok"}
//! → {"type":"subscribe"}
//! ← {"type":"ok"}
//! ← {"type":"sensor","accessory":"Sunset","state":"event_active","at":"..."}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::scheduler::{AccessoryStatus, SensorState};
use crate::geo::SolarPeriod;

/// Requests a client may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeRequest {
    /// Status of every accessory, or of one when `accessory` is given.
    Status {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        accessory: Option<String>,
    },
    /// Characteristic write, acknowledged once persisted.
    Set {
        accessory: String,
        characteristic: Characteristic,
        value: serde_json::Value,
    },
    Identify {
        accessory: String,
    },
    /// Turn this connection into an event stream.
    Subscribe,
}

/// Writable characteristics of an accessory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Characteristic {
    Period,
    Offset,
    Enabled,
}

impl Characteristic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Characteristic::Period => "period",
            Characteristic::Offset => "offset",
            Characteristic::Enabled => "enabled",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "period" => Some(Characteristic::Period),
            "offset" => Some(Characteristic::Offset),
            "enabled" => Some(Characteristic::Enabled),
            _ => None,
        }
    }

    /// Interpret a raw JSON value for this characteristic.
    ///
    /// Periods accept a catalog index or a catalog name. An index that is out
    /// of range is passed through so the scheduler can reject it.
    pub fn parse_value(&self, value: &serde_json::Value) -> Result<Setting, String> {
        match self {
            Characteristic::Period => {
                if let Some(index) = value.as_u64() {
                    return usize::try_from(index)
                        .map(Setting::Period)
                        .map_err(|_| format!("period index {index} is out of range"));
                }
                value
                    .as_str()
                    .and_then(SolarPeriod::from_name)
                    .map(|period| Setting::Period(period.index()))
                    .ok_or_else(|| format!("'{value}' is not a known period"))
            }
            Characteristic::Offset => value
                .as_i64()
                .map(Setting::Offset)
                .ok_or_else(|| format!("offset must be a whole number of minutes, got {value}")),
            Characteristic::Enabled => value
                .as_bool()
                .map(Setting::Enabled)
                .ok_or_else(|| format!("enabled must be true or false, got {value}")),
        }
    }
}

/// A decoded characteristic write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    Period(usize),
    Offset(i64),
    Enabled(bool),
}

/// Replies to a request, one per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeResponse {
    Ok,
    Status { accessories: Vec<AccessoryStatus> },
    Error { message: String },
}

impl BridgeResponse {
    pub fn error(message: impl Into<String>) -> Self {
        BridgeResponse::Error {
            message: message.into(),
        }
    }
}

/// Events pushed to subscribed connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// The contact sensor changed state.
    Sensor {
        accessory: String,
        state: SensorState,
        at: DateTime<Utc>,
    },
    /// The armed event timer changed; `next_fire` is `None` when idle.
    Scheduled {
        accessory: String,
        next_fire: Option<DateTime<Utc>>,
    },
}
