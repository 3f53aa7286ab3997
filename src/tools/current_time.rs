//! get_current_time tool
//!
//! Reports the current date and time in an IANA timezone.

use crate::error::Result;
use crate::tools::{ToolExecutor, ToolResult};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::json;

/// Registered tool name
pub const TOOL_NAME: &str = "get_current_time";

#[derive(Debug, Default, Deserialize)]
struct CurrentTimeParams {
    #[serde(default)]
    timezone_str: Option<String>,
}

/// Tool returning the current date and time in a timezone
pub struct CurrentTimeTool {
    default_timezone: String,
}

impl CurrentTimeTool {
    /// Create the tool with the timezone used when the model passes none
    pub fn new(default_timezone: impl Into<String>) -> Self {
        Self {
            default_timezone: default_timezone.into(),
        }
    }
}

/// Render `instant` in `tz` as the `{date, time, full}` object
fn format_in_timezone(instant: DateTime<Utc>, tz: Tz) -> serde_json::Value {
    let local = tz.from_utc_datetime(&instant.naive_utc());
    json!({
        "date": local.format("%Y-%m-%d").to_string(),
        "time": local.format("%H:%M:%S %Z").to_string(),
        "full": local.format("%Y-%m-%d %H:%M:%S %Z").to_string(),
    })
}

#[async_trait]
impl ToolExecutor for CurrentTimeTool {
    fn tool_definition(&self) -> serde_json::Value {
        json!({
            "name": TOOL_NAME,
            "description": "Get current date and time in the specified timezone. Returns date (YYYY-MM-DD), time (HH:MM:SS TZ) and full (YYYY-MM-DD HH:MM:SS TZ).",
            "parameters": {
                "type": "object",
                "properties": {
                    "timezone_str": {
                        "type": "string",
                        "description": format!("IANA timezone name, e.g. 'Africa/Cairo' (default: {})", self.default_timezone)
                    }
                }
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        let params: CurrentTimeParams = if args.is_null() {
            CurrentTimeParams::default()
        } else {
            match serde_json::from_value(args) {
                Ok(params) => params,
                Err(e) => return Ok(ToolResult::error(format!("Invalid arguments: {}", e))),
            }
        };

        let name = params
            .timezone_str
            .filter(|tz| !tz.trim().is_empty())
            .unwrap_or_else(|| self.default_timezone.clone());

        let tz: Tz = match name.trim().parse() {
            Ok(tz) => tz,
            Err(_) => return Ok(ToolResult::error(format!("Unknown timezone: {}", name))),
        };

        let value = format_in_timezone(Utc::now(), tz);
        Ok(ToolResult::success(value.to_string()))
    }
}
