//! Simulated thermostat: a temperature sensor and a setpoint store.

use std::sync::{Arc, Mutex};

use rand::Rng;
use serde_json::json;

use crate::core::schema::ParamSchema;
use crate::core::tool::{ToolArgs, ToolHandler, ToolResult};
use crate::tools::registry::ToolDefinition;

pub const GET_TEMPERATURE: &str = "get_temperature";
pub const SET_THERMOSTAT: &str = "set_thermostat";

pub const SETPOINT_MIN: f64 = 40.0;
pub const SETPOINT_MAX: f64 = 90.0;
pub const DEFAULT_SETPOINT: f64 = 72.0;

const OUT_OF_RANGE: &str = "Invalid temperature value (must be between 40 and 90 degrees)";

/// Shared setpoint. Cloning shares the same value.
#[derive(Debug, Clone)]
pub struct Thermostat {
    setpoint: Arc<Mutex<f64>>,
}

impl Default for Thermostat {
    fn default() -> Self {
        Self::new(DEFAULT_SETPOINT)
    }
}

impl Thermostat {
    pub fn new(initial: f64) -> Self {
        Self { setpoint: Arc::new(Mutex::new(initial)) }
    }

    pub fn setpoint(&self) -> f64 {
        *self.setpoint.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn store(&self, value: f64) {
        *self.setpoint.lock().unwrap_or_else(|e| e.into_inner()) = value;
    }
}

/// Reads the (simulated) sensor: a whole-degree value in [40, 80].
pub struct GetTemperature;

impl ToolHandler for GetTemperature {
    fn call(&self, _args: &ToolArgs<'_>) -> ToolResult {
        let temperature = f64::from(rand::thread_rng().gen_range(40u8..=80));
        tracing::info!(tool = GET_TEMPERATURE, temperature, "temperature read");
        ToolResult::success(json!({ "temperature": temperature, "unit": "F" }).to_string())
    }
}

pub struct SetThermostat(pub Thermostat);

impl ToolHandler for SetThermostat {
    fn call(&self, args: &ToolArgs<'_>) -> ToolResult {
        let requested = args.get_f64("temperature", f64::NAN);
        if !(SETPOINT_MIN..=SETPOINT_MAX).contains(&requested) {
            tracing::debug!(tool = SET_THERMOSTAT, ?requested, "rejected setpoint");
            return ToolResult::error(OUT_OF_RANGE);
        }
        self.0.store(requested);
        tracing::info!(tool = SET_THERMOSTAT, setpoint = requested, "thermostat setpoint updated");
        ToolResult::success(json!({ "setpoint": one_decimal(requested), "status": "success" }).to_string())
    }
}

/// Rounds the way a `%.1f` format does, from the exact binary value.
fn one_decimal(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}

pub fn definitions(thermostat: &Thermostat) -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(GET_TEMPERATURE, GetTemperature)
            .describe("Gets the current temperature reading in Fahrenheit"),
        ToolDefinition::new(SET_THERMOSTAT, SetThermostat(thermostat.clone()))
            .describe("Sets the thermostat setpoint temperature in Fahrenheit")
            .param(
                ParamSchema::number(
                    "temperature",
                    "Target temperature in Fahrenheit (must be between 40 and 90)",
                    SETPOINT_MIN,
                    SETPOINT_MAX,
                )
                .required(),
            ),
    ]
}
