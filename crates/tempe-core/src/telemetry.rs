//! Fire-and-forget telemetry.

use serde_json::Value;

/// Event recorded after every drain of the compilation queue.
pub const COMPILE_BURST_EVENT: &str = "tempe/compile-burst";

/// A named event with structured properties.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryEvent {
    pub name: &'static str,
    pub properties: Vec<(&'static str, Value)>,
}

impl TelemetryEvent {
    /// Create an event without properties.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            properties: Vec::new(),
        }
    }

    /// Add a property.
    pub fn with(mut self, key: &'static str, value: impl Into<Value>) -> Self {
        self.properties.push((key, value.into()));
        self
    }

    /// Look up a property by key.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}

/// Sink for telemetry events. Must not block.
pub trait Telemetry: Send + Sync {
    fn record(&self, event: TelemetryEvent);
}

/// Emits events as `tracing` records on the `tempe::telemetry` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn record(&self, event: TelemetryEvent) {
        let properties: serde_json::Map<String, Value> = event
            .properties
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        tracing::info!(
            target: "tempe::telemetry",
            event = event.name,
            properties = %serde_json::Value::Object(properties),
        );
    }
}
