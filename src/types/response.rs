use super::SecurityViolation;
use serde::{Deserialize, Serialize};

/// Outcome reported by the simulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationStatus {
    /// The transaction replayed successfully.
    #[default]
    Success,
    /// The transaction failed; see [`SimulationResponse::error`].
    Error,
}

/// The simulator's answer, as read from its stdout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResponse {
    /// Whether the simulation succeeded.
    pub status: SimulationStatus,
    /// Error message, set when [`Self::status`] is [`SimulationStatus::Error`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Machine-readable error code from the simulator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Serialized event records, in emission order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<String>,
    /// Host diagnostic events.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostic_events: Vec<DiagnosticEvent>,
    /// Contract and system events grouped by category.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categorized_events: Vec<CategorizedEvent>,
    /// Simulator log lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<String>,
    /// Resource budget consumption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_usage: Option<BudgetUsage>,
    /// Protocol version the simulation ran under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<u32>,
    /// WASM stack trace of a trap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<WasmStackTrace>,
    /// Source location of a trap, if source maps were available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_location: Option<String>,
    /// WASM offset of a trap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wasm_offset: Option<u64>,
    /// Folded flamegraph stacks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flamegraph: Option<String>,
    /// LCOV coverage report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lcov_report: Option<String>,
    /// Dump of the linear memory at the time of a trap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linear_memory_dump: Option<String>,
    /// Authorization trace, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_trace: Option<serde_json::Value>,
    /// Violations found by the security boundary analysis.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_violations: Vec<SecurityViolation>,
    /// Any other fields emitted by the simulator.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SimulationResponse {
    /// A successful response carrying the given events.
    pub fn success(events: Vec<String>) -> Self {
        Self { events, ..Default::default() }
    }

    /// A failed response carrying the given error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self { status: SimulationStatus::Error, error: Some(error.into()), ..Default::default() }
    }

    /// Whether the simulator reported success.
    pub fn is_success(&self) -> bool {
        self.status == SimulationStatus::Success
    }
}

/// A host diagnostic event.
///
/// Every field is optional on the wire; absent ones take their default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticEvent {
    /// Event type, e.g. `contract`, `system` or `diagnostic`.
    pub event_type: String,
    /// Emitting contract, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<String>,
    /// Event topics.
    pub topics: Vec<String>,
    /// Event payload.
    pub data: String,
    /// Whether the event was emitted inside a successful contract call.
    pub in_successful_contract_call: bool,
    /// WASM instruction that emitted the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wasm_instruction: Option<String>,
}

/// A [`DiagnosticEvent`] tagged with its category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorizedEvent {
    /// Event category, e.g. `contract` or `system`.
    pub category: String,
    /// The event itself.
    pub event: DiagnosticEvent,
}

/// Resource budget consumed by a simulation.
///
/// Simulators that do not meter limits only report the first three counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetUsage {
    /// CPU instructions consumed.
    pub cpu_instructions: u64,
    /// Memory bytes consumed.
    pub memory_bytes: u64,
    /// Number of metered operations.
    pub operations_count: u64,
    /// CPU instruction limit.
    pub cpu_limit: u64,
    /// Memory byte limit.
    pub memory_limit: u64,
    /// CPU usage relative to the limit.
    pub cpu_usage_percent: f64,
    /// Memory usage relative to the limit.
    pub memory_usage_percent: f64,
}

/// Stack trace of a WASM trap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WasmStackTrace {
    /// Trap classification as reported by the simulator.
    pub trap_kind: serde_json::Value,
    /// Raw trap message.
    pub raw_message: String,
    /// Frames, innermost first.
    pub frames: Vec<StackFrame>,
    /// Whether the trap was wrapped in a host error.
    pub soroban_wrapped: bool,
}

/// A single frame of a [`WasmStackTrace`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackFrame {
    /// Position in the trace.
    pub index: u32,
    /// WASM function index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub func_index: Option<u32>,
    /// Demangled function name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub func_name: Option<String>,
    /// Offset in the WASM module.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wasm_offset: Option<u64>,
    /// Module name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_simulator_output() {
        let output = json!({
            "status": "success",
            "events": ["{\"type\":\"auth\",\"contract\":\"CA\",\"address\":\"GA\"}"],
            "budget_usage": {
                "cpu_instructions": 1000,
                "memory_bytes": 2048,
                "operations_count": 3,
                "cpu_limit": 100000,
                "memory_limit": 40960,
                "cpu_usage_percent": 1.0,
                "memory_usage_percent": 5.0
            },
            "stack_trace": {
                "trap_kind": { "Unreachable": null },
                "raw_message": "wasm trap: unreachable",
                "frames": [{ "index": 0, "func_name": "transfer" }],
                "soroban_wrapped": true
            },
            "simulator_version": "0.4.1"
        });

        let response: SimulationResponse = serde_json::from_value(output).unwrap();
        assert!(response.is_success());
        assert_eq!(response.events.len(), 1);
        assert_eq!(response.budget_usage.unwrap().operations_count, 3);
        assert_eq!(response.stack_trace.unwrap().frames[0].func_name.as_deref(), Some("transfer"));
        assert_eq!(response.extra.get("simulator_version"), Some(&json!("0.4.1")));
        assert!(response.security_violations.is_empty());
    }

    #[test]
    fn parses_minimal_budget_and_categorized_events() {
        let output = r#"{"status":"success","error":null,"events":[],"logs":["CPU Instructions Used: 1200"],"flamegraph":null,"optimization_report":{"score":90},"budget_usage":{"cpu_instructions":1200,"memory_bytes":4096,"operations_count":3}}"#;
        let response: SimulationResponse = serde_json::from_str(output).unwrap();
        assert!(response.is_success());
        assert!(response.error.is_none());
        assert_eq!(
            response.budget_usage,
            Some(BudgetUsage {
                cpu_instructions: 1200,
                memory_bytes: 4096,
                operations_count: 3,
                ..Default::default()
            })
        );
        assert_eq!(response.extra["optimization_report"], json!({ "score": 90 }));

        let output = json!({
            "status": "success",
            "categorized_events": [{
                "category": "contract",
                "event": {
                    "event_type": "contract",
                    "contract_id": "CA",
                    "topics": ["transfer"],
                    "data": "100",
                    "in_successful_contract_call": true
                }
            }],
            "diagnostic_events": [{ "event_type": "diagnostic" }],
            "stack_trace": { "raw_message": "wasm trap: unreachable" }
        });
        let response: SimulationResponse = serde_json::from_value(output).unwrap();
        let categorized = &response.categorized_events[0];
        assert_eq!(categorized.category, "contract");
        assert_eq!(categorized.event.contract_id.as_deref(), Some("CA"));
        assert!(categorized.event.in_successful_contract_call);
        assert_eq!(response.diagnostic_events[0].topics, Vec::<String>::new());
        assert_eq!(response.stack_trace.unwrap().trap_kind, serde_json::Value::Null);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = serde_json::from_value::<SimulationResponse>(json!({ "status": "pending" }));
        assert!(err.is_err());
    }

    #[test]
    fn failure_roundtrip() {
        let response = SimulationResponse::failure("HostError: Error(Contract, #3)");
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"status":"error","error":"HostError: Error(Contract, #3)"}"#);
        assert_eq!(serde_json::from_str::<SimulationResponse>(&json).unwrap(), response);
    }
}
