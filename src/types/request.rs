use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::PathBuf};

/// Untyped key/value bag passed through to the simulator as-is.
pub type ConfigBag = serde_json::Map<String, serde_json::Value>;

/// A transaction to replay, as sent to the simulator on stdin.
///
/// The pipeline never inspects these fields. It only serializes the request and hands it over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationRequest {
    /// Base64 XDR of the transaction envelope.
    pub envelope_xdr: String,
    /// Base64 XDR of the transaction result metadata.
    pub result_meta_xdr: String,
    /// Ledger entries to seed the simulated ledger with, keyed by XDR ledger key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ledger_entries: BTreeMap<String, String>,
    /// Ledger close time to simulate at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Ledger sequence to simulate at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_sequence: Option<u32>,
    /// Local WASM to run instead of the on-chain code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wasm_path: Option<PathBuf>,
    /// Arguments for a mocked invocation of [`Self::wasm_path`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock_args: Option<Vec<String>>,
    /// Whether to collect a CPU/memory profile.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub profile: bool,
    /// Protocol version override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<u32>,
    /// Base fee override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock_base_fee: Option<u32>,
    /// Gas price override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock_gas_price: Option<u64>,
    /// Authorization tracing options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_trace_opts: Option<AuthTraceOptions>,
    /// Custom authorization configuration, forwarded untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_auth_config: Option<ConfigBag>,
    /// Resource cost calibration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_calibration: Option<ResourceCalibration>,
}

impl SimulationRequest {
    /// Creates a new [`SimulationRequest`] for the given envelope and result metadata.
    pub fn new(envelope_xdr: impl Into<String>, result_meta_xdr: impl Into<String>) -> Self {
        Self {
            envelope_xdr: envelope_xdr.into(),
            result_meta_xdr: result_meta_xdr.into(),
            ..Default::default()
        }
    }

    /// Adds a ledger entry.
    pub fn with_ledger_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ledger_entries.insert(key.into(), value.into());
        self
    }

    /// Sets the ledger close time.
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the ledger sequence.
    pub fn with_ledger_sequence(mut self, sequence: u32) -> Self {
        self.ledger_sequence = Some(sequence);
        self
    }

    /// Sets a local WASM override together with its mocked arguments.
    pub fn with_wasm(mut self, path: impl Into<PathBuf>, args: Vec<String>) -> Self {
        self.wasm_path = Some(path.into());
        self.mock_args = Some(args);
        self
    }

    /// Enables profiling.
    pub fn with_profile(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }

    /// Sets the protocol version override.
    pub fn with_protocol_version(mut self, version: u32) -> Self {
        self.protocol_version = Some(version);
        self
    }

    /// Sets the fee overrides.
    pub fn with_mock_fees(mut self, base_fee: Option<u32>, gas_price: Option<u64>) -> Self {
        self.mock_base_fee = base_fee;
        self.mock_gas_price = gas_price;
        self
    }

    /// Sets the authorization tracing options.
    pub fn with_auth_trace_opts(mut self, opts: AuthTraceOptions) -> Self {
        self.auth_trace_opts = Some(opts);
        self
    }

    /// Sets the custom authorization configuration.
    pub fn with_custom_auth_config(mut self, config: ConfigBag) -> Self {
        self.custom_auth_config = Some(config);
        self
    }

    /// Sets the resource calibration.
    pub fn with_resource_calibration(mut self, calibration: ResourceCalibration) -> Self {
        self.resource_calibration = Some(calibration);
        self
    }
}

/// Options controlling authorization tracing in the simulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTraceOptions {
    /// Whether tracing is enabled.
    pub enabled: bool,
    /// Whether to trace custom account contracts.
    pub trace_custom_contracts: bool,
    /// Whether to capture signature details.
    pub capture_sig_details: bool,
    /// Maximum depth of traced events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_event_depth: Option<u32>,
}

/// Per-operation resource costs used to calibrate the simulated budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCalibration {
    /// Fixed cost of a SHA-256 invocation.
    pub sha256_fixed: u64,
    /// Per-byte cost of SHA-256.
    pub sha256_per_byte: u64,
    /// Fixed cost of a Keccak-256 invocation.
    pub keccak256_fixed: u64,
    /// Per-byte cost of Keccak-256.
    pub keccak256_per_byte: u64,
    /// Fixed cost of an Ed25519 verification.
    pub ed25519_fixed: u64,
}
