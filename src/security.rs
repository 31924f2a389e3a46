//! Security boundary analysis of simulation events.
//!
//! The analysis is a single in-order pass over the serialized event records of one simulation. A
//! contract that writes to storage before any address authorized it is flagged. Records that
//! cannot be parsed or attributed to a contract are ignored: the analysis annotates a result, it
//! never rejects one.

use crate::{
    constants::{ASSET_CONTRACT_MARKERS, UNKNOWN_CONTRACT},
    types::{SecurityViolation, Severity, ViolationKind},
};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// The fields of an event record the analysis cares about.
#[derive(Debug, Default, Deserialize)]
struct EventRecord {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    contract: String,
    #[serde(default)]
    address: String,
}

/// Parses one record. Records must be JSON objects.
fn parse_record(raw: &str) -> serde_json::Result<EventRecord> {
    let fields: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)?;
    serde_json::from_value(serde_json::Value::Object(fields))
}

/// Authorization seen so far for one contract.
#[derive(Debug, Default)]
struct ContractAuth<'a> {
    has_auth: bool,
    authorized: HashSet<&'a str>,
}

/// Scans the events of a completed simulation and returns the violations found, in event order.
pub fn analyze_security_boundary(events: &[String]) -> Vec<SecurityViolation> {
    let records: Vec<_> = events
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| match parse_record(raw) {
            Ok(record) => Some((index, record)),
            Err(err) => {
                trace!(index, %err, "Skipping malformed event record");
                None
            }
        })
        .filter(|(_, record)| is_attributable(&record.contract))
        .collect();

    let mut contracts: HashMap<&str, ContractAuth<'_>> = HashMap::new();
    let mut violations = Vec::new();

    for (index, record) in &records {
        let state = contracts.entry(record.contract.as_str()).or_default();
        match record.kind.as_str() {
            "auth" => {
                state.has_auth = true;
                state.authorized.insert(record.address.as_str());
                trace!(
                    contract = %record.contract,
                    authorized = state.authorized.len(),
                    "Recorded authorization"
                );
            }
            "storage_write" if !state.has_auth && !is_asset_contract(&record.contract) => {
                violations.push(unauthorized_write(&record.contract, *index));
            }
            _ => {}
        }
    }

    violations
}

/// Whether a contract identifier names a standard asset contract.
pub fn is_asset_contract(contract: &str) -> bool {
    let contract = contract.to_lowercase();
    ASSET_CONTRACT_MARKERS.iter().any(|marker| contract.contains(marker))
}

fn is_attributable(contract: &str) -> bool {
    !contract.is_empty() && contract != UNKNOWN_CONTRACT
}

fn unauthorized_write(contract: &str, index: usize) -> SecurityViolation {
    let mut details = serde_json::Map::new();
    details.insert("operation".into(), "storage_write".into());
    details.insert("event_index".into(), index.into());

    SecurityViolation {
        kind: ViolationKind::UnauthorizedStateModification,
        severity: Severity::High,
        description: "Storage write operation without prior require_auth check".into(),
        contract: contract.to_string(),
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn event(kind: &str, contract: &str, address: &str) -> String {
        json!({ "type": kind, "contract": contract, "address": address }).to_string()
    }

    #[test]
    fn auth_before_write_is_clean() {
        let events = vec![event("auth", "CVAULT", "GADMIN"), event("storage_write", "CVAULT", "")];
        assert!(analyze_security_boundary(&events).is_empty());
    }

    #[test]
    fn write_without_auth_is_flagged() {
        let events = vec![event("storage_write", "CVAULT", "")];
        let violations = analyze_security_boundary(&events);

        assert_eq!(violations.len(), 1);
        let violation = &violations[0];
        assert_eq!(violation.kind, ViolationKind::UnauthorizedStateModification);
        assert_eq!(violation.severity, Severity::High);
        assert_eq!(violation.contract, "CVAULT");
        assert_eq!(violation.details.get("operation"), Some(&json!("storage_write")));
        assert_eq!(violation.details.get("event_index"), Some(&json!(0)));
    }

    #[test]
    fn later_auth_does_not_clear_earlier_write() {
        let events = vec![
            event("storage_write", "CVAULT", ""),
            event("auth", "CVAULT", "GADMIN"),
            event("storage_write", "CVAULT", ""),
        ];
        let violations = analyze_security_boundary(&events);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].details.get("event_index"), Some(&json!(0)));
    }

    #[test]
    fn auth_is_tracked_per_contract() {
        let events = vec![
            event("auth", "CVAULT", "GADMIN"),
            event("storage_write", "CPOOL", ""),
            event("storage_write", "CVAULT", ""),
        ];
        let violations = analyze_security_boundary(&events);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].contract, "CPOOL");
    }

    #[test]
    fn asset_contracts_are_exempt() {
        let events = vec![
            event("storage_write", "native_TOKEN_contract", ""),
            event("storage_write", "Stellar_Asset_USDC", ""),
            event("storage_write", "usdc-sac", ""),
        ];
        assert!(analyze_security_boundary(&events).is_empty());
        assert!(is_asset_contract("MyToken"));
        assert!(!is_asset_contract("CVAULT"));
    }

    #[test]
    fn malformed_and_unattributed_records_are_skipped() {
        let events = vec![
            "not json".to_string(),
            "[1,2,3]".to_string(),
            r#"["storage_write","CVAULT",""]"#.to_string(),
            json!(["storage_write", "CPOOL"]).to_string(),
            event("storage_write", "", ""),
            event("storage_write", "unknown", ""),
            json!({ "type": "storage_write" }).to_string(),
        ];
        assert!(analyze_security_boundary(&events).is_empty());
        assert!(analyze_security_boundary(&[]).is_empty());
    }

    #[test]
    fn violations_follow_event_order() {
        let events = vec![
            event("storage_write", "CB", ""),
            event("storage_write", "CA", ""),
            event("storage_write", "CB", ""),
        ];
        let contracts: Vec<_> =
            analyze_security_boundary(&events).into_iter().map(|v| v.contract).collect();
        assert_eq!(contracts, ["CB", "CA", "CB"]);
    }

    proptest! {
        #[test]
        fn unattributed_events_never_violate(
            kinds in prop::collection::vec(prop_oneof![
                Just("auth"), Just("storage_write"), Just("storage_read"), Just("call")
            ], 0..32),
            unknown in any::<bool>(),
        ) {
            let contract = if unknown { UNKNOWN_CONTRACT } else { "" };
            let events: Vec<_> = kinds.iter().map(|kind| event(kind, contract, "GA")).collect();
            prop_assert!(analyze_security_boundary(&events).is_empty());
        }
    }
}
