//! Operator overrides

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::column::ColumnType;
use super::document::Coordinate;

/// Operator patch replacing the resolved data of exactly one element
///
/// Overrides carry no weight or datasource: they always win over
/// datasource-derived data at their coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Override {
    pub column: ColumnType,
    #[serde(flatten)]
    pub coordinate: Coordinate,
    pub data: Value,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Override {
    pub fn new(column: ColumnType, coordinate: Coordinate, data: Value) -> Self {
        Self {
            column,
            coordinate,
            data,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Family;
    use serde_json::json;

    #[test]
    fn test_override_flattens_coordinate() {
        let patch = Override::new(
            ColumnType::Bgp,
            Coordinate::family_keyed("R1", "neighbors", Family::Ipv4, "192.0.2.2"),
            json!({"remote_as": 65001}),
        );
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value["column"], "bgp");
        assert_eq!(value["set_id"], "R1");
        assert_eq!(value["family"], "ipv4");
        assert_eq!(value["element_id"], "192.0.2.2");

        let parsed: Override = serde_json::from_value(json!({
            "column": "bgp",
            "set_id": "R1",
            "element_id": "options",
            "data": {"asn": 65000}
        }))
        .unwrap();
        assert_eq!(parsed.coordinate, Coordinate::singleton("R1", "options"));
    }
}
