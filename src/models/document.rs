//! Storage-normalized documents and their coordinates

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Address family of a family-keyed category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Ipv4,
    Ipv6,
}

impl Family {
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Ipv4 => "ipv4",
            Family::Ipv6 => "ipv6",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ipv4" => Ok(Family::Ipv4),
            "ipv6" => Ok(Family::Ipv6),
            other => Err(format!("unknown address family '{other}'")),
        }
    }
}

/// Identifies one resolvable element: `(set_id, category, family, element_id)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub set_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<Family>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
}

impl Coordinate {
    /// Coordinate of a whole flat set
    pub fn set(set_id: impl Into<String>) -> Self {
        Self {
            set_id: set_id.into(),
            category: None,
            family: None,
            element_id: None,
        }
    }

    /// Coordinate of a singleton key
    pub fn singleton(set_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            element_id: Some(key.into()),
            ..Self::set(set_id)
        }
    }

    /// Coordinate of an element in a keyed category
    pub fn keyed(
        set_id: impl Into<String>,
        category: impl Into<String>,
        element_id: impl Into<String>,
    ) -> Self {
        Self {
            set_id: set_id.into(),
            category: Some(category.into()),
            family: None,
            element_id: Some(element_id.into()),
        }
    }

    /// Coordinate of an element in a family-keyed category
    pub fn family_keyed(
        set_id: impl Into<String>,
        category: impl Into<String>,
        family: Family,
        element_id: impl Into<String>,
    ) -> Self {
        Self {
            family: Some(family),
            ..Self::keyed(set_id, category, element_id)
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.set_id)?;
        if let Some(category) = &self.category {
            write!(f, "/{category}")?;
        }
        if let Some(family) = &self.family {
            write!(f, "/{family}")?;
        }
        if let Some(element_id) = &self.element_id {
            write!(f, "/{element_id}")?;
        }
        Ok(())
    }
}

/// Normalized, storable unit produced by decomposition
///
/// Several documents may share a coordinate when different datasources
/// supply the same element; the highest weight wins at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub set_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<Family>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    pub datasource: String,
    pub weight: i64,
    #[serde(default)]
    pub flat: bool,
    pub data: Value,
}

impl Document {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            set_id: self.set_id.clone(),
            category: self.category.clone(),
            family: self.family,
            element_id: self.element_id.clone(),
        }
    }

    /// Key of the leaf this document populates in the recomposed tree
    pub fn leaf_key(&self) -> &str {
        if self.flat {
            &self.set_id
        } else {
            self.element_id.as_deref().unwrap_or(&self.set_id)
        }
    }

    /// Soft-hidden contributions carry a weight below one
    pub fn is_hidden(&self) -> bool {
        self.weight < 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coordinate_display() {
        let coordinate = Coordinate::family_keyed("R1", "neighbors", Family::Ipv6, "2001:db8::1");
        assert_eq!(coordinate.to_string(), "R1/neighbors/ipv6/2001:db8::1");
        assert_eq!(Coordinate::set("R1").to_string(), "R1");
    }

    #[test]
    fn test_leaf_key() {
        let flat = Document {
            set_id: "R1".to_string(),
            category: None,
            family: None,
            element_id: None,
            datasource: "inventory".to_string(),
            weight: 10,
            flat: true,
            data: json!({"roles": ["edge"]}),
        };
        assert_eq!(flat.leaf_key(), "R1");

        let singleton = Document {
            element_id: Some("options".to_string()),
            flat: false,
            ..flat.clone()
        };
        assert_eq!(singleton.leaf_key(), "options");
    }

    #[test]
    fn test_family_serde() {
        let family: Family = serde_json::from_value(json!("ipv4")).unwrap();
        assert_eq!(family, Family::Ipv4);
        assert!("ipv5".parse::<Family>().is_err());
    }
}
