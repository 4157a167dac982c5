//! Column taxonomy and category classifier
//!
//! Every column type carries a static [`ColumnDescriptor`] describing how its
//! config sets are shaped. Decomposition, recomposition and the config-set merge
//! all dispatch on this descriptor instead of inspecting payload keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// Configuration domain stored by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Device,
    Interface,
    Igp,
    Bgp,
    Firewall,
    Policy,
    Protocol,
}

/// Shape of a top-level key inside a structured config set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    /// One data object per set (`key -> data`)
    Singleton,
    /// Named elements (`category -> element_id -> data`)
    Keyed,
    /// Named elements split by address family (`category -> family -> element_id -> data`)
    FamilyKeyed,
}

/// Declared category of a structured column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySpec {
    pub name: &'static str,
    pub kind: CategoryKind,
}

const fn keyed(name: &'static str) -> CategorySpec {
    CategorySpec {
        name,
        kind: CategoryKind::Keyed,
    }
}

const fn family_keyed(name: &'static str) -> CategorySpec {
    CategorySpec {
        name,
        kind: CategoryKind::FamilyKeyed,
    }
}

const fn singleton(name: &'static str) -> CategorySpec {
    CategorySpec {
        name,
        kind: CategoryKind::Singleton,
    }
}

/// Static classifier of a column's config sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDescriptor {
    /// Each set is a single opaque payload
    Flat,
    /// Each set is composed of categories; undeclared keys are singletons
    Categorized {
        categories: &'static [CategorySpec],
    },
}

impl ColumnDescriptor {
    pub fn is_flat(&self) -> bool {
        matches!(self, ColumnDescriptor::Flat)
    }

    /// Declared categories (empty for flat columns)
    pub fn categories(&self) -> &'static [CategorySpec] {
        match self {
            ColumnDescriptor::Flat => &[],
            ColumnDescriptor::Categorized { categories } => categories,
        }
    }

    /// Look up a declared category by name
    pub fn category(&self, name: &str) -> Option<&'static CategorySpec> {
        self.categories().iter().find(|spec| spec.name == name)
    }

    /// Classify a top-level set key. Keys that are not declared are singletons.
    pub fn kind_of(&self, key: &str) -> CategoryKind {
        self.category(key)
            .map(|spec| spec.kind)
            .unwrap_or(CategoryKind::Singleton)
    }

    /// Whether `key` holds a collection of named elements
    pub fn is_collection(&self, key: &str) -> bool {
        !matches!(self.kind_of(key), CategoryKind::Singleton)
    }
}

const INTERFACE_CATEGORIES: &[CategorySpec] = &[keyed("interfaces"), keyed("lags"), keyed("vlans")];

const IGP_CATEGORIES: &[CategorySpec] = &[
    keyed("interfaces"),
    family_keyed("redistribute"),
    singleton("options"),
];

const BGP_CATEGORIES: &[CategorySpec] = &[
    family_keyed("neighbors"),
    keyed("groups"),
    family_keyed("networks"),
    singleton("options"),
];

const FIREWALL_CATEGORIES: &[CategorySpec] =
    &[family_keyed("filters"), family_keyed("prefix_lists")];

const POLICY_CATEGORIES: &[CategorySpec] = &[
    keyed("policies"),
    keyed("communities"),
    family_keyed("prefix_sets"),
];

const PROTOCOL_CATEGORIES: &[CategorySpec] = &[
    family_keyed("static_routes"),
    keyed("snmp_communities"),
    singleton("ntp"),
    singleton("syslog"),
];

impl ColumnType {
    /// Every column in the taxonomy
    pub const ALL: [ColumnType; 7] = [
        ColumnType::Device,
        ColumnType::Interface,
        ColumnType::Igp,
        ColumnType::Bgp,
        ColumnType::Firewall,
        ColumnType::Policy,
        ColumnType::Protocol,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Device => "device",
            ColumnType::Interface => "interface",
            ColumnType::Igp => "igp",
            ColumnType::Bgp => "bgp",
            ColumnType::Firewall => "firewall",
            ColumnType::Policy => "policy",
            ColumnType::Protocol => "protocol",
        }
    }

    /// Category classifier for this column
    pub fn descriptor(&self) -> ColumnDescriptor {
        match self {
            ColumnType::Device => ColumnDescriptor::Flat,
            ColumnType::Interface => ColumnDescriptor::Categorized {
                categories: INTERFACE_CATEGORIES,
            },
            ColumnType::Igp => ColumnDescriptor::Categorized {
                categories: IGP_CATEGORIES,
            },
            ColumnType::Bgp => ColumnDescriptor::Categorized {
                categories: BGP_CATEGORIES,
            },
            ColumnType::Firewall => ColumnDescriptor::Categorized {
                categories: FIREWALL_CATEGORIES,
            },
            ColumnType::Policy => ColumnDescriptor::Categorized {
                categories: POLICY_CATEGORIES,
            },
            ColumnType::Protocol => ColumnDescriptor::Categorized {
                categories: PROTOCOL_CATEGORIES,
            },
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColumnType::ALL
            .into_iter()
            .find(|column| column.as_str() == s)
            .ok_or_else(|| EngineError::UnknownColumn(s.to_string()))
    }
}
