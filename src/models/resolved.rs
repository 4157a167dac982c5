//! Reconciled column views
//!
//! The output of recomposition: one entry per coordinate, each carrying the
//! provenance of the document (or override) that produced it.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::ROLES_KEY;
use super::column::ColumnType;
use super::document::{Coordinate, Family};

/// Which contribution produced a resolved element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    pub datasource: String,
    pub weight: i64,
    #[serde(rename = "override", skip_serializing_if = "is_false")]
    pub overridden: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One surviving element and its provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedElement {
    pub data: Value,
    pub meta: Provenance,
}

/// Elements of one category
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedCategory {
    Keyed(BTreeMap<String, ResolvedElement>),
    FamilyKeyed(BTreeMap<Family, BTreeMap<String, ResolvedElement>>),
}

impl ResolvedCategory {
    fn to_payload(&self) -> Value {
        match self {
            ResolvedCategory::Keyed(elements) => elements_payload(elements),
            ResolvedCategory::FamilyKeyed(families) => Value::Object(
                families
                    .iter()
                    .map(|(family, elements)| (family.to_string(), elements_payload(elements)))
                    .collect(),
            ),
        }
    }
}

fn elements_payload(elements: &BTreeMap<String, ResolvedElement>) -> Value {
    Value::Object(
        elements
            .iter()
            .map(|(id, element)| (id.clone(), element.data.clone()))
            .collect(),
    )
}

/// Config set of a structured column
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructuredSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<ResolvedElement>,
    #[serde(flatten)]
    pub singletons: BTreeMap<String, ResolvedElement>,
    #[serde(flatten)]
    pub categories: BTreeMap<String, ResolvedCategory>,
}

/// Reconciled config set
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedSet {
    Flat(ResolvedElement),
    Structured(StructuredSet),
}

impl ResolvedSet {
    /// Set payload with provenance stripped
    pub fn to_payload(&self) -> Value {
        match self {
            ResolvedSet::Flat(element) => element.data.clone(),
            ResolvedSet::Structured(set) => {
                let mut object = Map::new();
                if let Some(roles) = &set.roles {
                    object.insert(ROLES_KEY.to_string(), roles.data.clone());
                }
                for (key, element) in &set.singletons {
                    object.insert(key.clone(), element.data.clone());
                }
                for (name, category) in &set.categories {
                    object.insert(name.clone(), category.to_payload());
                }
                Value::Object(object)
            }
        }
    }

    fn elements<'a>(&'a self, set_id: &str, out: &mut Vec<(Coordinate, &'a ResolvedElement)>) {
        match self {
            ResolvedSet::Flat(element) => out.push((Coordinate::set(set_id), element)),
            ResolvedSet::Structured(set) => {
                if let Some(roles) = &set.roles {
                    out.push((Coordinate::singleton(set_id, ROLES_KEY), roles));
                }
                for (key, element) in &set.singletons {
                    out.push((Coordinate::singleton(set_id, key.as_str()), element));
                }
                for (name, category) in &set.categories {
                    match category {
                        ResolvedCategory::Keyed(elements) => {
                            for (id, element) in elements {
                                out.push((Coordinate::keyed(set_id, name.as_str(), id.as_str()), element));
                            }
                        }
                        ResolvedCategory::FamilyKeyed(families) => {
                            for (family, elements) in families {
                                for (id, element) in elements {
                                    out.push((
                                        Coordinate::family_keyed(
                                            set_id,
                                            name.as_str(),
                                            *family,
                                            id.as_str(),
                                        ),
                                        element,
                                    ));
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    fn element_mut(&mut self, coordinate: &Coordinate) -> Option<&mut ResolvedElement> {
        match self {
            ResolvedSet::Flat(element) => {
                let is_set = coordinate.category.is_none()
                    && coordinate.family.is_none()
                    && coordinate.element_id.is_none();
                is_set.then_some(element)
            }
            ResolvedSet::Structured(set) => {
                let element_id = coordinate.element_id.as_deref()?;
                match (&coordinate.category, coordinate.family) {
                    (None, None) if element_id == ROLES_KEY && set.roles.is_some() => {
                        set.roles.as_mut()
                    }
                    (None, None) => set.singletons.get_mut(element_id),
                    (Some(category), family) => match (set.categories.get_mut(category)?, family) {
                        (ResolvedCategory::Keyed(elements), None) => elements.get_mut(element_id),
                        (ResolvedCategory::FamilyKeyed(families), Some(family)) => {
                            families.get_mut(&family)?.get_mut(element_id)
                        }
                        _ => None,
                    },
                    (None, Some(_)) => None,
                }
            }
        }
    }
}

/// Reconstructed column: one entry per coordinate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedColumn {
    pub column: ColumnType,
    pub sets: BTreeMap<String, ResolvedSet>,
}

impl ResolvedColumn {
    pub fn new(column: ColumnType) -> Self {
        Self {
            column,
            sets: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Every resolved element with its coordinate, in coordinate order per set
    pub fn elements(&self) -> Vec<(Coordinate, &ResolvedElement)> {
        let mut out = Vec::new();
        for (set_id, set) in &self.sets {
            set.elements(set_id, &mut out);
        }
        out
    }

    pub fn element(&self, coordinate: &Coordinate) -> Option<&ResolvedElement> {
        self.elements()
            .into_iter()
            .find(|(c, _)| c == coordinate)
            .map(|(_, element)| element)
    }

    pub fn element_mut(&mut self, coordinate: &Coordinate) -> Option<&mut ResolvedElement> {
        self.sets.get_mut(&coordinate.set_id)?.element_mut(coordinate)
    }

    /// Payload of one set with provenance stripped
    pub fn set_payload(&self, set_id: &str) -> Option<Value> {
        self.sets.get(set_id).map(ResolvedSet::to_payload)
    }

    /// Whole column payload (`set_id -> set_data`) with provenance stripped
    pub fn to_payload(&self) -> Value {
        Value::Object(
            self.sets
                .iter()
                .map(|(set_id, set)| (set_id.clone(), set.to_payload()))
                .collect(),
        )
    }
}
