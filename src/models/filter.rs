//! Coordinate filters for fetch and delete operations

use serde::{Deserialize, Serialize};

use super::document::{Coordinate, Document, Family};

/// Any subset of `{datasource, set_id, category, family, element_id}`.
/// An absent field matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<Family>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn datasource(mut self, datasource: impl Into<String>) -> Self {
        self.datasource = Some(datasource.into());
        self
    }

    pub fn set_id(mut self, set_id: impl Into<String>) -> Self {
        self.set_id = Some(set_id.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn family(mut self, family: Family) -> Self {
        self.family = Some(family);
        self
    }

    pub fn element_id(mut self, element_id: impl Into<String>) -> Self {
        self.element_id = Some(element_id.into());
        self
    }

    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.datasource.is_none() && !self.has_coordinate()
    }

    /// True when at least one coordinate field is set
    pub fn has_coordinate(&self) -> bool {
        self.set_id.is_some()
            || self.category.is_some()
            || self.family.is_some()
            || self.element_id.is_some()
    }

    /// Same filter without the datasource restriction
    pub fn without_datasource(&self) -> Self {
        Self {
            datasource: None,
            ..self.clone()
        }
    }

    pub fn matches_coordinate(&self, coordinate: &Coordinate) -> bool {
        field_matches(&self.set_id, Some(&coordinate.set_id))
            && field_matches(&self.category, coordinate.category.as_ref())
            && self.family.is_none_or(|f| coordinate.family == Some(f))
            && field_matches(&self.element_id, coordinate.element_id.as_ref())
    }

    pub fn matches_document(&self, document: &Document) -> bool {
        field_matches(&self.datasource, Some(&document.datasource))
            && field_matches(&self.set_id, Some(&document.set_id))
            && field_matches(&self.category, document.category.as_ref())
            && self.family.is_none_or(|f| document.family == Some(f))
            && field_matches(&self.element_id, document.element_id.as_ref())
    }
}

impl From<&Coordinate> for Filter {
    fn from(coordinate: &Coordinate) -> Self {
        Self {
            datasource: None,
            set_id: Some(coordinate.set_id.clone()),
            category: coordinate.category.clone(),
            family: coordinate.family,
            element_id: coordinate.element_id.clone(),
        }
    }
}

fn field_matches(wanted: &Option<String>, actual: Option<&String>) -> bool {
    match wanted {
        None => true,
        Some(wanted) => actual == Some(wanted),
    }
}
