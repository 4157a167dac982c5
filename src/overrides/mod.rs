//! Override overlay
//!
//! Operator overrides are layered on top of the weighted datasource result:
//! the shadowed element keeps its place in the column, its data is replaced by
//! the override's and its provenance is flagged with `override = true`.

use serde_json::Value;
use tracing::debug;

use crate::codec::recompose;
use crate::config::Settings;
use crate::error::EngineError;
use crate::models::{ColumnType, Coordinate, Filter, Override, ResolvedColumn};
use crate::storage::DocumentStore;

/// Coordinates of every resolved element matched by `filter`
pub fn matching_coordinates(column: &ResolvedColumn, filter: &Filter) -> Vec<Coordinate> {
    column
        .elements()
        .into_iter()
        .filter(|(coordinate, element)| {
            filter.matches_coordinate(coordinate)
                && filter
                    .datasource
                    .as_ref()
                    .is_none_or(|ds| *ds == element.meta.datasource)
        })
        .map(|(coordinate, _)| coordinate)
        .collect()
}

/// Number of resolved elements matched by `filter`
pub fn count_matching_elements(column: &ResolvedColumn, filter: &Filter) -> usize {
    matching_coordinates(column, filter).len()
}

/// Resolve an override coordinate to the single element it targets.
///
/// A coordinate naming an existing element targets that element. Otherwise
/// absent coordinate fields act as wildcards and the coordinate is valid only
/// if exactly one element matches. The returned coordinate is that element's
/// full coordinate.
pub fn locate_target(
    column: &ResolvedColumn,
    coordinate: &Coordinate,
) -> Result<Coordinate, EngineError> {
    if column.element(coordinate).is_some() {
        return Ok(coordinate.clone());
    }

    let mut matches = matching_coordinates(column, &Filter::from(coordinate));
    match matches.len() {
        0 => Err(EngineError::NotFound(format!(
            "no {} element at {}",
            column.column, coordinate
        ))),
        1 => Ok(matches.remove(0)),
        n => Err(EngineError::AmbiguousOverride { matches: n }),
    }
}

/// Replace the data of every element targeted by an override of this column.
/// Returns the number of overrides applied.
pub fn apply_overrides(column: &mut ResolvedColumn, overrides: &[Override]) -> usize {
    let target = column.column;
    let mut applied = 0;
    for patch in overrides.iter().filter(|o| o.column == target) {
        match column.element_mut(&patch.coordinate) {
            Some(element) => {
                element.data = patch.data.clone();
                element.meta.overridden = true;
                applied += 1;
            }
            None => {
                debug!(
                    "Override at {} {} has no underlying element",
                    patch.column, patch.coordinate
                );
            }
        }
    }
    applied
}

/// Set payload with one element's data replaced, as the validator should see it
pub fn patched_set_payload(
    column: &ResolvedColumn,
    coordinate: &Coordinate,
    data: &Value,
) -> Option<Value> {
    let mut patched = column.clone();
    patched.element_mut(coordinate)?.data = data.clone();
    patched.set_payload(&coordinate.set_id)
}

/// Read path: recompose the matching documents and layer overrides on top
pub async fn reconcile<S: DocumentStore + ?Sized>(
    store: &S,
    settings: &Settings,
    column: ColumnType,
    filter: &Filter,
    show_hidden: bool,
) -> Result<ResolvedColumn, EngineError> {
    let documents = store.documents(column, filter).await?;
    let mut resolved = recompose(column, &documents, show_hidden, settings)?;
    let overrides = store.overrides(column, &filter.without_datasource()).await?;
    apply_overrides(&mut resolved, &overrides);
    Ok(resolved)
}
