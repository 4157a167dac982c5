use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use tracing::debug;

use super::outranks;
use crate::config::Settings;
use crate::error::EngineError;
use crate::models::{
    CategoryKind, ColumnType, Coordinate, Document, Provenance, ROLES_KEY, ResolvedCategory,
    ResolvedColumn, ResolvedElement, ResolvedSet, StructuredSet,
};

/// Rebuild a column from its documents.
///
/// Documents with `weight < 1` are skipped unless `show_hidden` is set. For
/// each coordinate the highest-ranked document survives (see [`super::rank`]),
/// whatever order the documents arrive in. Each leaf records the datasource and
/// weight that produced it.
pub fn recompose<'a, I>(
    column: ColumnType,
    documents: I,
    show_hidden: bool,
    settings: &Settings,
) -> Result<ResolvedColumn, EngineError>
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut winners: BTreeMap<Coordinate, &Document> = BTreeMap::new();
    for document in documents {
        if document.is_hidden() && !show_hidden {
            continue;
        }
        match winners.entry(document.coordinate()) {
            Entry::Vacant(slot) => {
                slot.insert(document);
            }
            Entry::Occupied(mut slot) => {
                let incumbent = *slot.get();
                if outranks(document, incumbent) {
                    debug!(
                        "{}: {} (weight {}) replaces {} (weight {})",
                        slot.key(),
                        document.datasource,
                        document.weight,
                        incumbent.datasource,
                        incumbent.weight
                    );
                    slot.insert(document);
                } else {
                    debug!(
                        "{}: keeping {} (weight {}) over {} (weight {})",
                        slot.key(),
                        incumbent.datasource,
                        incumbent.weight,
                        document.datasource,
                        document.weight
                    );
                }
            }
        }
    }

    let mut resolved = ResolvedColumn::new(column);
    for (coordinate, document) in winners {
        place(&mut resolved, &coordinate, document, settings)?;
    }
    Ok(resolved)
}

fn corrupt(coordinate: &Coordinate, reason: &str) -> EngineError {
    EngineError::CorruptDocument {
        coordinate: coordinate.to_string(),
        reason: reason.to_string(),
    }
}

fn place(
    resolved: &mut ResolvedColumn,
    coordinate: &Coordinate,
    document: &Document,
    settings: &Settings,
) -> Result<(), EngineError> {
    let element = ResolvedElement {
        data: document.data.clone(),
        meta: Provenance {
            datasource: document.datasource.clone(),
            weight: document.weight,
            overridden: false,
        },
    };

    let column = resolved.column;
    let descriptor = column.descriptor();
    if descriptor.is_flat() {
        if !document.flat || coordinate.category.is_some() || coordinate.element_id.is_some() {
            return Err(corrupt(coordinate, "structured document in a flat column"));
        }
        resolved
            .sets
            .insert(coordinate.set_id.clone(), ResolvedSet::Flat(element));
        return Ok(());
    }

    if document.flat {
        return Err(corrupt(coordinate, "flat document in a structured column"));
    }

    let set = match resolved
        .sets
        .entry(coordinate.set_id.clone())
        .or_insert_with(|| ResolvedSet::Structured(StructuredSet::default()))
    {
        ResolvedSet::Structured(set) => set,
        ResolvedSet::Flat(_) => return Err(corrupt(coordinate, "mixed flat and structured set")),
    };

    let leaf = document.leaf_key().to_string();

    let Some(category) = &coordinate.category else {
        if coordinate.family.is_some() {
            return Err(corrupt(coordinate, "address family without a category"));
        }
        if leaf == ROLES_KEY && settings.is_shared(&coordinate.set_id) {
            set.roles = Some(element);
        } else {
            set.singletons.insert(leaf, element);
        }
        return Ok(());
    };

    let spec = descriptor
        .category(category)
        .filter(|spec| spec.kind != CategoryKind::Singleton)
        .ok_or_else(|| EngineError::UnknownCategory {
            column: column.to_string(),
            category: category.clone(),
        })?;

    match (spec.kind, coordinate.family) {
        (CategoryKind::Keyed, None) => {
            let entry = set
                .categories
                .entry(category.clone())
                .or_insert_with(|| ResolvedCategory::Keyed(BTreeMap::new()));
            if let ResolvedCategory::Keyed(elements) = entry {
                elements.insert(leaf, element);
            }
        }
        (CategoryKind::FamilyKeyed, Some(family)) => {
            let entry = set
                .categories
                .entry(category.clone())
                .or_insert_with(|| ResolvedCategory::FamilyKeyed(BTreeMap::new()));
            if let ResolvedCategory::FamilyKeyed(families) = entry {
                families.entry(family).or_default().insert(leaf, element);
            }
        }
        (CategoryKind::Keyed, Some(_)) => {
            return Err(corrupt(coordinate, "address family on a keyed category"));
        }
        _ => {
            return Err(corrupt(coordinate, "family-keyed category without a family"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decompose;
    use crate::models::Family;
    use serde_json::json;

    fn doc(coordinate: Coordinate, datasource: &str, weight: i64, data: serde_json::Value) -> Document {
        Document {
            set_id: coordinate.set_id,
            category: coordinate.category,
            family: coordinate.family,
            element_id: coordinate.element_id,
            datasource: datasource.to_string(),
            weight,
            flat: false,
            data,
        }
    }

    #[test]
    fn test_round_trip_preserves_leaves() {
        let settings = Settings::default();
        let payload = json!({
            "_CORE": {"roles": ["core"], "options": {"graceful_restart": true}},
            "R1": {
                "options": {"asn": 65000},
                "groups": {"transit": {"import": "deny-all"}},
                "neighbors": {
                    "ipv4": {"192.0.2.2": {"remote_as": 65001}},
                    "ipv6": {"2001:db8::2": {"remote_as": 65001}}
                }
            }
        });

        let documents = decompose(ColumnType::Bgp, &payload, "ipam", 10, &settings).unwrap();
        let resolved = recompose(ColumnType::Bgp, &documents, false, &settings).unwrap();

        assert_eq!(resolved.to_payload(), payload);
        for (_, element) in resolved.elements() {
            assert_eq!(element.meta.datasource, "ipam");
            assert_eq!(element.meta.weight, 10);
        }
    }

    #[test]
    fn test_highest_weight_wins_in_any_order() {
        let settings = Settings::default();
        let coordinate = Coordinate::family_keyed("R1", "neighbors", Family::Ipv4, "192.0.2.2");
        let low = doc(coordinate.clone(), "ipam", 10, json!({"remote_as": 1}));
        let high = doc(coordinate.clone(), "manual", 50, json!({"remote_as": 2}));

        for order in [vec![&low, &high], vec![&high, &low]] {
            let resolved = recompose(ColumnType::Bgp, order, false, &settings).unwrap();
            let element = resolved.element(&coordinate).unwrap();
            assert_eq!(element.data, json!({"remote_as": 2}));
            assert_eq!(element.meta.datasource, "manual");
            assert_eq!(element.meta.weight, 50);
        }
    }

    #[test]
    fn test_hidden_documents() {
        let settings = Settings::default();
        let coordinate = Coordinate::singleton("R1", "options");
        let hidden = doc(coordinate.clone(), "staging", 0, json!({"asn": 1}));

        let resolved = recompose(ColumnType::Bgp, [&hidden], false, &settings).unwrap();
        assert!(resolved.is_empty());

        let resolved = recompose(ColumnType::Bgp, [&hidden], true, &settings).unwrap();
        assert_eq!(resolved.element(&coordinate).unwrap().meta.weight, 0);
    }

    #[test]
    fn test_unknown_category_fails_whole_recomposition() {
        let settings = Settings::default();
        let good = doc(Coordinate::singleton("R1", "options"), "ipam", 10, json!({}));
        let bad = doc(Coordinate::keyed("R1", "tunnels", "gre0"), "ipam", 10, json!({}));

        let result = recompose(ColumnType::Bgp, [&good, &bad], false, &settings);
        assert!(matches!(
            result,
            Err(EngineError::UnknownCategory { category, .. }) if category == "tunnels"
        ));
    }

    #[test]
    fn test_family_mismatch_is_corruption() {
        let settings = Settings::default();
        let bad = doc(Coordinate::keyed("R1", "neighbors", "192.0.2.2"), "ipam", 10, json!({}));
        let result = recompose(ColumnType::Bgp, [&bad], false, &settings);
        assert!(matches!(result, Err(EngineError::CorruptDocument { .. })));
    }
}
