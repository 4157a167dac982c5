use serde_json::{Map, Value};

use crate::config::Settings;
use crate::error::EngineError;
use crate::models::{CategoryKind, ColumnType, Document, Family, ROLES_KEY};

struct Emitter<'a> {
    datasource: &'a str,
    weight: i64,
    documents: Vec<Document>,
}

impl Emitter<'_> {
    fn emit(
        &mut self,
        set_id: &str,
        category: Option<&str>,
        family: Option<Family>,
        element_id: Option<&str>,
        flat: bool,
        data: &Value,
    ) {
        self.documents.push(Document {
            set_id: set_id.to_string(),
            category: category.map(str::to_string),
            family,
            element_id: element_id.map(str::to_string),
            datasource: self.datasource.to_string(),
            weight: self.weight,
            flat,
            data: data.clone(),
        });
    }
}

/// Flatten a column payload (`set_id -> set_data`) into documents.
///
/// Every document carries `datasource` and `weight`. Documents sharing a
/// coordinate are left for recomposition to resolve.
pub fn decompose(
    column: ColumnType,
    payload: &Value,
    datasource: &str,
    weight: i64,
    settings: &Settings,
) -> Result<Vec<Document>, EngineError> {
    let sets = payload.as_object().ok_or_else(|| {
        EngineError::InvalidPayload("column payload must be an object of config sets".to_string())
    })?;

    let mut emitter = Emitter {
        datasource,
        weight,
        documents: Vec::new(),
    };

    let descriptor = column.descriptor();
    for (set_id, set_data) in sets {
        if descriptor.is_flat() {
            emitter.emit(set_id, None, None, None, true, set_data);
            continue;
        }

        let set = as_object(set_data, set_id)?;
        for (key, value) in set {
            if key == ROLES_KEY && settings.is_shared(set_id) {
                emitter.emit(set_id, None, None, Some(ROLES_KEY), false, value);
                continue;
            }

            match descriptor.kind_of(key) {
                CategoryKind::Singleton => {
                    emitter.emit(set_id, None, None, Some(key), false, value);
                }
                CategoryKind::Keyed => {
                    let path = format!("{set_id}.{key}");
                    for (element_id, data) in as_object(value, &path)? {
                        emitter.emit(set_id, Some(key), None, Some(element_id), false, data);
                    }
                }
                CategoryKind::FamilyKeyed => {
                    let path = format!("{set_id}.{key}");
                    for (family_key, elements) in as_object(value, &path)? {
                        let family: Family = family_key
                            .parse()
                            .map_err(|e| EngineError::InvalidPayload(format!("{path}: {e}")))?;
                        let path = format!("{path}.{family_key}");
                        for (element_id, data) in as_object(elements, &path)? {
                            emitter.emit(
                                set_id,
                                Some(key),
                                Some(family),
                                Some(element_id),
                                false,
                                data,
                            );
                        }
                    }
                }
            }
        }
    }

    Ok(emitter.documents)
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, EngineError> {
    value
        .as_object()
        .ok_or_else(|| EngineError::InvalidPayload(format!("{path} must be an object")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;
    use serde_json::json;

    fn coordinates(documents: &[Document]) -> Vec<Coordinate> {
        let mut coordinates: Vec<_> = documents.iter().map(Document::coordinate).collect();
        coordinates.sort();
        coordinates
    }

    #[test]
    fn test_flat_column_emits_one_document_per_set() {
        let documents = decompose(
            ColumnType::Device,
            &json!({"R1": {"roles": ["edge"]}, "R2": {"roles": ["core"]}}),
            "inventory",
            100,
            &Settings::default(),
        )
        .unwrap();

        assert_eq!(documents.len(), 2);
        assert!(documents.iter().all(|d| d.flat && d.category.is_none()));
        assert!(documents.iter().all(|d| d.weight == 100 && d.datasource == "inventory"));
    }

    #[test]
    fn test_structured_column_emits_per_element() {
        let documents = decompose(
            ColumnType::Bgp,
            &json!({
                "_EDGE": {"roles": ["edge"], "options": {"mtu": 1500}},
                "R1": {
                    "options": {"asn": 65000},
                    "groups": {"transit": {}, "peers": {}},
                    "neighbors": {"ipv4": {"192.0.2.2": {}}, "ipv6": {"2001:db8::2": {}}}
                }
            }),
            "ipam",
            10,
            &Settings::default(),
        )
        .unwrap();

        assert_eq!(
            coordinates(&documents),
            vec![
                Coordinate::singleton("R1", "options"),
                Coordinate::keyed("R1", "groups", "peers"),
                Coordinate::keyed("R1", "groups", "transit"),
                Coordinate::family_keyed("R1", "neighbors", Family::Ipv4, "192.0.2.2"),
                Coordinate::family_keyed("R1", "neighbors", Family::Ipv6, "2001:db8::2"),
                Coordinate::singleton("_EDGE", "options"),
                Coordinate::singleton("_EDGE", "roles"),
            ]
        );
        assert!(documents.iter().all(|d| !d.flat));
    }

    #[test]
    fn test_rejects_unknown_family() {
        let result = decompose(
            ColumnType::Bgp,
            &json!({"R1": {"neighbors": {"ipx": {}}}}),
            "ipam",
            10,
            &Settings::default(),
        );
        assert!(matches!(result, Err(EngineError::InvalidPayload(_))));
    }
}
