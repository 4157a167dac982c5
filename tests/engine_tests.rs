//! Engine operation tests against the memory store

use netconfig_sot::{
    ColumnType, Coordinate, DocumentStore, Engine, EngineError, Family, Filter,
    MemoryDocumentStore, Outcome, Override, Settings, StructuralValidator, Validator,
};
use serde_json::{Value, json};
use std::sync::Arc;

fn engine() -> (Engine<MemoryDocumentStore>, Arc<MemoryDocumentStore>) {
    let settings = Arc::new(Settings::default());
    let store = Arc::new(MemoryDocumentStore::new());
    let validator: Arc<dyn Validator> =
        Arc::new(StructuralValidator::new(&settings.shared_prefix));
    let engine = Engine::with_column_registry(settings, Arc::clone(&store), validator);
    (engine, store)
}

async fn register_devices(engine: &Engine<MemoryDocumentStore>) {
    engine
        .reload(
            ColumnType::Device,
            "inventory",
            10,
            &json!({
                "R1": {
                    "roles": ["edge"],
                    "cvars": {"router_id": "192.0.2.1", "asn": 65000},
                    "site": "fra1"
                },
                "R2": {"roles": ["core"], "site": "ams1", "iso": "49.0001.0000.0000.0002.00"}
            }),
        )
        .await
        .unwrap();
}

fn bgp_payload() -> Value {
    json!({
        "_EDGE": {
            "roles": ["edge"],
            "options": {"mtu": 1500, "bfd": true},
            "groups": {"transit": {"import": "deny-all"}}
        },
        "R1": {
            "options": {"mtu": 9000},
            "neighbors": {
                "ipv4": {
                    "192.0.2.2": {"remote_as": 65001},
                    "192.0.2.3": {"remote_as": 65002}
                },
                "ipv6": {"2001:db8::2": {"remote_as": 65001}}
            }
        }
    })
}

async fn stored_documents(store: &MemoryDocumentStore, column: ColumnType) -> usize {
    store.documents(column, &Filter::new()).await.unwrap().len()
}

mod round_trip_tests {
    use super::*;

    #[tokio::test]
    async fn test_reload_reproduces_payload() {
        let (engine, _) = engine();
        register_devices(&engine).await;

        let resolved = engine
            .reload(ColumnType::Bgp, "ipam", 10, &bgp_payload())
            .await
            .unwrap();

        assert_eq!(resolved.to_payload(), bgp_payload());
        for (_, element) in resolved.elements() {
            assert_eq!(element.meta.datasource, "ipam");
            assert_eq!(element.meta.weight, 10);
            assert!(!element.meta.overridden);
        }
    }

    #[tokio::test]
    async fn test_flat_column_round_trip() {
        let (engine, _) = engine();
        register_devices(&engine).await;

        let resolved = engine
            .fetch(ColumnType::Device, &Filter::new(), false)
            .await
            .unwrap();
        assert_eq!(resolved.set_payload("R2").unwrap()["site"], "ams1");
        assert_eq!(resolved.set_payload("R1").unwrap()["cvars"]["asn"], 65000);
    }
}

mod resolution_tests {
    use super::*;

    async fn neighbor_after(order: &[(&str, i64, Value)]) -> (Value, String, i64) {
        let (engine, _) = engine();
        register_devices(&engine).await;

        for (datasource, weight, data) in order {
            let payload = json!({"R1": {"neighbors": {"ipv4": {"192.0.2.2": data}}}});
            engine
                .replace(ColumnType::Bgp, datasource, *weight, &payload)
                .await
                .unwrap();
        }

        let resolved = engine
            .fetch(ColumnType::Bgp, &Filter::new(), false)
            .await
            .unwrap();
        let coordinate = Coordinate::family_keyed("R1", "neighbors", Family::Ipv4, "192.0.2.2");
        let element = resolved.element(&coordinate).unwrap();
        (
            element.data.clone(),
            element.meta.datasource.clone(),
            element.meta.weight,
        )
    }

    #[tokio::test]
    async fn test_higher_weight_wins_in_any_order() {
        let low = ("ipam", 10, json!({"remote_as": 65001}));
        let high = ("manual", 50, json!({"remote_as": 65009}));

        let forward = neighbor_after(&[low.clone(), high.clone()]).await;
        let backward = neighbor_after(&[high, low]).await;

        assert_eq!(forward, backward);
        assert_eq!(forward, (json!({"remote_as": 65009}), "manual".to_string(), 50));
    }

    #[tokio::test]
    async fn test_equal_weight_prefers_smaller_datasource_name() {
        let alpha = ("alpha", 20, json!({"remote_as": 1}));
        let beta = ("beta", 20, json!({"remote_as": 2}));

        let forward = neighbor_after(&[alpha.clone(), beta.clone()]).await;
        let backward = neighbor_after(&[beta, alpha]).await;

        assert_eq!(forward, backward);
        assert_eq!(forward.1, "alpha");
    }

    #[tokio::test]
    async fn test_weight_zero_hidden_unless_requested() {
        let (engine, _) = engine();
        register_devices(&engine).await;

        engine
            .replace(ColumnType::Bgp, "ipam", 10, &json!({"R1": {"options": {"mtu": 1500}}}))
            .await
            .unwrap();
        engine
            .replace(ColumnType::Bgp, "lab", 0, &json!({"R1": {"options": {"mtu": 1}}}))
            .await
            .unwrap();

        let visible = engine
            .fetch(ColumnType::Bgp, &Filter::new(), false)
            .await
            .unwrap();
        assert_eq!(visible.set_payload("R1").unwrap()["options"]["mtu"], 1500);

        // hidden documents compete on weight like any other once shown
        let all = engine
            .fetch(ColumnType::Bgp, &Filter::new().datasource("lab"), true)
            .await
            .unwrap();
        assert_eq!(all.set_payload("R1").unwrap()["options"]["mtu"], 1);
    }

    #[tokio::test]
    async fn test_reload_replaces_only_its_datasource() {
        let (engine, store) = engine();
        register_devices(&engine).await;

        engine
            .reload(ColumnType::Bgp, "ipam", 10, &bgp_payload())
            .await
            .unwrap();
        engine
            .replace(ColumnType::Bgp, "manual", 5, &json!({"R1": {"groups": {"ibgp": {}}}}))
            .await
            .unwrap();

        let resolved = engine
            .reload(ColumnType::Bgp, "ipam", 10, &json!({"R1": {"options": {"mtu": 1500}}}))
            .await
            .unwrap();

        assert_eq!(
            resolved.to_payload(),
            json!({"R1": {"options": {"mtu": 1500}, "groups": {"ibgp": {}}}})
        );
        assert_eq!(stored_documents(&store, ColumnType::Bgp).await, 2);
    }
}

mod override_tests {
    use super::*;

    #[tokio::test]
    async fn test_override_takes_precedence_over_any_weight() {
        let (engine, _) = engine();
        register_devices(&engine).await;
        engine
            .reload(ColumnType::Bgp, "ipam", 10, &bgp_payload())
            .await
            .unwrap();

        let coordinate = Coordinate::singleton("R1", "options");
        let element = engine
            .override_upsert(Override::new(
                ColumnType::Bgp,
                coordinate.clone(),
                json!({"mtu": 4470}),
            ))
            .await
            .unwrap();
        assert!(element.meta.overridden);
        assert_eq!(element.meta.datasource, "ipam");

        engine
            .reload(ColumnType::Bgp, "authoritative", 1000, &bgp_payload())
            .await
            .unwrap();

        let resolved = engine
            .fetch(ColumnType::Bgp, &Filter::new(), false)
            .await
            .unwrap();
        let element = resolved.element(&coordinate).unwrap();
        assert_eq!(element.data, json!({"mtu": 4470}));
        assert!(element.meta.overridden);
        assert_eq!(element.meta.datasource, "authoritative");
    }

    #[tokio::test]
    async fn test_partial_coordinate_normalized_when_unique() {
        let (engine, _) = engine();
        register_devices(&engine).await;
        engine
            .reload(ColumnType::Bgp, "ipam", 10, &bgp_payload())
            .await
            .unwrap();

        let target = Coordinate {
            set_id: "R1".to_string(),
            category: Some("neighbors".to_string()),
            family: Some(Family::Ipv6),
            element_id: None,
        };
        engine
            .override_upsert(Override::new(
                ColumnType::Bgp,
                target,
                json!({"remote_as": 65111}),
            ))
            .await
            .unwrap();

        let stored = engine
            .override_fetch(ColumnType::Bgp, &Filter::new())
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(
            stored[0].coordinate,
            Coordinate::family_keyed("R1", "neighbors", Family::Ipv6, "2001:db8::2")
        );
    }

    #[tokio::test]
    async fn test_ambiguous_or_missing_target_rejected() {
        let (engine, _) = engine();
        register_devices(&engine).await;
        engine
            .reload(ColumnType::Bgp, "ipam", 10, &bgp_payload())
            .await
            .unwrap();

        let ambiguous = Coordinate {
            set_id: "R1".to_string(),
            category: Some("neighbors".to_string()),
            family: Some(Family::Ipv4),
            element_id: None,
        };
        let result = engine
            .override_upsert(Override::new(ColumnType::Bgp, ambiguous, json!({})))
            .await;
        assert!(matches!(
            result,
            Err(EngineError::AmbiguousOverride { matches: 2 })
        ));

        let missing = Coordinate::family_keyed("R1", "neighbors", Family::Ipv4, "198.51.100.1");
        let result = engine
            .override_upsert(Override::new(ColumnType::Bgp, missing, json!({})))
            .await;
        assert!(matches!(result, Err(EngineError::NotFound(_))));

        assert!(
            engine
                .override_fetch(ColumnType::Bgp, &Filter::new())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_singleton_named_like_keyed_element() {
        let (engine, _) = engine();
        register_devices(&engine).await;
        engine
            .reload(
                ColumnType::Protocol,
                "ipam",
                10,
                &json!({"R1": {
                    "ntp": {"servers": ["192.0.2.123"]},
                    "snmp_communities": {"ntp": {"access": "ro"}}
                }}),
            )
            .await
            .unwrap();

        let element = engine
            .override_upsert(Override::new(
                ColumnType::Protocol,
                Coordinate::singleton("R1", "ntp"),
                json!({"servers": ["198.51.100.123"]}),
            ))
            .await
            .unwrap();
        assert!(element.meta.overridden);

        let stored = engine
            .override_fetch(ColumnType::Protocol, &Filter::new())
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].coordinate, Coordinate::singleton("R1", "ntp"));

        let payload = engine
            .fetch(ColumnType::Protocol, &Filter::new(), false)
            .await
            .unwrap()
            .to_payload();
        assert_eq!(payload["R1"]["ntp"], json!({"servers": ["198.51.100.123"]}));
        assert_eq!(payload["R1"]["snmp_communities"]["ntp"], json!({"access": "ro"}));
    }

    #[tokio::test]
    async fn test_override_revalidates_surrounding_set() {
        let (engine, _) = engine();
        register_devices(&engine).await;
        engine
            .reload(ColumnType::Bgp, "ipam", 10, &bgp_payload())
            .await
            .unwrap();

        let result = engine
            .override_upsert(Override::new(
                ColumnType::Bgp,
                Coordinate::singleton("_EDGE", "roles"),
                json!("edge"),
            ))
            .await;
        assert!(matches!(result, Err(EngineError::ValidationFailed { .. })));

        engine
            .override_upsert(Override::new(
                ColumnType::Bgp,
                Coordinate::singleton("_EDGE", "roles"),
                json!(["edge", "core"]),
            ))
            .await
            .unwrap();
        assert_eq!(
            engine
                .override_fetch(ColumnType::Bgp, &Filter::new().set_id("_EDGE"))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_override_delete_requires_coordinate() {
        let (engine, _) = engine();
        register_devices(&engine).await;
        engine
            .reload(ColumnType::Bgp, "ipam", 10, &bgp_payload())
            .await
            .unwrap();
        engine
            .override_upsert(Override::new(
                ColumnType::Bgp,
                Coordinate::singleton("R1", "options"),
                json!({"mtu": 1}),
            ))
            .await
            .unwrap();

        assert!(matches!(
            engine.override_delete(ColumnType::Bgp, &Filter::new()).await,
            Err(EngineError::EmptyFilter)
        ));
        assert!(matches!(
            engine
                .override_delete(ColumnType::Bgp, &Filter::new().datasource("ipam"))
                .await,
            Err(EngineError::EmptyFilter)
        ));

        let deleted = engine
            .override_delete(ColumnType::Bgp, &Filter::new().set_id("R1"))
            .await
            .unwrap();
        assert_eq!(deleted, 1);

        let resolved = engine
            .fetch(ColumnType::Bgp, &Filter::new(), false)
            .await
            .unwrap();
        assert_eq!(resolved.set_payload("R1").unwrap()["options"], json!({"mtu": 9000}));
    }
}

mod gate_tests {
    use super::*;

    #[tokio::test]
    async fn test_unregistered_device_rejected_without_writes() {
        let (engine, store) = engine();
        register_devices(&engine).await;

        let payload = json!({
            "R1": {"options": {"mtu": 9000}},
            "R9": {"options": {"mtu": 1500}}
        });

        assert!(matches!(
            engine.validate(ColumnType::Bgp, &payload).await,
            Err(EngineError::DeviceNotRegistered { id }) if id == "R9"
        ));
        assert!(matches!(
            engine.reload(ColumnType::Bgp, "ipam", 10, &payload).await,
            Err(EngineError::DeviceNotRegistered { .. })
        ));
        assert!(matches!(
            engine.replace(ColumnType::Bgp, "ipam", 10, &payload).await,
            Err(EngineError::DeviceNotRegistered { .. })
        ));
        assert_eq!(stored_documents(&store, ColumnType::Bgp).await, 0);
    }

    #[tokio::test]
    async fn test_shared_sets_need_no_registration() {
        let (engine, _) = engine();
        let payload = json!({"_ALL": {"roles": ["*"], "options": {"mtu": 1500}}});
        assert!(engine.validate(ColumnType::Bgp, &payload).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_shape_reports_fields() {
        let (engine, store) = engine();
        register_devices(&engine).await;

        let payload = json!({
            "_EDGE": {"options": {"mtu": 1500}},
            "R1": {"neighbors": {"ipv5": {}}}
        });
        let Err(EngineError::ValidationFailed { fields }) =
            engine.reload(ColumnType::Bgp, "ipam", 10, &payload).await
        else {
            panic!("expected validation failure");
        };
        let paths: Vec<&str> = fields.iter().map(|f| f.path.as_str()).collect();
        assert!(paths.contains(&"_EDGE.roles"));
        assert!(paths.contains(&"R1.neighbors.ipv5"));
        assert_eq!(stored_documents(&store, ColumnType::Bgp).await, 0);
    }

    #[tokio::test]
    async fn test_delete_with_empty_filter_deletes_nothing() {
        let (engine, store) = engine();
        register_devices(&engine).await;
        engine
            .reload(ColumnType::Bgp, "ipam", 10, &bgp_payload())
            .await
            .unwrap();
        let before = stored_documents(&store, ColumnType::Bgp).await;

        let outcome: Outcome<usize> = engine.delete(ColumnType::Bgp, &Filter::new()).await.into();
        assert!(!outcome.success);
        assert!(outcome.data.is_none());
        assert_eq!(stored_documents(&store, ColumnType::Bgp).await, before);

        let deleted = engine
            .delete(ColumnType::Bgp, &Filter::new().set_id("_EDGE"))
            .await
            .unwrap();
        // roles, options and one group
        assert_eq!(deleted, 3);
        assert_eq!(stored_documents(&store, ColumnType::Bgp).await, before - 3);
    }
}

mod concurrency_tests {
    use super::*;

    fn generation(tag: &str, offset: u8) -> Value {
        let neighbors: serde_json::Map<String, Value> = (0..8u8)
            .map(|i| {
                (
                    format!("192.0.2.{}", offset + i),
                    json!({"generation": tag}),
                )
            })
            .collect();
        json!({"R1": {"neighbors": {"ipv4": neighbors}}})
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_readers_never_observe_partial_reload() {
        let (engine, _) = engine();
        register_devices(&engine).await;
        engine
            .reload(ColumnType::Bgp, "D", 10, &generation("a", 0))
            .await
            .unwrap();

        let writer = {
            let engine = engine.clone();
            tokio::spawn(async move {
                for round in 0..50 {
                    let payload = if round % 2 == 0 {
                        generation("b", 100)
                    } else {
                        generation("a", 0)
                    };
                    engine
                        .reload(ColumnType::Bgp, "D", 10, &payload)
                        .await
                        .unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    for _ in 0..50 {
                        let resolved = engine
                            .fetch(ColumnType::Bgp, &Filter::new().datasource("D"), false)
                            .await
                            .unwrap();
                        let elements = resolved.elements();
                        assert_eq!(elements.len(), 8);

                        let first = &elements[0].1.data["generation"];
                        assert!(
                            elements
                                .iter()
                                .all(|(_, element)| &element.data["generation"] == first)
                        );
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
    }
}
