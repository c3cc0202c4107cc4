//! Integration tests for finalization and snapshots.

use ormdb_metadata::{
    BuilderConfig, ConfigurationSource, ConventionSet, ErrorKind, ModelBuilder, ModelSnapshot,
    PropertyType, ScalarType,
};
use ConfigurationSource::*;

fn order_model() -> ModelBuilder {
    let mut builder = ModelBuilder::new(ConventionSet::relational());
    let customer = {
        let mut customer = builder.entity("Customer", Explicit).unwrap().unwrap();
        customer
            .property("Id", PropertyType::required(ScalarType::Uuid), Explicit)
            .unwrap();
        customer.key(&["Id"], Explicit).unwrap();
        customer
            .relational(Explicit)
            .to_table_in_schema(Some("Customers"), Some("sales"))
            .unwrap();
        customer.id()
    };

    let mut order = builder.entity("Order", Explicit).unwrap().unwrap();
    order
        .property("CustomerId", PropertyType::required(ScalarType::Uuid), Explicit)
        .unwrap();
    order
        .property("Total", PropertyType::required(ScalarType::Float64), Explicit)
        .unwrap()
        .unwrap()
        .relational(Explicit)
        .column_type(Some("decimal(18,2)"))
        .unwrap();
    order
        .foreign_key(customer, &["CustomerId"], Explicit)
        .unwrap()
        .unwrap()
        .relational(Explicit)
        .name(Some("FK_Order_Customer"))
        .unwrap();
    builder
}

#[test]
fn test_snapshot_json() {
    let builder = order_model();
    let json = builder.snapshot().to_json().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

    let entities = parsed["entities"].as_array().unwrap();
    assert_eq!(entities.len(), 2);
    assert_eq!(entities[0]["name"], "Customer");
    assert_eq!(
        entities[0]["annotations"]["Relational:TableName"]["source"],
        "Explicit"
    );
    assert_eq!(entities[1]["foreign_keys"][0]["principal"], "Customer");
    assert_eq!(entities[1]["foreign_keys"][0]["properties"][0], "CustomerId");
}

#[test]
fn test_snapshot_resolves_names() {
    let builder = order_model();
    let snapshot = ModelSnapshot::capture(builder.metadata());

    let order = snapshot.get_entity("Order").unwrap();
    assert_eq!(order.properties.len(), 2);
    assert!(order.keys.is_empty());
    assert!(order.foreign_keys[0]
        .annotations
        .get("Relational:Name")
        .is_some());
    assert_eq!(snapshot.get_entity("Customer").unwrap().keys, vec![vec!["Id"]]);
}

#[test]
fn test_finalized_model_is_read_only() {
    let model = order_model().finalize().unwrap();
    assert!(model.is_read_only());

    let customer = model.find_entity_type("Customer").unwrap();
    let view = model.relational_entity(customer);
    assert_eq!(view.table_name(), "Customers");
    assert_eq!(view.schema().as_deref(), Some("sales"));

    let mut builder = ModelBuilder::from_model(model, ConventionSet::new(), BuilderConfig::new());
    let err = builder
        .relational_entity(customer, Explicit)
        .to_table(Some("Clients"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
}
