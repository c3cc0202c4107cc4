//! Integration tests for convention dispatch.

use ormdb_metadata::{
    AnnotationChange, CapabilitySet, ConfigurationSource, Convention, ConventionSet, ElementRef,
    EntityTypeId, ModelBuilder, Result, Value,
};
use parking_lot::Mutex;
use std::sync::Arc;
use ConfigurationSource::*;

/// Records every annotation change it is notified of.
struct ChangeLog {
    tag: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl Convention for ChangeLog {
    fn name(&self) -> &str {
        self.tag
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::ENTITY_TYPE_ANNOTATION_SET
    }

    fn annotation_set(
        &self,
        _builder: &mut ModelBuilder,
        change: &AnnotationChange,
    ) -> Result<Option<ElementRef>> {
        self.log.lock().push(format!(
            "{}:{}={:?}",
            self.tag, change.name, change.new_value
        ));
        Ok(Some(change.element))
    }
}

/// Gives every new entity type a default comment.
struct DefaultComment;

impl Convention for DefaultComment {
    fn name(&self) -> &str {
        "DefaultComment"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::ENTITY_TYPE_ADDED
    }

    fn entity_type_added(
        &self,
        builder: &mut ModelBuilder,
        entity: EntityTypeId,
    ) -> Result<Option<EntityTypeId>> {
        builder.set_annotation(
            ElementRef::EntityType(entity),
            "Comment",
            Some(Value::from("generated")),
            Convention,
        )?;
        Ok(Some(entity))
    }
}

fn logged_set(log: &Arc<Mutex<Vec<String>>>) -> ConventionSet {
    ConventionSet::new()
        .with(ChangeLog {
            tag: "C1",
            log: log.clone(),
        })
        .with(ChangeLog {
            tag: "C2",
            log: log.clone(),
        })
}

#[test]
fn test_dispatch_order_is_deterministic() {
    for _ in 0..5 {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut builder = ModelBuilder::new(logged_set(&log));
        let order = builder.add_entity_type("Order", Explicit).unwrap().unwrap();
        builder
            .set_annotation(
                ElementRef::EntityType(order),
                "Comment",
                Some(Value::from("x")),
                Explicit,
            )
            .unwrap();

        let log = log.lock();
        assert_eq!(log.len(), 2);
        assert!(log[0].starts_with("C1:"));
        assert!(log[1].starts_with("C2:"));
    }
}

#[test]
fn test_idempotent_write_is_not_dispatched() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut builder = ModelBuilder::new(logged_set(&log));
    let order = builder.add_entity_type("Order", Explicit).unwrap().unwrap();
    let element = ElementRef::EntityType(order);

    for _ in 0..2 {
        let outcome = builder
            .set_annotation(element, "Comment", Some(Value::from("x")), DataAnnotation)
            .unwrap();
        assert!(outcome.accepted);
    }
    assert_eq!(log.lock().len(), 2);
}

#[test]
fn test_nested_mutations_dispatch_before_return() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let conventions = ConventionSet::new().with(DefaultComment).with(ChangeLog {
        tag: "log",
        log: log.clone(),
    });
    let mut builder = ModelBuilder::new(conventions);
    let order = builder.add_entity_type("Order", Explicit).unwrap().unwrap();

    assert_eq!(
        *log.lock(),
        vec![format!("log:Comment={:?}", Some(Value::from("generated")))]
    );
    let comment = builder
        .metadata()
        .annotations_of(ElementRef::EntityType(order))
        .unwrap()
        .get("Comment")
        .unwrap()
        .clone();
    assert_eq!(comment.source, Convention);

    let overridden = builder
        .set_annotation(
            ElementRef::EntityType(order),
            "Comment",
            Some(Value::from("mine")),
            Explicit,
        )
        .unwrap();
    assert!(overridden.accepted);
    assert_eq!(overridden.current, Some(Value::from("mine")));
}
