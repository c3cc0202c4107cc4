//! Database sequences declared on the model.
//!
//! A sequence is a group of model annotations under
//! `Relational:Sequence:<schema>.<name>`: a marker holding the name, then one
//! annotation per field. Every field keeps its own configuration source.

use super::annotations::RelationalModelAnnotations;
use super::builder::RelationalModelBuilder;
use super::names::RELATIONAL_PREFIX;
use crate::builder::ModelBuilder;
use crate::error::{MetadataError, Result};
use crate::model::{Annotations, ElementRef, ScalarType, Value};
use crate::source::ConfigurationSource;
use serde::Serialize;
use tracing::debug;

/// First value of a sequence that configures none.
pub const DEFAULT_SEQUENCE_START: i64 = 1;

/// Step of a sequence that configures none.
pub const DEFAULT_SEQUENCE_INCREMENT: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SequenceField {
    Schema,
    StoreType,
    StartValue,
    IncrementBy,
    MinValue,
    MaxValue,
    Cyclic,
}

impl SequenceField {
    const ALL: [SequenceField; 7] = [
        SequenceField::Schema,
        SequenceField::StoreType,
        SequenceField::StartValue,
        SequenceField::IncrementBy,
        SequenceField::MinValue,
        SequenceField::MaxValue,
        SequenceField::Cyclic,
    ];

    const fn suffix(self) -> &'static str {
        match self {
            SequenceField::Schema => "Schema",
            SequenceField::StoreType => "StoreType",
            SequenceField::StartValue => "StartValue",
            SequenceField::IncrementBy => "IncrementBy",
            SequenceField::MinValue => "MinValue",
            SequenceField::MaxValue => "MaxValue",
            SequenceField::Cyclic => "Cyclic",
        }
    }
}

fn sequence_key(prefix: Option<&str>, name: &str, schema: Option<&str>) -> String {
    let prefix = prefix.unwrap_or(RELATIONAL_PREFIX);
    match schema {
        Some(schema) => format!("{prefix}:Sequence:{schema}.{name}"),
        None => format!("{prefix}:Sequence:{name}"),
    }
}

fn field_key(base: &str, field: SequenceField) -> String {
    format!("{base}:{}", field.suffix())
}

/// Whether `name` is the marker annotation of a sequence visible to `provider`.
fn is_marker(name: &str, provider: Option<&str>) -> bool {
    let Some((prefix, rest)) = name.split_once(':') else {
        return false;
    };
    (prefix == RELATIONAL_PREFIX || Some(prefix) == provider)
        && rest
            .strip_prefix("Sequence:")
            .is_some_and(|qualified| !qualified.contains(':'))
}

fn qualified_name(name: &str, schema: Option<&str>) -> String {
    match schema {
        Some(schema) => format!("{schema}.{name}"),
        None => name.to_string(),
    }
}

fn validate_sequence_name(name: &str, schema: Option<&str>) -> Result<()> {
    if name.is_empty() {
        return Err(MetadataError::EmptyName {
            element: "sequence".to_string(),
            facet: "name",
        });
    }
    if schema == Some("") {
        return Err(MetadataError::EmptyName {
            element: format!("sequence {name}"),
            facet: "schema",
        });
    }
    if name.contains(':') || schema.is_some_and(|schema| schema.contains(':')) {
        return Err(MetadataError::InvalidSequence {
            sequence: qualified_name(name, schema),
            reason: "names cannot contain ':'".to_string(),
        });
    }
    Ok(())
}

/// A sequence as configured on the model, with defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sequence {
    /// Sequence name.
    pub name: String,
    /// Schema holding the sequence.
    pub schema: Option<String>,
    /// Numeric type the sequence produces.
    pub store_type: ScalarType,
    /// First value.
    pub start_value: i64,
    /// Step between values.
    pub increment_by: i32,
    /// Lower bound.
    pub min_value: Option<i64>,
    /// Upper bound.
    pub max_value: Option<i64>,
    /// Whether the sequence restarts after reaching a bound.
    pub is_cyclic: bool,
}

impl Sequence {
    fn read(annotations: &Annotations, base: &str) -> Option<Sequence> {
        let name = annotations.value(base)?.as_str()?.to_string();
        let field = move |field: SequenceField| annotations.value(&field_key(base, field));
        Some(Sequence {
            name,
            schema: field(SequenceField::Schema)
                .and_then(Value::as_str)
                .map(str::to_string),
            store_type: field(SequenceField::StoreType)
                .and_then(Value::as_str)
                .and_then(|name| name.parse().ok())
                .unwrap_or(ScalarType::Int64),
            start_value: field(SequenceField::StartValue)
                .and_then(Value::as_i64)
                .unwrap_or(DEFAULT_SEQUENCE_START),
            increment_by: field(SequenceField::IncrementBy)
                .and_then(Value::as_i64)
                .and_then(|step| i32::try_from(step).ok())
                .unwrap_or(DEFAULT_SEQUENCE_INCREMENT),
            min_value: field(SequenceField::MinValue).and_then(Value::as_i64),
            max_value: field(SequenceField::MaxValue).and_then(Value::as_i64),
            is_cyclic: field(SequenceField::Cyclic)
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }
}

impl RelationalModelAnnotations<'_> {
    /// Find a sequence, preferring its provider declaration.
    pub fn find_sequence(&self, name: &str, schema: Option<&str>) -> Option<Sequence> {
        let annotations = self.model.annotations();
        self.model
            .provider_prefix()
            .and_then(|prefix| Sequence::read(annotations, &sequence_key(Some(prefix), name, schema)))
            .or_else(|| Sequence::read(annotations, &sequence_key(None, name, schema)))
    }

    /// All sequences in declaration order.
    pub fn sequences(&self) -> Vec<Sequence> {
        let annotations = self.model.annotations();
        let provider = self.model.provider_prefix();
        let mut sequences: Vec<Sequence> = Vec::new();
        for annotation in annotations.iter() {
            if !is_marker(&annotation.name, provider) {
                continue;
            }
            let Some(declared) = Sequence::read(annotations, &annotation.name) else {
                continue;
            };
            let seen = sequences
                .iter()
                .any(|s| s.name == declared.name && s.schema == declared.schema);
            if !seen {
                if let Some(sequence) = self.find_sequence(&declared.name, declared.schema.as_deref()) {
                    sequences.push(sequence);
                }
            }
        }
        sequences
    }
}

impl<'a> RelationalModelBuilder<'a> {
    /// Sequence `name` in `schema`, declared at this builder's source if missing.
    ///
    /// Returns `Ok(None)` when a stronger source removed the sequence.
    pub fn get_or_add_sequence(
        self,
        name: &str,
        schema: Option<&str>,
    ) -> Result<Option<RelationalSequenceBuilder<'a>>> {
        validate_sequence_name(name, schema)?;
        let base = sequence_key(self.provider.as_deref(), name, schema);

        if self.builder.metadata().annotations().value(&base).is_none() {
            let outcome = self.builder.set_annotation(
                ElementRef::Model,
                &base,
                Some(Value::from(name)),
                self.source,
            )?;
            if !outcome.accepted {
                debug!(sequence = name, source = %self.source, "sequence declaration rejected");
                return Ok(None);
            }
            if let Some(schema) = schema {
                self.builder.set_annotation(
                    ElementRef::Model,
                    &field_key(&base, SequenceField::Schema),
                    Some(Value::from(schema)),
                    self.source,
                )?;
            }
            debug!(sequence = name, source = %self.source, "sequence added");
        }

        Ok(Some(RelationalSequenceBuilder {
            builder: self.builder,
            base,
            display: qualified_name(name, schema),
            source: self.source,
        }))
    }

    /// Remove a sequence together with its fields.
    ///
    /// Returns `Ok(false)` when the sequence does not exist or any part of it
    /// was configured by a stronger source.
    pub fn remove_sequence(&mut self, name: &str, schema: Option<&str>) -> Result<bool> {
        let base = sequence_key(self.provider.as_deref(), name, schema);
        let annotations = self.builder.metadata().annotations();
        if annotations.value(&base).is_none() {
            return Ok(false);
        }

        let mut keys: Vec<String> = SequenceField::ALL
            .iter()
            .map(|field| field_key(&base, *field))
            .collect();
        keys.push(base);
        let strongest = keys.iter().filter_map(|key| annotations.source(key)).max();
        if !self.source.overrides(strongest, true) {
            debug!(sequence = name, source = %self.source, "sequence removal rejected");
            return Ok(false);
        }

        for key in &keys {
            self.builder
                .set_annotation(ElementRef::Model, key, None, self.source)?;
        }
        debug!(sequence = name, source = %self.source, "sequence removed");
        Ok(true)
    }
}

/// Configures one sequence.
pub struct RelationalSequenceBuilder<'a> {
    builder: &'a mut ModelBuilder,
    base: String,
    display: String,
    source: ConfigurationSource,
}

impl RelationalSequenceBuilder<'_> {
    /// The sequence as currently configured.
    pub fn metadata(&self) -> Option<Sequence> {
        Sequence::read(self.builder.metadata().annotations(), &self.base)
    }

    fn set(&mut self, field: SequenceField, value: Option<Value>) -> Result<bool> {
        let outcome = self.builder.set_annotation(
            ElementRef::Model,
            &field_key(&self.base, field),
            value,
            self.source,
        )?;
        Ok(outcome.accepted && !outcome.removed)
    }

    fn invalid(&self, reason: impl Into<String>) -> MetadataError {
        MetadataError::InvalidSequence {
            sequence: self.display.clone(),
            reason: reason.into(),
        }
    }

    /// Set the numeric type the sequence produces.
    pub fn store_type(&mut self, store_type: ScalarType) -> Result<bool> {
        if !store_type.is_numeric() {
            return Err(self.invalid(format!("store type {store_type} is not numeric")));
        }
        self.set(SequenceField::StoreType, Some(Value::from(store_type.to_string())))
    }

    /// Set the first value.
    pub fn start_value(&mut self, start: i64) -> Result<bool> {
        self.set(SequenceField::StartValue, Some(Value::Int64(start)))
    }

    /// Set the step between values.
    pub fn increment_by(&mut self, increment: i32) -> Result<bool> {
        if increment == 0 {
            return Err(self.invalid("increment cannot be zero"));
        }
        self.set(SequenceField::IncrementBy, Some(Value::Int32(increment)))
    }

    /// Set or clear the lower bound.
    pub fn min_value(&mut self, min: Option<i64>) -> Result<bool> {
        let max = self.metadata().and_then(|sequence| sequence.max_value);
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(self.invalid(format!("minimum {min} exceeds maximum {max}")));
            }
        }
        self.set(SequenceField::MinValue, min.map(Value::Int64))
    }

    /// Set or clear the upper bound.
    pub fn max_value(&mut self, max: Option<i64>) -> Result<bool> {
        let min = self.metadata().and_then(|sequence| sequence.min_value);
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(self.invalid(format!("maximum {max} is below minimum {min}")));
            }
        }
        self.set(SequenceField::MaxValue, max.map(Value::Int64))
    }

    /// Set whether the sequence restarts after reaching a bound.
    pub fn cyclic(&mut self, cyclic: bool) -> Result<bool> {
        self.set(SequenceField::Cyclic, Some(Value::Bool(cyclic)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convention::ConventionSet;
    use crate::error::ErrorKind;
    use crate::BuilderConfig;
    use ConfigurationSource::*;

    #[test]
    fn test_sequence_fields_read_back() {
        let mut builder = ModelBuilder::new(ConventionSet::new());
        builder
            .relational(Convention)
            .get_or_add_sequence("Mine", None)
            .unwrap()
            .unwrap()
            .increment_by(77)
            .unwrap();

        let sequence = builder.metadata().relational().find_sequence("Mine", None).unwrap();
        assert_eq!(sequence.increment_by, 77);
        assert_eq!(sequence.start_value, DEFAULT_SEQUENCE_START);
        assert_eq!(sequence.store_type, ScalarType::Int64);
        assert_eq!(sequence.schema, None);
        assert!(builder.metadata().relational().find_sequence("Mine", Some("dbo")).is_none());
    }

    #[test]
    fn test_sequence_fields_follow_sources() {
        let mut builder = ModelBuilder::new(ConventionSet::new());
        {
            let mut ids = builder
                .relational(Explicit)
                .get_or_add_sequence("OrderIds", Some("sales"))
                .unwrap()
                .unwrap();
            assert!(ids.start_value(1000).unwrap());
            assert!(ids.store_type(ScalarType::Int32).unwrap());
        }

        let mut ids = builder
            .relational(Convention)
            .get_or_add_sequence("OrderIds", Some("sales"))
            .unwrap()
            .unwrap();
        assert!(!ids.start_value(1).unwrap());
        assert!(ids.cyclic(true).unwrap());

        let sequence = ids.metadata().unwrap();
        assert_eq!(sequence.start_value, 1000);
        assert_eq!(sequence.schema.as_deref(), Some("sales"));
        assert_eq!(sequence.store_type, ScalarType::Int32);
        assert!(sequence.is_cyclic);
    }

    #[test]
    fn test_invalid_sequence_values() {
        let mut builder = ModelBuilder::new(ConventionSet::new());
        let mut ids = builder
            .relational(Explicit)
            .get_or_add_sequence("Ids", None)
            .unwrap()
            .unwrap();

        let err = ids.store_type(ScalarType::String).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DomainValidation);
        assert!(err.to_string().contains("Ids"));
        assert!(ids.increment_by(0).is_err());
        assert!(ids.max_value(Some(10)).unwrap());
        assert!(ids.min_value(Some(11)).is_err());
        assert_eq!(ids.metadata().unwrap().min_value, None);

        let err = builder
            .relational(Explicit)
            .get_or_add_sequence("", None)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::DomainValidation);
    }

    #[test]
    fn test_remove_sequence_respects_sources() {
        let mut builder = ModelBuilder::new(ConventionSet::new());
        builder
            .relational(Convention)
            .get_or_add_sequence("Ids", None)
            .unwrap()
            .unwrap()
            .increment_by(5)
            .unwrap();
        builder
            .relational(DataAnnotation)
            .get_or_add_sequence("Ids", None)
            .unwrap()
            .unwrap()
            .increment_by(10)
            .unwrap();

        assert!(!builder.relational(Convention).remove_sequence("Ids", None).unwrap());
        assert!(builder.relational(Explicit).remove_sequence("Ids", None).unwrap());
        assert!(builder.metadata().relational().find_sequence("Ids", None).is_none());
        assert!(builder
            .relational(Convention)
            .get_or_add_sequence("Ids", None)
            .unwrap()
            .is_none());
        assert!(!builder.relational(Explicit).remove_sequence("Missing", None).unwrap());
    }

    #[test]
    fn test_provider_sequence_wins() {
        let config = BuilderConfig::new().with_provider("SqlServer");
        let mut builder = ModelBuilder::with_config(ConventionSet::new(), config);
        builder
            .relational(Explicit)
            .get_or_add_sequence("Ids", None)
            .unwrap()
            .unwrap()
            .increment_by(1)
            .unwrap();
        builder
            .relational(Explicit)
            .for_provider()
            .get_or_add_sequence("Ids", None)
            .unwrap()
            .unwrap()
            .increment_by(50)
            .unwrap();
        builder
            .relational(Explicit)
            .get_or_add_sequence("Other", Some("audit"))
            .unwrap()
            .unwrap();

        let relational = builder.metadata().relational();
        assert_eq!(relational.find_sequence("Ids", None).unwrap().increment_by, 50);
        let names: Vec<(String, Option<String>)> = relational
            .sequences()
            .into_iter()
            .map(|s| (s.name, s.schema))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Ids".to_string(), None),
                ("Other".to_string(), Some("audit".to_string())),
            ]
        );
    }
}
