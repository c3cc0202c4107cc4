//! Write facades for the relational facets.

use super::names::RelationalFacet;
use crate::builder::ModelBuilder;
use crate::error::{MetadataError, Result};
use crate::model::{ElementRef, EntityTypeId, PropertyId, Value};
use crate::source::ConfigurationSource;
use tracing::debug;

fn validate_name(
    builder: &ModelBuilder,
    element: ElementRef,
    facet: &'static str,
    name: Option<&str>,
) -> Result<()> {
    match name {
        Some("") => Err(MetadataError::EmptyName {
            element: builder.metadata().display_name(element),
            facet,
        }),
        _ => Ok(()),
    }
}

fn set_facet(
    builder: &mut ModelBuilder,
    element: ElementRef,
    facet: RelationalFacet,
    provider: Option<&str>,
    value: Option<Value>,
    source: ConfigurationSource,
) -> Result<bool> {
    let name = facet.annotation_name(provider);
    let outcome = builder.set_annotation(element, &name, value, source)?;
    // A write whose element was removed during dispatch did not take effect.
    Ok(outcome.accepted && !outcome.removed)
}

impl ModelBuilder {
    /// Relational facets of the model.
    pub fn relational(&mut self, source: ConfigurationSource) -> RelationalModelBuilder<'_> {
        RelationalModelBuilder {
            builder: self,
            source,
            provider: None,
        }
    }

    /// Relational facets of an entity type.
    pub fn relational_entity(
        &mut self,
        entity: EntityTypeId,
        source: ConfigurationSource,
    ) -> RelationalEntityTypeBuilder<'_> {
        RelationalEntityTypeBuilder::new(self, entity, source)
    }
}

/// Configures model-wide relational facets.
pub struct RelationalModelBuilder<'a> {
    pub(crate) builder: &'a mut ModelBuilder,
    pub(crate) source: ConfigurationSource,
    pub(crate) provider: Option<String>,
}

impl RelationalModelBuilder<'_> {
    /// Write provider annotations instead of the generic ones.
    pub fn for_provider(mut self) -> Self {
        self.provider = self.builder.config.provider_prefix.clone();
        self
    }

    /// Set or clear the default schema.
    pub fn default_schema(&mut self, schema: Option<&str>) -> Result<bool> {
        validate_name(self.builder, ElementRef::Model, "default schema", schema)?;
        set_facet(
            self.builder,
            ElementRef::Model,
            RelationalFacet::DefaultSchema,
            self.provider.as_deref(),
            schema.map(Value::from),
            self.source,
        )
    }
}

/// Configures the table mapping and discriminator of an entity type.
pub struct RelationalEntityTypeBuilder<'a> {
    pub(crate) builder: &'a mut ModelBuilder,
    pub(crate) entity: EntityTypeId,
    pub(crate) source: ConfigurationSource,
    pub(crate) provider: Option<String>,
}

impl<'a> RelationalEntityTypeBuilder<'a> {
    pub(crate) fn new(
        builder: &'a mut ModelBuilder,
        entity: EntityTypeId,
        source: ConfigurationSource,
    ) -> Self {
        Self {
            builder,
            entity,
            source,
            provider: None,
        }
    }

    /// Write provider annotations instead of the generic ones.
    pub fn for_provider(mut self) -> Self {
        self.provider = self.builder.config.provider_prefix.clone();
        self
    }

    pub(crate) fn annotation_name(&self, facet: RelationalFacet) -> String {
        facet.annotation_name(self.provider.as_deref())
    }

    fn element(&self) -> ElementRef {
        ElementRef::EntityType(self.entity)
    }

    /// Set or clear the table name.
    pub fn to_table(&mut self, name: Option<&str>) -> Result<bool> {
        validate_name(self.builder, self.element(), "table name", name)?;
        set_facet(
            self.builder,
            self.element(),
            RelationalFacet::TableName,
            self.provider.as_deref(),
            name.map(Value::from),
            self.source,
        )
    }

    /// Set or clear the schema.
    pub fn schema(&mut self, schema: Option<&str>) -> Result<bool> {
        validate_name(self.builder, self.element(), "schema", schema)?;
        set_facet(
            self.builder,
            self.element(),
            RelationalFacet::Schema,
            self.provider.as_deref(),
            schema.map(Value::from),
            self.source,
        )
    }

    /// Set table name and schema together.
    ///
    /// Either both facets are written or neither. A facet already holding the
    /// requested value does not need to accept the write.
    pub fn to_table_in_schema(&mut self, name: Option<&str>, schema: Option<&str>) -> Result<bool> {
        validate_name(self.builder, self.element(), "table name", name)?;
        validate_name(self.builder, self.element(), "schema", schema)?;

        let table_key = self.annotation_name(RelationalFacet::TableName);
        let schema_key = self.annotation_name(RelationalFacet::Schema);
        let table_value = name.map(Value::from);
        let schema_value = schema.map(Value::from);
        let allow_same_source = self.builder.allow_same_source();

        let annotations = self
            .builder
            .metadata()
            .annotations_of(self.element())
            .ok_or_else(|| self.builder.element_not_found(self.element()))?;
        let table_pending = annotations.value(&table_key) != table_value.as_ref();
        let schema_pending = annotations.value(&schema_key) != schema_value.as_ref();

        let table_ok = !table_pending
            || annotations.can_set(&table_key, table_value.as_ref(), self.source, allow_same_source);
        let schema_ok = !schema_pending
            || annotations.can_set(&schema_key, schema_value.as_ref(), self.source, allow_same_source);
        if !(table_ok && schema_ok) {
            debug!(
                entity = %self.builder.metadata().display_name(self.element()),
                source = %self.source,
                "table mapping write rejected"
            );
            return Ok(false);
        }

        if table_pending {
            let outcome = self
                .builder
                .set_annotation(self.element(), &table_key, table_value, self.source)?;
            if !outcome.accepted || outcome.removed {
                return Ok(false);
            }
        }
        if schema_pending {
            let outcome = self
                .builder
                .set_annotation(self.element(), &schema_key, schema_value, self.source)?;
            return Ok(outcome.accepted && !outcome.removed);
        }
        Ok(true)
    }
}

/// Configures the column mapping of a property.
pub struct RelationalPropertyBuilder<'a> {
    builder: &'a mut ModelBuilder,
    property: PropertyId,
    source: ConfigurationSource,
    provider: Option<String>,
}

impl<'a> RelationalPropertyBuilder<'a> {
    pub(crate) fn new(
        builder: &'a mut ModelBuilder,
        property: PropertyId,
        source: ConfigurationSource,
    ) -> Self {
        Self {
            builder,
            property,
            source,
            provider: None,
        }
    }

    /// Write provider annotations instead of the generic ones.
    pub fn for_provider(mut self) -> Self {
        self.provider = self.builder.config.provider_prefix.clone();
        self
    }

    fn set(&mut self, facet: RelationalFacet, value: Option<Value>) -> Result<bool> {
        set_facet(
            self.builder,
            ElementRef::Property(self.property),
            facet,
            self.provider.as_deref(),
            value,
            self.source,
        )
    }

    /// Set or clear the column name.
    pub fn column_name(&mut self, name: Option<&str>) -> Result<bool> {
        validate_name(self.builder, ElementRef::Property(self.property), "column name", name)?;
        self.set(RelationalFacet::ColumnName, name.map(Value::from))
    }

    /// Set or clear the column store type.
    pub fn column_type(&mut self, store_type: Option<&str>) -> Result<bool> {
        validate_name(self.builder, ElementRef::Property(self.property), "column type", store_type)?;
        self.set(RelationalFacet::ColumnType, store_type.map(Value::from))
    }

    /// Set or clear the column default value.
    pub fn default_value(&mut self, value: Option<Value>) -> Result<bool> {
        self.set(RelationalFacet::DefaultValue, value)
    }

    /// Set or clear the column default SQL.
    pub fn generated_value_sql(&mut self, sql: Option<&str>) -> Result<bool> {
        validate_name(self.builder, ElementRef::Property(self.property), "default SQL", sql)?;
        self.set(RelationalFacet::GeneratedValueSql, sql.map(Value::from))
    }
}

/// Configures the constraint or index name of a key, index or foreign key.
pub struct RelationalNameBuilder<'a> {
    builder: &'a mut ModelBuilder,
    element: ElementRef,
    source: ConfigurationSource,
    provider: Option<String>,
}

impl<'a> RelationalNameBuilder<'a> {
    pub(crate) fn new(
        builder: &'a mut ModelBuilder,
        element: ElementRef,
        source: ConfigurationSource,
    ) -> Self {
        Self {
            builder,
            element,
            source,
            provider: None,
        }
    }

    /// Write provider annotations instead of the generic ones.
    pub fn for_provider(mut self) -> Self {
        self.provider = self.builder.config.provider_prefix.clone();
        self
    }

    /// Set or clear the name.
    pub fn name(&mut self, name: Option<&str>) -> Result<bool> {
        validate_name(self.builder, self.element, "name", name)?;
        set_facet(
            self.builder,
            self.element,
            RelationalFacet::Name,
            self.provider.as_deref(),
            name.map(Value::from),
            self.source,
        )
    }
}
