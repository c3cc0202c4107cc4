//! Relational annotation names.

/// Prefix of the provider-independent relational annotations.
pub const RELATIONAL_PREFIX: &str = "Relational";

/// Default name of a discriminator property created without one.
pub const DEFAULT_DISCRIMINATOR_NAME: &str = "Discriminator";

/// A relational facet stored as an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationalFacet {
    /// Table an entity type maps to.
    TableName,
    /// Schema of the table.
    Schema,
    /// Column a property maps to.
    ColumnName,
    /// Store type of the column.
    ColumnType,
    /// Column default value.
    DefaultValue,
    /// Column default SQL expression.
    GeneratedValueSql,
    /// Name of the discriminator property, on a hierarchy root.
    DiscriminatorProperty,
    /// Discriminator value of an entity type.
    DiscriminatorValue,
    /// Constraint or index name of a key, index or foreign key.
    Name,
    /// Schema used by entity types without one.
    DefaultSchema,
}

impl RelationalFacet {
    /// Annotation name suffix.
    pub const fn suffix(self) -> &'static str {
        match self {
            RelationalFacet::TableName => "TableName",
            RelationalFacet::Schema => "Schema",
            RelationalFacet::ColumnName => "ColumnName",
            RelationalFacet::ColumnType => "ColumnType",
            RelationalFacet::DefaultValue => "DefaultValue",
            RelationalFacet::GeneratedValueSql => "GeneratedValueSql",
            RelationalFacet::DiscriminatorProperty => "DiscriminatorProperty",
            RelationalFacet::DiscriminatorValue => "DiscriminatorValue",
            RelationalFacet::Name => "Name",
            RelationalFacet::DefaultSchema => "DefaultSchema",
        }
    }

    /// Annotation name under `prefix`, or under [`RELATIONAL_PREFIX`] when
    /// no provider is given.
    pub fn annotation_name(self, prefix: Option<&str>) -> String {
        format!("{}:{}", prefix.unwrap_or(RELATIONAL_PREFIX), self.suffix())
    }

    /// Check whether `name` stores this facet, generically or for `provider`.
    pub fn matches(self, name: &str, provider: Option<&str>) -> bool {
        match name.split_once(':') {
            Some((prefix, suffix)) => {
                suffix == self.suffix()
                    && (prefix == RELATIONAL_PREFIX || Some(prefix) == provider)
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_names() {
        assert_eq!(
            RelationalFacet::TableName.annotation_name(None),
            "Relational:TableName"
        );
        assert_eq!(
            RelationalFacet::Schema.annotation_name(Some("SqlServer")),
            "SqlServer:Schema"
        );
    }

    #[test]
    fn test_matches() {
        let facet = RelationalFacet::TableName;
        assert!(facet.matches("Relational:TableName", None));
        assert!(facet.matches("SqlServer:TableName", Some("SqlServer")));
        assert!(!facet.matches("Sqlite:TableName", Some("SqlServer")));
        assert!(!facet.matches("Relational:Schema", None));
        assert!(!facet.matches("TableName", None));
    }
}
