use crate::error::{Error, Result};
use crate::registry::Registry;

/// Validate that every cross-entity reference resolves within the registry.
///
/// This checks:
/// - foreign key targets are registered entities
/// - many-to-many targets are registered entities
pub(crate) fn validate_references(registry: &Registry) -> Result<()> {
    for schema in registry.iter() {
        for column in schema.columns() {
            if let Some(target) = column.field.foreign_key_target() {
                if !registry.contains(target) {
                    return Err(Error::schema(
                        schema.name(),
                        format!(
                            "foreign key `{}` references unknown entity `{target}`",
                            column.name
                        ),
                    ));
                }
            }
        }

        for relation in schema.many_to_many() {
            if !registry.contains(&relation.to) {
                return Err(Error::schema(
                    schema.name(),
                    format!(
                        "many-to-many `{}` references unknown entity `{}`",
                        relation.field, relation.to
                    ),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_unknown_foreign_key_target() {
        let mut registry = Registry::new();
        registry
            .declare(
                "Orders",
                "id: IntegerField(primary_key=True)\nguest_id: ForeignKey(to=Guest)",
            )
            .unwrap();

        let err = validate_references(&registry).unwrap_err();
        assert!(
            err.to_string()
                .contains("foreign key `guest_id` references unknown entity `Guest`")
        );

        registry
            .declare("Guest", "id: IntegerField(primary_key=True)")
            .unwrap();
        assert!(validate_references(&registry).is_ok());
    }

    #[test]
    fn reports_unknown_many_to_many_target() {
        let mut registry = Registry::new();
        registry
            .declare("Owner", "tags: ManyToManyField(to=Tag)")
            .unwrap();

        let err = validate_references(&registry).unwrap_err();
        assert!(matches!(err, Error::Schema { ref entity, .. } if entity == "Owner"));
    }
}
