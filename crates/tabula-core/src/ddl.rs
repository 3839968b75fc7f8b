//! `CREATE TABLE IF NOT EXISTS` statements derived from entity schemas.

use crate::schema::EntitySchema;

/// Referenced column of every foreign key.
pub const IDENTITY_COLUMN: &str = "id";

/// Table definition for the entity itself.
pub fn create_table(schema: &EntitySchema) -> String {
    let mut clauses = Vec::with_capacity(schema.columns().len() + 1);

    for column in schema.columns() {
        clauses.push(format!("{} {}", column.name, column.field.sql_type()));
        if let Some(target) = column.field.foreign_key_target() {
            clauses.push(format!(
                "FOREIGN KEY ({}) REFERENCES {}({IDENTITY_COLUMN})",
                column.name,
                target.to_lowercase()
            ));
        }
    }

    let primary_key = schema.primary_key();
    if !primary_key.is_empty() {
        clauses.push(format!("PRIMARY KEY ({})", primary_key.join(", ")));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        schema.table_name(),
        clauses.join(", ")
    )
}

/// One table definition per many-to-many relation.
pub fn create_junction_tables(schema: &EntitySchema) -> Vec<String> {
    schema
        .junction_schemas()
        .iter()
        .map(create_table)
        .collect()
}

/// The entity table followed by its junction tables.
pub fn create_statements(schema: &EntitySchema) -> Vec<String> {
    let mut statements = vec![create_table(schema)];
    statements.extend(create_junction_tables(schema));
    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_table() {
        let schema = EntitySchema::parse(
            "Menu",
            "id: IntegerField(primary_key=True)\n\
             name: CharField(max_length=100)\n\
             prices: FloatField(min_value=1, max_value=1000)",
        )
        .unwrap();

        assert_eq!(
            create_table(&schema),
            "CREATE TABLE IF NOT EXISTS menu (id INTEGER, name VARCHAR(100), prices FLOAT, PRIMARY KEY (id))"
        );
    }

    #[test]
    fn foreign_keys_follow_their_column() {
        let schema = EntitySchema::parse(
            "Orders",
            "id: IntegerField(primary_key=True)\n\
             order_date: CharField(max_length=10)\n\
             guest_id: ForeignKey(to=Guest)\n\
             barista_id: ForeignKey(to=Barista)",
        )
        .unwrap();

        assert_eq!(
            create_table(&schema),
            "CREATE TABLE IF NOT EXISTS orders (id INTEGER, order_date VARCHAR(10), \
             guest_id INTEGER, FOREIGN KEY (guest_id) REFERENCES guest(id), \
             barista_id INTEGER, FOREIGN KEY (barista_id) REFERENCES barista(id), \
             PRIMARY KEY (id))"
        );
    }

    #[test]
    fn composite_primary_key() {
        let schema = EntitySchema::parse(
            "Shift",
            "barista: CharField(max_length=30, primary_key=True)\n\
             day: IntegerField(primary_key=True)\n\
             hours: IntegerField()",
        )
        .unwrap();

        assert!(create_table(&schema).ends_with("PRIMARY KEY (barista, day))"));
    }

    #[test]
    fn table_without_primary_key() {
        let schema = EntitySchema::parse("Note", "text: CharField()").unwrap();
        assert_eq!(
            create_table(&schema),
            "CREATE TABLE IF NOT EXISTS note (text VARCHAR(255))"
        );
    }

    #[test]
    fn many_to_many_junction_table() {
        let schema = EntitySchema::parse(
            "Owner",
            "id: IntegerField(primary_key=True)\n\
             related_models: ManyToManyField(to='RelatedModel')",
        )
        .unwrap();

        let statements = create_statements(&schema);
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[0],
            "CREATE TABLE IF NOT EXISTS owner (id INTEGER, PRIMARY KEY (id))"
        );
        assert_eq!(
            statements[1],
            "CREATE TABLE IF NOT EXISTS owner_has_relatedmodel (\
             id INTEGER GENERATED BY DEFAULT AS IDENTITY, \
             owner_id INTEGER, FOREIGN KEY (owner_id) REFERENCES owner(id), \
             relatedmodel_id INTEGER, FOREIGN KEY (relatedmodel_id) REFERENCES relatedmodel(id), \
             PRIMARY KEY (id))"
        );
    }
}
