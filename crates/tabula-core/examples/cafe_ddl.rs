//! Declare a small cafe model and print its DDL, then the JSON Schema of
//! `EntitySchema` when run with `--json-schema`.

use schemars::schema_for;
use tabula_core::{EntitySchema, Registry, Result, ddl};

const ENTITIES: &[(&str, &str)] = &[
    (
        "Menu",
        "id: IntegerField(primary_key=True)
         name: CharField(max_length=100)
         prices: FloatField(min_value=1, max_value=1000)",
    ),
    (
        "Barista",
        "id: IntegerField(primary_key=True)
         name: CharField(words_count=3)
         work_time: IntegerField(min_value=0, max_value=160)",
    ),
    (
        "Personal_Order",
        "id: IntegerField(primary_key=True)
         count: IntegerField(min_value=1, max_value=5)
         menu_id: ForeignKey(to=Menu)
         barista_id: ForeignKey(to=Barista)",
    ),
];

fn main() -> Result<()> {
    if std::env::args().any(|arg| arg == "--json-schema") {
        let schema = schema_for!(EntitySchema);
        match serde_json::to_string_pretty(&schema) {
            Ok(json) => println!("{json}"),
            Err(err) => eprintln!("failed to encode json schema: {err}"),
        }
        return Ok(());
    }

    let mut registry = Registry::new();
    for (name, declaration) in ENTITIES {
        registry.declare(name, declaration)?;
    }
    registry.validate_references()?;
    for schema in registry.creation_order()? {
        println!("{};", ddl::create_table(schema));
    }
    Ok(())
}
