mod common;

use common::{MemoryExecutor, UnreachableExecutor};
use tabula_core::{Error, Registry, Store, Value, Violation};

const MENU: &str = "
    id: IntegerField(primary_key=True)
    name: CharField(max_length=100)
    prices: FloatField(min_value=1, max_value=1000)
";

const BARISTA: &str = "
    id: IntegerField(primary_key=True)
    name: CharField(max_length=255, words_count=3)
    work_time: IntegerField(min_value=0, max_value=160)
";

const PERSONAL_ORDER: &str = "
    id: IntegerField(primary_key=True)
    count: IntegerField(min_value=1, max_value=5)
    menu_id: ForeignKey(to=Menu)
";

fn cafe() -> Store<MemoryExecutor> {
    let mut registry = Registry::new();
    registry.declare("Personal_Order", PERSONAL_ORDER).unwrap();
    registry.declare("Menu", MENU).unwrap();
    registry.declare("Barista", BARISTA).unwrap();

    let store = Store::new(registry, MemoryExecutor::default());
    store.create_all_tables().unwrap();
    store
}

fn latte(store: &Store<MemoryExecutor>) -> tabula_core::Instance {
    store
        .registry()
        .instance(
            "Menu",
            [
                ("id", Value::Integer(1)),
                ("name", Value::text("Latte")),
                ("prices", Value::Float(259.5)),
            ],
        )
        .unwrap()
}

#[test]
fn menu_rejects_price_above_maximum() {
    let store = cafe();
    let err = store
        .registry()
        .instance(
            "Menu",
            [
                ("id", Value::Integer(1)),
                ("name", Value::text("Latte")),
                ("prices", Value::Integer(1500)),
            ],
        )
        .unwrap_err();

    match err {
        Error::ConstraintViolation {
            entity,
            field,
            violation: Violation::AboveMax { max, .. },
        } => {
            assert_eq!(entity, "Menu");
            assert_eq!(field, "prices");
            assert_eq!(max, Value::Float(1000.0));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn save_then_all_round_trips_every_column() {
    let store = cafe();
    let latte = latte(&store);
    store.save(&latte).unwrap();

    let menu = store.all("Menu").unwrap();
    assert_eq!(menu.len(), 1);
    assert_eq!(menu[0], latte);
    assert_eq!(menu[0].get("prices").unwrap(), &Value::Float(259.5));
}

#[test]
fn integer_price_reads_back_as_float() {
    let store = cafe();
    let americano = store
        .registry()
        .instance(
            "Menu",
            [
                ("id", Value::Integer(3)),
                ("name", Value::text("Americano")),
                ("prices", Value::Integer(300)),
            ],
        )
        .unwrap();
    assert_eq!(americano.get("prices").unwrap(), &Value::Float(300.0));
    store.save(&americano).unwrap();

    let statement = store.executor().log.borrow().last().cloned().unwrap();
    assert_eq!(statement.params[2], Value::Float(300.0));

    let menu = store.all("Menu").unwrap();
    assert_eq!(menu, vec![americano]);
}

#[test]
fn all_on_empty_table_is_empty() {
    let store = cafe();
    assert!(store.all("Barista").unwrap().is_empty());
}

#[test]
fn get_by_primary_key() {
    let store = cafe();
    store.save(&latte(&store)).unwrap();
    let espresso = store
        .registry()
        .instance(
            "Menu",
            [
                ("id", Value::Integer(2)),
                ("name", Value::text("Espresso")),
                ("prices", Value::Float(150.0)),
            ],
        )
        .unwrap();
    store.save(&espresso).unwrap();

    let found = store
        .get("Menu", [("id", Value::Integer(2))])
        .unwrap()
        .expect("espresso");
    assert_eq!(found.get("name").unwrap(), &Value::text("Espresso"));

    let missing = store.get("Menu", [("id", Value::Integer(3))]).unwrap();
    assert!(missing.is_none());
}

#[test]
fn get_matches_null_columns() {
    let store = cafe();
    store.save(&latte(&store)).unwrap();
    let unnamed = store
        .registry()
        .instance(
            "Menu",
            [
                ("id", Value::Integer(2)),
                ("name", Value::Null),
                ("prices", Value::Float(10.0)),
            ],
        )
        .unwrap();
    store.save(&unnamed).unwrap();

    let found = store
        .get("Menu", [("name", Value::Null)])
        .unwrap()
        .expect("row without a name");
    assert_eq!(found.get("id").unwrap(), &Value::Integer(2));

    let executed = store.executor().executed();
    assert_eq!(
        executed.last().unwrap(),
        "SELECT * FROM menu WHERE name IS NULL"
    );
}

#[test]
fn get_rejects_unknown_filters() {
    let store = cafe();
    let err = store
        .get("Menu", [("price", Value::Float(1.0))])
        .unwrap_err();
    assert!(matches!(err, Error::UnknownField { .. }));
}

#[test]
fn unknown_entity_is_reported() {
    let store = cafe();
    assert!(matches!(store.all("Guest"), Err(Error::UnknownEntity(_))));
}

#[test]
fn table_creation_is_idempotent() {
    let store = cafe();
    store.save(&latte(&store)).unwrap();

    store.create_all_tables().unwrap();
    store.create_table("Menu").unwrap();

    let tables = store.executor().tables.borrow();
    assert_eq!(tables.len(), 3);
    assert_eq!(tables["menu"].rows.len(), 1);
}

#[test]
fn referenced_tables_are_created_first() {
    let store = cafe();
    let executed = store.executor().executed();
    let position = |table: &str| {
        executed
            .iter()
            .position(|sql| sql.starts_with(&format!("CREATE TABLE IF NOT EXISTS {table} (")))
            .unwrap()
    };
    assert!(position("menu") < position("personal_order"));
}

#[test]
fn owner_gets_junction_table() {
    let mut registry = Registry::new();
    registry
        .declare("RelatedModel", "id: IntegerField(primary_key=True)")
        .unwrap();
    registry
        .declare(
            "Owner",
            "id: IntegerField(primary_key=True)\n\
             related_models: ManyToManyField(to='RelatedModel')",
        )
        .unwrap();
    let store = Store::new(registry, MemoryExecutor::default());
    store.create_all_tables().unwrap();

    let junction = store
        .executor()
        .table("owner_has_relatedmodel")
        .expect("junction table");
    assert_eq!(junction.columns, vec!["id", "owner_id", "relatedmodel_id"]);

    let link = store
        .registry()
        .instance(
            "owner_has_relatedmodel",
            [
                ("owner_id", Value::Integer(1)),
                ("relatedmodel_id", Value::Integer(4)),
            ],
        )
        .unwrap();
    store.save(&link).unwrap();

    let links = store.all("Owner_has_RelatedModel").unwrap();
    assert_eq!(links[0].get("id").unwrap(), &Value::Integer(1));
}

#[test]
fn dangling_foreign_key_fails_before_any_statement() {
    let mut registry = Registry::new();
    registry.declare("Personal_Order", PERSONAL_ORDER).unwrap();
    let store = Store::new(registry, MemoryExecutor::default());

    let err = store.create_all_tables().unwrap_err();
    assert!(matches!(err, Error::Schema { .. }));
    assert!(store.executor().executed().is_empty());
}

#[test]
fn raw_statements_pass_through() {
    let store = cafe();
    store.save(&latte(&store)).unwrap();

    let rows = store
        .execute("SELECT * FROM menu WHERE id = $1", vec![Value::Integer(1)])
        .unwrap()
        .expect("result set");
    assert_eq!(rows.columns, vec!["id", "name", "prices"]);
    assert_eq!(rows.rows.len(), 1);

    let none = store
        .execute("CREATE TABLE IF NOT EXISTS audit (entry VARCHAR(10))", Vec::new())
        .unwrap();
    assert!(none.is_none());
}

#[test]
fn store_failures_are_returned() {
    let mut registry = Registry::new();
    registry.declare("Menu", MENU).unwrap();
    let store = Store::new(registry, UnreachableExecutor);

    let latte = store
        .registry()
        .instance("Menu", [("id", Value::Integer(1)), ("name", Value::text("Latte")), ("prices", Value::Float(2.0))])
        .unwrap();
    assert!(matches!(store.save(&latte), Err(Error::Connection(_))));
    assert!(matches!(store.all("Menu"), Err(Error::Connection(_))));
}

#[test]
fn bounds_are_inclusive_for_every_numeric_field() {
    let store = cafe();
    let registry = store.registry();

    for (entity, field, low, high) in [
        ("Barista", "work_time", 0, 160),
        ("Personal_Order", "count", 1, 5),
        ("Menu", "prices", 1, 1000),
    ] {
        for ok in [low, high] {
            assert!(
                registry
                    .instance(entity, [(field, Value::Integer(ok))])
                    .is_ok(),
                "{entity}.{field} = {ok}"
            );
        }
        for bad in [low - 1, high + 1] {
            assert!(
                matches!(
                    registry.instance(entity, [(field, Value::Integer(bad))]),
                    Err(Error::ConstraintViolation { .. })
                ),
                "{entity}.{field} = {bad}"
            );
        }
    }
}

#[test]
fn barista_name_needs_three_words() {
    let store = cafe();
    let registry = store.registry();

    assert!(registry
        .instance("Barista", [("name", Value::text("Anna  Maria Petrova"))])
        .is_ok());
    for name in ["Anna", "Anna Maria", "Anna Maria Petrova Ivanovna"] {
        assert!(matches!(
            registry.instance("Barista", [("name", Value::text(name))]),
            Err(Error::ConstraintViolation {
                violation: Violation::WordCount { expected: 3, .. },
                ..
            })
        ));
    }
}
