use miniweb::prelude::*;

fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry.register(
        TableSchema::new("authors")
            .column("id", ColumnType::Serial)
            .column("name", ColumnType::Varchar(100))
            .has_many("books", "books", "author_id"),
    );
    registry.register(
        TableSchema::new("books")
            .column("id", ColumnType::Serial)
            .column("author_id", ColumnType::Integer)
            .column("title", ColumnType::Text)
            .column("meta", ColumnType::Jsonb)
            .has_one("author", "authors", "author_id"),
    );
    registry
}

fn orm() -> Orm {
    let db = Database::new("sqlite::memory:", false).unwrap();
    let orm = Orm::new(db, registry());
    orm.table("authors").unwrap().create_table().unwrap();
    orm.table("books").unwrap().create_table().unwrap();
    orm
}

#[test]
fn bulk_queue_flushes_below_threshold_on_demand() {
    let orm = orm();
    let books = orm.table("books").unwrap();

    for i in 0..10 {
        orm.bulk()
            .queue(
                "books",
                Record::new()
                    .with("author_id", 1i64)
                    .with("title", format!("Book {i}")),
            )
            .unwrap();
    }
    // Nothing written until the explicit flush.
    assert_eq!(books.all().count().unwrap(), 0);

    orm.bulk().flush().unwrap();
    assert_eq!(books.all().count().unwrap(), 10);
}

#[test]
fn bulk_queue_flushes_itself_at_the_threshold() {
    let db = Database::new("sqlite::memory:", false).unwrap();
    let orm = Orm::new(db.clone(), registry());
    orm.table("books").unwrap().create_table().unwrap();

    let bulk = miniweb::BulkInserter::new(db, std::sync::Arc::new(registry())).with_threshold(5);
    for i in 0..7 {
        bulk.queue("books", Record::new().with("title", format!("Book {i}")))
            .unwrap();
    }

    let books = orm.table("books").unwrap();
    assert_eq!(books.all().count().unwrap(), 5);
    assert_eq!(bulk.pending("books"), 2);

    bulk.flush().unwrap();
    assert_eq!(books.all().count().unwrap(), 7);
}

#[test]
fn relations_traverse_both_directions() {
    let orm = orm();
    let authors = orm.table("authors").unwrap();
    let books = orm.table("books").unwrap();

    let ada = authors.insert(Record::new().with("name", "Ada")).unwrap();
    let ada_id = ada.get_named::<i64>("id").unwrap();
    for title in ["Notes", "Diagrams"] {
        books
            .insert(
                Record::new()
                    .with("author_id", ada_id)
                    .with("title", title)
                    .with("meta", serde_json::json!({"lang": "en"})),
            )
            .unwrap();
    }

    let shelf = match ada.related("books").unwrap() {
        Related::Many(rowset) => rowset,
        Related::One(_) => panic!("expected has-many"),
    };
    assert_eq!(shelf.count().unwrap(), 2);

    let notes = shelf
        .search(SearchTerm::eq("title", "Notes"))
        .first()
        .unwrap()
        .unwrap();
    assert_eq!(
        notes.get("meta"),
        Some(&Value::Json(serde_json::json!({"lang": "en"})))
    );

    match notes.related("author").unwrap() {
        Related::One(Some(author)) => {
            assert_eq!(author.get_named::<String>("name").unwrap(), "Ada");
        }
        _ => panic!("expected has-one"),
    }
}

#[test]
fn rowsets_stay_deferred_across_writes() {
    let orm = orm();
    let books = orm.table("books").unwrap();

    let pending = books.all().search(SearchTerm::eq("title", "Late"));
    assert_eq!(pending.count().unwrap(), 0);

    books.insert(Record::new().with("title", "Late")).unwrap();
    // The same rowset sees the new row because it runs at consumption.
    assert_eq!(pending.count().unwrap(), 1);
}
