use crate::database::migrations::{has_discovery_schema, run_discovery_migrations};
use rusqlite::Connection;

#[test]
fn test_discovery_migrations() {
    let mut conn = Connection::open_in_memory().unwrap();

    assert!(!has_discovery_schema(&conn).unwrap());
    run_discovery_migrations(&mut conn).expect("Migrations should succeed");
    assert!(has_discovery_schema(&conn).unwrap());

    let tables: Vec<String> = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    for table in [
        "projects",
        "sow_data",
        "requirement_matches",
        "questions",
        "transcripts",
        "answers",
        "additional_documents",
        "document_answers",
        "new_information",
        "refinery_schema_history",
    ] {
        assert!(tables.contains(&table.to_string()), "missing table {table}");
    }
}

#[test]
fn test_migrations_are_idempotent() {
    let mut conn = Connection::open_in_memory().unwrap();

    run_discovery_migrations(&mut conn).expect("First migration should succeed");
    run_discovery_migrations(&mut conn).expect("Second migration should succeed");

    let applied: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM refinery_schema_history",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(applied, 7);
}

#[test]
fn test_blank_question_text_is_rejected() {
    let mut conn = Connection::open_in_memory().unwrap();
    run_discovery_migrations(&mut conn).unwrap();

    conn.execute(
        "INSERT INTO projects (name, sow_path, created_at, updated_at) VALUES ('p', 's', 0, 0)",
        [],
    )
    .unwrap();

    let result = conn.execute(
        "INSERT INTO questions (project_id, question, created_at, updated_at) VALUES (1, '   ', 0, 0)",
        [],
    );
    assert!(result.is_err());
}
