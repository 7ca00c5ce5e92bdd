use refinery::embed_migrations;

// Embed migrations from the migrations directory
embed_migrations!("src/database/migrations");

/// Run the discovery schema migrations on a database connection
///
/// Creates the tables backing the question/answer/requirement graph:
/// - projects and sow_data (with requirement_matches)
/// - questions
/// - transcripts and answers
/// - additional_documents and document_answers
/// - new_information
/// - a shared insertion order across both answer tables
///
/// Public so that callers embedding the engine can migrate their own
/// connection before handing it over.
///
/// # Example
/// ```no_run
/// use rusqlite::Connection;
/// use discovery_core::database::migrations::run_discovery_migrations;
///
/// let mut conn = Connection::open("discovery.db")?;
/// run_discovery_migrations(&mut conn)?;
/// # Ok::<(), discovery_core::StorageError>(())
/// ```
pub fn run_discovery_migrations<C>(conn: &mut C) -> Result<(), crate::StorageError>
where
    C: refinery::Migrate,
{
    migrations::runner().run(conn)?;
    Ok(())
}

/// Check if the discovery tables exist in a database
pub fn has_discovery_schema(conn: &rusqlite::Connection) -> Result<bool, crate::StorageError> {
    let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name='questions'")?;
    Ok(stmt.exists([])?)
}
