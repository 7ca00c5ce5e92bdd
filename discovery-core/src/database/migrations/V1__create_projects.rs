/// Create the projects table, one row per discovery engagement
pub fn migration() -> String {
    r#"
CREATE TABLE projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    sow_path TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX idx_projects_name ON projects(name);
"#
    .to_string()
}
