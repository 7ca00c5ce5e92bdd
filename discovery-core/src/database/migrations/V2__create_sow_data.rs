/// Create the sow_data table and its requirement_matches side table
pub fn migration() -> String {
    r#"
CREATE TABLE sow_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL UNIQUE,
    sections TEXT NOT NULL,
    requirements TEXT NOT NULL,
    boundaries TEXT NOT NULL,
    full_text TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    FOREIGN KEY (project_id) REFERENCES projects (id)
);

CREATE TABLE requirement_matches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    requirement_id TEXT NOT NULL,
    source_file TEXT NOT NULL,
    keyword TEXT NOT NULL,
    context TEXT NOT NULL,
    FOREIGN KEY (project_id) REFERENCES projects (id)
);

CREATE INDEX idx_requirement_matches_project
    ON requirement_matches(project_id, requirement_id);
"#
    .to_string()
}
