/// Create the new_information table for topics raised outside the SOW
pub fn migration() -> String {
    r#"
CREATE TABLE new_information (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    transcript_id INTEGER NOT NULL,
    topic TEXT NOT NULL,
    excerpt TEXT NOT NULL DEFAULT '',
    impact TEXT NOT NULL CHECK (impact IN ('new_requirement', 'scope_change', 'clarification', 'scope_creep')),
    priority INTEGER NOT NULL DEFAULT 3,
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'reviewed')),
    created_at INTEGER NOT NULL,
    FOREIGN KEY (project_id) REFERENCES projects (id),
    FOREIGN KEY (transcript_id) REFERENCES transcripts (id)
);
"#
    .to_string()
}
