/// Create the questions table; follow-ups point at their parent question
pub fn migration() -> String {
    r#"
CREATE TABLE questions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    parent_question_id INTEGER,
    question TEXT NOT NULL CHECK (length(trim(question)) > 0),
    context TEXT NOT NULL DEFAULT '',
    source TEXT NOT NULL DEFAULT '',
    source_text TEXT NOT NULL DEFAULT '',
    priority INTEGER NOT NULL DEFAULT 3 CHECK (priority BETWEEN 1 AND 3),
    target_stakeholder TEXT,
    status TEXT NOT NULL DEFAULT 'unanswered' CHECK (status IN ('unanswered', 'partially_answered', 'answered')),
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    FOREIGN KEY (project_id) REFERENCES projects (id),
    FOREIGN KEY (parent_question_id) REFERENCES questions (id)
);

CREATE INDEX idx_questions_project_status ON questions(project_id, status, priority);
"#
    .to_string()
}
