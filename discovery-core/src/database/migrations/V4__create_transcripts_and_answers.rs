/// Create meeting transcripts and the answers found in them
pub fn migration() -> String {
    r#"
CREATE TABLE transcripts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    meeting_date INTEGER NOT NULL,
    transcript_text TEXT NOT NULL,
    processed INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (project_id) REFERENCES projects (id)
);

CREATE TABLE answers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    question_id INTEGER NOT NULL,
    transcript_id INTEGER NOT NULL,
    answer_text TEXT NOT NULL,
    confidence REAL NOT NULL CHECK (confidence BETWEEN 0.0 AND 1.0),
    created_at INTEGER NOT NULL,
    FOREIGN KEY (question_id) REFERENCES questions (id),
    FOREIGN KEY (transcript_id) REFERENCES transcripts (id)
);

CREATE INDEX idx_answers_question ON answers(question_id, created_at);
"#
    .to_string()
}
