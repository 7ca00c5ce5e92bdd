/// Create supplementary documents and the answers found in them
pub fn migration() -> String {
    r#"
CREATE TABLE additional_documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    filename TEXT NOT NULL,
    file_path TEXT NOT NULL,
    file_size INTEGER,
    uploaded_at INTEGER NOT NULL,
    processed_at INTEGER,
    processing_status TEXT NOT NULL DEFAULT 'pending' CHECK (processing_status IN ('pending', 'completed', 'failed')),
    content_extracted INTEGER NOT NULL DEFAULT 0,
    answers_found INTEGER NOT NULL DEFAULT 0,
    questions_generated INTEGER NOT NULL DEFAULT 0,
    requirement_matches INTEGER NOT NULL DEFAULT 0,
    notes TEXT,
    FOREIGN KEY (project_id) REFERENCES projects (id)
);

CREATE TABLE document_answers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    question_id INTEGER NOT NULL,
    document_id INTEGER NOT NULL,
    answer_text TEXT NOT NULL,
    confidence REAL NOT NULL CHECK (confidence BETWEEN 0.0 AND 1.0),
    document_section TEXT,
    created_at INTEGER NOT NULL,
    FOREIGN KEY (question_id) REFERENCES questions (id),
    FOREIGN KEY (document_id) REFERENCES additional_documents (id)
);

CREATE INDEX idx_document_answers_question ON document_answers(question_id, created_at);
"#
    .to_string()
}
