/// Give answers from both provenances one shared insertion order
pub fn migration() -> String {
    r#"
ALTER TABLE answers ADD COLUMN seq INTEGER NOT NULL DEFAULT 0;
ALTER TABLE document_answers ADD COLUMN seq INTEGER NOT NULL DEFAULT 0;
"#
    .to_string()
}
