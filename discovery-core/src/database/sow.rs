use super::{now, touch_project, Database};
use crate::error::StorageError;
use crate::types::{RequirementMatch, SowData};
use rusqlite::{params, OptionalExtension};
use std::collections::BTreeMap;

impl Database {
    /// Upsert the project's single SOW row and replace its requirement matches.
    ///
    /// Matches from any previous parse are deleted before the new set is
    /// inserted, all inside one transaction. Returns false on failure.
    pub fn put_sow_data(&self, project_id: i64, sow_data: &SowData) -> bool {
        match self.try_put_sow_data(project_id, sow_data) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(project_id, error = %e, "Failed to store SOW data");
                false
            }
        }
    }

    fn try_put_sow_data(&self, project_id: i64, sow_data: &SowData) -> Result<(), StorageError> {
        let sections = serde_json::to_string(&sow_data.sections)?;
        let requirements = serde_json::to_string(&sow_data.requirements)?;
        let boundaries = serde_json::to_string(&sow_data.boundaries)?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO sow_data (project_id, sections, requirements, boundaries, full_text, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(project_id) DO UPDATE SET
                    sections = excluded.sections,
                    requirements = excluded.requirements,
                    boundaries = excluded.boundaries,
                    full_text = excluded.full_text,
                    updated_at = excluded.updated_at",
            params![
                project_id,
                sections,
                requirements,
                boundaries,
                sow_data.full_text,
                now()
            ],
        )?;

        tx.execute(
            "DELETE FROM requirement_matches WHERE project_id = ?1",
            params![project_id],
        )?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO requirement_matches (project_id, requirement_id, source_file, keyword, context)
                    VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (requirement_id, matches) in &sow_data.requirement_matches {
                for m in matches {
                    insert.execute(params![
                        project_id,
                        requirement_id,
                        m.source_file,
                        m.keyword,
                        m.context
                    ])?;
                }
            }
        }

        touch_project(&tx, project_id)?;
        tx.commit()?;

        tracing::debug!(
            project_id,
            requirements = sow_data.requirements.len(),
            matched_requirements = sow_data.requirement_matches.len(),
            "Stored SOW data"
        );
        Ok(())
    }

    pub fn get_sow_data(&self, project_id: i64) -> Result<Option<SowData>, StorageError> {
        let conn = self.conn()?;

        let row = conn
            .query_row(
                "SELECT sections, requirements, boundaries, full_text FROM sow_data WHERE project_id = ?1",
                params![project_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((sections, requirements, boundaries, full_text)) = row else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT requirement_id, source_file, keyword, context FROM requirement_matches
                WHERE project_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![project_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                RequirementMatch {
                    source_file: row.get(1)?,
                    keyword: row.get(2)?,
                    context: row.get(3)?,
                },
            ))
        })?;

        let mut requirement_matches: BTreeMap<String, Vec<RequirementMatch>> = BTreeMap::new();
        for row in rows {
            let (requirement_id, m) = row?;
            requirement_matches.entry(requirement_id).or_default().push(m);
        }

        Ok(Some(SowData {
            sections: serde_json::from_str(&sections)?,
            requirements: serde_json::from_str(&requirements)?,
            boundaries: serde_json::from_str(&boundaries)?,
            requirement_matches,
            full_text,
        }))
    }
}
