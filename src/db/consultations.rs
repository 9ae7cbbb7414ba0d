use super::*;

/// Shared predicate over the `consultations` table. Same parameter layout as
/// the task predicate; only the time column differs.
const CONSULTATION_PREDICATE: &str = "owner_id = ?1
       AND (?2 IS NULL OR status = ?2)
       AND (?3 IS NULL OR scheduled_at >= ?3)
       AND (?4 IS NULL OR scheduled_at < ?4)";

const CONSULTATION_COLUMNS: &str = "id, owner_id, lead_id, scheduled_at, location, status,
            outcome, completed_at, created_at, updated_at";

impl LeadDb {
    // =========================================================================
    // Consultations
    // =========================================================================

    fn map_consultation_row(row: &rusqlite::Row) -> rusqlite::Result<DbConsultation> {
        Ok(DbConsultation {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            lead_id: row.get(2)?,
            scheduled_at: row.get(3)?,
            location: row.get(4)?,
            status: row.get(5)?,
            outcome: row.get(6)?,
            completed_at: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    pub fn insert_consultation(&self, consultation: &DbConsultation) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO consultations (
                id, owner_id, lead_id, scheduled_at, location, status, outcome,
                completed_at, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                consultation.id,
                consultation.owner_id,
                consultation.lead_id,
                consultation.scheduled_at,
                consultation.location,
                consultation.status,
                consultation.outcome,
                consultation.completed_at,
                consultation.created_at,
                consultation.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_consultation(
        &self,
        owner_id: &str,
        id: &str,
    ) -> Result<Option<DbConsultation>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CONSULTATION_COLUMNS} FROM consultations WHERE id = ?1 AND owner_id = ?2"
        ))?;

        let mut rows = stmt.query_map(params![id, owner_id], Self::map_consultation_row)?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Mark a consultation completed, recording an optional outcome note.
    /// Fires at most once; repeat calls return false and leave the first
    /// outcome in place.
    pub fn complete_consultation(
        &self,
        owner_id: &str,
        id: &str,
        outcome: Option<&str>,
        now: &str,
    ) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE consultations
             SET status = 'completed', outcome = ?3, completed_at = ?4, updated_at = ?4
             WHERE id = ?1 AND owner_id = ?2 AND status = 'pending'",
            params![id, owner_id, outcome, now],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_consultation(&self, owner_id: &str, id: &str) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "DELETE FROM consultations WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id],
        )?;
        Ok(changed > 0)
    }

    /// One page of consultations matching the selector, soonest first with
    /// id as the tiebreak.
    pub fn list_consultations_page(
        &self,
        selector: &ScheduleSelector,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<DbConsultation>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CONSULTATION_COLUMNS} FROM consultations
             WHERE {CONSULTATION_PREDICATE}
             ORDER BY scheduled_at ASC, id ASC
             LIMIT ?5 OFFSET ?6"
        ))?;

        let base = selector.bind();
        let bound: [&dyn rusqlite::ToSql; 6] =
            [base[0], base[1], base[2], base[3], &limit, &offset];
        let rows = stmt.query_map(&bound[..], Self::map_consultation_row)?;

        let mut consultations = Vec::new();
        for row in rows {
            consultations.push(row?);
        }
        Ok(consultations)
    }

    pub fn count_consultations(&self, selector: &ScheduleSelector) -> Result<i64, DbError> {
        let bound = selector.bind();
        let count = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM consultations WHERE {CONSULTATION_PREDICATE}"),
            &bound[..],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
