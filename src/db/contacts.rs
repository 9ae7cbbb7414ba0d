use super::*;

impl LeadDb {
    // =========================================================================
    // Contact points
    // =========================================================================

    fn map_contact_point_row(row: &rusqlite::Row) -> rusqlite::Result<DbContactPoint> {
        Ok(DbContactPoint {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            lead_id: row.get(2)?,
            kind: row.get(3)?,
            note: row.get(4)?,
            occurred_at: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    pub fn insert_contact_point(&self, contact: &DbContactPoint) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO contact_points (id, owner_id, lead_id, kind, note, occurred_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                contact.id,
                contact.owner_id,
                contact.lead_id,
                contact.kind,
                contact.note,
                contact.occurred_at,
                contact.created_at,
            ],
        )?;
        Ok(())
    }

    /// Contact history for a lead, most recent first.
    pub fn list_contact_points(
        &self,
        owner_id: &str,
        lead_id: &str,
    ) -> Result<Vec<DbContactPoint>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, lead_id, kind, note, occurred_at, created_at
             FROM contact_points
             WHERE owner_id = ?1 AND lead_id = ?2
             ORDER BY occurred_at DESC, id ASC",
        )?;

        let rows = stmt.query_map(params![owner_id, lead_id], Self::map_contact_point_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
