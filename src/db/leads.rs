use super::*;

/// Shared predicate over the `leads` table, bound by [`LeadSelector`].
///
/// Positional params: owner id, optional terminal status, non-terminal-only
/// flag, optional anchor window bounds. A NULL param disables its clause, so
/// the paged query and every count query run against the identical fragment.
const LEAD_PREDICATE: &str = "owner_id = ?1
       AND (?2 IS NULL OR terminal_status = ?2)
       AND (?3 = 0 OR terminal_status IS NULL)
       AND (?4 IS NULL OR COALESCE(last_contacted_at, imported_at) > ?4)
       AND (?5 IS NULL OR COALESCE(last_contacted_at, imported_at) <= ?5)";

const LEAD_COLUMNS: &str = "id, owner_id, first_name, last_name, phone, email, goals, notes,
            imported_at, last_contacted_at, terminal_status, terminal_at, updated_at";

impl LeadDb {
    // =========================================================================
    // Leads
    // =========================================================================

    fn map_lead_row(row: &rusqlite::Row) -> rusqlite::Result<DbLead> {
        Ok(DbLead {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            phone: row.get(4)?,
            email: row.get(5)?,
            goals: row.get(6)?,
            notes: row.get(7)?,
            imported_at: row.get(8)?,
            last_contacted_at: row.get(9)?,
            terminal_status: row.get(10)?,
            terminal_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    pub fn insert_lead(&self, lead: &DbLead) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO leads (
                id, owner_id, first_name, last_name, phone, email, goals, notes,
                imported_at, last_contacted_at, terminal_status, terminal_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                lead.id,
                lead.owner_id,
                lead.first_name,
                lead.last_name,
                lead.phone,
                lead.email,
                lead.goals,
                lead.notes,
                lead.imported_at,
                lead.last_contacted_at,
                lead.terminal_status,
                lead.terminal_at,
                lead.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a single lead scoped to its owner.
    pub fn get_lead(&self, owner_id: &str, id: &str) -> Result<Option<DbLead>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?1 AND owner_id = ?2"
        ))?;

        let mut rows = stmt.query_map(params![id, owner_id], Self::map_lead_row)?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Replace the contact-detail columns. Returns false if the lead does not
    /// exist for this owner. `imported_at`, `last_contacted_at` and terminal
    /// state are never written here.
    pub fn update_lead_details(
        &self,
        owner_id: &str,
        id: &str,
        details: &LeadDetails,
        now: &str,
    ) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE leads
             SET first_name = ?3, last_name = ?4, phone = ?5, email = ?6,
                 goals = ?7, notes = ?8, updated_at = ?9
             WHERE id = ?1 AND owner_id = ?2",
            params![
                id,
                owner_id,
                details.first_name,
                details.last_name,
                details.phone,
                details.email,
                details.goals,
                details.notes,
                now,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Advance `last_contacted_at` to `instant` if that is later than the
    /// stored value. Out-of-order touches (an older contact recorded late)
    /// never rewind it. Returns false if the lead does not exist.
    pub fn touch_last_contacted(
        &self,
        owner_id: &str,
        id: &str,
        instant: &str,
        now: &str,
    ) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE leads
             SET last_contacted_at = CASE
                     WHEN ?3 > COALESCE(last_contacted_at, '') THEN ?3
                     ELSE last_contacted_at
                 END,
                 updated_at = ?4
             WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id, instant, now],
        )?;
        Ok(changed > 0)
    }

    /// Record a terminal status. Re-recording the same status keeps the
    /// original `terminal_at`; switching statuses stamps a fresh one.
    pub fn set_terminal_status(
        &self,
        owner_id: &str,
        id: &str,
        terminal_status: &str,
        terminal_at: &str,
        now: &str,
    ) -> Result<bool, DbError> {
        // SET expressions see the pre-update row, so the CASE compares
        // against the old terminal_status.
        let changed = self.conn.execute(
            "UPDATE leads
             SET terminal_at = CASE
                     WHEN terminal_status IS ?3 THEN terminal_at
                     ELSE ?4
                 END,
                 terminal_status = ?3,
                 updated_at = ?5
             WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id, terminal_status, terminal_at, now],
        )?;
        Ok(changed > 0)
    }

    /// Clear a recorded terminal status so time-based derivation resumes.
    pub fn clear_terminal_status(
        &self,
        owner_id: &str,
        id: &str,
        now: &str,
    ) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE leads
             SET terminal_status = NULL, terminal_at = NULL, updated_at = ?3
             WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id, now],
        )?;
        Ok(changed > 0)
    }

    /// Delete a lead and everything hanging off it. Children go first so FK
    /// enforcement never sees an orphan window. Returns false if the lead
    /// does not exist for this owner (in which case nothing is deleted).
    pub fn delete_lead_cascading(&self, owner_id: &str, id: &str) -> Result<bool, DbError> {
        self.with_transaction(|db| {
            db.conn.execute(
                "DELETE FROM contact_points WHERE lead_id = ?1 AND owner_id = ?2",
                params![id, owner_id],
            )?;
            db.conn.execute(
                "DELETE FROM tasks WHERE lead_id = ?1 AND owner_id = ?2",
                params![id, owner_id],
            )?;
            db.conn.execute(
                "DELETE FROM consultations WHERE lead_id = ?1 AND owner_id = ?2",
                params![id, owner_id],
            )?;
            let changed = db.conn.execute(
                "DELETE FROM leads WHERE id = ?1 AND owner_id = ?2",
                params![id, owner_id],
            )?;
            Ok(changed > 0)
        })
    }

    /// One page of leads matching the selector, newest import first with id
    /// as the tiebreak. The caller passes `limit` one higher than the page
    /// size to probe for a next page.
    pub fn list_leads_page(
        &self,
        selector: &LeadSelector,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<DbLead>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads
             WHERE {LEAD_PREDICATE}
             ORDER BY imported_at DESC, id ASC
             LIMIT ?6 OFFSET ?7"
        ))?;

        let base = selector.bind();
        let bound: [&dyn rusqlite::ToSql; 7] = [
            base[0], base[1], base[2], base[3], base[4], &limit, &offset,
        ];
        let rows = stmt.query_map(&bound[..], Self::map_lead_row)?;

        let mut leads = Vec::new();
        for row in rows {
            leads.push(row?);
        }
        Ok(leads)
    }

    /// Count of leads matching the selector, over the same predicate the
    /// paged query runs.
    pub fn count_leads(&self, selector: &LeadSelector) -> Result<i64, DbError> {
        let bound = selector.bind();
        let count = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM leads WHERE {LEAD_PREDICATE}"),
            &bound[..],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
