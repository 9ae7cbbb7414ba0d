use super::*;

/// Shared predicate over the `tasks` table, bound by [`ScheduleSelector`].
///
/// Positional params: owner id, optional status, optional half-open due
/// window (`due_at >= from AND due_at < before`). The paged query and every
/// bucket count bind the same fragment.
const TASK_PREDICATE: &str = "owner_id = ?1
       AND (?2 IS NULL OR status = ?2)
       AND (?3 IS NULL OR due_at >= ?3)
       AND (?4 IS NULL OR due_at < ?4)";

const TASK_COLUMNS: &str =
    "id, owner_id, lead_id, title, due_at, status, completed_at, created_at, updated_at";

impl LeadDb {
    // =========================================================================
    // Tasks
    // =========================================================================

    fn map_task_row(row: &rusqlite::Row) -> rusqlite::Result<DbTask> {
        Ok(DbTask {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            lead_id: row.get(2)?,
            title: row.get(3)?,
            due_at: row.get(4)?,
            status: row.get(5)?,
            completed_at: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    pub fn insert_task(&self, task: &DbTask) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO tasks (
                id, owner_id, lead_id, title, due_at, status, completed_at,
                created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                task.id,
                task.owner_id,
                task.lead_id,
                task.title,
                task.due_at,
                task.status,
                task.completed_at,
                task.created_at,
                task.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_task(&self, owner_id: &str, id: &str) -> Result<Option<DbTask>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND owner_id = ?2"
        ))?;

        let mut rows = stmt.query_map(params![id, owner_id], Self::map_task_row)?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Mark a task completed. The status guard makes this transition fire at
    /// most once: a second call matches no row and returns false.
    pub fn complete_task(&self, owner_id: &str, id: &str, now: &str) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET status = 'completed', completed_at = ?3, updated_at = ?3
             WHERE id = ?1 AND owner_id = ?2 AND status = 'pending'",
            params![id, owner_id, now],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_task(&self, owner_id: &str, id: &str) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "DELETE FROM tasks WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id],
        )?;
        Ok(changed > 0)
    }

    /// One page of tasks matching the selector, soonest due first with id as
    /// the tiebreak, so overdue work leads every listing.
    pub fn list_tasks_page(
        &self,
        selector: &ScheduleSelector,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<DbTask>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE {TASK_PREDICATE}
             ORDER BY due_at ASC, id ASC
             LIMIT ?5 OFFSET ?6"
        ))?;

        let base = selector.bind();
        let bound: [&dyn rusqlite::ToSql; 6] =
            [base[0], base[1], base[2], base[3], &limit, &offset];
        let rows = stmt.query_map(&bound[..], Self::map_task_row)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    pub fn count_tasks(&self, selector: &ScheduleSelector) -> Result<i64, DbError> {
        let bound = selector.bind();
        let count = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM tasks WHERE {TASK_PREDICATE}"),
            &bound[..],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
