use std::sync::MutexGuard;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::ReadingChallenge;

use super::Repository;

pub trait ChallengeRepository: Repository<Entity = ReadingChallenge, Id = str> {
    /// Newest first.
    fn list(&self) -> Result<Vec<ReadingChallenge>>;
}

pub struct SqliteChallengeRepository<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> SqliteChallengeRepository<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    fn row_to_challenge(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReadingChallenge> {
        Ok(ReadingChallenge {
            id: row.get(0)?,
            name: row.get(1)?,
            target: row.get(2)?,
            current: row.get(3)?,
            percentage: row.get(4)?,
        })
    }
}

impl Repository for SqliteChallengeRepository<'_> {
    type Entity = ReadingChallenge;
    type Id = str;

    fn find_by_id(&self, id: &str) -> Result<Option<ReadingChallenge>> {
        let challenge = self
            .conn
            .query_row(
                "SELECT id, name, target, current, percentage FROM reading_challenges WHERE id = ?1",
                params![id],
                Self::row_to_challenge,
            )
            .optional()?;
        Ok(challenge)
    }

    fn save(&self, challenge: &ReadingChallenge) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO reading_challenges
                (id, name, target, current, percentage, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                target = excluded.target,
                current = excluded.current,
                percentage = excluded.percentage,
                updated_at = excluded.updated_at",
            params![
                challenge.id,
                challenge.name,
                challenge.target,
                challenge.current,
                challenge.percentage,
                now,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM reading_challenges WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

impl ChallengeRepository for SqliteChallengeRepository<'_> {
    fn list(&self) -> Result<Vec<ReadingChallenge>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, target, current, percentage FROM reading_challenges
             ORDER BY created_at DESC",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_challenge)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
