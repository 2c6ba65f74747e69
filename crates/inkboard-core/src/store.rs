//! Canvas Store
//!
//! This module provides the durable canvas CRUD surface consumed by both the
//! real-time core and the request/response API, plus a SQLite implementation.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{sqlite::SqlitePool, Row, SqliteConnection};
use tracing::{debug, info};
use uuid::Uuid;

use crate::canvas::{validate_name, Canvas, CanvasAccess, CanvasSummary};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::{CanvasId, UserId};

/// Durable canvas operations
#[async_trait]
pub trait CanvasStore: Send + Sync {
    /// Create an empty canvas with the default name
    async fn create(&self, owner: &str) -> Result<CanvasId>;

    /// Fetch a canvas regardless of caller
    async fn get(&self, canvas_id: CanvasId) -> Result<Canvas>;

    /// Fetch a canvas for a caller who must be owner or shared user
    async fn load(&self, canvas_id: CanvasId, caller: &str) -> Result<Canvas> {
        let canvas = self.get(canvas_id).await?;
        canvas.ensure_editor(caller)?;
        Ok(canvas)
    }

    /// Owner, shared set, elements and revision in one lookup
    async fn access(&self, canvas_id: CanvasId) -> Result<CanvasAccess> {
        self.get(canvas_id).await.map(CanvasAccess::from)
    }

    /// Rename; owner only, 1..=20 characters
    async fn rename(&self, canvas_id: CanvasId, caller: &str, name: &str) -> Result<()>;

    /// Replace elements on behalf of an owner or shared user
    async fn replace_elements(
        &self,
        canvas_id: CanvasId,
        caller: &str,
        elements: &[Element],
    ) -> Result<()>;

    /// Relay write: no caller check, applied only if `revision` is newer
    /// than the stored one. Returns whether the write applied.
    async fn write_elements(
        &self,
        canvas_id: CanvasId,
        revision: u64,
        elements: &[Element],
    ) -> Result<bool>;

    /// Grant edit access to the user registered under `grantee_email`
    async fn share(&self, canvas_id: CanvasId, owner: &str, grantee_email: &str)
        -> Result<UserId>;

    /// Revoke a grant; no error if the grantee was not shared
    async fn unshare(&self, canvas_id: CanvasId, owner: &str, grantee: &str) -> Result<()>;

    /// Hard-delete; owner only
    async fn delete(&self, canvas_id: CanvasId, owner: &str) -> Result<()>;

    /// Canvases owned by or shared with `user`, newest first
    async fn list(&self, user: &str) -> Result<Vec<CanvasSummary>>;
}

/// Email → user id resolution used by sharing
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Register (or re-register) a user's email
    async fn add_user(&self, user_id: &str, email: &str) -> Result<()>;

    /// Look up a user by email
    async fn resolve_email(&self, email: &str) -> Result<Option<UserId>>;
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("bad timestamp {raw:?}: {e}")))
}

fn parse_id(raw: &str) -> Result<CanvasId> {
    Uuid::parse_str(raw).map_err(|e| Error::Internal(format!("bad canvas id {raw:?}: {e}")))
}

/// SQLite-based canvas store
pub struct SqliteCanvasStore {
    pool: SqlitePool,
}

impl SqliteCanvasStore {
    /// Create a new canvas store with the given database pool
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema
    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS canvases (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                elements_json TEXT NOT NULL DEFAULT '[]',
                revision INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS canvas_shares (
                canvas_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                PRIMARY KEY (canvas_id, user_id)
            );

            CREATE INDEX IF NOT EXISTS idx_canvases_owner ON canvases(owner_id);
            CREATE INDEX IF NOT EXISTS idx_canvases_created ON canvases(created_at);
            CREATE INDEX IF NOT EXISTS idx_shares_user ON canvas_shares(user_id);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_canvas(
        conn: &mut SqliteConnection,
        canvas_id: CanvasId,
    ) -> Result<Option<Canvas>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, name, elements_json, revision, created_at
            FROM canvases
            WHERE id = ?
            "#,
        )
        .bind(canvas_id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let shared: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT user_id FROM canvas_shares
            WHERE canvas_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(canvas_id.to_string())
        .fetch_all(&mut *conn)
        .await?;

        let id: String = row.try_get("id")?;
        let elements_json: String = row.try_get("elements_json")?;
        let revision: i64 = row.try_get("revision")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Some(Canvas {
            id: parse_id(&id)?,
            owner: row.try_get("owner_id")?,
            shared,
            elements: serde_json::from_str(&elements_json)?,
            name: row.try_get("name")?,
            revision: u64::try_from(revision).unwrap_or_default(),
            created_at: parse_timestamp(&created_at)?,
        }))
    }

    async fn require_canvas(conn: &mut SqliteConnection, canvas_id: CanvasId) -> Result<Canvas> {
        Self::fetch_canvas(conn, canvas_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("canvas {canvas_id}")))
    }
}

#[async_trait]
impl CanvasStore for SqliteCanvasStore {
    async fn create(&self, owner: &str) -> Result<CanvasId> {
        let canvas = Canvas::new(owner);

        sqlx::query(
            r#"
            INSERT INTO canvases (id, owner_id, name, elements_json, revision, created_at)
            VALUES (?, ?, ?, '[]', 0, ?)
            "#,
        )
        .bind(canvas.id.to_string())
        .bind(&canvas.owner)
        .bind(&canvas.name)
        .bind(timestamp(canvas.created_at))
        .execute(&self.pool)
        .await?;

        info!(canvas_id = %canvas.id, owner = %owner, "Canvas created");
        Ok(canvas.id)
    }

    async fn get(&self, canvas_id: CanvasId) -> Result<Canvas> {
        let mut conn = self.pool.acquire().await?;
        Self::require_canvas(&mut conn, canvas_id).await
    }

    async fn rename(&self, canvas_id: CanvasId, caller: &str, name: &str) -> Result<()> {
        validate_name(name)?;

        let mut tx = self.pool.begin().await?;
        let canvas = Self::require_canvas(&mut tx, canvas_id).await?;
        canvas.ensure_owner(caller, "rename")?;

        sqlx::query("UPDATE canvases SET name = ? WHERE id = ?")
            .bind(name)
            .bind(canvas_id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(canvas_id = %canvas_id, name = %name, "Canvas renamed");
        Ok(())
    }

    async fn replace_elements(
        &self,
        canvas_id: CanvasId,
        caller: &str,
        elements: &[Element],
    ) -> Result<()> {
        let elements_json = serde_json::to_string(elements)?;

        let mut tx = self.pool.begin().await?;
        let canvas = Self::require_canvas(&mut tx, canvas_id).await?;
        canvas.ensure_editor(caller)?;

        sqlx::query("UPDATE canvases SET elements_json = ? WHERE id = ?")
            .bind(&elements_json)
            .bind(canvas_id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(canvas_id = %canvas_id, count = elements.len(), "Canvas elements replaced");
        Ok(())
    }

    async fn write_elements(
        &self,
        canvas_id: CanvasId,
        revision: u64,
        elements: &[Element],
    ) -> Result<bool> {
        let elements_json = serde_json::to_string(elements)?;
        let revision = i64::try_from(revision)
            .map_err(|_| Error::validation(format!("revision {revision} out of range")))?;

        let result = sqlx::query(
            r#"
            UPDATE canvases
            SET elements_json = ?, revision = ?
            WHERE id = ? AND revision < ?
            "#,
        )
        .bind(&elements_json)
        .bind(revision)
        .bind(canvas_id.to_string())
        .bind(revision)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM canvases WHERE id = ?")
            .bind(canvas_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        match exists {
            Some(_) => Ok(false),
            None => Err(Error::not_found(format!("canvas {canvas_id}"))),
        }
    }

    async fn share(
        &self,
        canvas_id: CanvasId,
        owner: &str,
        grantee_email: &str,
    ) -> Result<UserId> {
        let grantee = self
            .resolve_email(grantee_email)
            .await?
            .ok_or_else(|| Error::not_found("user with this email not found"))?;

        let mut tx = self.pool.begin().await?;
        let mut canvas = Self::require_canvas(&mut tx, canvas_id).await?;
        canvas.ensure_owner(owner, "share")?;
        canvas.grant(&grantee)?;

        sqlx::query("INSERT INTO canvas_shares (canvas_id, user_id) VALUES (?, ?)")
            .bind(canvas_id.to_string())
            .bind(&grantee)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(canvas_id = %canvas_id, grantee = %grantee, "Canvas shared");
        Ok(grantee)
    }

    async fn unshare(&self, canvas_id: CanvasId, owner: &str, grantee: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let canvas = Self::require_canvas(&mut tx, canvas_id).await?;
        canvas.ensure_owner(owner, "unshare")?;

        let result = sqlx::query("DELETE FROM canvas_shares WHERE canvas_id = ? AND user_id = ?")
            .bind(canvas_id.to_string())
            .bind(grantee)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(
            canvas_id = %canvas_id,
            grantee = %grantee,
            removed = result.rows_affected() > 0,
            "Canvas unshared"
        );
        Ok(())
    }

    async fn delete(&self, canvas_id: CanvasId, owner: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let canvas = Self::require_canvas(&mut tx, canvas_id).await?;
        canvas.ensure_owner(owner, "delete")?;

        sqlx::query("DELETE FROM canvas_shares WHERE canvas_id = ?")
            .bind(canvas_id.to_string())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM canvases WHERE id = ?")
            .bind(canvas_id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(canvas_id = %canvas_id, "Canvas deleted");
        Ok(())
    }

    async fn list(&self, user: &str) -> Result<Vec<CanvasSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.owner_id, c.name, c.created_at,
                   (SELECT COUNT(*) FROM canvas_shares s WHERE s.canvas_id = c.id) AS shared_count
            FROM canvases c
            WHERE c.owner_id = ?
               OR EXISTS (
                   SELECT 1 FROM canvas_shares s2
                   WHERE s2.canvas_id = c.id AND s2.user_id = ?
               )
            ORDER BY c.created_at DESC, c.rowid DESC
            "#,
        )
        .bind(user)
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.try_get("id")?;
                let created_at: String = row.try_get("created_at")?;
                let shared_count: i64 = row.try_get("shared_count")?;
                Ok(CanvasSummary {
                    id: parse_id(&id)?,
                    name: row.try_get("name")?,
                    owner: row.try_get("owner_id")?,
                    shared_count: usize::try_from(shared_count).unwrap_or_default(),
                    created_at: parse_timestamp(&created_at)?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl UserDirectory for SqliteCanvasStore {
    async fn add_user(&self, user_id: &str, email: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email) VALUES (?, ?)
            ON CONFLICT(id) DO UPDATE SET email = excluded.email
            "#,
        )
        .bind(user_id)
        .bind(email)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn resolve_email(&self, email: &str) -> Result<Option<UserId>> {
        let id = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }
}
