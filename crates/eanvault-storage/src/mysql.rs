use async_trait::async_trait;
use eanvault_core::registry::{CodeListSummary, Registry, Result};
use eanvault_core::{RegistryError, UsedCodes};
use jiff::Timestamp;
use sqlx::{MySql, MySqlPool, Row, Transaction};
use tracing::debug;

const SCHEMA: &str = include_str!("../ddl/mysql/code_lists.sql");

/// MySQL implementation of the registry contract.
///
/// Each version is one row of `code_lists`, with the codes stored as a JSON
/// array. The latest row carries `latest = 1`; writes run in a transaction
/// that locks the current latest row, so two writers in different
/// processes still end up last-write-wins but never with two latest rows.
#[derive(Debug, Clone)]
pub struct MySqlRegistry {
    pool: MySqlPool,
}

impl MySqlRegistry {
    /// Creates a registry from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a registry by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `code_lists` table if it is missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn insert_latest(tx: &mut Transaction<'_, MySql>, codes: &UsedCodes) -> Result<u64> {
        sqlx::query("UPDATE code_lists SET latest = 0 WHERE latest = 1")
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        let result = sqlx::query(
            r#"
            INSERT INTO code_lists (codes, code_count, latest, updated_at)
            VALUES (?, ?, 1, ?)
            "#,
        )
        .bind(encode_codes(codes)?)
        .bind(codes.len() as i64)
        .bind(now_unix_millis())
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.last_insert_id())
    }
}

fn now_unix_millis() -> i64 {
    Timestamp::now().as_millisecond()
}

fn parse_updated_at(millis: i64) -> Result<Timestamp> {
    Timestamp::from_millisecond(millis).map_err(|e| {
        RegistryError::InvalidData(format!("invalid updated_at timestamp '{}': {e}", millis))
    })
}

fn encode_codes(codes: &UsedCodes) -> Result<String> {
    serde_json::to_string(codes)
        .map_err(|e| RegistryError::Operation(format!("serialize codes: {e}")))
}

fn decode_codes(raw: &str) -> Result<UsedCodes> {
    serde_json::from_str(raw)
        .map_err(|e| RegistryError::InvalidData(format!("invalid stored codes: {e}")))
}

fn map_sqlx_error(err: sqlx::Error) -> RegistryError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => RegistryError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => RegistryError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => RegistryError::InvalidData(message),
        _ => RegistryError::Query(message),
    }
}

#[async_trait]
impl Registry for MySqlRegistry {
    async fn fetch_current(&self) -> Result<UsedCodes> {
        let row = sqlx::query(
            r#"
            SELECT codes
            FROM code_lists
            WHERE latest = 1
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(UsedCodes::new());
        };

        let raw: String = row.try_get("codes").map_err(map_sqlx_error)?;
        decode_codes(&raw)
    }

    async fn replace_current(&self, codes: &UsedCodes) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let current = sqlx::query(
            r#"
            SELECT id
            FROM code_lists
            WHERE latest = 1
            ORDER BY id DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let id = match current {
            Some(row) => {
                let id: u64 = row.try_get("id").map_err(map_sqlx_error)?;
                sqlx::query(
                    r#"
                    UPDATE code_lists
                    SET codes = ?, code_count = ?, updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(encode_codes(codes)?)
                .bind(codes.len() as i64)
                .bind(now_unix_millis())
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
                id
            }
            None => Self::insert_latest(&mut tx, codes).await?,
        };

        tx.commit().await.map_err(map_sqlx_error)?;
        debug!(id, len = codes.len(), "replaced current code list");
        Ok(())
    }

    async fn append_as_new_version(&self, codes: &UsedCodes) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let id = Self::insert_latest(&mut tx, codes).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(id, len = codes.len(), "appended code list version");
        Ok(())
    }

    async fn versions(&self) -> Result<Vec<CodeListSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, code_count, latest, updated_at
            FROM code_lists
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                let id: u64 = row.try_get("id").map_err(map_sqlx_error)?;
                let len: i64 = row.try_get("code_count").map_err(map_sqlx_error)?;
                let latest: bool = row.try_get("latest").map_err(map_sqlx_error)?;
                let updated_at: i64 = row.try_get("updated_at").map_err(map_sqlx_error)?;

                Ok(CodeListSummary {
                    id,
                    updated_at: parse_updated_at(updated_at)?,
                    latest,
                    len: usize::try_from(len).map_err(|e| {
                        RegistryError::InvalidData(format!("invalid code_count '{}': {e}", len))
                    })?,
                })
            })
            .collect()
    }
}
