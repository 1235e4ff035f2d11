use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::{
    domain::{RawRow, Record, RowIssue},
    input::normalize_rows,
};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/estados.db";

/// Durable name -> status mapping backed by the `estados` table.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// Outcome of [`Storage::replace_all`]: what was written and which input rows
/// were dropped or coerced on the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplaceReport {
    pub records: Vec<Record>,
    pub issues: Vec<RowIssue>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Every record, highest status first. Equal statuses keep insertion order.
    pub async fn load_all(&self) -> Result<Vec<Record>> {
        let rows = sqlx::query("SELECT nombre, estado FROM estados ORDER BY estado DESC, id ASC")
            .fetch_all(&self.pool)
            .await
            .context("failed to load estados")?;

        rows.into_iter()
            .map(|row| -> Result<Record> {
                Ok(Record {
                    name: row.try_get("nombre")?,
                    status: row.try_get("estado")?,
                })
            })
            .collect()
    }

    pub async fn status_of(&self, name: &str) -> Result<Option<f64>> {
        let row = sqlx::query("SELECT estado FROM estados WHERE nombre = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<f64, _>(0)))
    }

    /// Inserts `name` or overwrites its status. `name` is stored as given;
    /// trimming and emptiness checks belong to the caller.
    pub async fn upsert(&self, name: &str, status: f64) -> Result<()> {
        sqlx::query(
            "INSERT INTO estados (nombre, estado) VALUES (?, ?)
             ON CONFLICT(nombre) DO UPDATE SET estado = excluded.estado",
        )
        .bind(name)
        .bind(status)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to upsert estado for '{name}'"))?;
        Ok(())
    }

    /// Returns whether a row was removed. A missing name is not an error.
    pub async fn delete(&self, name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM estados WHERE nombre = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn reset_all(&self) -> Result<u64> {
        let result = sqlx::query("UPDATE estados SET estado = 0")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Swaps the whole collection for `rows` in one transaction.
    pub async fn replace_all(&self, rows: &[RawRow]) -> Result<ReplaceReport> {
        let normalized = normalize_rows(rows);

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM estados")
            .execute(&mut *tx)
            .await
            .context("failed to clear estados")?;
        for record in &normalized.records {
            sqlx::query("INSERT INTO estados (nombre, estado) VALUES (?, ?)")
                .bind(&record.name)
                .bind(record.status)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("failed to insert estado for '{}'", record.name))?;
        }
        tx.commit().await?;

        Ok(ReplaceReport {
            records: normalized.records,
            issues: normalized.issues,
        })
    }
}

/// Turns a configured location (plain path, `sqlite:` or `sqlite://` URL) into
/// a sqlx URL and creates its parent directory. Blank input means the default.
pub fn prepare_database_url(raw_database_url: &str) -> Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_sqlite_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return DEFAULT_DATABASE_URL.to_string();
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
