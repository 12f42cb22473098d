//! Idempotent schema bootstrap, applied at startup.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::{debug, info_span, Instrument};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

// Serializes concurrent bootstraps; `CREATE ... IF NOT EXISTS` alone can still race.
const SCHEMA_LOCK_ID: i64 = 0x636c_6963_6b65_72;

/// Apply `sql/schema.sql` in one transaction.
///
/// # Errors
/// Returns an error if any statement fails; nothing is committed in that case.
pub async fn bootstrap(pool: &PgPool) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .context("failed to begin schema transaction")?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(SCHEMA_LOCK_ID)
        .execute(&mut *tx)
        .await
        .context("failed to acquire schema lock")?;

    for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DDL",
            db.statement = statement.as_str()
        );
        sqlx::query(statement)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
    }

    tx.commit()
        .await
        .context("failed to commit schema transaction")?;

    debug!("Database schema is up to date");

    Ok(())
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}
