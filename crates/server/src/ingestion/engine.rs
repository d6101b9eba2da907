//! Upsert/versioning engine — turns one adapter batch into durable state.
//!
//! [`IngestionEngine::apply`] owns the write path for `skills` and
//! `skill_metrics`: every item in the batch is upserted by (name,
//! source) and gets exactly one appended snapshot, all inside a single
//! transaction. Any failure rolls the whole batch back.

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use skillpulse_core::{RunOutcome, ScrapedItem, Source};

use super::types::IngestError;

/// Stateless engine over a `&PgPool`.
pub struct IngestionEngine;

impl IngestionEngine {
    /// Apply one batch of scraped items for `source`.
    ///
    /// Items are processed in input order; a duplicate (name, source)
    /// within one batch means the later item wins the descriptive
    /// fields while both snapshots are kept. The engine never retries —
    /// the next attempt is the next scheduled or manual run.
    pub async fn apply(
        pool: &PgPool,
        source: Source,
        items: &[ScrapedItem],
    ) -> Result<RunOutcome, IngestError> {
        validate_batch(items)?;

        let mut tx = pool.begin().await?;

        for item in items {
            let skill_id = upsert_skill(&mut tx, source, item).await?;
            append_snapshot(&mut tx, skill_id, item).await?;
        }

        tx.commit().await?;

        debug!(source = %source, items = items.len(), "batch committed");
        Ok(RunOutcome::success(source, items.len()))
    }
}

/// Reject the batch before any write when an item fails basic shape
/// requirements (the storage layer would reject it anyway; failing
/// early keeps the error message precise).
fn validate_batch(items: &[ScrapedItem]) -> Result<(), IngestError> {
    for (index, item) in items.iter().enumerate() {
        if item.name.trim().is_empty() {
            return Err(IngestError::Validation {
                index,
                reason: "missing name".to_string(),
            });
        }
        if item.url.trim().is_empty() {
            return Err(IngestError::Validation {
                index,
                reason: format!("missing url for '{}'", item.name),
            });
        }
    }
    Ok(())
}

/// Create-or-update the skill row for (item.name, source); returns its id.
///
/// Updates overwrite description and url, advance updated_at, and only
/// replace language when the item carries one (COALESCE keeps the
/// stored value otherwise).
async fn upsert_skill(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    source: Source,
    item: &ScrapedItem,
) -> Result<Uuid, IngestError> {
    let existing: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM skills WHERE name = $1 AND source = $2")
            .bind(&item.name)
            .bind(source.as_str())
            .fetch_optional(&mut **tx)
            .await?;

    match existing {
        Some(id) => {
            sqlx::query(
                "UPDATE skills SET
                    description = $2,
                    url = $3,
                    language = COALESCE($4, language),
                    updated_at = now()
                 WHERE id = $1",
            )
            .bind(id)
            .bind(&item.description)
            .bind(&item.url)
            .bind(&item.language)
            .execute(&mut **tx)
            .await?;
            Ok(id)
        }
        None => {
            let id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO skills (id, name, source, description, url, language)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(id)
            .bind(&item.name)
            .bind(source.as_str())
            .bind(&item.description)
            .bind(&item.url)
            .bind(&item.language)
            .execute(&mut **tx)
            .await?;
            Ok(id)
        }
    }
}

/// Append one snapshot carrying the item's metric fields verbatim,
/// NULLs included. recorded_at is set by the database at insert time.
async fn append_snapshot(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    skill_id: Uuid,
    item: &ScrapedItem,
) -> Result<(), IngestError> {
    sqlx::query(
        "INSERT INTO skill_metrics
            (skill_id, stars, forks, downloads_day, downloads_week, downloads_month, likes, last_activity)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(skill_id)
    .bind(item.stars)
    .bind(item.forks)
    .bind(item.downloads_day)
    .bind(item.downloads_week)
    .bind(item.downloads_month)
    .bind(item.likes)
    .bind(item.last_activity)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, url: &str) -> ScrapedItem {
        ScrapedItem {
            name: name.to_string(),
            url: url.to_string(),
            description: "d".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_batch_accepts_well_formed() {
        let items = vec![item("pkg-a", "https://example.com/a"), item("pkg-b", "https://example.com/b")];
        assert!(validate_batch(&items).is_ok());
    }

    #[test]
    fn test_validate_batch_accepts_empty_batch() {
        assert!(validate_batch(&[]).is_ok());
    }

    #[test]
    fn test_validate_batch_rejects_missing_name() {
        let items = vec![item("pkg-a", "u"), item("  ", "u")];
        let err = validate_batch(&items).unwrap_err();
        assert!(matches!(err, IngestError::Validation { index: 1, .. }));
        assert!(err.to_string().contains("missing name"));
    }

    #[test]
    fn test_validate_batch_rejects_missing_url() {
        let items = vec![item("pkg-a", "")];
        let err = validate_batch(&items).unwrap_err();
        assert!(matches!(err, IngestError::Validation { index: 0, .. }));
        assert!(err.to_string().contains("pkg-a"));
    }

    #[test]
    fn test_validate_batch_empty_description_is_fine() {
        let mut ok = item("pkg-a", "https://example.com/a");
        ok.description = String::new();
        assert!(validate_batch(&[ok]).is_ok());
    }
}
