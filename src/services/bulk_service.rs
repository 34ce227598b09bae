use sea_orm::DatabaseConnection;
use serde::Serialize;

use crate::domain::DomainError;
use crate::domain::figure::RegisterFigureInput;
use crate::modules::import::{RawRecord, ValidationReport, validate_data};
use crate::services::figure_service::register_figure;

/// Result of registering one record
#[derive(Debug, Clone, Serialize)]
pub struct RecordOutcome {
    pub row: usize,
    pub name: String,
    pub success: bool,
    pub figure_id: Option<i32>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub message: String,
    pub results: Vec<RecordOutcome>,
}

#[derive(Debug, Clone)]
pub enum BulkOutcome {
    /// Nothing was registered because some records are invalid
    Blocked(ValidationReport),
    Completed(BulkSummary),
}

/// Register drafts one after another in input order. A failing record does
/// not stop the batch and nothing already registered is rolled back.
pub async fn register_all(
    db: &DatabaseConnection,
    drafts: Vec<(usize, RegisterFigureInput)>,
    created_by: Option<i32>,
) -> BulkSummary {
    let mut results = Vec::with_capacity(drafts.len());

    for (row, draft) in drafts {
        let name = draft.name.clone();
        match register_figure(db, draft, created_by).await {
            Ok(figure) => results.push(RecordOutcome {
                row,
                name,
                success: true,
                figure_id: Some(figure.id),
                error: None,
            }),
            Err(e) => {
                tracing::warn!("Bulk row {} ('{}') failed: {}", row, name, e);
                results.push(RecordOutcome {
                    row,
                    name,
                    success: false,
                    figure_id: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    let succeeded = results.iter().filter(|r| r.success).count();
    let failed = results.len() - succeeded;
    BulkSummary {
        succeeded,
        failed,
        message: format!("{} succeeded, {} failed", succeeded, failed),
        results,
    }
}

/// Validate the whole batch, then register it only if every record is valid.
pub async fn submit(
    db: &DatabaseConnection,
    records: &[RawRecord],
    created_by: Option<i32>,
) -> Result<BulkOutcome, DomainError> {
    if records.is_empty() {
        return Err(DomainError::Validation("No records to register".to_string()));
    }

    let mut report = validate_data(records);
    if !report.is_valid {
        tracing::info!(
            "Bulk submission blocked: {} of {} records invalid",
            report.errors.len(),
            report.total
        );
        return Ok(BulkOutcome::Blocked(report));
    }

    let drafts = std::mem::take(&mut report.drafts);
    let summary = register_all(db, drafts, created_by).await;
    tracing::info!("Bulk registration finished: {}", summary.message);
    Ok(BulkOutcome::Completed(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db;
    use crate::modules::import::parse_csv;

    const CSV: &str = "name,manufacturer,series,character,category,releaseDate,price\n\
        Rem,GSC,Re:Zero,Rem,Scale,2024-01-10,22000\n\
        Ram,GSC,Re:Zero,Ram,Scale,2024-02-10,22000\n";

    #[tokio::test]
    async fn test_submit_registers_in_order() {
        let db = db::init_db("sqlite::memory:").await.unwrap();
        let records = parse_csv(CSV).unwrap();

        let BulkOutcome::Completed(summary) = submit(&db, &records, None).await.unwrap() else {
            panic!("expected completion");
        };
        assert_eq!(summary.message, "2 succeeded, 0 failed");
        let rows: Vec<usize> = summary.results.iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![0, 1]);
        assert!(summary.results[0].figure_id < summary.results[1].figure_id);
    }

    #[tokio::test]
    async fn test_invalid_record_blocks_everything() {
        let db = db::init_db("sqlite::memory:").await.unwrap();
        let csv = format!("{}Broken,GSC,Re:Zero,,Scale,2024-13,\n", CSV);
        let records = parse_csv(&csv).unwrap();

        let BulkOutcome::Blocked(report) = submit(&db, &records, None).await.unwrap() else {
            panic!("expected the batch to be blocked");
        };
        assert!(!report.is_valid);
        assert!(report.errors.contains_key(&2));

        use crate::models::figure;
        use sea_orm::{EntityTrait, PaginatorTrait};
        assert_eq!(figure::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failures_are_collected_without_rollback() {
        let db = db::init_db("sqlite::memory:").await.unwrap();
        let records = parse_csv(CSV).unwrap();
        let mut report = validate_data(&records);
        // Point the second draft at a category id that does not exist
        report.drafts[1].1.category = crate::domain::figure::MasterRef::Id(999);

        let summary = register_all(&db, std::mem::take(&mut report.drafts), None).await;
        assert_eq!(summary.message, "1 succeeded, 1 failed");
        assert!(summary.results[0].success);
        assert!(summary.results[1].error.is_some());
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let db = db::init_db("sqlite::memory:").await.unwrap();
        assert!(matches!(
            submit(&db, &[], None).await,
            Err(DomainError::Validation(_))
        ));
    }
}
