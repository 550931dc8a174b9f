//! Startup check that the database has the tables every registered collection reads.

use db::schema::COLLECTIONS;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum DatabaseValidationError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Database validator for ensuring schema is correct
pub struct DatabaseValidator {
    pool: SqlitePool,
}

impl DatabaseValidator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Check migrations ran and every registered collection has a table.
    pub async fn validate(&self) -> Result<ValidationResult, DatabaseValidationError> {
        let migrations_applied = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'",
        )
        .fetch_one(&self.pool)
        .await?;

        let migrations_applied = if migrations_applied > 0 {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
                .fetch_one(&self.pool)
                .await?
        } else {
            0
        };

        let required: Vec<&str> = COLLECTIONS.iter().map(|c| c.name).collect();
        let missing_tables = self.missing_tables(&required).await?;

        let result = ValidationResult {
            migrations_applied: migrations_applied as usize,
            missing_tables,
        };

        if result.is_ok() {
            info!(
                migrations_applied = result.migrations_applied,
                "Database validation complete"
            );
        } else {
            warn!(summary = %result.summary(), "Database validation found problems");
        }

        Ok(result)
    }

    async fn missing_tables(&self, required: &[&str]) -> Result<Vec<String>, DatabaseValidationError> {
        let mut missing = Vec::new();

        for table in required {
            let exists = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
            )
            .bind(*table)
            .fetch_one(&self.pool)
            .await?
                > 0;

            if !exists {
                missing.push(table.to_string());
            }
        }

        Ok(missing)
    }
}

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub migrations_applied: usize,
    pub missing_tables: Vec<String>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.migrations_applied > 0 && self.missing_tables.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.migrations_applied == 0 {
            "Database not initialized - migrations need to be run".to_string()
        } else if !self.missing_tables.is_empty() {
            format!("Missing tables: {}", self.missing_tables.join(", "))
        } else {
            format!("Database OK - {} migrations applied", self.migrations_applied)
        }
    }
}

#[cfg(test)]
mod tests {
    use db::DBService;

    use super::*;

    #[tokio::test]
    async fn test_migrated_database_is_valid() {
        let db = DBService::new_in_memory().await.unwrap();
        let result = DatabaseValidator::new(db.pool.clone()).validate().await.unwrap();
        assert!(result.is_ok(), "{}", result.summary());
    }

    #[tokio::test]
    async fn test_dropped_table_is_reported() {
        let db = DBService::new_in_memory().await.unwrap();
        sqlx::query("DROP TABLE leads").execute(&db.pool).await.unwrap();

        let result = DatabaseValidator::new(db.pool.clone()).validate().await.unwrap();
        assert!(!result.is_ok());
        assert_eq!(result.missing_tables, vec!["leads".to_string()]);
    }
}
