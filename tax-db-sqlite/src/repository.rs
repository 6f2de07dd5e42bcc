use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tax_core::{Deduction, DeductionKind, DeductionRepository, RepositoryError};
use tracing::{debug, info};

use crate::decimal::get_decimal;

const IN_MEMORY: &str = ":memory:";

const UPSERT_DEDUCTION: &str = "INSERT INTO deductions (kind, amount, created_at, updated_at)
     VALUES (?, ?, ?, ?)
     ON CONFLICT(kind) DO UPDATE SET amount = excluded.amount, updated_at = excluded.updated_at";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens `connection_string`, which is `:memory:`, a bare file path, or
    /// a `sqlite:` URL. Files are created when missing.
    ///
    /// An in-memory database lives only as long as its connection, so the
    /// pool is pinned to one connection that never idles out.
    pub async fn new(connection_string: &str) -> Result<Self, RepositoryError> {
        let in_memory = is_in_memory(connection_string);
        let options = connect_options(connection_string)?;

        let mut pool_options = SqlitePoolOptions::new();
        if in_memory {
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;

        debug!(connection = connection_string, in_memory, "connected to sqlite");
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(())
    }

    /// Inserts the default amount for every kind that has no row yet.
    /// Existing amounts are left alone.
    pub async fn seed_defaults(&self) -> Result<(), RepositoryError> {
        let now = Utc::now();
        let mut seeded = 0;

        for kind in DeductionKind::ALL {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO deductions (kind, amount, created_at, updated_at)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(kind.as_str())
            .bind(kind.default_amount().to_string())
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

            seeded += result.rows_affected();
        }

        if seeded > 0 {
            info!(seeded, "seeded default deductions");
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_in_memory(connection_string: &str) -> bool {
    connection_string == IN_MEMORY
        || connection_string == "sqlite::memory:"
        || connection_string.contains("mode=memory")
}

fn connect_options(connection_string: &str) -> Result<SqliteConnectOptions, RepositoryError> {
    let options = if connection_string == IN_MEMORY {
        SqliteConnectOptions::from_str("sqlite::memory:")
    } else if connection_string.starts_with("sqlite:") {
        SqliteConnectOptions::from_str(connection_string)
    } else {
        Ok(SqliteConnectOptions::new().filename(connection_string))
    };

    options
        .map(|options| options.create_if_missing(true))
        .map_err(|e| RepositoryError::Configuration(e.to_string()))
}

fn row_to_deduction(row: &SqliteRow) -> Result<Deduction, RepositoryError> {
    let kind: String = row
        .try_get("kind")
        .map_err(|e| RepositoryError::Database(e.to_string()))?;
    let kind = DeductionKind::parse(&kind)
        .ok_or_else(|| RepositoryError::Database(format!("Invalid deduction kind: {kind}")))?;

    Ok(Deduction {
        kind,
        amount: get_decimal(row, "amount")?,
    })
}

#[async_trait]
impl DeductionRepository for SqliteRepository {
    async fn list_deductions(&self) -> Result<Vec<Deduction>, RepositoryError> {
        let rows = sqlx::query("SELECT kind, amount FROM deductions")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut deductions = rows
            .iter()
            .map(row_to_deduction)
            .collect::<Result<Vec<_>, _>>()?;
        deductions.sort_by_key(|d| d.kind);
        Ok(deductions)
    }

    async fn get_deduction(
        &self,
        kind: DeductionKind,
    ) -> Result<Deduction, RepositoryError> {
        let row = sqlx::query("SELECT kind, amount FROM deductions WHERE kind = ?")
            .bind(kind.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        row_to_deduction(&row)
    }

    async fn update_deduction(
        &self,
        kind: DeductionKind,
        amount: Decimal,
    ) -> Result<Deduction, RepositoryError> {
        let now = Utc::now();

        sqlx::query(UPSERT_DEDUCTION)
            .bind(kind.as_str())
            .bind(amount.to_string())
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        info!(kind = %kind, %amount, "deduction updated");
        self.get_deduction(kind).await
    }

    async fn reset_deductions(&self) -> Result<Vec<Deduction>, RepositoryError> {
        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        for kind in DeductionKind::ALL {
            sqlx::query(UPSERT_DEDUCTION)
                .bind(kind.as_str())
                .bind(kind.default_amount().to_string())
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        info!("deductions reset to defaults");
        self.list_deductions().await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    async fn setup_test_db() -> SqliteRepository {
        let repo = SqliteRepository::new(IN_MEMORY)
            .await
            .expect("Failed to open in-memory database");
        repo.run_migrations().await.expect("Failed to run migrations");
        repo.seed_defaults().await.expect("Failed to seed defaults");
        repo
    }

    fn deduction(
        kind: DeductionKind,
        amount: Decimal,
    ) -> Deduction {
        Deduction { kind, amount }
    }

    #[tokio::test]
    async fn test_list_deductions_returns_seeded_defaults() {
        let repo = setup_test_db().await;

        let deductions = repo.list_deductions().await.unwrap();

        assert_eq!(
            deductions,
            vec![
                deduction(DeductionKind::Personal, dec!(60000)),
                deduction(DeductionKind::Donation, dec!(100000)),
                deduction(DeductionKind::KReceipt, dec!(50000)),
            ]
        );
    }

    #[tokio::test]
    async fn test_get_deduction() {
        let repo = setup_test_db().await;

        let personal = repo.get_deduction(DeductionKind::Personal).await.unwrap();

        assert_eq!(personal.amount, dec!(60000.00));
    }

    #[tokio::test]
    async fn test_get_deduction_not_found() {
        let repo = SqliteRepository::new(IN_MEMORY).await.unwrap();
        repo.run_migrations().await.unwrap();

        let result = repo.get_deduction(DeductionKind::Donation).await;

        assert_eq!(result, Err(RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_update_deduction_persists_exact_amount() {
        let repo = setup_test_db().await;

        let updated = repo
            .update_deduction(DeductionKind::Personal, dec!(70000.55))
            .await
            .unwrap();

        assert_eq!(updated, deduction(DeductionKind::Personal, dec!(70000.55)));
        assert_eq!(
            repo.get_deduction(DeductionKind::Personal).await.unwrap().amount,
            dec!(70000.55)
        );
    }

    #[tokio::test]
    async fn test_update_deduction_inserts_missing_row() {
        let repo = SqliteRepository::new(IN_MEMORY).await.unwrap();
        repo.run_migrations().await.unwrap();

        repo.update_deduction(DeductionKind::KReceipt, dec!(0))
            .await
            .unwrap();

        assert_eq!(
            repo.list_deductions().await.unwrap(),
            vec![deduction(DeductionKind::KReceipt, dec!(0))]
        );
    }

    #[tokio::test]
    async fn test_seed_defaults_keeps_existing_amounts() {
        let repo = setup_test_db().await;
        repo.update_deduction(DeductionKind::Donation, dec!(20000))
            .await
            .unwrap();

        repo.seed_defaults().await.unwrap();

        assert_eq!(
            repo.get_deduction(DeductionKind::Donation).await.unwrap().amount,
            dec!(20000)
        );
    }

    #[tokio::test]
    async fn test_reset_deductions_restores_defaults() {
        let repo = setup_test_db().await;
        repo.update_deduction(DeductionKind::Personal, dec!(10000))
            .await
            .unwrap();
        repo.update_deduction(DeductionKind::KReceipt, dec!(0))
            .await
            .unwrap();

        let reset = repo.reset_deductions().await.unwrap();

        assert_eq!(reset.len(), 3);
        assert_eq!(
            repo.get_deduction(DeductionKind::Personal).await.unwrap().amount,
            dec!(60000)
        );
        assert_eq!(
            repo.get_deduction(DeductionKind::KReceipt).await.unwrap().amount,
            dec!(50000)
        );
    }

    #[tokio::test]
    async fn test_deduction_config_snapshot() {
        let repo = setup_test_db().await;
        repo.update_deduction(DeductionKind::Personal, dec!(70000))
            .await
            .unwrap();

        let config = repo.deduction_config().await.unwrap();

        assert_eq!(config.amount_for(DeductionKind::Personal), dec!(70000));
        assert_eq!(config.amount_for(DeductionKind::Donation), dec!(100000));
        assert_eq!(config.require(&DeductionKind::ALL), Ok(()));
    }

    #[tokio::test]
    async fn test_file_database_survives_reopen() {
        let path = std::env::temp_dir().join(format!(
            "tax-db-sqlite-test-{}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let path_str = path.to_string_lossy().to_string();

        {
            let repo = SqliteRepository::new(&path_str).await.unwrap();
            repo.run_migrations().await.unwrap();
            repo.seed_defaults().await.unwrap();
            repo.update_deduction(DeductionKind::Personal, dec!(45000))
                .await
                .unwrap();
            repo.pool().close().await;
        }

        let reopened = SqliteRepository::new(&path_str).await.unwrap();
        reopened.run_migrations().await.unwrap();
        reopened.seed_defaults().await.unwrap();

        assert_eq!(
            reopened
                .get_deduction(DeductionKind::Personal)
                .await
                .unwrap()
                .amount,
            dec!(45000)
        );

        reopened.pool().close().await;
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_in_memory_detection() {
        assert!(is_in_memory(":memory:"));
        assert!(is_in_memory("sqlite::memory:"));
        assert!(!is_in_memory("deductions.db"));
        assert!(!is_in_memory("sqlite://deductions.db"));
    }
}
