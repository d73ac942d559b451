use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::instrument;

/// A database transaction together with the timestamp every write inside it
/// is stamped with. Dropping an uncommitted operation rolls it back.
pub struct LedgerOperation<'t> {
    tx: Transaction<'t, Postgres>,
    now: DateTime<Utc>,
}

impl<'t> LedgerOperation<'t> {
    #[instrument(name = "ledger_operation.init", skip_all, err)]
    pub(crate) async fn init(pool: &PgPool) -> Result<LedgerOperation<'static>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let now = db_now(&mut *tx).await?;
        Ok(LedgerOperation { tx, now })
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn tx(&mut self) -> &mut Transaction<'t, Postgres> {
        &mut self.tx
    }

    pub(crate) fn as_executor(&mut self) -> &mut PgConnection {
        &mut self.tx
    }

    #[instrument(name = "ledger_operation.commit", skip_all, err)]
    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    pub async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.rollback().await
    }
}

/// Current time according to the database clock.
pub(crate) async fn db_now<'c, E>(executor: E) -> Result<DateTime<Utc>, sqlx::Error>
where
    E: sqlx::PgExecutor<'c>,
{
    sqlx::query_scalar("SELECT NOW()").fetch_one(executor).await
}
