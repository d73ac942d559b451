use sqlx::{migrate::MigrateError, PgPool};

/// Applies the bundled `remit_*` schema migrations.
pub async fn run(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!().run(pool).await
}
