use derive_builder::Builder;

use crate::optimistic::RetryPolicy;

#[derive(Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct RemitLedgerConfig {
    #[builder(setter(into, strip_option), default)]
    pub(super) pg_con: Option<String>,
    #[builder(setter(into, strip_option), default)]
    pub(super) max_connections: Option<u32>,
    #[builder(default)]
    pub(super) exec_migrations: bool,
    #[builder(setter(into, strip_option), default)]
    pub(super) pool: Option<sqlx::PgPool>,
    /// Attempts per cash balance write before a version conflict is surfaced.
    #[builder(setter(into, strip_option), default)]
    pub(super) max_cas_attempts: Option<u32>,
}

impl RemitLedgerConfig {
    pub fn builder() -> RemitLedgerConfigBuilder {
        RemitLedgerConfigBuilder::default()
    }

    pub(super) fn retry_policy(&self) -> RetryPolicy {
        self.max_cas_attempts
            .map(RetryPolicy::new)
            .unwrap_or_default()
    }
}

impl RemitLedgerConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match (self.pg_con.as_ref(), self.pool.as_ref()) {
            (None, None) | (Some(None), None) | (None, Some(None)) | (Some(None), Some(None)) => {
                return Err("One of pg_con or pool must be set".to_string())
            }
            (Some(Some(_)), Some(Some(_))) => {
                return Err("Only one of pg_con or pool must be set".to_string())
            }
            _ => (),
        }
        if let Some(Some(0)) = self.max_cas_attempts {
            return Err("max_cas_attempts must be at least 1".to_string());
        }
        Ok(())
    }
}
