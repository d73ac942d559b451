//! Outgoing and incoming remittances and their lifecycle.
//!
//! Both kinds move `pending -> partial -> completed` as settlements are applied
//! and can only be cancelled while nothing has been settled. An incoming
//! remittance is finally marked `paid` once fully allocated and disbursed.
//! Rows are locked `FOR UPDATE` for every transition.
mod entity;
pub mod error;
mod repo;

use sqlx::PgPool;
use tracing::instrument;

use crate::{ledger_operation::*, primitives::*};

pub use entity::*;
use error::*;
use repo::*;

#[derive(Clone)]
pub struct Remittances {
    repo: RemittanceRepo,
    pool: PgPool,
}

impl Remittances {
    pub(crate) fn new(pool: &PgPool) -> Self {
        Self {
            repo: RemittanceRepo::new(pool),
            pool: pool.clone(),
        }
    }

    #[instrument(name = "remit_ledger.remittances.create_outgoing", skip(self), err)]
    pub async fn create_outgoing(
        &self,
        new_remittance: NewOutgoingRemittance,
    ) -> Result<OutgoingRemittance, RemittanceError> {
        new_remittance.validate()?;
        let mut op = LedgerOperation::init(&self.pool).await?;
        let code = self
            .repo
            .next_code(op.as_executor(), new_remittance.tenant_id, OUTGOING_CODE_PREFIX)
            .await?;
        let remittance = new_remittance.into_remittance(code, op.now())?;
        self.repo
            .insert_outgoing(op.as_executor(), &remittance)
            .await?;
        op.commit().await?;
        Ok(remittance)
    }

    #[instrument(name = "remit_ledger.remittances.create_incoming", skip(self), err)]
    pub async fn create_incoming(
        &self,
        new_remittance: NewIncomingRemittance,
    ) -> Result<IncomingRemittance, RemittanceError> {
        new_remittance.validate()?;
        let mut op = LedgerOperation::init(&self.pool).await?;
        let code = self
            .repo
            .next_code(op.as_executor(), new_remittance.tenant_id, INCOMING_CODE_PREFIX)
            .await?;
        let remittance = new_remittance.into_remittance(code, op.now())?;
        self.repo
            .insert_incoming(op.as_executor(), &remittance)
            .await?;
        op.commit().await?;
        Ok(remittance)
    }

    #[instrument(name = "remit_ledger.remittances.find_outgoing", skip(self), err)]
    pub async fn find_outgoing(
        &self,
        tenant_id: TenantId,
        id: OutgoingRemittanceId,
    ) -> Result<OutgoingRemittance, RemittanceError> {
        self.repo.find_outgoing(tenant_id, id).await
    }

    #[instrument(name = "remit_ledger.remittances.find_incoming", skip(self), err)]
    pub async fn find_incoming(
        &self,
        tenant_id: TenantId,
        id: IncomingRemittanceId,
    ) -> Result<IncomingRemittance, RemittanceError> {
        self.repo.find_incoming(tenant_id, id).await
    }

    #[instrument(name = "remit_ledger.remittances.list_outgoing", skip(self), err)]
    pub async fn list_outgoing(
        &self,
        tenant_id: TenantId,
        status: Option<OutgoingStatus>,
    ) -> Result<Vec<OutgoingRemittance>, RemittanceError> {
        self.repo.list_outgoing(tenant_id, status).await
    }

    #[instrument(name = "remit_ledger.remittances.list_incoming", skip(self), err)]
    pub async fn list_incoming(
        &self,
        tenant_id: TenantId,
        status: Option<IncomingStatus>,
    ) -> Result<Vec<IncomingRemittance>, RemittanceError> {
        self.repo.list_incoming(tenant_id, status).await
    }

    #[instrument(name = "remit_ledger.remittances.list_settleable_outgoing", skip(self), err)]
    pub async fn list_settleable_outgoing(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<OutgoingRemittance>, RemittanceError> {
        self.repo.list_settleable_outgoing(tenant_id).await
    }

    #[instrument(name = "remit_ledger.remittances.cancel_outgoing", skip(self), err)]
    pub async fn cancel_outgoing(
        &self,
        tenant_id: TenantId,
        id: OutgoingRemittanceId,
        reason: impl Into<String> + std::fmt::Debug,
    ) -> Result<OutgoingRemittance, RemittanceError> {
        let mut op = LedgerOperation::init(&self.pool).await?;
        let mut remittance = self
            .repo
            .find_outgoing_for_update(op.as_executor(), tenant_id, id)
            .await?;
        remittance.cancel(reason.into(), op.now())?;
        self.repo
            .update_outgoing(op.as_executor(), &remittance)
            .await?;
        op.commit().await?;
        Ok(remittance)
    }

    #[instrument(name = "remit_ledger.remittances.cancel_incoming", skip(self), err)]
    pub async fn cancel_incoming(
        &self,
        tenant_id: TenantId,
        id: IncomingRemittanceId,
        reason: impl Into<String> + std::fmt::Debug,
    ) -> Result<IncomingRemittance, RemittanceError> {
        let mut op = LedgerOperation::init(&self.pool).await?;
        let mut remittance = self
            .repo
            .find_incoming_for_update(op.as_executor(), tenant_id, id)
            .await?;
        remittance.cancel(reason.into(), op.now())?;
        self.repo
            .update_incoming(op.as_executor(), &remittance)
            .await?;
        op.commit().await?;
        Ok(remittance)
    }

    #[instrument(name = "remit_ledger.remittances.mark_incoming_paid", skip(self), err)]
    pub async fn mark_incoming_paid(
        &self,
        tenant_id: TenantId,
        id: IncomingRemittanceId,
        payment_reference: Option<String>,
    ) -> Result<IncomingRemittance, RemittanceError> {
        let mut op = LedgerOperation::init(&self.pool).await?;
        let mut remittance = self
            .repo
            .find_incoming_for_update(op.as_executor(), tenant_id, id)
            .await?;
        remittance.mark_paid(payment_reference, op.now())?;
        self.repo
            .update_incoming(op.as_executor(), &remittance)
            .await?;
        op.commit().await?;
        Ok(remittance)
    }

    pub(crate) async fn lock_outgoing_in_op(
        &self,
        op: &mut LedgerOperation<'_>,
        tenant_id: TenantId,
        id: OutgoingRemittanceId,
    ) -> Result<OutgoingRemittance, RemittanceError> {
        self.repo
            .find_outgoing_for_update(op.as_executor(), tenant_id, id)
            .await
    }

    pub(crate) async fn lock_incoming_in_op(
        &self,
        op: &mut LedgerOperation<'_>,
        tenant_id: TenantId,
        id: IncomingRemittanceId,
    ) -> Result<IncomingRemittance, RemittanceError> {
        self.repo
            .find_incoming_for_update(op.as_executor(), tenant_id, id)
            .await
    }

    pub(crate) async fn update_outgoing_in_op(
        &self,
        op: &mut LedgerOperation<'_>,
        remittance: &OutgoingRemittance,
    ) -> Result<(), RemittanceError> {
        self.repo
            .update_outgoing(op.as_executor(), remittance)
            .await
    }

    pub(crate) async fn update_incoming_in_op(
        &self,
        op: &mut LedgerOperation<'_>,
        remittance: &IncomingRemittance,
    ) -> Result<(), RemittanceError> {
        self.repo
            .update_incoming(op.as_executor(), remittance)
            .await
    }
}
