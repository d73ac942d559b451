mod helpers;

use remit_ledger::{
    auto_settlement::{error::AutoSettlementError, *},
    *,
};

#[tokio::test]
async fn fifo_suggestions_fill_oldest_first() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let tenant_id = TenantId::new();
    let oldest = ledger
        .remittances()
        .create_outgoing(helpers::new_outgoing(tenant_id, 300_000, 84_000))
        .await?;
    let middle = ledger
        .remittances()
        .create_outgoing(helpers::new_outgoing(tenant_id, 500_000, 83_000))
        .await?;
    ledger
        .remittances()
        .create_outgoing(helpers::new_outgoing(tenant_id, 900_000, 84_500))
        .await?;
    let incoming = ledger
        .remittances()
        .create_incoming(helpers::new_incoming(tenant_id, 600_000, 85_500))
        .await?;

    let suggestions = ledger
        .auto_settlements()
        .suggest(tenant_id, incoming.id, SettlementStrategy::Fifo)
        .await?;
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].outgoing_id, oldest.id);
    assert_eq!(suggestions[0].amount_irr, Money::from(300_000));
    assert!(suggestions[0].fully_settles_outgoing);
    assert_eq!(suggestions[1].outgoing_id, middle.id);
    assert_eq!(suggestions[1].amount_irr, Money::from(300_000));
    assert!(!suggestions[1].fully_settles_outgoing);
    let total: Money = suggestions.iter().map(|s| s.amount_irr).sum();
    assert_eq!(total, incoming.remaining_irr);
    assert!(suggestions
        .iter()
        .all(|s| (50..=100).contains(&s.match_score)));
    Ok(())
}

#[tokio::test]
async fn best_rate_prefers_the_widest_spread() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let tenant_id = TenantId::new();
    ledger
        .remittances()
        .create_outgoing(helpers::new_outgoing(tenant_id, 300_000, 84_000))
        .await?;
    let cheapest = ledger
        .remittances()
        .create_outgoing(helpers::new_outgoing(tenant_id, 500_000, 83_000))
        .await?;
    let incoming = ledger
        .remittances()
        .create_incoming(helpers::new_incoming(tenant_id, 400_000, 85_500))
        .await?;

    let suggestions = ledger
        .auto_settlements()
        .suggest(tenant_id, incoming.id, SettlementStrategy::BestRate)
        .await?;
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].outgoing_id, cheapest.id);
    assert!(suggestions[0].estimated_profit_cad.is_positive());

    let manual = ledger
        .auto_settlements()
        .suggest(tenant_id, incoming.id, SettlementStrategy::Manual)
        .await?;
    assert!(manual.is_empty());
    Ok(())
}

#[tokio::test]
async fn auto_settle_executes_each_suggestion() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let tenant_id = TenantId::new();
    let first = ledger
        .remittances()
        .create_outgoing(helpers::new_outgoing(tenant_id, 200_000, 84_000))
        .await?;
    let second = ledger
        .remittances()
        .create_outgoing(helpers::new_outgoing(tenant_id, 700_000, 84_000))
        .await?;
    let incoming = ledger
        .remittances()
        .create_incoming(helpers::new_incoming(tenant_id, 500_000, 85_500))
        .await?;

    let result = ledger
        .auto_settlements()
        .auto_settle(tenant_id, incoming.id, SettlementStrategy::Lifo, UserId::new())
        .await?;
    assert_eq!(result.requested, 1);
    assert_eq!(result.created, 1);
    assert!(result.failures.is_empty());
    assert_eq!(result.settlements[0].outgoing_remittance_id, second.id);

    let incoming = ledger
        .remittances()
        .find_incoming(tenant_id, incoming.id)
        .await?;
    assert_eq!(incoming.status, IncomingStatus::Completed);
    let first = ledger
        .remittances()
        .find_outgoing(tenant_id, first.id)
        .await?;
    assert_eq!(first.status, OutgoingStatus::Pending);

    let res = ledger
        .auto_settlements()
        .suggest(tenant_id, incoming.id, SettlementStrategy::Fifo)
        .await;
    assert!(matches!(res, Err(AutoSettlementError::IncomingNotOpen { .. })));
    Ok(())
}

#[tokio::test]
async fn stale_candidate_is_reported_and_the_rest_still_settle() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let tenant_id = TenantId::new();
    let older = ledger
        .remittances()
        .create_outgoing(helpers::new_outgoing(tenant_id, 1_000_000, 84_000))
        .await?;
    let newer = ledger
        .remittances()
        .create_outgoing(helpers::new_outgoing(tenant_id, 1_000_000, 84_000))
        .await?;
    let incoming = ledger
        .remittances()
        .create_incoming(helpers::new_incoming(tenant_id, 1_500_000, 85_500))
        .await?;

    let suggestions = ledger
        .auto_settlements()
        .suggest(tenant_id, incoming.id, SettlementStrategy::Fifo)
        .await?;
    assert_eq!(suggestions.len(), 2);
    ledger
        .remittances()
        .cancel_outgoing(tenant_id, newer.id, "sender withdrew")
        .await?;

    let result = ledger
        .auto_settlements()
        .execute(tenant_id, SettlementStrategy::Fifo, UserId::new(), suggestions)
        .await;
    assert_eq!(result.requested, 2);
    assert_eq!(result.created, 1);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].outgoing_id, newer.id);
    assert_eq!(result.settlements[0].outgoing_remittance_id, older.id);

    let persisted = ledger
        .settlements()
        .list_for_outgoing(tenant_id, older.id)
        .await?;
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].settled_amount_irr, Money::from(1_000_000));
    let incoming = ledger
        .remittances()
        .find_incoming(tenant_id, incoming.id)
        .await?;
    assert_eq!(incoming.status, IncomingStatus::Partial);
    assert_eq!(incoming.remaining_irr, Money::from(500_000));
    let newer = ledger
        .remittances()
        .find_outgoing(tenant_id, newer.id)
        .await?;
    assert_eq!(newer.status, OutgoingStatus::Cancelled);
    assert_eq!(newer.settled_amount_irr, Money::ZERO);
    Ok(())
}

#[tokio::test]
async fn fresh_candidate_scores_without_age_bonus() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let tenant_id = TenantId::new();
    ledger
        .remittances()
        .create_outgoing(helpers::new_outgoing(tenant_id, 200_000, 84_000))
        .await?;
    let incoming = ledger
        .remittances()
        .create_incoming(helpers::new_incoming(tenant_id, 500_000, 85_500))
        .await?;
    let suggestions = ledger
        .auto_settlements()
        .suggest(tenant_id, incoming.id, SettlementStrategy::Fifo)
        .await?;
    assert_eq!(suggestions.len(), 1);
    assert!(suggestions[0].fully_settles_outgoing);
    // base 50, profit bonus capped at 20, full settlement 10
    assert_eq!(suggestions[0].match_score, 80);
    Ok(())
}

#[tokio::test]
async fn auto_settle_with_no_candidates_reports_nothing() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let tenant_id = TenantId::new();
    let incoming = ledger
        .remittances()
        .create_incoming(helpers::new_incoming(tenant_id, 500_000, 85_500))
        .await?;
    let result = ledger
        .auto_settlements()
        .auto_settle(tenant_id, incoming.id, SettlementStrategy::Fifo, UserId::new())
        .await?;
    assert_eq!(result.requested, 0);
    assert_eq!(result.created, 0);
    assert!(result.settlements.is_empty());
    Ok(())
}
