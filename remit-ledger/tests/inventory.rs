mod helpers;

use remit_ledger::{
    inventory::{error::InventoryError, *},
    *,
};
use rust_decimal_macros::dec;

fn movement(
    tenant_id: TenantId,
    currency: Currency,
    quantity: Money,
    rate: Money,
) -> NewCurrencyMovement {
    NewCurrencyMovement::builder()
        .tenant_id(tenant_id)
        .currency(currency)
        .quantity(quantity)
        .rate(rate)
        .build()
        .unwrap()
}

#[tokio::test]
async fn weighted_average_cost_scenario() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let tenant_id = TenantId::new();
    let usd = helpers::usd();

    ledger
        .inventory()
        .record_purchase(movement(tenant_id, usd, dec!(1000).into(), dec!(1.35).into()))
        .await?;
    let second = ledger
        .inventory()
        .record_purchase(movement(tenant_id, usd, dec!(1000).into(), dec!(1.30).into()))
        .await?;
    assert_eq!(second.new_wac, Money::from(dec!(1.325)));
    assert_eq!(second.profit_or_loss, Money::ZERO);

    let sale = ledger
        .inventory()
        .record_sale(movement(tenant_id, usd, dec!(500).into(), dec!(1.40).into()))
        .await?;
    assert_eq!(sale.profit_or_loss, Money::from(dec!(37.5)));
    assert_eq!(sale.previous_wac, sale.new_wac);
    assert_eq!(sale.new_quantity, Money::from(1_500));

    let holding = ledger.inventory().find_holding(tenant_id, usd).await?;
    assert_eq!(holding.quantity, Money::from(1_500));
    assert_eq!(holding.wac, Money::from(dec!(1.325)));
    assert_eq!(holding.total_cost, Money::from(dec!(1987.5)));

    let history = ledger.inventory().history(tenant_id, usd).await?;
    assert_eq!(history.len(), 3);
    assert_eq!(history[2].transaction_type, WacTransactionType::Sell);
    Ok(())
}

#[tokio::test]
async fn overselling_changes_nothing() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let tenant_id = TenantId::new();
    let eur = helpers::eur();
    ledger
        .inventory()
        .record_purchase(movement(tenant_id, eur, dec!(100).into(), dec!(1.5).into()))
        .await?;

    let res = ledger
        .inventory()
        .record_sale(movement(tenant_id, eur, dec!(100.5).into(), dec!(1.6).into()))
        .await;
    assert!(matches!(res, Err(InventoryError::InsufficientHolding { .. })));
    let holding = ledger.inventory().find_holding(tenant_id, eur).await?;
    assert_eq!(holding.quantity, Money::from(100));
    assert_eq!(ledger.inventory().history(tenant_id, eur).await?.len(), 1);

    let res = ledger
        .inventory()
        .record_sale(movement(tenant_id, helpers::usd(), Money::ONE, Money::ONE))
        .await;
    assert!(matches!(res, Err(InventoryError::InsufficientHolding { .. })));
    Ok(())
}

#[tokio::test]
async fn full_sale_resets_position_and_drops_from_inventory() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let tenant_id = TenantId::new();
    let usd = helpers::usd();
    let eur = helpers::eur();
    ledger
        .inventory()
        .record_purchase(movement(tenant_id, usd, dec!(200).into(), dec!(1.36).into()))
        .await?;
    ledger
        .inventory()
        .record_purchase(movement(tenant_id, eur, dec!(50).into(), dec!(1.48).into()))
        .await?;
    ledger
        .inventory()
        .record_purchase(movement(tenant_id, helpers::cad(), dec!(10).into(), Money::ONE))
        .await?;

    let sale = ledger
        .inventory()
        .record_sale(movement(tenant_id, usd, dec!(200).into(), dec!(1.38).into()))
        .await?;
    assert_eq!(sale.new_quantity, Money::ZERO);
    assert_eq!(sale.new_wac, Money::ZERO);

    let positions = ledger
        .inventory()
        .currency_inventory(tenant_id, helpers::cad())
        .await?;
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].currency, eur);
    assert_eq!(positions[0].total_cost, Money::from(74));
    Ok(())
}

#[tokio::test]
async fn adjustments_never_move_the_average() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let tenant_id = TenantId::new();
    let usd = helpers::usd();
    ledger
        .inventory()
        .record_purchase(movement(tenant_id, usd, dec!(100).into(), dec!(1.3).into()))
        .await?;
    let up = ledger
        .inventory()
        .record_adjustment(tenant_id, usd, Money::from(20), Some("recount".to_string()))
        .await?;
    assert_eq!(up.new_quantity, Money::from(120));
    assert_eq!(up.new_wac, Money::from(dec!(1.3)));

    let res = ledger
        .inventory()
        .record_adjustment(tenant_id, usd, Money::from(-121), None)
        .await;
    assert!(matches!(res, Err(InventoryError::InsufficientHolding { .. })));
    Ok(())
}

#[tokio::test]
async fn concurrent_sales_cannot_oversell() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let tenant_id = TenantId::new();
    let usd = helpers::usd();
    ledger
        .inventory()
        .record_purchase(movement(tenant_id, usd, dec!(100).into(), dec!(1.3).into()))
        .await?;

    let sales = (0..4).map(|_| {
        ledger
            .inventory()
            .record_sale(movement(tenant_id, usd, dec!(30).into(), dec!(1.4).into()))
    });
    let results = futures::future::join_all(sales).await;
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 3);
    let holding = ledger.inventory().find_holding(tenant_id, usd).await?;
    assert_eq!(holding.quantity, Money::from(10));
    Ok(())
}
