//! List pending promotions without touching the catalog.

use crate::catalog::{CatalogSource, PromotionalItem};
use crate::error::Result;

/// Pending items in dispatch order (lowest row first).
pub async fn collect(catalog: &dyn CatalogSource) -> Result<Vec<PromotionalItem>> {
    let mut pending: Vec<PromotionalItem> = catalog
        .load_snapshot()
        .await?
        .into_iter()
        .filter(|item| item.status.is_pending())
        .collect();
    pending.sort_by_key(|item| item.row);
    Ok(pending)
}

fn format_line(item: &PromotionalItem) -> String {
    format!("{:>5}  {:<40}  {}", item.row, item.name, item.promo_price)
}

/// CLI entry point
pub async fn run(catalog: &dyn CatalogSource) -> Result<()> {
    let pending = collect(catalog).await?;

    if pending.is_empty() {
        println!("No pending promotions");
        return Ok(());
    }

    println!("{:>5}  {:<40}  PRICE", "ROW", "NAME");
    for item in &pending {
        println!("{}", format_line(item));
    }
    println!("\n{} pending", pending.len());
    Ok(())
}
