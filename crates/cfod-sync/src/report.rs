//! Post-run store aggregates, printed for the operator.

use std::collections::BTreeMap;
use std::fmt;

use cfod_core::OpportunityType;
use cfod_store::{StoreError, StoreRead};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct StoreReport {
    pub total: u64,
    pub by_type: BTreeMap<String, u64>,
}

/// Count total rows plus one count per canonical type. Purely
/// observational; failures here do not undo the writes that preceded them.
pub async fn store_report<S: StoreRead + ?Sized>(
    store: &S,
    table: &str,
) -> Result<StoreReport, StoreError> {
    let total = store.count(table, None).await?;
    let mut by_type = BTreeMap::new();
    for kind in OpportunityType::ALL {
        let count = store
            .count(table, Some(("opportunity_type", kind.as_str())))
            .await?;
        by_type.insert(kind.as_str().to_string(), count);
    }
    Ok(StoreReport { total, by_type })
}

impl fmt::Display for StoreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "store now holds {} opportunities:", self.total)?;
        for (kind, count) in &self.by_type {
            writeln!(f, "  {kind}: {count}")?;
        }
        Ok(())
    }
}
