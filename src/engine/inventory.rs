//! Inventory Filter - finds the instances whose state actually needs changing

use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::bridge::{ComputeInventory, InstanceQuery, LifecycleState, ProviderError};

/// Queries the inventory with the configured tag predicate and a state
pub struct InventoryFilter {
    inventory: Arc<dyn ComputeInventory>,
    tag_key: String,
    tag_value: String,
}

impl InventoryFilter {
    pub fn new(inventory: Arc<dyn ComputeInventory>, tag_key: &str, tag_value: &str) -> Self {
        Self {
            inventory,
            tag_key: tag_key.to_string(),
            tag_value: tag_value.to_string(),
        }
    }

    /// Human-readable predicate, e.g. `Env=AutoStop`
    pub fn predicate(&self) -> String {
        format!("{}={}", self.tag_key, self.tag_value)
    }

    /// Ids of tagged instances currently in `state`, in inventory order
    ///
    /// Drains every page. Entries reported in any other state are dropped,
    /// as are ids already returned by an earlier page.
    pub async fn find(&self, state: LifecycleState) -> Result<Vec<String>, ProviderError> {
        let query = InstanceQuery {
            tag_key: self.tag_key.clone(),
            tag_value: self.tag_value.clone(),
            state,
        };

        let mut instance_ids = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut seen_tokens = HashSet::new();
        let mut next_token: Option<String> = None;

        loop {
            let page = self
                .inventory
                .describe_instances(&query, next_token.as_deref())
                .await?;

            instance_ids.extend(
                page.instances
                    .into_iter()
                    .filter(|instance| instance.state == state)
                    .map(|instance| instance.instance_id)
                    .filter(|id| seen_ids.insert(id.clone())),
            );

            match page.next_token {
                Some(token) if !seen_tokens.insert(token.clone()) => {
                    return Err(ProviderError::new(
                        "InvalidPagination",
                        format!("Inventory returned pagination token '{}' twice", token),
                    ));
                }
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        debug!(
            predicate = %self.predicate(),
            %state,
            count = instance_ids.len(),
            "Inventory filtered"
        );
        Ok(instance_ids)
    }
}
