use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;
use voyra_core::repository::{CommissionRepository, PriceRuleRepository};
use voyra_core::rules::{Commission, PriceRule};
use voyra_core::EngineResult;

/// Administrator-maintained price rules. The pricing path only ever reads
/// the active snapshot.
pub struct InMemoryPriceRuleRepository {
    rules: RwLock<HashMap<Uuid, PriceRule>>,
}

impl InMemoryPriceRuleRepository {
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryPriceRuleRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceRuleRepository for InMemoryPriceRuleRepository {
    async fn save(&self, rule: PriceRule) -> EngineResult<()> {
        self.rules.write().await.insert(rule.id, rule);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> EngineResult<()> {
        self.rules.write().await.remove(&id);
        Ok(())
    }

    async fn list(&self) -> EngineResult<Vec<PriceRule>> {
        Ok(self.rules.read().await.values().cloned().collect())
    }

    async fn active_rules(&self) -> EngineResult<Vec<PriceRule>> {
        Ok(self
            .rules
            .read()
            .await
            .values()
            .filter(|r| r.is_active)
            .cloned()
            .collect())
    }
}

pub struct InMemoryCommissionRepository {
    commissions: RwLock<HashMap<Uuid, Commission>>,
}

impl InMemoryCommissionRepository {
    pub fn new() -> Self {
        Self {
            commissions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCommissionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommissionRepository for InMemoryCommissionRepository {
    async fn save(&self, commission: Commission) -> EngineResult<()> {
        self.commissions
            .write()
            .await
            .insert(commission.id, commission);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> EngineResult<()> {
        self.commissions.write().await.remove(&id);
        Ok(())
    }

    async fn list(&self) -> EngineResult<Vec<Commission>> {
        Ok(self.commissions.read().await.values().cloned().collect())
    }

    async fn active_commissions(&self) -> EngineResult<Vec<Commission>> {
        Ok(self
            .commissions
            .read()
            .await
            .values()
            .filter(|c| c.is_active)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use voyra_core::rules::{RuleKind, RuleScope};

    fn rule(is_active: bool) -> PriceRule {
        PriceRule {
            id: Uuid::new_v4(),
            name: "Summer promo".to_string(),
            kind: RuleKind::PercentageDiscount,
            value: 10.0,
            scope: RuleScope::AllCustomers,
            hotel_code: None,
            board_type: None,
            valid_from: None,
            valid_until: None,
            is_active,
            priority: 1,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_active_rules_filters_inactive() {
        let repo = InMemoryPriceRuleRepository::new();
        repo.save(rule(true)).await.unwrap();
        repo.save(rule(false)).await.unwrap();

        assert_eq!(repo.list().await.unwrap().len(), 2);
        assert_eq!(repo.active_rules().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_overwrites_by_id() {
        let repo = InMemoryPriceRuleRepository::new();
        let mut r = rule(true);
        repo.save(r.clone()).await.unwrap();
        r.value = 25.0;
        repo.save(r.clone()).await.unwrap();

        let stored = repo.list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].value, 25.0);
    }
}
