use async_trait::async_trait;
use tokio::sync::RwLock;
use voyra_core::audit::{AuditEntry, AuditPage, AuditQuery};
use voyra_core::repository::AuditLogRepository;
use voyra_core::EngineResult;

/// Append-only audit trail. The core never mutates or deletes entries;
/// retention is an external concern.
pub struct InMemoryAuditLogRepository {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditLogRepository {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryAuditLogRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLogRepository {
    async fn append(&self, entry: AuditEntry) -> EngineResult<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn query(&self, query: &AuditQuery) -> EngineResult<AuditPage> {
        let entries = self.entries.read().await;
        let mut matching: Vec<AuditEntry> = entries
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));

        let total = matching.len();
        let limit = query.effective_limit();
        let offset = (query.effective_page() - 1) * limit;
        let page_entries = matching.into_iter().skip(offset).take(limit).collect();

        Ok(AuditPage {
            entries: page_entries,
            page: query.effective_page() as u32,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn entry(entity: &str, actor: &str) -> AuditEntry {
        AuditEntry::new(
            entity,
            "id-1".to_string(),
            "BOOKING_CONFIRMED",
            actor.to_string(),
            serde_json::json!({}),
        )
    }

    #[tokio::test]
    async fn test_filter_by_entity_and_actor() {
        let repo = InMemoryAuditLogRepository::new();
        repo.append(entry("reservation", "u1")).await.unwrap();
        repo.append(entry("reservation", "u2")).await.unwrap();
        repo.append(entry("price_rule", "u1")).await.unwrap();

        let query = AuditQuery {
            entity: Some("reservation".to_string()),
            actor_user_id: Some("u1".to_string()),
            limit: 10,
            page: 1,
            ..Default::default()
        };
        let page = repo.query(&query).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_date_range_filter() {
        let repo = InMemoryAuditLogRepository::new();
        let mut old = entry("reservation", "u1");
        old.recorded_at = Utc::now() - Duration::days(10);
        repo.append(old).await.unwrap();
        repo.append(entry("reservation", "u1")).await.unwrap();

        let query = AuditQuery {
            from: Some(Utc::now() - Duration::days(1)),
            limit: 10,
            page: 1,
            ..Default::default()
        };
        assert_eq!(repo.query(&query).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_limit_capped_and_newest_first() {
        let repo = InMemoryAuditLogRepository::new();
        for i in 0..150 {
            let mut e = entry("reservation", "u1");
            e.recorded_at = Utc::now() - Duration::seconds(150 - i);
            repo.append(e).await.unwrap();
        }

        let query = AuditQuery { limit: 500, page: 1, ..Default::default() };
        let page = repo.query(&query).await.unwrap();
        assert_eq!(page.entries.len(), 100);
        assert_eq!(page.total, 150);
        assert!(page.entries[0].recorded_at >= page.entries[99].recorded_at);

        let second = repo
            .query(&AuditQuery { limit: 500, page: 2, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(second.entries.len(), 50);
    }
}
