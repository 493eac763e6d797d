use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum page size the audit read model will serve.
pub const AUDIT_PAGE_LIMIT: u32 = 100;

/// Append-only record of an engine-side state change. The core never mutates
/// or deletes entries; retention is an external concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub entity: String,
    pub entity_id: String,
    pub action: String,
    pub actor_user_id: String,
    pub payload: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        entity: &str,
        entity_id: String,
        action: &str,
        actor_user_id: String,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity: entity.to_string(),
            entity_id,
            action: action.to_string(),
            actor_user_id,
            payload,
            recorded_at: Utc::now(),
        }
    }
}

/// Filters for the audit read model. `limit` is capped at
/// [`AUDIT_PAGE_LIMIT`]; `page` is 1-based.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    pub entity: Option<String>,
    pub actor_user_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: u32,
    pub limit: u32,
}

impl AuditQuery {
    pub fn effective_limit(&self) -> usize {
        self.limit.clamp(1, AUDIT_PAGE_LIMIT) as usize
    }

    pub fn effective_page(&self) -> usize {
        self.page.max(1) as usize
    }

    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(entity) = &self.entity {
            if entry.entity != *entity {
                return false;
            }
        }
        if let Some(actor) = &self.actor_user_id {
            if entry.actor_user_id != *actor {
                return false;
            }
        }
        if let Some(from) = self.from {
            if entry.recorded_at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if entry.recorded_at > to {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditPage {
    pub entries: Vec<AuditEntry>,
    pub page: u32,
    pub total: usize,
}
