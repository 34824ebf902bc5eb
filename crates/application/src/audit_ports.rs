use async_trait::async_trait;
use campora_core::{AppResult, UserId};
use campora_domain::AuditAction;

/// Immutable audit event payload emitted by permission mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Administrator that performed the action, when known.
    pub actor: Option<UserId>,
    /// Stable audit action identifier.
    pub action: AuditAction,
    /// Resource type label.
    pub resource_type: String,
    /// Resource identifier.
    pub resource_id: String,
    /// Optional audit detail payload.
    pub detail: Option<String>,
}

/// Port for the append-only audit sink.
///
/// The sink is best-effort from the core's point of view: services log and
/// swallow append failures so a dead sink never fails a primary operation.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}
