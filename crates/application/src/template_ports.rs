use async_trait::async_trait;
use campora_core::{AppResult, TemplateId};
use campora_domain::{RoleTemplate, TemplateEntry};

/// Repository port for role templates and their entries.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Persists a template and its entries; duplicate (name, type) signals
    /// `Conflict`.
    async fn insert_template(
        &self,
        template: RoleTemplate,
        entries: Vec<TemplateEntry>,
    ) -> AppResult<()>;

    /// Finds a template by id.
    async fn find_template(&self, template_id: TemplateId) -> AppResult<Option<RoleTemplate>>;

    /// Lists all templates ordered by type and name.
    async fn list_templates(&self) -> AppResult<Vec<RoleTemplate>>;

    /// Lists a template's entries ordered by sort order.
    async fn list_entries(&self, template_id: TemplateId) -> AppResult<Vec<TemplateEntry>>;
}
