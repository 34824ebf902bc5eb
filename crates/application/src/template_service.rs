use std::sync::Arc;

use campora_core::{AppError, AppResult, DepartmentId, TemplateId, UserId, UserIdentity};
use campora_domain::{
    AuditAction, RoleAssignment, RoleTemplate, TemplateEntry, TemplateType, window_end,
};
use chrono::Utc;

use crate::{
    AssignmentRepository, AuditEvent, AuditRepository, ResolutionCache, RoleRepository,
    TemplateRepository,
};

/// Input payload for template creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTemplateInput {
    /// Template name, unique per type.
    pub name: String,
    /// Organization type the template targets.
    pub template_type: TemplateType,
    /// Optional template description.
    pub description: String,
    /// Roles the template bundles.
    pub entries: Vec<TemplateEntry>,
}

/// Outcome of applying a template to one user: one row per entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedEntry {
    /// Role code of the applied entry.
    pub role_code: String,
    /// Whether a new ledger row was created; false when the user already
    /// held the role for that department.
    pub created: bool,
}

/// One user a batch application could not process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// The user that failed.
    pub user_id: UserId,
    /// Why the application failed.
    pub error: String,
}

/// Outcome of a batch template application.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchApplyOutcome {
    /// Users the template was applied to.
    pub succeeded: Vec<UserId>,
    /// Users that failed, with the reason.
    pub failed: Vec<BatchFailure>,
}

/// Application service for role templates: predefined role bundles applied
/// to users in one step.
#[derive(Clone)]
pub struct TemplateService {
    repository: Arc<dyn TemplateRepository>,
    role_repository: Arc<dyn RoleRepository>,
    assignment_repository: Arc<dyn AssignmentRepository>,
    cache: ResolutionCache,
    audit_repository: Arc<dyn AuditRepository>,
}

impl TemplateService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn TemplateRepository>,
        role_repository: Arc<dyn RoleRepository>,
        assignment_repository: Arc<dyn AssignmentRepository>,
        cache: ResolutionCache,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            repository,
            role_repository,
            assignment_repository,
            cache,
            audit_repository,
        }
    }

    /// Creates a template after checking every bundled role exists.
    pub async fn create_template(&self, input: CreateTemplateInput) -> AppResult<RoleTemplate> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation(
                "template name must not be empty".to_owned(),
            ));
        }

        for entry in &input.entries {
            self.role_repository
                .find_role(entry.role_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("role '{}' was not found", entry.role_id))
                })?;
        }

        let template = RoleTemplate {
            id: TemplateId::new(),
            name: input.name,
            template_type: input.template_type,
            description: input.description,
            is_active: true,
        };
        self.repository
            .insert_template(template.clone(), input.entries)
            .await?;

        Ok(template)
    }

    /// Returns a template by id.
    pub async fn template(&self, template_id: TemplateId) -> AppResult<RoleTemplate> {
        self.repository
            .find_template(template_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("template '{template_id}' was not found")))
    }

    /// Lists all templates.
    pub async fn list_templates(&self) -> AppResult<Vec<RoleTemplate>> {
        self.repository.list_templates().await
    }

    /// Lists a template's entries in bundle order.
    pub async fn template_entries(&self, template_id: TemplateId) -> AppResult<Vec<TemplateEntry>> {
        self.template(template_id).await?;
        self.repository.list_entries(template_id).await
    }

    /// Applies a template to one user: one get-or-create ledger row per
    /// entry. Re-applying is idempotent; rows the user already holds are
    /// left untouched and reported with `created == false`.
    pub async fn apply_to_user(
        &self,
        actor: &UserIdentity,
        template_id: TemplateId,
        user_id: UserId,
        department: Option<DepartmentId>,
    ) -> AppResult<Vec<AppliedEntry>> {
        let template = self.template(template_id).await?;
        let entries = self.repository.list_entries(template_id).await?;

        let applied = self
            .apply_entries(actor, &entries, user_id, department)
            .await?;

        self.cache.invalidate_user(user_id, None);

        self.append_audit(AuditEvent {
            actor: Some(actor.user_id()),
            action: AuditAction::TemplateApplied,
            resource_type: "role_template".to_owned(),
            resource_id: template.name.clone(),
            detail: Some(format!(
                "applied template '{}' to user '{user_id}' ({} role(s))",
                template.name,
                applied.len()
            )),
        })
        .await;

        Ok(applied)
    }

    /// Applies a template to a batch of users, collecting per-user
    /// failures instead of aborting the batch. The template and entries
    /// are fetched once.
    pub async fn apply_to_users(
        &self,
        actor: &UserIdentity,
        template_id: TemplateId,
        user_ids: Vec<UserId>,
        department: Option<DepartmentId>,
    ) -> AppResult<BatchApplyOutcome> {
        let template = self.template(template_id).await?;
        let entries = self.repository.list_entries(template_id).await?;

        let mut outcome = BatchApplyOutcome::default();
        for user_id in user_ids {
            match self.apply_entries(actor, &entries, user_id, department).await {
                Ok(_) => {
                    self.cache.invalidate_user(user_id, None);
                    outcome.succeeded.push(user_id);
                }
                Err(error) => outcome.failed.push(BatchFailure {
                    user_id,
                    error: error.to_string(),
                }),
            }
        }

        if !outcome.succeeded.is_empty() {
            self.append_audit(AuditEvent {
                actor: Some(actor.user_id()),
                action: AuditAction::TemplateApplied,
                resource_type: "role_template".to_owned(),
                resource_id: template.name.clone(),
                detail: Some(format!(
                    "applied template '{}' to {} user(s), {} failed",
                    template.name,
                    outcome.succeeded.len(),
                    outcome.failed.len()
                )),
            })
            .await;
        }

        Ok(outcome)
    }

    async fn apply_entries(
        &self,
        actor: &UserIdentity,
        entries: &[TemplateEntry],
        user_id: UserId,
        department: Option<DepartmentId>,
    ) -> AppResult<Vec<AppliedEntry>> {
        let now = Utc::now();
        let mut applied = Vec::with_capacity(entries.len());

        for entry in entries {
            let role = self
                .role_repository
                .find_role(entry.role_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("role '{}' was not found", entry.role_id))
                })?;

            let valid_until = match (entry.is_temporary, entry.valid_days) {
                (true, Some(days)) => Some(window_end(now, days)?),
                _ => None,
            };
            let assignment = RoleAssignment {
                user_id,
                role_id: entry.role_id,
                department,
                is_temporary: entry.is_temporary,
                valid_from: entry.is_temporary.then_some(now),
                valid_until,
                assigned_by: Some(actor.user_id()),
                assigned_at: now,
                notes: None,
            };

            let outcome = self.assignment_repository.create_if_absent(assignment).await?;
            applied.push(AppliedEntry {
                role_code: role.code,
                created: outcome.created,
            });
        }

        Ok(applied)
    }

    async fn append_audit(&self, event: AuditEvent) {
        if let Err(error) = self.audit_repository.append_event(event).await {
            tracing::warn!(%error, "audit sink unavailable, event dropped");
        }
    }
}
