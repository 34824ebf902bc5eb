use crate::state::AppState;

use campora_application::{CreateModuleInput, CreateRoleInput, CreateTemplateInput, SeedOutcome};
use campora_core::{AppError, AppResult, UserId, UserIdentity};
use campora_domain::{Action, Role, RoleType, TemplateEntry, TemplateType};

use tracing::info;
use uuid::Uuid;

const DEV_SEED_ACTOR_ID: &str = "7c1f4b7e-8f3a-4d25-9c06-5f0a54d9b1f2";
const DEV_SEED_ACTOR_NAME: &str = "Platform Seeder";
const DEV_SEED_ACTOR_EMAIL: &str = "seeder@campora.local";

const DEV_SEED_TEMPLATE_NAME: &str = "ERP Universitario Básico";

/// Seeds the development catalog: modules, the academic permission grid,
/// the university role set, and the baseline grants for student and
/// teacher roles. Safe to run repeatedly.
pub async fn run(state: &AppState) -> AppResult<()> {
    let actor = seed_actor()?;

    ensure_modules(state).await?;
    let outcome = seed_academic_grid(state).await?;
    info!(
        created = outcome.created.len(),
        skipped_or_failed = outcome.failed.len(),
        "academic permission grid seeded"
    );

    let roles = ensure_university_roles(state).await?;
    ensure_university_template(state, &roles).await?;
    ensure_baseline_grants(state, &actor).await?;

    info!("development permission seed completed");
    Ok(())
}

fn seed_actor() -> AppResult<UserIdentity> {
    let parsed = Uuid::parse_str(DEV_SEED_ACTOR_ID).map_err(|error| {
        AppError::Internal(format!(
            "invalid static dev seed actor id '{DEV_SEED_ACTOR_ID}': {error}"
        ))
    })?;
    Ok(UserIdentity::new(
        UserId::from_uuid(parsed),
        DEV_SEED_ACTOR_NAME,
        Some(DEV_SEED_ACTOR_EMAIL.to_owned()),
    ))
}

async fn ensure_modules(state: &AppState) -> AppResult<()> {
    let modules = [
        ("academic", "Académico", "Gestión académica y estudiantil"),
        ("financial", "Financiero", "Gestión financiera y contable"),
        ("users", "Usuarios", "Gestión de usuarios y roles"),
        ("reports", "Reportes", "Generación y consulta de reportes"),
        ("system", "Sistema", "Configuración del sistema"),
    ];

    for (position, (code, name, description)) in modules.into_iter().enumerate() {
        let created = state
            .catalog_service
            .create_module(CreateModuleInput {
                code: code.to_owned(),
                name: name.to_owned(),
                description: description.to_owned(),
                sort_order: i32::try_from(position).map_err(|_| {
                    AppError::Internal("module sort order exceeded i32 range".to_owned())
                })?,
            })
            .await;

        match created {
            Ok(_) => info!(module = code, "module created"),
            Err(AppError::Conflict(_)) => {}
            Err(error) => return Err(error),
        }
    }

    Ok(())
}

async fn seed_academic_grid(state: &AppState) -> AppResult<SeedOutcome> {
    let grid = vec![
        (
            "students".to_owned(),
            vec![
                Action::View,
                Action::Create,
                Action::Edit,
                Action::Delete,
                Action::Export,
            ],
        ),
        (
            "teachers".to_owned(),
            vec![Action::View, Action::Create, Action::Edit, Action::Delete],
        ),
        (
            "courses".to_owned(),
            vec![
                Action::View,
                Action::Create,
                Action::Edit,
                Action::Delete,
                Action::Manage,
            ],
        ),
        (
            "grades".to_owned(),
            vec![Action::View, Action::Create, Action::Edit, Action::Approve],
        ),
        (
            "schedules".to_owned(),
            vec![Action::View, Action::Create, Action::Edit],
        ),
    ];

    state
        .catalog_service
        .create_module_permissions("academic", grid)
        .await
}

async fn ensure_university_roles(state: &AppState) -> AppResult<Vec<Role>> {
    let definitions = [
        ("estudiante", "Estudiante", RoleType::Business),
        ("docente", "Docente", RoleType::Business),
        ("coordinador", "Coordinador Académico", RoleType::Business),
        ("administrativo", "Personal Administrativo", RoleType::Business),
        ("super_admin", "Super Administrador", RoleType::System),
    ];

    let mut existing = state.role_service.list_roles().await?;
    let mut roles = Vec::with_capacity(definitions.len());

    for (code, name, role_type) in definitions {
        if let Some(role) = existing.iter().find(|role| role.code == code) {
            roles.push(role.clone());
            continue;
        }

        let role = state
            .role_service
            .create_role(CreateRoleInput {
                code: code.to_owned(),
                name: name.to_owned(),
                role_type,
                description: format!("Rol de {} en el sistema universitario", name.to_lowercase()),
            })
            .await?;
        info!(role = code, "role created");
        existing.push(role.clone());
        roles.push(role);
    }

    Ok(roles)
}

async fn ensure_university_template(state: &AppState, roles: &[Role]) -> AppResult<()> {
    let templates = state.template_service.list_templates().await?;
    if templates.iter().any(|template| {
        template.name == DEV_SEED_TEMPLATE_NAME && template.template_type == TemplateType::University
    }) {
        return Ok(());
    }

    let entries = roles
        .iter()
        .enumerate()
        .map(|(position, role)| TemplateEntry {
            sort_order: i32::try_from(position).unwrap_or(0),
            ..TemplateEntry::required(role.id)
        })
        .collect();

    state
        .template_service
        .create_template(CreateTemplateInput {
            name: DEV_SEED_TEMPLATE_NAME.to_owned(),
            template_type: TemplateType::University,
            description: "Plantilla con roles básicos para sistema universitario".to_owned(),
            entries,
        })
        .await?;
    info!(template = DEV_SEED_TEMPLATE_NAME, "university template created");

    Ok(())
}

async fn ensure_baseline_grants(state: &AppState, actor: &UserIdentity) -> AppResult<()> {
    let baseline: [(&str, &[&str]); 2] = [
        (
            "estudiante",
            &[
                "academic.courses.view.own",
                "academic.grades.view.own",
                "academic.schedules.view.own",
            ],
        ),
        (
            "docente",
            &[
                "academic.courses.view.all",
                "academic.courses.edit.own",
                "academic.students.view.department",
                "academic.grades.create.own",
                "academic.grades.edit.own",
            ],
        ),
    ];

    for (role_code, codes) in baseline {
        let role = state.role_service.role_by_code(role_code).await?;

        let outcome = state
            .role_service
            .bulk_assign_permissions(
                actor,
                role.id,
                codes.iter().map(|code| (*code).to_owned()).collect(),
            )
            .await?;

        if let Some(failure) = outcome.failed.first() {
            return Err(AppError::Internal(format!(
                "seed grant '{}' for role '{role_code}' failed: {}",
                failure.code, failure.error
            )));
        }

        info!(
            role = role_code,
            granted = outcome.assigned.len(),
            "baseline grants applied"
        );
    }

    Ok(())
}
