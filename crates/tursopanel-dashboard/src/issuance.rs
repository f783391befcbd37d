//! Token issuance: authorize, resolve, mint, persist.

use crate::auth::CurrentUser;
use crate::error::DashboardError;
use crate::state::AppState;
use crate::validation::FieldErrors;
use tursopanel_store::{NewToken, TokenRecord};
use tursopanel_token::claims::GRANTEE_SENTINEL;
use tursopanel_token::{
    Expiry, Grantee, MAX_EXPIRATION_DAYS, ScopeResolver, Subject, Target, TokenScope,
};

/// A validated issuance request.
#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub target: Target,
    pub grantee: Grantee,
    pub expiry: Expiry,
    pub name: Option<String>,
}

/// Database or group row the token is about, after the policy check.
struct AuthorizedSubject {
    database_id: Option<i64>,
    group_id: Option<i64>,
}

/// Issue a full-access / read-only pair and record it.
pub async fn issue(
    state: &AppState,
    requester: &CurrentUser,
    request: IssueRequest,
) -> Result<TokenRecord, DashboardError> {
    validate(&request)?;

    let subject = authorize(state, requester, &request.target).await?;
    check_grantee(state, request.grantee).await?;

    let scope = TokenScope {
        target: request.target.clone(),
        grantee: request.grantee,
    };
    let resolved = ScopeResolver::resolve(&scope, state.store()).await?;
    let pair = state.minter().mint_pair(&resolved, request.expiry)?;

    let record = state
        .store()
        .insert_token(&NewToken {
            name: request.name.unwrap_or_else(|| resolved.subject.clone()),
            full_access_token: pair.full_access,
            read_only_token: pair.read_only,
            expiration_days: pair.expiry.days(),
            expires_at: pair.expires_at,
            grantee: resolved.grantee,
            database_id: subject.database_id,
            group_id: subject.group_id,
            created_by: requester.0.id,
        })
        .await?;

    tracing::info!(
        token_id = record.id,
        subject = %resolved.subject,
        is_group = resolved.is_group,
        requester = %requester.0.username,
        expiration_days = record.expiration_days,
        "issued token pair"
    );
    Ok(record)
}

fn validate(request: &IssueRequest) -> Result<(), DashboardError> {
    let mut errors = FieldErrors::default();

    let grantee_id = match request.grantee {
        Grantee::User(id) | Grantee::Group(id) => id,
    };
    if grantee_id == GRANTEE_SENTINEL {
        errors.add("grantee", "The grantee id must be a positive integer.");
    }
    match request.target.subject() {
        Subject::Name(name) if name.trim().is_empty() => {
            errors.add("target", "The target name must not be empty.");
        }
        Subject::Id(0) => errors.add("target", "The target id must be a positive integer."),
        _ => {}
    }
    if let Expiry::Days(days) = request.expiry
        && days > MAX_EXPIRATION_DAYS
    {
        errors.add(
            "expiration_days",
            format!(
                "The expiration may not exceed {MAX_EXPIRATION_DAYS} days; use 0 for unlimited."
            ),
        );
    }
    if let Some(name) = &request.name
        && name.trim().is_empty()
    {
        errors.add("name", "The name must not be empty.");
    }

    errors.into_result()
}

/// Only the owner of the database or group, or an admin, may issue tokens for it.
async fn authorize(
    state: &AppState,
    requester: &CurrentUser,
    target: &Target,
) -> Result<AuthorizedSubject, DashboardError> {
    let store = state.store();
    match target {
        Target::Database(subject) => {
            let record = match subject {
                Subject::Id(id) => store.find_database(to_row_id(*id)?).await?,
                Subject::Name(name) => store.find_database_by_name(name).await?,
            }
            .filter(|db| !db.is_archived())
            .ok_or_else(|| DashboardError::NotFound(describe("database", subject)))?;

            if !requester.can_manage(record.owner_id) {
                return Err(DashboardError::Forbidden(format!(
                    "you do not own database '{}'",
                    record.name
                )));
            }
            Ok(AuthorizedSubject {
                database_id: Some(record.id),
                group_id: None,
            })
        }
        Target::Group(subject) => {
            let record = match subject {
                Subject::Id(id) => store.find_group(to_row_id(*id)?).await?,
                Subject::Name(name) => store.find_group_by_name(name).await?,
            }
            .ok_or_else(|| DashboardError::NotFound(describe("group", subject)))?;

            if !requester.can_manage(record.owner_id) {
                return Err(DashboardError::Forbidden(format!(
                    "you do not own group '{}'",
                    record.name
                )));
            }
            Ok(AuthorizedSubject {
                database_id: None,
                group_id: Some(record.id),
            })
        }
    }
}

/// The grantee must be an existing user, or an existing group for team grants.
async fn check_grantee(state: &AppState, grantee: Grantee) -> Result<(), DashboardError> {
    let store = state.store();
    let exists = match grantee {
        Grantee::User(id) => match i64::try_from(id) {
            Ok(id) => store.find_user(id).await?.is_some(),
            Err(_) => false,
        },
        Grantee::Group(id) => match i64::try_from(id) {
            Ok(id) => store.find_group(id).await?.is_some(),
            Err(_) => false,
        },
    };
    if exists {
        return Ok(());
    }

    let mut errors = FieldErrors::default();
    match grantee {
        Grantee::User(id) => errors.add("grantee", format!("There is no user with id {id}.")),
        Grantee::Group(id) => errors.add("grantee", format!("There is no group with id {id}.")),
    }
    errors.into_result()
}

fn to_row_id(id: u64) -> Result<i64, DashboardError> {
    i64::try_from(id).map_err(|_| DashboardError::NotFound(format!("id {id}")))
}

fn describe(kind: &str, subject: &Subject) -> String {
    match subject {
        Subject::Id(id) => format!("{kind} with id {id}"),
        Subject::Name(name) => format!("{kind} '{name}'"),
    }
}
