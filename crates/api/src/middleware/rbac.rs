//! Permission-based access control.
//!
//! Permissions are slugs granted to roles (global) or to a user on a single
//! resource instance. [`RequirePermission`] enforces a global slug at the
//! type level; handlers that need a scoped or conditional check call
//! [`has_permission`] / [`ensure_permission`] after loading the resource.

use std::marker::PhantomData;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use portal_core::error::CoreError;
use portal_core::permissions::{self, ResourceScope};
use portal_db::repositories::PermissionRepo;

use super::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// A permission slug usable with [`RequirePermission`].
pub trait Permission {
    const SLUG: &'static str;
    /// Message returned with the 403.
    const DENIED: &'static str;
}

/// `project.view_all`: the approval list and every project.
pub struct ViewAllProjects;

impl Permission for ViewAllProjects {
    const SLUG: &'static str = permissions::PROJECT_VIEW_ALL;
    const DENIED: &'static str = "You are not allowed to list all projects";
}

/// `legal_instrument.manage`: the legal instrument catalog.
pub struct ManageLegalInstruments;

impl Permission for ManageLegalInstruments {
    const SLUG: &'static str = permissions::LEGAL_INSTRUMENT_MANAGE;
    const DENIED: &'static str = "You are not allowed to manage legal instruments";
}

/// Requires the global permission `P`. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn catalog(perm: RequirePermission<ManageLegalInstruments>) -> AppResult<Json<()>> {
///     tracing::debug!(user_id = perm.user.user_id, "catalog access");
///     Ok(Json(()))
/// }
/// ```
pub struct RequirePermission<P: Permission> {
    pub user: AuthUser,
    _permission: PhantomData<P>,
}

impl<P: Permission> FromRequestParts<AppState> for RequirePermission<P> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        ensure_permission(state, &user, P::SLUG, None, P::DENIED).await?;
        Ok(RequirePermission {
            user,
            _permission: PhantomData,
        })
    }
}

/// Whether `user` holds `slug`, globally or on `scope`.
pub async fn has_permission(
    state: &AppState,
    user: &AuthUser,
    slug: &str,
    scope: Option<ResourceScope>,
) -> AppResult<bool> {
    Ok(PermissionRepo::has_permission(&state.pool, user.user_id, slug, scope).await?)
}

/// Fail with 403 and `denied` unless `user` holds `slug`.
pub async fn ensure_permission(
    state: &AppState,
    user: &AuthUser,
    slug: &str,
    scope: Option<ResourceScope>,
    denied: &str,
) -> AppResult<()> {
    if has_permission(state, user, slug, scope).await? {
        Ok(())
    } else {
        tracing::debug!(user_id = user.user_id, permission = slug, "Permission denied");
        Err(AppError::Core(CoreError::Forbidden(denied.to_string())))
    }
}
