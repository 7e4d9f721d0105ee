//! Permission checks over `role_permissions` and `resource_memberships`.
//!
//! A user holds a permission either through their role (global) or through a
//! membership row scoped to one resource instance. There is no caching and
//! no hierarchy beyond these two sources.

use sqlx::PgPool;
use portal_core::permissions::ResourceScope;
use portal_core::types::DbId;

/// Answers permission questions and manages scoped grants.
pub struct PermissionRepo;

impl PermissionRepo {
    /// Whether `user_id` holds `permission`, globally through the role or,
    /// when `scope` is given, through a membership on that resource.
    ///
    /// Inactive users hold no permissions.
    pub async fn has_permission(
        pool: &PgPool,
        user_id: DbId,
        permission: &str,
        scope: Option<ResourceScope>,
    ) -> Result<bool, sqlx::Error> {
        let (resource_type, resource_id) = match scope {
            Some(s) => (Some(s.resource_type), Some(s.resource_id)),
            None => (None, None),
        };
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                SELECT 1 FROM users u
                JOIN role_permissions rp ON rp.role_id = u.role_id
                JOIN permissions p ON p.id = rp.permission_id
                WHERE u.id = $1 AND u.is_active AND p.slug = $2
             ) OR EXISTS (
                SELECT 1 FROM resource_memberships m
                JOIN permissions p ON p.id = m.permission_id
                JOIN users u ON u.id = m.user_id
                WHERE m.user_id = $1 AND u.is_active AND p.slug = $2
                  AND m.resource_type = $3 AND m.resource_id = $4
             )",
        )
        .bind(user_id)
        .bind(permission)
        .bind(resource_type)
        .bind(resource_id)
        .fetch_one(pool)
        .await
    }

    /// Active users holding `permission` through their role.
    pub async fn user_ids_with_permission(
        pool: &PgPool,
        permission: &str,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT u.id FROM users u
             JOIN role_permissions rp ON rp.role_id = u.role_id
             JOIN permissions p ON p.id = rp.permission_id
             WHERE u.is_active AND p.slug = $1
             ORDER BY u.id",
        )
        .bind(permission)
        .fetch_all(pool)
        .await
    }

    /// Grant `permission` to a user on one resource. Idempotent.
    ///
    /// Returns `false` when the permission slug does not exist.
    pub async fn grant_membership(
        pool: &PgPool,
        user_id: DbId,
        permission: &str,
        scope: ResourceScope,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO resource_memberships (user_id, permission_id, resource_type, resource_id)
             SELECT $1, p.id, $3, $4 FROM permissions p WHERE p.slug = $2
             ON CONFLICT ON CONSTRAINT uq_resource_memberships DO NOTHING",
        )
        .bind(user_id)
        .bind(permission)
        .bind(scope.resource_type)
        .bind(scope.resource_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
