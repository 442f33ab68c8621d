//! Request identity and role capabilities.
//!
//! Checks happen here, in the request layer, before any service is called.
//! Owners see and modify only their own recipients, messages and mailings.
//! Managers see everything and administer users, but may not create or
//! modify campaign data.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::user::Role;
use crate::services::user_service;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;
        let pool = SqlitePool::from_ref(state);
        match user_service::find_by_token(&pool, token).await? {
            Some(user) if user.is_active => Ok(AuthUser {
                id: user.id,
                email: user.email,
                role: user.role,
            }),
            _ => Err(AppError::Unauthorized),
        }
    }
}

pub struct ManagerUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for ManagerUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.is_manager() {
            Ok(ManagerUser(user))
        } else {
            Err(AppError::denied("manager rights required"))
        }
    }
}

impl AuthUser {
    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }

    /// Owner filter for list queries; `None` means every record.
    pub fn scope(&self) -> Option<i64> {
        if self.is_manager() {
            None
        } else {
            Some(self.id)
        }
    }

    pub fn can_view(&self, owner_id: Option<i64>) -> bool {
        self.is_manager() || owner_id == Some(self.id)
    }

    pub fn ensure_can_view(&self, owner_id: Option<i64>, what: &str) -> AppResult<()> {
        if self.can_view(owner_id) {
            Ok(())
        } else {
            Err(AppError::denied(format!("you cannot view another user's {what}")))
        }
    }

    pub fn ensure_can_create(&self, what: &str) -> AppResult<()> {
        if self.is_manager() {
            return Err(AppError::denied(format!("managers cannot create {what}")));
        }
        Ok(())
    }

    pub fn ensure_can_modify(&self, owner_id: Option<i64>, what: &str) -> AppResult<()> {
        if self.is_manager() {
            return Err(AppError::denied(format!("managers cannot modify {what}")));
        }
        if owner_id != Some(self.id) {
            return Err(AppError::denied(format!("you can only modify your own {what}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, role: Role) -> AuthUser {
        AuthUser {
            id,
            email: format!("u{id}@example.com"),
            role,
        }
    }

    #[test]
    fn owner_is_scoped_to_own_records() {
        let owner = user(1, Role::Owner);
        assert_eq!(owner.scope(), Some(1));
        assert!(owner.can_view(Some(1)));
        assert!(!owner.can_view(Some(2)));
        assert!(!owner.can_view(None));
        assert!(owner.ensure_can_create("recipients").is_ok());
        assert!(owner.ensure_can_modify(Some(1), "mailings").is_ok());
        assert!(matches!(
            owner.ensure_can_modify(Some(2), "mailings"),
            Err(AppError::PermissionDenied(_))
        ));
    }

    #[test]
    fn manager_sees_everything_but_cannot_mutate() {
        let manager = user(9, Role::Manager);
        assert_eq!(manager.scope(), None);
        assert!(manager.can_view(Some(1)));
        assert!(manager.can_view(None));
        assert!(manager.ensure_can_create("messages").is_err());
        assert!(manager.ensure_can_modify(Some(9), "messages").is_err());
    }

    #[test]
    fn orphaned_records_are_read_only_for_owners() {
        let owner = user(1, Role::Owner);
        assert!(owner.ensure_can_modify(None, "recipients").is_err());
    }
}
