//! User administration against the Cognito user pool.
//!
//! Admin flags live in custom attributes: `custom:is_admin`,
//! `custom:admin_level` and `custom:is_suspended`.

use std::collections::HashMap;

use aws_sdk_cognitoidentityprovider::primitives::DateTime;
use aws_sdk_cognitoidentityprovider::types::{AttributeType, UserType};
use jiff::Timestamp;
use ncp_core::models::user::{display_name, AdminLevel, AdminRoleUpdate, Identity, UserRecord};
use tracing::info;

use crate::client::Cognito;
use crate::error::AuthError;
use crate::jwt::flag;

pub const ATTR_IS_ADMIN: &str = "custom:is_admin";
pub const ATTR_ADMIN_LEVEL: &str = "custom:admin_level";
pub const ATTR_IS_SUSPENDED: &str = "custom:is_suspended";

pub const CANNOT_DELETE_SUPER: &str = "Cannot delete super admin users";
pub const CANNOT_DEMOTE_SUPER: &str = "Cannot demote super admin users";

/// A pool user with its attributes flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolUser {
    pub username: String,
    pub attributes: HashMap<String, String>,
    pub created_at: Option<Timestamp>,
    pub enabled: bool,
    pub confirmed: bool,
}

impl PoolUser {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn email(&self) -> Option<&str> {
        self.attr("email")
    }

    pub fn is_admin(&self) -> bool {
        flag(self.attr(ATTR_IS_ADMIN))
    }

    pub fn admin_level(&self) -> Option<AdminLevel> {
        self.attr(ATTR_ADMIN_LEVEL).and_then(|l| l.parse().ok())
    }

    pub fn is_super_admin(&self) -> bool {
        self.admin_level() == Some(AdminLevel::Super)
    }

    /// Suspended by attribute or disabled in the pool.
    pub fn is_suspended(&self) -> bool {
        flag(self.attr(ATTR_IS_SUSPENDED)) || !self.enabled
    }

    /// `identity` with its admin and suspension flags replaced by the
    /// pool's current values.
    pub fn current_identity(&self, identity: Identity) -> Identity {
        Identity {
            is_admin: self.is_admin(),
            admin_level: self.admin_level(),
            is_suspended: self.is_suspended(),
            ..identity
        }
    }

    /// The admin table row, given the user's NCP count. The pool's `sub`
    /// attribute is the id NCPs are owned by.
    pub fn to_record(&self, ncp_count: u64) -> UserRecord {
        UserRecord {
            id: self.attr("sub").unwrap_or(&self.username).to_string(),
            email: self.email().map(str::to_string),
            full_name: display_name(
                self.attr("given_name"),
                self.attr("family_name"),
                self.attr("name"),
                self.email(),
            ),
            created_at: self.created_at,
            last_sign_in_at: None,
            email_confirmed: self.confirmed,
            is_suspended: self.is_suspended(),
            is_admin: self.is_admin(),
            admin_level: self.admin_level(),
            ncp_count,
        }
    }
}

pub fn attribute_map(attributes: &[AttributeType]) -> HashMap<String, String> {
    attributes
        .iter()
        .filter_map(|a| a.value().map(|v| (a.name().to_string(), v.to_string())))
        .collect()
}

fn timestamp(dt: Option<&DateTime>) -> Option<Timestamp> {
    dt.and_then(|dt| Timestamp::from_second(dt.secs()).ok())
}

fn from_user_type(user: &UserType) -> PoolUser {
    PoolUser {
        username: user.username().unwrap_or_default().to_string(),
        attributes: attribute_map(user.attributes()),
        created_at: timestamp(user.user_create_date()),
        enabled: user.enabled(),
        confirmed: user
            .user_status()
            .is_some_and(|s| s.as_str() == "CONFIRMED"),
    }
}

fn cognito_err<E: std::fmt::Display>(e: E) -> AuthError {
    AuthError::Cognito(e.to_string())
}

fn attribute(name: &str, value: &str) -> Result<AttributeType, AuthError> {
    AttributeType::builder()
        .name(name)
        .value(value)
        .build()
        .map_err(cognito_err)
}

/// Every user in the pool, following pagination.
pub async fn list_users(cognito: &Cognito) -> Result<Vec<PoolUser>, AuthError> {
    let mut users = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let resp = cognito
            .client
            .list_users()
            .user_pool_id(&cognito.user_pool_id)
            .set_pagination_token(token.take())
            .send()
            .await
            .map_err(|e| cognito_err(e.into_service_error()))?;

        users.extend(resp.users().iter().map(from_user_type));

        match resp.pagination_token() {
            Some(next) if !next.is_empty() => token = Some(next.to_string()),
            _ => break,
        }
    }

    Ok(users)
}

/// One user by username (or `sub`, which Cognito accepts as username).
pub async fn get_user(cognito: &Cognito, username: &str) -> Result<PoolUser, AuthError> {
    let resp = cognito
        .client
        .admin_get_user()
        .user_pool_id(&cognito.user_pool_id)
        .username(username)
        .send()
        .await
        .map_err(|e| {
            let e = e.into_service_error();
            if e.is_user_not_found_exception() {
                AuthError::UserNotFound(username.to_string())
            } else {
                cognito_err(e)
            }
        })?;

    Ok(PoolUser {
        username: resp.username().to_string(),
        attributes: attribute_map(resp.user_attributes()),
        created_at: timestamp(resp.user_create_date()),
        enabled: resp.enabled(),
        confirmed: resp
            .user_status()
            .is_some_and(|s| s.as_str() == "CONFIRMED"),
    })
}

async fn update_attributes(cognito: &Cognito, username: &str, attributes: Vec<AttributeType>) -> Result<(), AuthError> {
    cognito
        .client
        .admin_update_user_attributes()
        .user_pool_id(&cognito.user_pool_id)
        .username(username)
        .set_user_attributes(Some(attributes))
        .send()
        .await
        .map_err(|e| cognito_err(e.into_service_error()))?;
    Ok(())
}

/// Suspend (disable and flag) or re-activate a user.
pub async fn set_suspended(cognito: &Cognito, username: &str, suspended: bool) -> Result<String, AuthError> {
    update_attributes(
        cognito,
        username,
        vec![attribute(ATTR_IS_SUSPENDED, if suspended { "true" } else { "false" })?],
    )
    .await?;

    if suspended {
        cognito
            .client
            .admin_disable_user()
            .user_pool_id(&cognito.user_pool_id)
            .username(username)
            .send()
            .await
            .map_err(|e| cognito_err(e.into_service_error()))?;
    } else {
        cognito
            .client
            .admin_enable_user()
            .user_pool_id(&cognito.user_pool_id)
            .username(username)
            .send()
            .await
            .map_err(|e| cognito_err(e.into_service_error()))?;
    }

    info!(username, suspended, "user status updated");
    Ok(status_message(suspended))
}

pub fn status_message(suspended: bool) -> String {
    format!("User {} successfully", if suspended { "suspended" } else { "activated" })
}

/// Super admins can never be deleted.
pub fn check_can_delete(target: &PoolUser) -> Result<(), AuthError> {
    if target.is_super_admin() {
        return Err(AuthError::Forbidden(CANNOT_DELETE_SUPER.to_string()));
    }
    Ok(())
}

/// Super admins can never be demoted.
pub fn check_role_change(target: &PoolUser, update: &AdminRoleUpdate) -> Result<(), AuthError> {
    if target.is_super_admin() && !update.is_admin {
        return Err(AuthError::Forbidden(CANNOT_DEMOTE_SUPER.to_string()));
    }
    Ok(())
}

pub fn role_message(update: &AdminRoleUpdate) -> String {
    if update.is_admin {
        format!("User promoted to admin ({} admin) successfully", update.admin_level)
    } else {
        "User demoted from admin successfully".to_string()
    }
}

/// Delete a user from the pool. Callers remove the user's data first.
pub async fn delete_user(cognito: &Cognito, target: &PoolUser) -> Result<(), AuthError> {
    check_can_delete(target)?;
    cognito
        .client
        .admin_delete_user()
        .user_pool_id(&cognito.user_pool_id)
        .username(&target.username)
        .send()
        .await
        .map_err(|e| cognito_err(e.into_service_error()))?;
    info!(username = %target.username, "user deleted");
    Ok(())
}

/// Promote or demote. Demotion clears the admin level.
pub async fn set_admin_role(cognito: &Cognito, target: &PoolUser, update: &AdminRoleUpdate) -> Result<String, AuthError> {
    check_role_change(target, update)?;
    let level = if update.is_admin { update.admin_level.as_str() } else { "" };
    update_attributes(
        cognito,
        &target.username,
        vec![
            attribute(ATTR_IS_ADMIN, if update.is_admin { "true" } else { "false" })?,
            attribute(ATTR_ADMIN_LEVEL, level)?,
        ],
    )
    .await?;
    info!(username = %target.username, is_admin = update.is_admin, level, "admin role updated");
    Ok(role_message(update))
}
