use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AdminLevel {
    Regular,
    Super,
}

impl AdminLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AdminLevel::Regular => "regular",
            AdminLevel::Super => "super",
        }
    }
}

impl fmt::Display for AdminLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regular" => Ok(AdminLevel::Regular),
            "super" => Ok(AdminLevel::Super),
            other => Err(CoreError::UnknownAdminLevel(other.to_string())),
        }
    }
}

/// The signed-in identity as seen by route gating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Identity {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub admin_level: Option<AdminLevel>,
    #[serde(default)]
    pub is_suspended: bool,
}

impl Identity {
    /// Admin pages are open to any admin that is not suspended.
    pub fn can_access_admin(&self) -> bool {
        self.is_admin && !self.is_suspended
    }

    /// Promotion, demotion and provider changes need a super admin.
    /// An admin without an explicit level counts as regular.
    pub fn is_super_admin(&self) -> bool {
        self.can_access_admin() && self.admin_level == Some(AdminLevel::Super)
    }
}

/// A user row in the admin user table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserRecord {
    pub id: String,
    pub email: Option<String>,
    pub full_name: String,
    pub created_at: Option<jiff::Timestamp>,
    pub last_sign_in_at: Option<jiff::Timestamp>,
    pub email_confirmed: bool,
    pub is_suspended: bool,
    pub is_admin: bool,
    pub admin_level: Option<AdminLevel>,
    pub ncp_count: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserStatusUpdate {
    pub suspended: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AdminRoleUpdate {
    pub is_admin: bool,
    #[serde(default = "default_admin_level")]
    pub admin_level: AdminLevel,
}

fn default_admin_level() -> AdminLevel {
    AdminLevel::Regular
}

/// Generic acknowledgement returned by admin mutations.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Display name for a user: first + last name when known, otherwise a
/// name derived from the e-mail local part (`john.doe@x` → `John Doe`).
pub fn display_name(first: Option<&str>, last: Option<&str>, full: Option<&str>, email: Option<&str>) -> String {
    let joined = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if !joined.is_empty() {
        return joined;
    }

    if let Some(full) = full.map(str::trim).filter(|f| !f.is_empty()) {
        return full.to_string();
    }

    let Some(local) = email.and_then(|e| e.split('@').next()).filter(|l| !l.is_empty()) else {
        return String::new();
    };

    local
        .split(['.', '_', '-'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
