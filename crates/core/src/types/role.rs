//! Administrator roles.

use serde::{Deserialize, Serialize};

/// Admin role with different permission levels.
///
/// Roles are fixed when an account is created; there is no promotion or
/// demotion flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Root administrator. Created by first-run initialization; may create
    /// other administrators.
    SuperAdmin,
    /// Can edit organization and application settings.
    Admin,
}

impl AdminRole {
    /// Whether this role may create other admin accounts.
    #[must_use]
    pub const fn can_manage_admins(self) -> bool {
        matches!(self, Self::SuperAdmin)
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SuperAdmin => write!(f, "super_admin"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid admin role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_serde() {
        for role in [AdminRole::SuperAdmin, AdminRole::Admin] {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{role}\""));
            assert_eq!(role.to_string().parse::<AdminRole>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!("viewer".parse::<AdminRole>().is_err());
    }

    #[test]
    fn test_only_super_admin_manages_admins() {
        assert!(AdminRole::SuperAdmin.can_manage_admins());
        assert!(!AdminRole::Admin.can_manage_admins());
    }
}
