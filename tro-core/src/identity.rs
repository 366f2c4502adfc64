use serde::{Deserialize, Serialize};

/// Back-office roles, established by the external auth layer and forwarded
/// to the API. Capability checks live in the lifecycle manager, not in
/// whatever UI happens to call it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdminRole {
    Admin,
    SuperAdmin,
}

impl AdminRole {
    /// Only super-admins may permanently delete booking records.
    pub fn can_purge_bookings(&self) -> bool {
        matches!(self, AdminRole::SuperAdmin)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(AdminRole::Admin),
            "super-admin" | "superadmin" => Some(AdminRole::SuperAdmin),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purge_capability_is_super_admin_only() {
        assert!(!AdminRole::Admin.can_purge_bookings());
        assert!(AdminRole::SuperAdmin.can_purge_bookings());
    }

    #[test]
    fn parses_header_spellings() {
        assert_eq!(AdminRole::parse("Super-Admin"), Some(AdminRole::SuperAdmin));
        assert_eq!(AdminRole::parse("admin"), Some(AdminRole::Admin));
        assert_eq!(AdminRole::parse("viewer"), None);
    }
}
