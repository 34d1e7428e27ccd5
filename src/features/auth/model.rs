use serde::{Deserialize, Serialize};
use sqlx::Type;
use utoipa::ToSchema;
use uuid::Uuid;

/// Actor role carried in the identity token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Reporter,
    Driver,
    Partner,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Reporter => write!(f, "reporter"),
            Role::Driver => write!(f, "driver"),
            Role::Partner => write!(f, "partner"),
        }
    }
}

/// Caller identity resolved by the auth middleware
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Admins act on anything; everyone else only on what they own
    pub fn owns_or_admin(&self, owner_id: Option<Uuid>) -> bool {
        self.is_admin() || owner_id == Some(self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owns_or_admin() {
        let driver = AuthenticatedUser::new(Uuid::new_v4(), Role::Driver);
        let admin = AuthenticatedUser::new(Uuid::new_v4(), Role::Admin);

        assert!(driver.owns_or_admin(Some(driver.user_id)));
        assert!(!driver.owns_or_admin(Some(Uuid::new_v4())));
        assert!(!driver.owns_or_admin(None));
        assert!(admin.owns_or_admin(None));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Driver).unwrap(), "\"driver\"");
        assert_eq!(Role::Partner.to_string(), "partner");
    }
}
