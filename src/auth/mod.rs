//! Authentication and authorization module
//!
//! Provides JWT-based authentication and role-based access control.

mod jwt;
mod middleware;
mod password;

pub use jwt::{create_token, decode_token, Claims};
pub use middleware::auth_middleware;
pub use password::{hash_password, verify_password};

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// User roles for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access to every resource
    Admin,
    /// Can manage their own research output
    Faculty,
    Student,
    Public,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Faculty => "faculty",
            Role::Student => "student",
            Role::Public => "public",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Public
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "faculty" => Ok(Role::Faculty),
            "student" => Ok(Role::Student),
            "public" => Ok(Role::Public),
            _ => Err(()),
        }
    }
}

/// Permit or reject a request based on the caller's role claim.
///
/// The single capability check used by every role-gated route.
pub fn authorize(claims: &Claims, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&claims.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Access denied".to_string()))
    }
}

/// Role check plus an ownership predicate for resources whose non-admin
/// mutation is restricted to the row's creator. Admins bypass the predicate.
pub fn authorize_owned<F>(claims: &Claims, allowed: &[Role], is_owner: F) -> Result<(), AppError>
where
    F: Fn(&Claims) -> bool,
{
    authorize(claims, allowed)?;

    if claims.role != Role::Admin && !is_owner(claims) {
        return Err(AppError::Forbidden(
            "You can only modify resources you created".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn claims(role: Role) -> Claims {
        Claims {
            sub: 7,
            email: "user@example.edu".to_string(),
            role,
            iat: 0,
            exp: i64::MAX,
        }
    }

    #[test]
    fn test_authorize_permits_listed_role() {
        assert!(authorize(&claims(Role::Faculty), &[Role::Admin, Role::Faculty]).is_ok());
    }

    #[test]
    fn test_authorize_rejects_unlisted_role() {
        let err = authorize(&claims(Role::Student), &[Role::Admin]).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_ownership_gates_non_admins() {
        let faculty = claims(Role::Faculty);
        let allowed = [Role::Admin, Role::Faculty];

        // Owner passes, non-owner does not.
        assert!(authorize_owned(&faculty, &allowed, |c| c.sub == 7).is_ok());
        assert!(authorize_owned(&faculty, &allowed, |c| c.sub == 99).is_err());
    }

    #[test]
    fn test_admin_bypasses_ownership() {
        assert!(authorize_owned(&claims(Role::Admin), &[Role::Admin, Role::Faculty], |_| false).is_ok());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse(), Ok(Role::Admin));
        assert_eq!("public".parse(), Ok(Role::Public));
        assert!("superuser".parse::<Role>().is_err());
    }
}
