use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
pub enum Role {
    Admin,
    Dispatcher,
    #[serde(rename = "Entry Operator")]
    #[strum(serialize = "Entry Operator")]
    EntryOperator,
    Accountant,
}

/// Navigation destinations a role may be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Module {
    Dashboard,
    Bilty,
    Vehicle,
    Schedule,
    Seller,
    Supplier,
    Billing,
    Reports,
}

impl Module {
    pub const ALL: [Module; 8] = [
        Module::Dashboard,
        Module::Bilty,
        Module::Vehicle,
        Module::Schedule,
        Module::Seller,
        Module::Supplier,
        Module::Billing,
        Module::Reports,
    ];
}

impl Role {
    pub fn capabilities(self) -> &'static [Module] {
        match self {
            Role::Admin => &Module::ALL,
            Role::Dispatcher => &[Module::Dashboard, Module::Bilty, Module::Vehicle, Module::Schedule],
            Role::EntryOperator => &[Module::Bilty, Module::Seller, Module::Supplier],
            Role::Accountant => &[Module::Dashboard, Module::Billing, Module::Reports],
        }
    }

    pub fn permits(self, module: Module) -> bool {
        self.capabilities().contains(&module)
    }
}

/// The signed-in user, carried explicitly on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Session {
    pub fn can(&self, module: Module) -> bool {
        self.role.permits(module)
    }

    pub fn authorize(&self, module: Module) -> Result<(), AppError> {
        if self.can(module) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!("{} cannot access {}", self.role, module)))
        }
    }

    /// Passes when any one of `modules` is granted.
    pub fn authorize_any(&self, modules: &[Module]) -> Result<(), AppError> {
        match modules.iter().find(|m| self.can(**m)) {
            Some(_) => Ok(()),
            None => Err(AppError::forbidden(format!("{} cannot access this resource", self.role))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// bcrypt hash. Entries without one are admitted on email alone.
    #[serde(default)]
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Success(Session),
    InvalidCredentials,
}

#[derive(Debug, Clone)]
pub struct UserDirectory {
    users: Vec<DirectoryUser>,
}

impl Default for UserDirectory {
    fn default() -> Self {
        let seed = |id: &str, name: &str, email: &str, role| DirectoryUser {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            password_hash: None,
        };
        UserDirectory::new(vec![
            seed("1", "Admin User", "admin@bilty.com", Role::Admin),
            seed("2", "Dispatch Manager", "dispatcher@bilty.com", Role::Dispatcher),
            seed("3", "Entry Operator", "entry@bilty.com", Role::EntryOperator),
            seed("4", "Accounts", "accounts@bilty.com", Role::Accountant),
        ])
    }
}

impl UserDirectory {
    pub fn new(users: Vec<DirectoryUser>) -> Self {
        UserDirectory { users }
    }

    /// Reads a JSON array of users.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::internal(format!("Cannot read user directory {}: {e}", path.display())))?;
        let users: Vec<DirectoryUser> = serde_json::from_str(&raw)
            .map_err(|e| AppError::internal(format!("Invalid user directory {}: {e}", path.display())))?;
        Ok(UserDirectory::new(users))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AppError> {
        let email = email.trim();
        let Some(user) = self.users.iter().find(|u| u.email.eq_ignore_ascii_case(email)) else {
            return Ok(LoginOutcome::InvalidCredentials);
        };

        if let Some(hash) = &user.password_hash {
            let ok = bcrypt::verify(password, hash)
                .map_err(|e| AppError::internal(format!("Password verify error: {e}")))?;
            if !ok {
                return Ok(LoginOutcome::InvalidCredentials);
            }
        }

        Ok(LoginOutcome::Success(Session {
            user_id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: Role) -> Session {
        Session { user_id: "u".into(), name: "U".into(), email: "u@bilty.com".into(), role }
    }

    #[test]
    fn admin_is_granted_every_module() {
        let admin = session(Role::Admin);
        assert!(Module::ALL.iter().all(|m| admin.can(*m)));
    }

    #[test]
    fn other_roles_are_limited_to_their_modules() {
        let dispatcher = session(Role::Dispatcher);
        assert!(dispatcher.authorize(Module::Bilty).is_ok());
        assert!(matches!(dispatcher.authorize(Module::Billing), Err(AppError::Forbidden(_))));

        let operator = session(Role::EntryOperator);
        assert!(operator.can(Module::Seller));
        assert!(!operator.can(Module::Dashboard));

        let accountant = session(Role::Accountant);
        assert!(accountant.authorize_any(&[Module::Reports, Module::Billing]).is_ok());
        assert!(accountant.authorize(Module::Vehicle).is_err());
    }

    #[test]
    fn login_by_email_without_stored_hash() {
        let directory = UserDirectory::default();
        match directory.login(" Admin@Bilty.com ", "anything").ok() {
            Some(LoginOutcome::Success(s)) => assert_eq!(s.role, Role::Admin),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(
            directory.login("nobody@bilty.com", "").ok(),
            Some(LoginOutcome::InvalidCredentials)
        );
    }

    #[test]
    fn login_checks_password_when_hash_present() {
        let hash = bcrypt::hash("s3cret", 4).expect("hash");
        let directory = UserDirectory::new(vec![DirectoryUser {
            id: "9".into(),
            name: "Accounts".into(),
            email: "accounts@bilty.com".into(),
            role: Role::Accountant,
            password_hash: Some(hash),
        }]);
        assert!(matches!(directory.login("accounts@bilty.com", "s3cret"), Ok(LoginOutcome::Success(_))));
        assert_eq!(
            directory.login("accounts@bilty.com", "wrong").ok(),
            Some(LoginOutcome::InvalidCredentials)
        );
    }

    #[test]
    fn roles_parse_from_display_strings() {
        assert_eq!("Entry Operator".parse::<Role>().ok(), Some(Role::EntryOperator));
        assert_eq!(Module::Billing.as_ref(), "billing");
    }
}
