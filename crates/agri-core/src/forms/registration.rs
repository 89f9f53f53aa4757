// ============================================================================
// Registration form
// ============================================================================

use serde::Serialize;

use crate::error::ValidationError;
use crate::types::Role;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Body of `POST /auth/register/`. The role goes up in upper case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub phone: String,
    pub organization: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationDraft {
    pub role: Role,
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone: String,
    pub organization: String,
    pub address: String,
}

impl RegistrationDraft {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            username: String::new(),
            email: String::new(),
            password: String::new(),
            confirm_password: String::new(),
            phone: String::new(),
            organization: String::new(),
            address: String::new(),
        }
    }

    pub fn validate(&self) -> Result<RegistrationRequest, ValidationError> {
        if self.username.trim().is_empty() || self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ValidationError::RequiredFields);
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort { min: MIN_PASSWORD_LEN });
        }

        Ok(RegistrationRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            role: self.role,
            phone: self.phone.trim().to_string(),
            organization: self.organization.trim().to_string(),
            address: self.address.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> RegistrationDraft {
        RegistrationDraft {
            username: "meena".into(),
            email: "meena@example.com".into(),
            password: "harvest2024".into(),
            confirm_password: "harvest2024".into(),
            organization: "Meena Traders".into(),
            ..RegistrationDraft::new(Role::Retailer)
        }
    }

    #[test]
    fn test_valid_registration() {
        let request = filled().validate().unwrap();
        assert_eq!(serde_json::to_value(&request).unwrap()["role"], "RETAILER");
    }

    #[test]
    fn test_checks_in_order() {
        let mut draft = filled();
        draft.email.clear();
        assert_eq!(draft.validate(), Err(ValidationError::RequiredFields));

        let mut draft = filled();
        draft.confirm_password = "harvest2025".into();
        assert_eq!(draft.validate().unwrap_err().to_string(), "Passwords do not match");

        let mut draft = filled();
        draft.password = "short".into();
        draft.confirm_password = "short".into();
        assert_eq!(
            draft.validate().unwrap_err().to_string(),
            "Password must be at least 8 characters"
        );
    }
}
