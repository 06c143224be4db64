use std::fmt;
use std::str::FromStr;

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use super::domain::UserId;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Account role asserted by the authenticating gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Donor,
    Recipient,
    Hospital,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Donor => "donor",
            Role::Recipient => "recipient",
            Role::Hospital => "hospital",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = IdentityError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "donor" => Ok(Role::Donor),
            "recipient" => Ok(Role::Recipient),
            "hospital" => Ok(Role::Hospital),
            _ => Err(IdentityError::UnknownRole(raw.to_string())),
        }
    }
}

/// Authenticated caller of a booking operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub user_id: UserId,
    pub role: Role,
}

impl Requester {
    pub fn donor(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Donor,
        }
    }

    pub fn hospital(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Hospital,
        }
    }

    pub fn recipient(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Recipient,
        }
    }

    pub fn require(&self, role: Role) -> Result<UserId, AccessDenied> {
        if self.role == role {
            Ok(self.user_id)
        } else {
            Err(AccessDenied {
                required: role,
                actual: self.role,
            })
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, IdentityError> {
        let user_id = header_value(headers, USER_ID_HEADER)?
            .parse::<u64>()
            .map_err(|_| IdentityError::Malformed(USER_ID_HEADER))?;
        let role = header_value(headers, USER_ROLE_HEADER)?.parse::<Role>()?;

        Ok(Self {
            user_id: UserId(user_id),
            role,
        })
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, IdentityError> {
    headers
        .get(name)
        .ok_or(IdentityError::Missing(name))?
        .to_str()
        .map_err(|_| IdentityError::Malformed(name))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("operation reserved for {required} accounts (caller is {actual})")]
pub struct AccessDenied {
    pub required: Role,
    pub actual: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("missing identity header {0}")]
    Missing(&'static str),
    #[error("malformed identity header {0}")]
    Malformed(&'static str),
    #[error("unknown role '{0}'")]
    UnknownRole(String),
}
