//! Authenticated principal.

use serde::{Deserialize, Serialize};

use crate::auth::proto::User;

/// The caller resolved from a valid credential.
///
/// Created once per authenticated request and dropped with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}
