use serde::{Deserialize, Serialize};

use crate::models::ids::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// True for bot accounts, including our own.
    pub bot: bool,
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>, bot: bool) -> Self {
        Self {
            id,
            name: name.into(),
            bot,
        }
    }
}
