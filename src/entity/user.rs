use serde::{Deserialize, Serialize};

// User stored in the persisted auth blob
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUser {
    #[serde(alias = "_id")]
    pub id: String,
    pub username: String,
}

/// Auth token blob written by the login flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthBlob {
    pub token: String,
    pub user: SessionUser,
}
