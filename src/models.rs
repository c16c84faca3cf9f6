use serde::{Deserialize, Serialize};

use crate::token::SubjectId;

// Login request body
#[derive(Deserialize, Serialize, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// Login response body
#[derive(Deserialize, Serialize, Clone)]
pub struct TokenResponse {
    pub token: String,
    pub expires_in: u64,
}

// Who the bearer token says the caller is
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct SubjectResponse {
    pub subject_id: SubjectId,
}
