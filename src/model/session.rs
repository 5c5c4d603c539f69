use serde::{Deserialize, Serialize};

/// Body of `POST /login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub student_id: String,
    pub password: String,
}

/// The signed-in user as returned by the backend and kept in the secure store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub student_id: String,
    pub name: String,
}

/// Response of `POST /login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserProfile,
}
