//! Role profile entity definitions
//!
//! Each user of a given role has at most one profile row of that role;
//! the profile carries the avatar image path used when serializing the
//! user for chat broadcasts.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: i64,
    pub user_id: i64,
    pub profile_pic: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: i64,
    pub user_id: i64,
    pub profile_pic: Option<String>,
    pub speciality: Option<String>,
    pub created_at: String,
}
