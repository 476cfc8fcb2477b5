//! Conversation entity definitions

use serde::{Deserialize, Serialize};

/// A conversation between exactly one patient and one doctor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Conversation {
    /// Whether the given user is one of the two participants.
    pub fn is_participant(&self, user_id: i64) -> bool {
        self.patient_id == user_id || self.doctor_id == user_id
    }

    /// The participant that is not `user_id`, if `user_id` is a participant.
    pub fn other_participant(&self, user_id: i64) -> Option<i64> {
        if self.patient_id == user_id {
            Some(self.doctor_id)
        } else if self.doctor_id == user_id {
            Some(self.patient_id)
        } else {
            None
        }
    }
}
