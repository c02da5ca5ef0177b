//! Identify request and response messages

use serde::{Deserialize, Serialize};

use crate::errors::{SharedError, SharedResult};
use crate::types::ContactId;

/// Contact details submitted for identification
///
/// Empty strings are treated as absent. Matching is exact, so no other
/// normalization happens here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

impl Submission {
    pub fn new(email: Option<String>, phone_number: Option<String>) -> Self {
        Self {
            email: email.filter(|e| !e.is_empty()),
            phone_number: phone_number.filter(|p| !p.is_empty()),
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.is_empty())
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref().filter(|p| !p.is_empty())
    }

    /// Require at least one identifying field
    pub fn validate(&self) -> SharedResult<()> {
        if self.email().is_none() && self.phone_number().is_none() {
            return Err(SharedError::InvalidSubmission {
                reason: "either email or phoneNumber must be provided".to_string(),
            });
        }
        Ok(())
    }
}

/// Consolidated view of one identity cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterView {
    pub primary_id: ContactId,
    /// Distinct emails, primary's first, then by ascending contact id
    pub emails: Vec<String>,
    /// Distinct phone numbers, same ordering as `emails`
    pub phone_numbers: Vec<String>,
    /// Secondary contact ids, ascending
    pub secondary_ids: Vec<ContactId>,
}
