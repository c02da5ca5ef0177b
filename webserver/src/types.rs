//! Request and response bodies for the HTTP API

use serde::{Deserialize, Serialize};
use shared::{ClusterView, ContactId, Submission};

/// Phone numbers arrive either as JSON strings or bare numbers
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PhoneNumberInput {
    Text(String),
    Number(serde_json::Number),
}

impl PhoneNumberInput {
    pub fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}

/// Body of `POST /identify`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<PhoneNumberInput>,
}

impl From<IdentifyRequest> for Submission {
    fn from(request: IdentifyRequest) -> Self {
        Submission::new(request.email, request.phone_number.map(PhoneNumberInput::into_string))
    }
}

/// Consolidated contact as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPayload {
    pub primary_contact_id: ContactId,
    pub emails: Vec<String>,
    pub phone_numbers: Vec<String>,
    pub secondary_contact_ids: Vec<ContactId>,
}

impl From<ClusterView> for ContactPayload {
    fn from(view: ClusterView) -> Self {
        Self {
            primary_contact_id: view.primary_id,
            emails: view.emails,
            phone_numbers: view.phone_numbers,
            secondary_contact_ids: view.secondary_ids,
        }
    }
}

/// Body of a successful `POST /identify`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyResponse {
    pub contact: ContactPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Unix seconds
    pub timestamp: i64,
    /// Seconds since the server started
    pub uptime: u64,
}
