//! Test fixtures and data for reconciler tests

use chrono::{DateTime, Duration, TimeZone, Utc};
use shared::{Contact, ContactId, LinkPrecedence, Submission};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const DOC_EMAIL: &'static str = "doc@hillvalley.edu";
    pub const MARTY_EMAIL: &'static str = "marty@hillvalley.edu";
    pub const BIFF_EMAIL: &'static str = "biff@hillvalley.edu";
    pub const DOC_PHONE: &'static str = "123456";
    pub const MARTY_PHONE: &'static str = "717171";
    pub const BIFF_PHONE: &'static str = "919191";

    pub fn submission(email: Option<&str>, phone: Option<&str>) -> Submission {
        Submission::new(email.map(str::to_string), phone.map(str::to_string))
    }

    pub fn email_only(email: &str) -> Submission {
        Self::submission(Some(email), None)
    }

    pub fn phone_only(phone: &str) -> Submission {
        Self::submission(None, Some(phone))
    }

    pub fn pair(email: &str, phone: &str) -> Submission {
        Self::submission(Some(email), Some(phone))
    }

    /// Fixed point in the past for pre-seeded rows
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 4, 1, 0, 0, 0).unwrap()
    }

    pub fn primary(id: i64, email: Option<&str>, phone: Option<&str>, age_secs: i64) -> Contact {
        Self::row(id, email, phone, None, age_secs)
    }

    pub fn secondary(id: i64, email: Option<&str>, phone: Option<&str>, linked: i64, age_secs: i64) -> Contact {
        Self::row(id, email, phone, Some(linked), age_secs)
    }

    fn row(id: i64, email: Option<&str>, phone: Option<&str>, linked: Option<i64>, age_secs: i64) -> Contact {
        let created = Self::epoch() + Duration::seconds(age_secs);
        Contact {
            id: ContactId(id),
            email: email.map(str::to_string),
            phone_number: phone.map(str::to_string),
            linked_id: linked.map(ContactId),
            link_precedence: if linked.is_some() {
                LinkPrecedence::Secondary
            } else {
                LinkPrecedence::Primary
            },
            created_at: created,
            updated_at: created,
            deleted_at: None,
        }
    }
}
