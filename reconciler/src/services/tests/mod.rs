//! Service-specific tests
//!
//! Each store implementation has its own test file.


#[cfg(test)]
pub mod common {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use shared::{Contact, ContactId, LinkPrecedence};

    /// Fixed epoch so test rows have predictable seniority
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 4, 1, 0, 0, 0).unwrap()
    }

    /// Existing row created `age_secs` after the epoch
    pub fn stored(id: i64, email: Option<&str>, phone: Option<&str>, linked: Option<i64>, age_secs: i64) -> Contact {
        let created = epoch() + Duration::seconds(age_secs);
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
