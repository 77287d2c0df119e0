//! Remote API data model

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

pub mod auth;
pub mod post;
pub mod user;

pub use auth::{AuthResponse, Login, Otp, Signup};
pub use post::{
    Applicant, ApplicantStatus, ApplicantStatusUpdate, MailData, Post, PostDraft, PostStatus,
    RoleRequirement,
};
pub use user::{PlatformStats, ProfileUpdate, UserProfile};

/// Timestamp as sent by the backend
///
/// Depending on serializer configuration the backend sends date-times either as ISO-8601 strings,
/// or as `[year, month, day, hour, minute, second, nanos]` arrays with trailing parts optional.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Parts(Vec<u32>),
}

impl RawTimestamp {
    fn into_datetime(self) -> Option<NaiveDateTime> {
        match self {
            RawTimestamp::Text(text) => text.parse::<NaiveDateTime>().ok().or_else(|| {
                text.parse::<chrono::DateTime<chrono::FixedOffset>>()
                    .ok()
                    .map(|dt| dt.naive_utc())
            }),
            RawTimestamp::Parts(parts) => {
                let part = |idx: usize| parts.get(idx).copied().unwrap_or(0);
                let [year, month, day] = [0, 1, 2].map(|idx| parts.get(idx).copied());
                let date = NaiveDate::from_ymd_opt(year? as i32, month?, day?)?;
                date.and_hms_nano_opt(part(3), part(4), part(5), part(6))
            }
        }
    }
}

/// Deserializes optional backend timestamp
///
/// Unparsable timestamps are treated as missing rather than failing the whole payload.
pub(crate) fn deserialize_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawTimestamp> = Deserialize::deserialize(deserializer)?;
    Ok(raw.and_then(RawTimestamp::into_datetime))
}

/// Deserializes `null` the same way as a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let value: Option<T> = Deserialize::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}
