// src/domain/seller_update.rs

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How often a seller expects an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateFrequency {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

impl UpdateFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateFrequency::Daily => "daily",
            UpdateFrequency::Weekly => "weekly",
            UpdateFrequency::Monthly => "monthly",
        }
    }

    /// The earliest time the next update may go out after `last_sent_at`.
    pub fn next_due(self, last_sent_at: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            UpdateFrequency::Daily => last_sent_at + Duration::days(1),
            UpdateFrequency::Weekly => last_sent_at + Duration::weeks(1),
            UpdateFrequency::Monthly => last_sent_at
                .checked_add_months(Months::new(1))
                .unwrap_or(last_sent_at + Duration::days(30)),
        }
    }
}

impl FromStr for UpdateFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(UpdateFrequency::Daily),
            "weekly" => Ok(UpdateFrequency::Weekly),
            "monthly" => Ok(UpdateFrequency::Monthly),
            other => Err(format!("unknown update frequency '{other}'")),
        }
    }
}

/// The saved search behind a recurring seller update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerUpdateCriteria {
    /// A blank postal code disables the postal filter ("watch everything").
    pub postal_code: Option<String>,
    pub elementary_school: Option<String>,
    pub property_sub_type: Option<String>,
    /// Watermark of the last successful send.
    pub last_sent_at: Option<DateTime<Utc>>,
}

/// Seller-update criteria as kept by the seller-update store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSellerUpdate {
    pub id: i64,
    pub name: String,
    pub frequency: UpdateFrequency,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub criteria: SellerUpdateCriteria,
}

impl StoredSellerUpdate {
    /// Never-sent criteria are always due.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        match self.criteria.last_sent_at {
            None => true,
            Some(last) => self.frequency.next_due(last) <= now,
        }
    }
}

/// Request body for creating stored criteria.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSellerUpdate {
    pub name: String,
    #[serde(default)]
    pub frequency: UpdateFrequency,
    pub postal_code: Option<String>,
    pub elementary_school: Option<String>,
    pub property_sub_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stored(frequency: UpdateFrequency, last_sent_at: Option<DateTime<Utc>>) -> StoredSellerUpdate {
        StoredSellerUpdate {
            id: 1,
            name: "Downtown watch".into(),
            frequency,
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            criteria: SellerUpdateCriteria {
                postal_code: Some("78701".into()),
                last_sent_at,
                ..Default::default()
            },
        }
    }

    #[test]
    fn never_sent_is_due() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert!(stored(UpdateFrequency::Monthly, None).is_due(now));
    }

    #[test]
    fn weekly_waits_a_full_week() {
        let last = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let update = stored(UpdateFrequency::Weekly, Some(last));
        assert!(!update.is_due(last + Duration::days(6)));
        assert!(update.is_due(last + Duration::days(7)));
    }

    #[test]
    fn monthly_uses_calendar_months() {
        let last = Utc.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap();
        assert_eq!(
            UpdateFrequency::Monthly.next_due(last),
            Utc.with_ymd_and_hms(2024, 2, 29, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn inactive_is_never_due() {
        let mut update = stored(UpdateFrequency::Daily, None);
        update.is_active = false;
        assert!(!update.is_due(Utc::now()));
    }
}
