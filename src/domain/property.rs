// src/domain/property.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The normalized listing lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StandardStatus {
    Active,
    #[serde(rename = "Active Under Contract")]
    ActiveUnderContract,
    Pending,
    Closed,
    Expired,
    Withdrawn,
    Cancelled,
    Terminated,
}

impl StandardStatus {
    pub const ALL: [StandardStatus; 8] = [
        StandardStatus::Active,
        StandardStatus::ActiveUnderContract,
        StandardStatus::Pending,
        StandardStatus::Closed,
        StandardStatus::Expired,
        StandardStatus::Withdrawn,
        StandardStatus::Cancelled,
        StandardStatus::Terminated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StandardStatus::Active => "Active",
            StandardStatus::ActiveUnderContract => "Active Under Contract",
            StandardStatus::Pending => "Pending",
            StandardStatus::Closed => "Closed",
            StandardStatus::Expired => "Expired",
            StandardStatus::Withdrawn => "Withdrawn",
            StandardStatus::Cancelled => "Cancelled",
            StandardStatus::Terminated => "Terminated",
        }
    }
}

impl fmt::Display for StandardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StandardStatus {
    type Err = String;

    /// Accepts the display label in any case, with or without spaces
    /// ("Active Under Contract", "ActiveUnderContract", "active under contract").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let squashed: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_lowercase();

        StandardStatus::ALL
            .into_iter()
            .find(|status| status.as_str().replace(' ', "").to_lowercase() == squashed)
            .ok_or_else(|| format!("unknown standard status '{s}'"))
    }
}

/// One listing snapshot as supplied by the property store.
///
/// Every field except the identifier and the visibility flag is optional;
/// absent values are excluded from whatever predicate or metric reads them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    pub id: String,
    pub listing_id: Option<String>,
    pub standard_status: Option<StandardStatus>,

    // Pricing
    pub list_price: Option<Decimal>,
    pub close_price: Option<Decimal>,
    pub original_list_price: Option<Decimal>,

    // Structure
    pub bedrooms_total: Option<u32>,
    pub bathrooms_full: Option<u32>,
    pub bathrooms_half: Option<u32>,
    pub bathrooms_total_integer: Option<u32>,
    pub living_area: Option<Decimal>,
    pub lot_size_square_feet: Option<Decimal>,
    pub lot_size_acres: Option<Decimal>,
    pub year_built: Option<i32>,
    pub garage_parking_spaces: Option<u32>,
    pub total_parking_spaces: Option<u32>,
    pub main_level_bedrooms: Option<u32>,
    pub property_type: Option<String>,
    pub property_sub_type: Option<String>,

    // Market timing
    pub days_on_market: Option<u32>,
    pub cumulative_days_on_market: Option<u32>,
    pub listing_contract_date: Option<NaiveDate>,
    pub close_date: Option<NaiveDate>,
    pub modification_timestamp: Option<DateTime<Utc>>,

    // Location
    pub unparsed_address: Option<String>,
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub city: Option<String>,
    pub state_or_province: Option<String>,
    pub postal_code: Option<String>,
    pub subdivision: Option<String>,
    pub county_or_parish: Option<String>,

    // Schools
    pub elementary_school: Option<String>,
    pub middle_or_junior_school: Option<String>,
    pub high_school: Option<String>,
    pub school_district: Option<String>,

    // Amenity flags
    #[serde(rename = "flexListingYN")]
    pub flex_listing_yn: Option<bool>,
    #[serde(rename = "poolPrivateYN")]
    pub pool_private_yn: Option<bool>,
    #[serde(rename = "waterfrontYN")]
    pub waterfront_yn: Option<bool>,
    #[serde(rename = "viewYN")]
    pub view_yn: Option<bool>,
    #[serde(rename = "horseYN")]
    pub horse_yn: Option<bool>,
    #[serde(rename = "associationYN")]
    pub association_yn: Option<bool>,

    // Terms
    pub property_sale_contingency: Option<String>,
    pub occupant_type: Option<String>,
    pub possession: Option<String>,

    /// Must be true for the record to appear in any result.
    #[serde(default)]
    pub is_visible: bool,
}

/// Returns the first candidate that is present and non-zero.
///
/// Candidates are listed in precedence order. A zero counts as missing so a
/// placeholder in a higher-precedence field does not mask a real value in a
/// lower one.
pub fn first_present<T>(candidates: impl IntoIterator<Item = Option<T>>) -> Option<T>
where
    T: Default + PartialEq,
{
    candidates
        .into_iter()
        .flatten()
        .find(|v| *v != T::default())
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl PropertyRecord {
    pub fn is_closed(&self) -> bool {
        self.standard_status == Some(StandardStatus::Closed)
    }

    /// Realized value for sold comps, asking value for everything else.
    ///
    /// A Closed record without a close price has no derived price; the list
    /// price is never substituted for it.
    pub fn derived_price(&self) -> Option<Decimal> {
        if self.is_closed() {
            self.close_price
        } else {
            self.list_price
        }
    }

    /// Derived price divided by living area, when the area is positive.
    pub fn price_per_sq_ft(&self) -> Option<Decimal> {
        let area = self.living_area.filter(|a| *a > Decimal::ZERO)?;
        let price = self.derived_price()?;
        price.checked_div(area)
    }

    /// Days on market, in precedence order:
    /// 1. `days_on_market`
    /// 2. `cumulative_days_on_market`
    pub fn resolved_days_on_market(&self) -> Option<u32> {
        first_present([self.days_on_market, self.cumulative_days_on_market])
    }

    /// Bathroom count, in precedence order:
    /// 1. `bathrooms_total_integer`
    /// 2. `bathrooms_full`
    pub fn resolved_bathrooms(&self) -> Option<u32> {
        first_present([self.bathrooms_total_integer, self.bathrooms_full])
    }

    /// Display address, in precedence order:
    /// 1. `unparsed_address`
    /// 2. `"<street_number> <street_name>, <city>"` when a street name exists
    pub fn resolved_address(&self) -> Option<String> {
        if let Some(address) = non_blank(&self.unparsed_address) {
            return Some(address.to_string());
        }

        let street_name = non_blank(&self.street_name)?;
        let street = match non_blank(&self.street_number) {
            Some(number) => format!("{number} {street_name}"),
            None => street_name.to_string(),
        };

        Some(match non_blank(&self.city) {
            Some(city) => format!("{street}, {city}"),
            None => street,
        })
    }
}
