// src/domain/criteria.rs

use crate::domain::property::{PropertyRecord, StandardStatus};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An inclusive `[min, max]` bound where either end may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeBound<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T> Default for RangeBound<T> {
    fn default() -> Self {
        Self { min: None, max: None }
    }
}

impl<T: PartialOrd + Copy> RangeBound<T> {
    pub fn new(min: Option<T>, max: Option<T>) -> Self {
        Self { min, max }
    }

    pub fn at_least(min: T) -> Self {
        Self::new(Some(min), None)
    }

    pub fn between(min: T, max: T) -> Self {
        Self::new(Some(min), Some(max))
    }

    pub fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// An open bound admits everything, including a missing value.
    /// Any active end rejects a missing value.
    pub fn admits(&self, value: Option<T>) -> bool {
        if self.is_open() {
            return true;
        }
        let Some(v) = value else {
            return false;
        };
        self.min.map_or(true, |min| v >= min) && self.max.map_or(true, |max| v <= max)
    }
}

/// An immutable description of one property search.
///
/// Every populated field is an independent AND predicate; empty sets, open
/// bounds and `None` flags impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchCriteria {
    // Numeric bounds
    pub list_price: RangeBound<Decimal>,
    pub bedrooms: RangeBound<u32>,
    pub bathrooms_full: RangeBound<u32>,
    pub bathrooms_half: RangeBound<u32>,
    pub bathrooms_total: RangeBound<u32>,
    pub living_area: RangeBound<Decimal>,
    pub lot_size_square_feet: RangeBound<Decimal>,
    pub lot_size_acres: RangeBound<Decimal>,
    pub year_built: RangeBound<i32>,
    pub garage_spaces: RangeBound<u32>,
    pub parking_total: RangeBound<u32>,

    // Accepted-value sets
    pub statuses: Vec<StandardStatus>,
    /// Case-insensitive substring match against the property city.
    pub cities: Vec<String>,
    pub postal_codes: Vec<String>,
    /// Case-insensitive substring match against the property subdivision.
    pub subdivisions: Vec<String>,
    /// Exact match against elementary, middle/junior or high school.
    pub schools: Vec<String>,
    pub school_districts: Vec<String>,
    pub counties: Vec<String>,

    // Amenity flags
    pub flex_listing: Option<bool>,
    pub pool_private: Option<bool>,
    pub waterfront: Option<bool>,
    pub view: Option<bool>,
    pub horse: Option<bool>,
    pub association: Option<bool>,

    // Exact-match terms
    pub sale_contingency: Option<String>,
    pub occupant_type: Option<String>,
    pub possession: Option<String>,

    /// Closed listings must have closed on or after this date.
    pub closed_since: Option<NaiveDate>,
}

/// Case-insensitive substring match against any non-blank needle. Blank
/// needles are ignored; with none left there is no constraint.
fn contains_ci(haystack: &Option<String>, needles: &[String]) -> bool {
    let mut needles = needles
        .iter()
        .map(|needle| needle.trim().to_lowercase())
        .filter(|needle| !needle.is_empty())
        .peekable();
    if needles.peek().is_none() {
        return true;
    }
    let Some(haystack) = haystack.as_deref() else {
        return false;
    };
    let haystack = haystack.to_lowercase();
    needles.any(|needle| haystack.contains(&needle))
}

fn in_set(value: &Option<String>, accepted: &[String]) -> bool {
    accepted.is_empty()
        || value
            .as_deref()
            .is_some_and(|v| accepted.iter().any(|a| a == v))
}

fn flag_matches(wanted: Option<bool>, actual: Option<bool>) -> bool {
    match wanted {
        None => true,
        Some(w) => actual == Some(w),
    }
}

fn term_matches(wanted: &Option<String>, actual: &Option<String>) -> bool {
    match wanted {
        None => true,
        Some(w) => actual.as_deref() == Some(w.as_str()),
    }
}

impl SearchCriteria {
    /// The single predicate behind every search path.
    pub fn matches(&self, p: &PropertyRecord) -> bool {
        p.is_visible
            && self.matches_bounds(p)
            && self.matches_sets(p)
            && self.matches_flags(p)
            && self.matches_terms(p)
            && self.matches_close_date(p)
    }

    fn matches_bounds(&self, p: &PropertyRecord) -> bool {
        self.list_price.admits(p.list_price)
            && self.bedrooms.admits(p.bedrooms_total)
            && self.bathrooms_full.admits(p.bathrooms_full)
            && self.bathrooms_half.admits(p.bathrooms_half)
            && self.bathrooms_total.admits(p.bathrooms_total_integer)
            && self.living_area.admits(p.living_area)
            && self.lot_size_square_feet.admits(p.lot_size_square_feet)
            && self.lot_size_acres.admits(p.lot_size_acres)
            && self.year_built.admits(p.year_built)
            && self.garage_spaces.admits(p.garage_parking_spaces)
            && self.parking_total.admits(p.total_parking_spaces)
    }

    fn matches_sets(&self, p: &PropertyRecord) -> bool {
        let status_ok = self.statuses.is_empty()
            || p
                .standard_status
                .is_some_and(|s| self.statuses.contains(&s));

        let city_ok = contains_ci(&p.city, &self.cities);
        let subdivision_ok = contains_ci(&p.subdivision, &self.subdivisions);

        let school_ok = self.schools.is_empty()
            || [&p.elementary_school, &p.middle_or_junior_school, &p.high_school]
                .into_iter()
                .any(|school| in_set(school, &self.schools));

        status_ok
            && city_ok
            && subdivision_ok
            && school_ok
            && in_set(&p.postal_code, &self.postal_codes)
            && in_set(&p.school_district, &self.school_districts)
            && in_set(&p.county_or_parish, &self.counties)
    }

    fn matches_flags(&self, p: &PropertyRecord) -> bool {
        flag_matches(self.flex_listing, p.flex_listing_yn)
            && flag_matches(self.pool_private, p.pool_private_yn)
            && flag_matches(self.waterfront, p.waterfront_yn)
            && flag_matches(self.view, p.view_yn)
            && flag_matches(self.horse, p.horse_yn)
            && flag_matches(self.association, p.association_yn)
    }

    fn matches_terms(&self, p: &PropertyRecord) -> bool {
        term_matches(&self.sale_contingency, &p.property_sale_contingency)
            && term_matches(&self.occupant_type, &p.occupant_type)
            && term_matches(&self.possession, &p.possession)
    }

    fn matches_close_date(&self, p: &PropertyRecord) -> bool {
        match self.closed_since {
            Some(cutoff) if p.is_closed() => p.close_date.is_some_and(|d| d >= cutoff),
            _ => true,
        }
    }
}
