// src/params.rs

use crate::domain::{RangeBound, SearchCriteria, StandardStatus};
use crate::errors::ServerError;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;

/// Decoded query-string pairs, in request order.
#[derive(Debug, Default, Clone)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn parse(query: Option<&str>) -> Self {
        let pairs = query
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self { pairs }
    }

    pub fn from_request(req: &astra::Request) -> Self {
        Self::parse(req.uri().query())
    }

    /// Last non-blank value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
            .find(|v| !v.is_empty())
    }

    /// Every value for `key`, from repeated keys and comma-separated values.
    pub fn list(&self, key: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .flat_map(|(_, v)| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn parsed<T>(&self, key: &str) -> Result<Option<T>, ServerError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|e| ServerError::BadRequest(format!("{key}: {e}")))
            })
            .transpose()
    }

    pub fn parsed_list<T>(&self, key: &str) -> Result<Vec<T>, ServerError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.list(key)
            .into_iter()
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|e| ServerError::BadRequest(format!("{key}: {e}")))
            })
            .collect()
    }

    pub fn flag(&self, key: &str) -> Result<Option<bool>, ServerError> {
        self.get(key)
            .map(|raw| match raw.to_lowercase().as_str() {
                "true" | "1" | "yes" | "y" => Ok(true),
                "false" | "0" | "no" | "n" => Ok(false),
                other => Err(ServerError::BadRequest(format!(
                    "{key}: expected a boolean, got '{other}'"
                ))),
            })
            .transpose()
    }

    pub fn date(&self, key: &str) -> Result<Option<NaiveDate>, ServerError> {
        self.get(key)
            .map(|raw| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|e| ServerError::BadRequest(format!("{key}: {e}")))
            })
            .transpose()
    }

    /// RFC 3339 timestamp, or a bare date taken as midnight UTC.
    pub fn timestamp(&self, key: &str) -> Result<Option<DateTime<Utc>>, ServerError> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some(ts.with_timezone(&Utc)));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| Some(dt.and_utc()))
            .ok_or_else(|| ServerError::BadRequest(format!("{key}: expected an RFC 3339 timestamp or a date")))
    }

    fn range<T>(&self, prefix: &str) -> Result<RangeBound<T>, ServerError>
    where
        T: FromStr + PartialOrd + Copy,
        T::Err: Display,
    {
        let min = self.parsed(&format!("{prefix}Min"))?;
        let max = self.parsed(&format!("{prefix}Max"))?;
        Ok(RangeBound::new(min, max))
    }

    /// Non-empty id set from `ids`.
    pub fn id_set(&self) -> Result<BTreeSet<String>, ServerError> {
        let ids: BTreeSet<String> = self.list("ids").into_iter().collect();
        if ids.is_empty() {
            return Err(ServerError::BadRequest("ids: at least one property id is required".into()));
        }
        Ok(ids)
    }

    pub fn limit_offset(&self) -> Result<(Option<usize>, Option<usize>), ServerError> {
        Ok((self.parsed("limit")?, self.parsed("offset")?))
    }

    /// Builds search criteria from the query string. Unknown keys are ignored.
    pub fn search_criteria(&self) -> Result<SearchCriteria, ServerError> {
        let mut statuses: Vec<StandardStatus> = self.parsed_list("statuses")?;
        statuses.extend(self.parsed_list::<StandardStatus>("status")?);

        Ok(SearchCriteria {
            list_price: self.range("listPrice")?,
            bedrooms: self.range("bedrooms")?,
            bathrooms_full: self.range("bathroomsFull")?,
            bathrooms_half: self.range("bathroomsHalf")?,
            bathrooms_total: self.range("bathroomsTotal")?,
            living_area: self.range("livingArea")?,
            lot_size_square_feet: self.range("lotSizeSquareFeet")?,
            lot_size_acres: self.range("lotSizeAcres")?,
            year_built: self.range("yearBuilt")?,
            garage_spaces: self.range("garageSpaces")?,
            parking_total: self.range("parkingTotal")?,

            statuses,
            cities: self.list("cities"),
            postal_codes: self.list("postalCodes"),
            subdivisions: self.list("subdivisions"),
            schools: self.list("schools"),
            school_districts: self.list("schoolDistricts"),
            counties: self.list("counties"),

            flex_listing: self.flag("flexListing")?,
            pool_private: self.flag("poolPrivate")?,
            waterfront: self.flag("waterfront")?,
            view: self.flag("view")?,
            horse: self.flag("horse")?,
            association: self.flag("association")?,

            sale_contingency: self.get("saleContingency").map(str::to_string),
            occupant_type: self.get("occupantType").map(str::to_string),
            possession: self.get("possession").map(str::to_string),

            closed_since: self.date("closedSince")?,
        })
    }
}
