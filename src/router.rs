use crate::analysis::{
    aggregate_metrics, get_properties, market_summary, match_seller_update, search_properties,
    timeline, MarketSummary, Metric, SellerUpdateMatch, StatisticsCache, StatisticsKey,
};
use crate::config::AppConfig;
use crate::db::connection::Database;
use crate::db::{properties, seller_updates};
use crate::domain::{NewSellerUpdate, PropertyRecord, SellerUpdateCriteria};
use crate::errors::ServerError;
use crate::params::QueryParams;
use crate::responses::{json_response, json_status_response, ResultResp};
use astra::Request;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::io::Read;
use std::sync::Arc;
use tracing::debug;

/// Everything a request handler needs, shared across server workers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub cache: Arc<StatisticsCache>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> Self {
        Self {
            db,
            cache: Arc::new(StatisticsCache::new()),
            config,
        }
    }
}

pub fn handle(mut req: Request, state: &AppState) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let query = QueryParams::from_request(&req);
    debug!(%method, %path, "request");

    match (method.as_str(), path.as_str()) {
        ("GET", "/health") => json_response(&json!({ "status": "ok" })),

        ("GET", "/properties") => list_properties(state, &query),
        ("GET", "/properties/search") => find_properties(state, &query),
        ("POST", "/properties") => {
            let records: Vec<PropertyRecord> = read_json(&mut req)?;
            upsert_properties(state, &records)
        }

        ("GET", "/cma/statistics") => statistics(state, &query),
        ("GET", "/cma/timeline") => price_timeline(state, &query),
        ("DELETE", "/cma/statistics/cache") => {
            let dropped = state.cache.len();
            state.cache.clear();
            json_response(&json!({ "cleared": dropped }))
        }

        ("GET", "/seller-updates") => json_response(&seller_updates::list_seller_updates(&state.db)?),
        ("POST", "/seller-updates") => {
            let new: NewSellerUpdate = read_json(&mut req)?;
            let created = seller_updates::create_seller_update(&state.db, &new, Utc::now())?;
            json_status_response(201, &created)
        }
        ("GET", "/seller-updates/preview") => seller_update_preview(state, &query),

        _ => Err(ServerError::NotFound),
    }
}

fn read_json<T: DeserializeOwned>(req: &mut Request) -> Result<T, ServerError> {
    let mut body = String::new();
    req.body_mut()
        .reader()
        .read_to_string(&mut body)
        .map_err(|e| ServerError::BadRequest(format!("unreadable body: {e}")))?;
    Ok(serde_json::from_str(&body)?)
}

fn list_properties(state: &AppState, query: &QueryParams) -> ResultResp {
    let criteria = query.search_criteria()?;
    let (limit, offset) = query.limit_offset()?;
    let inventory = properties::load_visible_properties(&state.db)?;
    json_response(&get_properties(&inventory, &criteria, limit, offset))
}

fn find_properties(state: &AppState, query: &QueryParams) -> ResultResp {
    let criteria = query.search_criteria()?;
    let (limit, offset) = query.limit_offset()?;
    let inventory = properties::load_visible_properties(&state.db)?;
    json_response(&search_properties(&inventory, &criteria, limit, offset))
}

fn upsert_properties(state: &AppState, records: &[PropertyRecord]) -> ResultResp {
    let written = properties::upsert_properties(&state.db, records)?;
    for id in &written {
        state.cache.invalidate_property(id);
    }
    json_response(&json!({ "upserted": written.len() }))
}

fn statistics(state: &AppState, query: &QueryParams) -> ResultResp {
    let ids = query.id_set()?;
    let mut metrics: Vec<Metric> = query.parsed_list("metrics")?;
    if metrics.is_empty() {
        metrics = Metric::ALL.to_vec();
    }

    let key = StatisticsKey::new(&ids, &metrics);
    let result = state.cache.get_or_try_insert_with(key, || {
        let records = properties::load_properties_by_ids(&state.db, &ids)?;
        Ok::<_, ServerError>(aggregate_metrics(&records, &ids, &metrics)?)
    })?;
    json_response(&result)
}

fn price_timeline(state: &AppState, query: &QueryParams) -> ResultResp {
    let ids = query.id_set()?;
    let records = properties::load_properties_by_ids(&state.db, &ids)?;
    json_response(&timeline(&records, &ids))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SellerUpdatePreview {
    #[serde(flatten)]
    matched: SellerUpdateMatch,
    summary: Option<MarketSummary>,
}

fn seller_update_preview(state: &AppState, query: &QueryParams) -> ResultResp {
    let criteria = SellerUpdateCriteria {
        postal_code: query.get("postalCode").map(str::to_string),
        elementary_school: query.get("elementarySchool").map(str::to_string),
        property_sub_type: query.get("propertySubType").map(str::to_string),
        last_sent_at: query.timestamp("lastSentAt")?,
    };
    let since = query.timestamp("since")?;
    let limit = query
        .parsed("limit")?
        .unwrap_or(state.config.seller_update_limit);

    let inventory = properties::load_visible_properties(&state.db)?;
    let matched = match_seller_update(&criteria, &inventory, since, limit);
    let summary = market_summary(inventory.iter().filter(|p| criteria.matches(p)));

    json_response(&SellerUpdatePreview { matched, summary })
}
