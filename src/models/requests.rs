use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::{analysis::FilterConfig, domain::Apartment};

/// Request to analyse an apartment against the market
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[validate(nested)]
    pub apartment: Apartment,
    /// Overrides for the configured filter defaults
    #[serde(default)]
    pub filters: Option<FilterConfig>,
    /// Persist an analysis report for the apartment (requires an apartment id)
    #[serde(default)]
    pub save_report: bool,
}

/// Request to geocode stored offers that have no coordinates yet
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeOffersRequest {
    #[serde(default)]
    pub city_id: Option<i64>,
    #[serde(default = "default_batch_size")]
    /// Offers are geocoded one by one at the provider's rate limit, so a
    /// batch is kept small enough to finish within a request
    #[validate(range(min = 1, max = 50))]
    pub limit: usize,
}

fn default_batch_size() -> usize {
    20
}
