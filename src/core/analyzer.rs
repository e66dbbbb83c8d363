use crate::core::{
    error::AnalysisError,
    ranker::Ranker,
    recommendation::generate_recommendation,
    statistics::calculate_statistics,
};
use crate::models::{AnalysisResult, Apartment, FilterConfig, MarketOffer, RankedOffer};
use validator::Validate;

/// Full outcome of an analysis
///
/// `offers` is kept next to the result for callers that render the
/// comparable listings; only `result` is meant for serialization.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub result: AnalysisResult,
    pub offers: Vec<RankedOffer>,
    pub total_candidates: usize,
}

/// Pricing analysis orchestrator: ranker -> statistics -> recommendation
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    ranker: Ranker,
}

impl Analyzer {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            ranker: Ranker::new(config),
        }
    }

    pub fn config(&self) -> &FilterConfig {
        self.ranker.config()
    }

    /// Run the complete analysis for `apartment` against `candidates`
    ///
    /// Fails only when the apartment itself is malformed. An empty or
    /// non-matching pool produces a zero-count, low-confidence result.
    pub fn analyze(
        &self,
        apartment: &Apartment,
        candidates: Vec<MarketOffer>,
    ) -> Result<Analysis, AnalysisError> {
        validate_subject(apartment)?;
        validate_filters(self.config())?;

        tracing::info!(
            "Analyzing apartment {:?}: {} rooms, {:.1} m², desired price {:?}, {} candidates",
            apartment.id,
            apartment.rooms,
            apartment.area,
            apartment.desired_price,
            candidates.len()
        );

        let ranked = self.ranker.find_similar(apartment, candidates);
        let statistics = calculate_statistics(&ranked.offers);
        let recommendation = generate_recommendation(apartment.desired_price, &statistics);

        tracing::info!(
            "Apartment {:?}: {} similar offers, fair price {:.0}, difference {:.1}% ({:?}, {:?} confidence)",
            apartment.id,
            statistics.count,
            recommendation.fair_price,
            recommendation.price_difference_percent,
            recommendation.category,
            recommendation.confidence
        );

        Ok(Analysis {
            result: AnalysisResult::new(statistics, recommendation),
            offers: ranked.offers,
            total_candidates: ranked.total_candidates,
        })
    }

    /// Ranked comparable offers only, without statistics
    pub fn similar_offers(
        &self,
        apartment: &Apartment,
        candidates: Vec<MarketOffer>,
    ) -> Result<(Vec<RankedOffer>, usize), AnalysisError> {
        validate_subject(apartment)?;
        validate_filters(self.config())?;
        let ranked = self.ranker.find_similar(apartment, candidates);
        Ok((ranked.offers, ranked.total_candidates))
    }
}

/// Fail fast on a subject the pipeline cannot price
pub fn validate_subject(apartment: &Apartment) -> Result<(), AnalysisError> {
    if !apartment.area.is_finite() {
        return Err(AnalysisError::Validation("area must be a finite number".to_string()));
    }
    if let Some(price) = apartment.desired_price {
        if !price.is_finite() {
            return Err(AnalysisError::Validation("desired price must be a finite number".to_string()));
        }
    }
    apartment.validate()?;
    Ok(())
}

/// Reject filter parameters that would make the similarity window meaningless
pub fn validate_filters(config: &FilterConfig) -> Result<(), AnalysisError> {
    for (name, value) in [
        ("areaTolerancePercent", config.area_tolerance_percent),
        ("priceTolerancePercent", config.price_tolerance_percent),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(AnalysisError::Validation(format!(
                "{} must be a non-negative number, got {}",
                name, value
            )));
        }
    }
    if config.max_distance_km.is_nan() {
        return Err(AnalysisError::Validation("maxDistanceKm must be a number".to_string()));
    }
    if config.max_results == 0 {
        return Err(AnalysisError::Validation("maxResults must be at least 1".to_string()));
    }
    Ok(())
}
