use crate::core::{
    distance::{haversine_distance, validate_coordinates},
    filters::{matches_window, SimilarityWindow},
};
use crate::models::{Apartment, Coordinates, FilterConfig, MarketOffer, RankedOffer};
use std::cmp::Ordering;

/// Result of the ranking process
#[derive(Debug, Clone)]
pub struct RankResult {
    pub offers: Vec<RankedOffer>,
    pub total_candidates: usize,
}

/// Similarity filter and ranker - implements the multi-stage filtering pipeline
///
/// # Pipeline Stages
/// 1. Room count
/// 2. Area tolerance
/// 3. Price tolerance (subject with a desired price only)
/// 4. Same floor (optional)
/// 5. Distance radius (geolocated subject only)
/// 6. Ordering by distance, then price, and truncation
#[derive(Debug, Clone, Default)]
pub struct Ranker {
    config: FilterConfig,
}

impl Ranker {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Find the offers comparable to `apartment`
    ///
    /// `candidates` is expected to be the active offers of the apartment's
    /// city. An empty pool, or a pool where nothing survives, yields an
    /// empty list.
    pub fn find_similar(&self, apartment: &Apartment, candidates: Vec<MarketOffer>) -> RankResult {
        let total_candidates = candidates.len();
        let window = SimilarityWindow::for_apartment(apartment, &self.config);

        tracing::debug!(
            "Similarity window for apartment {:?}: rooms {}-{}, area {:.1}-{:.1}, price {:?}, floor {:?}",
            apartment.id,
            window.min_rooms,
            window.max_rooms,
            window.min_area,
            window.max_area,
            window.price,
            window.floor
        );

        // Stages 1-4: attribute filters
        let comparable: Vec<MarketOffer> = candidates
            .into_iter()
            .filter(|offer| offer.is_active)
            .filter(|offer| matches_window(offer, &window))
            .collect();

        tracing::debug!(
            "{} of {} candidates passed attribute filters",
            comparable.len(),
            total_candidates
        );

        // Stage 5: distance
        let mut ranked = match self.distance_origin(apartment) {
            Some(origin) => self.filter_by_distance(origin, comparable),
            None => {
                tracing::debug!("Distance filtering disabled (no subject coordinates or radius <= 0)");
                comparable.into_iter().map(RankedOffer::untagged).collect()
            }
        };

        // Stage 6: nearest first, unknown distance last, then cheapest first
        ranked.sort_by(compare_ranked);
        ranked.truncate(self.config.max_results);

        let distances: Vec<f64> = ranked.iter().filter_map(|o| o.distance_km).collect();
        if !distances.is_empty() {
            tracing::debug!(
                "Average distance of similar offers: {:.1} km",
                distances.iter().sum::<f64>() / distances.len() as f64
            );
        }

        RankResult {
            offers: ranked,
            total_candidates,
        }
    }

    /// Subject location to measure from, if distance filtering applies
    fn distance_origin(&self, apartment: &Apartment) -> Option<Coordinates> {
        if !self.config.distance_filter_enabled() {
            return None;
        }

        let location = apartment.coordinates()?;
        match validate_coordinates(location.latitude, location.longitude) {
            Ok(origin) => Some(origin),
            Err(e) => {
                tracing::warn!("Apartment {:?} has unusable coordinates, skipping distance filter: {}", apartment.id, e);
                None
            }
        }
    }

    fn filter_by_distance(&self, origin: Coordinates, offers: Vec<MarketOffer>) -> Vec<RankedOffer> {
        let max_distance_km = self.config.max_distance_km;

        offers
            .into_iter()
            .filter_map(|offer| {
                let Some((lat, lon)) = offer.coordinates() else {
                    // Keep offers without geolocation; they sort last
                    tracing::debug!("Offer {} has no coordinates", offer.id);
                    return Some(RankedOffer::untagged(offer));
                };

                let location = match validate_coordinates(lat, lon) {
                    Ok(location) => location,
                    Err(e) => {
                        tracing::warn!("Skipping distance for offer {}: {}", offer.id, e);
                        return Some(RankedOffer::untagged(offer));
                    }
                };

                let distance_km = haversine_distance(
                    origin.latitude,
                    origin.longitude,
                    location.latitude,
                    location.longitude,
                );

                if distance_km <= max_distance_km {
                    Some(RankedOffer {
                        offer,
                        distance_km: Some(distance_km),
                    })
                } else {
                    tracing::debug!("Offer {} too far: {:.1} km", offer.id, distance_km);
                    None
                }
            })
            .collect()
    }
}

/// Order by distance ascending (missing distance treated as +inf), then price ascending
fn compare_ranked(a: &RankedOffer, b: &RankedOffer) -> Ordering {
    let da = a.distance_km.unwrap_or(f64::INFINITY);
    let db = b.distance_km.unwrap_or(f64::INFINITY);

    da.total_cmp(&db).then_with(|| a.price().total_cmp(&b.price()))
}
