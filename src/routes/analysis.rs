use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;
use crate::core::{calculate_bounding_box, validate_coordinates, validate_filters, Analyzer};
use crate::models::{
    AnalysisReport, AnalyzeRequest, AnalyzeResponse, Apartment, City, ErrorResponse,
    GeocodeOffersRequest, GeocodeOffersResponse, HealthResponse, MarketOffer, OfferQuery,
    LocationSource, SimilarOffersResponse,
};
use crate::services::{LocationResolver, MarketDataStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MarketDataStore>,
    pub resolver: Arc<LocationResolver>,
    /// Analyzer built from the configured filter defaults
    pub analyzer: Analyzer,
}

/// Configure all analysis-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/analysis", web::post().to(analyze))
        .route("/analysis/offers", web::post().to(similar_offers))
        .route("/offers/geocode", web::post().to(geocode_offers));
}

fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code: status.as_u16(),
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Everything an analysis needs once the request has been resolved
struct PreparedAnalysis {
    apartment: Apartment,
    analyzer: Analyzer,
    candidates: Vec<MarketOffer>,
    location_source: Option<LocationSource>,
}

/// Validate the request, locate the apartment and load its offer pool
async fn prepare(state: &AppState, req: AnalyzeRequest) -> Result<PreparedAnalysis, HttpResponse> {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for analysis request: {}", errors);
        return Err(error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string()));
    }

    let analyzer = match req.filters {
        Some(filters) => Analyzer::new(filters),
        None => state.analyzer.clone(),
    };
    if let Err(e) = validate_filters(analyzer.config()) {
        return Err(error_response(StatusCode::BAD_REQUEST, "Validation failed", e.to_string()));
    }

    let mut apartment = req.apartment;

    let city = match state.store.get_city(apartment.city_id).await {
        Ok(Some(city)) => city,
        Ok(None) => {
            return Err(error_response(
                StatusCode::NOT_FOUND,
                "City not found",
                format!("No city with id {}", apartment.city_id),
            ));
        }
        Err(e) => {
            tracing::error!("Failed to fetch city {}: {}", apartment.city_id, e);
            return Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch city", e.to_string()));
        }
    };

    let mut location_source = None;
    if apartment.needs_geocoding() {
        if let Some((location, source)) = state.resolver.resolve(&apartment.address, Some(&city)).await {
            tracing::debug!("Located apartment {:?} via {:?}", apartment.id, source);
            apartment.set_coordinates(location);
            location_source = Some(source);
        }
    }

    let query = offer_query(&apartment, &analyzer);
    let candidates = match state.store.active_offers(&query).await {
        Ok(offers) => offers,
        Err(e) => {
            tracing::error!("Failed to load offers for city {}: {}", apartment.city_id, e);
            return Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load market offers", e.to_string()));
        }
    };

    Ok(PreparedAnalysis {
        apartment,
        analyzer,
        candidates,
        location_source,
    })
}

/// Database pre-filter: city, room range and, when a radius applies, a bounding box
fn offer_query(apartment: &Apartment, analyzer: &Analyzer) -> OfferQuery {
    let config = analyzer.config();
    let (min_rooms, max_rooms) = config.room_policy.bounds(apartment.rooms);

    let bounding_box = if config.distance_filter_enabled() {
        apartment
            .coordinates()
            .and_then(|c| validate_coordinates(c.latitude, c.longitude).ok())
            .map(|c| calculate_bounding_box(c.latitude, c.longitude, config.max_distance_km))
    } else {
        None
    };

    OfferQuery {
        city_id: apartment.city_id,
        min_rooms,
        max_rooms,
        bounding_box,
    }
}

/// Price analysis endpoint
///
/// POST /api/v1/analysis
///
/// Request body:
/// ```json
/// {
///   "apartment": {"cityId": 1, "address": "...", "area": 50.0, "rooms": 2,
///                 "floor": 4, "totalFloors": 9, "desiredPrice": 40000.0},
///   "filters": {"areaTolerancePercent": 20.0, "maxDistanceKm": 10.0},
///   "saveReport": false
/// }
/// ```
async fn analyze(state: web::Data<AppState>, req: web::Json<AnalyzeRequest>) -> impl Responder {
    let req = req.into_inner();
    let save_report = req.save_report;

    if save_report && req.apartment.id.is_none() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Validation failed",
            "saveReport requires an apartment id",
        );
    }

    let prepared = match prepare(&state, req).await {
        Ok(prepared) => prepared,
        Err(response) => return response,
    };

    let analysis = match prepared.analyzer.analyze(&prepared.apartment, prepared.candidates) {
        Ok(analysis) => analysis,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "Validation failed", e.to_string()),
    };

    if let (true, Some(apartment_id)) = (save_report, prepared.apartment.id) {
        let report = AnalysisReport::from_result(apartment_id, &analysis.result);
        if let Err(e) = state.store.save_report(&report).await {
            tracing::error!("Failed to save analysis report for apartment {}: {}", apartment_id, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save analysis report", e.to_string());
        }
    }

    tracing::info!(
        "Analysis for apartment {:?} complete: {} similar offers (from {} candidates)",
        prepared.apartment.id,
        analysis.result.count,
        analysis.total_candidates
    );

    HttpResponse::Ok().json(AnalyzeResponse {
        analysis_id: uuid::Uuid::new_v4().to_string(),
        result: analysis.result,
        location_source: prepared.location_source,
    })
}

/// Ranked comparable offers endpoint
///
/// POST /api/v1/analysis/offers
///
/// Takes the same body as `/analysis`; `saveReport` is ignored.
async fn similar_offers(state: web::Data<AppState>, req: web::Json<AnalyzeRequest>) -> impl Responder {
    let prepared = match prepare(&state, req.into_inner()).await {
        Ok(prepared) => prepared,
        Err(response) => return response,
    };

    match prepared.analyzer.similar_offers(&prepared.apartment, prepared.candidates) {
        Ok((offers, total_candidates)) => HttpResponse::Ok().json(SimilarOffersResponse {
            offers,
            total_candidates,
        }),
        Err(e) => error_response(StatusCode::BAD_REQUEST, "Validation failed", e.to_string()),
    }
}

/// Offer coordinate backfill endpoint
///
/// POST /api/v1/offers/geocode
///
/// Only geocoder hits are stored; a city centroid would place every offer
/// at the same point and defeat the distance filter.
async fn geocode_offers(state: web::Data<AppState>, req: web::Json<GeocodeOffersRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }

    let offers = match state.store.offers_missing_coordinates(req.city_id, req.limit).await {
        Ok(offers) => offers,
        Err(e) => {
            tracing::error!("Failed to load offers without coordinates: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load market offers", e.to_string());
        }
    };

    let mut cities: HashMap<i64, Option<City>> = HashMap::new();
    let mut outcome = GeocodeOffersResponse::default();

    for offer in offers {
        outcome.processed += 1;

        if !cities.contains_key(&offer.city_id) {
            let city = state.store.get_city(offer.city_id).await.unwrap_or_else(|e| {
                tracing::warn!("Failed to fetch city {}: {}", offer.city_id, e);
                None
            });
            cities.insert(offer.city_id, city);
        }
        let city = cities.get(&offer.city_id).and_then(Option::as_ref);

        match state.resolver.resolve(&offer.address, city).await {
            Some((location, LocationSource::Geocoder)) => {
                match state.store.update_offer_coordinates(offer.id, location).await {
                    Ok(()) => outcome.updated += 1,
                    Err(e) => {
                        tracing::warn!("Failed to store coordinates for offer {}: {}", offer.id, e);
                        outcome.failed += 1;
                    }
                }
            }
            _ => outcome.failed += 1,
        }
    }

    tracing::info!(
        "Offer geocoding batch: {} processed, {} updated, {} failed",
        outcome.processed,
        outcome.updated,
        outcome.failed
    );

    HttpResponse::Ok().json(outcome)
}
