// Model exports
pub mod analysis;
pub mod domain;
pub mod requests;
pub mod responses;

pub use analysis::{AnalysisReport, AnalysisResult, Confidence, FilterConfig, PriceStatistics, Recommendation, RecommendationCategory, RoomPolicy};
pub use domain::{Apartment, BoundingBox, City, Coordinates, LocationSource, MarketOffer, OfferQuery, OfferSource, RankedOffer, RepairType};
pub use requests::{AnalyzeRequest, GeocodeOffersRequest};
pub use responses::{AnalyzeResponse, ErrorResponse, GeocodeOffersResponse, HealthResponse, SimilarOffersResponse};
