// Core algorithm exports
pub mod analyzer;
pub mod distance;
pub mod error;
pub mod filters;
pub mod ranker;
pub mod recommendation;
pub mod statistics;

pub use analyzer::{Analysis, Analyzer, validate_filters, validate_subject};
pub use distance::{haversine_distance, distance_between, validate_coordinates, calculate_bounding_box, is_within_bounding_box};
pub use error::{AnalysisError, CoordinateError};
pub use filters::{SimilarityWindow, matches_window};
pub use ranker::{Ranker, RankResult};
pub use recommendation::generate_recommendation;
pub use statistics::calculate_statistics;
