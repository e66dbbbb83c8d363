//! Fair Rent - rental price analysis service
//!
//! This library provides the pricing engine behind the service: it filters a
//! pool of market offers down to listings comparable with the user's
//! apartment, computes market statistics over them and turns those into a
//! price recommendation.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{Analyzer, Analysis, Ranker, distance::{haversine_distance, calculate_bounding_box}};
pub use models::{Apartment, MarketOffer, RankedOffer, FilterConfig, AnalysisResult, AnalyzeRequest, AnalyzeResponse};
