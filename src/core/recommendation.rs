use crate::core::statistics::format_amount;
use crate::models::{Confidence, PriceStatistics, Recommendation, RecommendationCategory};

/// Deviation from the fair price still considered fair, in percent (inclusive)
pub const FAIR_PRICE_THRESHOLD_PERCENT: f64 = 5.0;

/// Deviation beyond which a concrete target price is suggested, in percent
pub const SUGGESTION_THRESHOLD_PERCENT: f64 = 10.0;

/// Below this many comparable offers confidence is always low
pub const MIN_RELIABLE_SAMPLE: usize = 3;

/// Below this many comparable offers the text suggests widening the search
pub const COMFORTABLE_SAMPLE: usize = 5;

/// Derive a pricing recommendation from the market statistics
///
/// The fair price is the median of the comparable offers. The subject's
/// desired price defaults to the fair price when absent, which classifies
/// as fair.
pub fn generate_recommendation(desired_price: Option<f64>, stats: &PriceStatistics) -> Recommendation {
    let desired_price = desired_price.filter(|price| *price > 0.0);

    if stats.count == 0 {
        let fair_price = desired_price.unwrap_or(0.0);
        return Recommendation {
            fair_price,
            price_difference_percent: 0.0,
            price_difference_absolute: 0.0,
            text: "Insufficient data for analysis. Try widening the area or price tolerance, or the search radius."
                .to_string(),
            category: RecommendationCategory::Info,
            confidence: Confidence::Low,
            suggested_price: fair_price,
        };
    }

    let fair_price = stats.median_price;
    let desired_price = desired_price.unwrap_or(fair_price);

    let price_difference_absolute = desired_price - fair_price;
    let price_difference_percent = if fair_price > 0.0 {
        price_difference_absolute / fair_price * 100.0
    } else {
        0.0
    };

    let (mut text, category, mut confidence) = classify(price_difference_percent);

    text.push_str(&format!(". Market range: {}.", stats.price_range));

    if stats.count < MIN_RELIABLE_SAMPLE {
        confidence = Confidence::Low;
        text.push_str(&format!(
            "\nOnly {} comparable offer(s) found, too few for a reliable estimate.",
            stats.count
        ));
    }

    if price_difference_percent > SUGGESTION_THRESHOLD_PERCENT {
        text.push_str(&format!(
            "\nSuggestion: lower the price to {} to rent faster.",
            format_amount(fair_price)
        ));
    } else if price_difference_percent < -SUGGESTION_THRESHOLD_PERCENT {
        text.push_str(&format!(
            "\nSuggestion: you can raise the price to {}.",
            format_amount(fair_price)
        ));
    }

    if stats.count < COMFORTABLE_SAMPLE {
        text.push_str("\nWiden the search radius or tolerances for a more precise analysis.");
    }

    Recommendation {
        fair_price,
        price_difference_percent,
        price_difference_absolute,
        text,
        category,
        confidence,
        suggested_price: fair_price,
    }
}

/// Map a percentage deviation onto message, category and base confidence
fn classify(difference_percent: f64) -> (String, RecommendationCategory, Confidence) {
    if difference_percent.abs() <= FAIR_PRICE_THRESHOLD_PERCENT {
        (
            "Your price is fair and close to the market".to_string(),
            RecommendationCategory::Success,
            Confidence::High,
        )
    } else if difference_percent > 0.0 {
        (
            format!("Your price is overpriced by {:.1}%", difference_percent.abs()),
            RecommendationCategory::Danger,
            Confidence::Medium,
        )
    } else {
        (
            format!("Your price is underpriced by {:.1}%", difference_percent.abs()),
            RecommendationCategory::Warning,
            Confidence::Medium,
        )
    }
}
