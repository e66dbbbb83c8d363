use crate::models::{PriceStatistics, RankedOffer};

/// Calculate price statistics over the matched offers
///
/// An empty slice yields the all-zero record with a `"0 - 0"` price range.
/// Offers with a zero area still count towards every price figure; they are
/// only left out of the price-per-area average.
pub fn calculate_statistics(offers: &[RankedOffer]) -> PriceStatistics {
    if offers.is_empty() {
        return PriceStatistics::empty();
    }

    let prices: Vec<f64> = offers.iter().map(|o| o.offer.price).collect();

    let avg_price = mean(&prices);
    let median_price = median(&prices);
    let min_price = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max_price = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let prices_per_area: Vec<f64> = offers
        .iter()
        .filter(|o| o.offer.area > 0.0)
        .map(|o| o.offer.price_per_area())
        .collect();
    let avg_price_per_area = if prices_per_area.is_empty() {
        0.0
    } else {
        mean(&prices_per_area)
    };

    PriceStatistics {
        count: offers.len(),
        avg_price,
        median_price,
        min_price,
        max_price,
        avg_price_per_area,
        price_range: format!("{} - {}", format_amount(min_price), format_amount(max_price)),
    }
}

#[inline]
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median of a non-empty slice; mean of the two middle values for even lengths
pub fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Whole-currency amount with comma thousands separators, e.g. `39,000`
pub fn format_amount(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
