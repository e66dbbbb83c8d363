use crate::models::{Apartment, FilterConfig, MarketOffer};

/// Inclusive bounds an offer has to fall into to count as comparable
///
/// Built once per analysis from the subject apartment and the filter
/// configuration, then applied to every candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityWindow {
    pub min_rooms: u32,
    pub max_rooms: u32,
    pub min_area: f64,
    pub max_area: f64,
    /// `None` when the subject has no desired price
    pub price: Option<(f64, f64)>,
    /// `Some` only when same-floor matching is requested
    pub floor: Option<u32>,
}

impl SimilarityWindow {
    pub fn for_apartment(apartment: &Apartment, config: &FilterConfig) -> Self {
        let (min_rooms, max_rooms) = config.room_policy.bounds(apartment.rooms);
        let (min_area, max_area) = tolerance_band(apartment.area, config.area_tolerance_percent);

        let price = apartment
            .desired_price
            .filter(|price| *price > 0.0)
            .map(|price| tolerance_band(price, config.price_tolerance_percent));

        let floor = if config.include_same_floor && apartment.floor > 0 {
            Some(apartment.floor)
        } else {
            None
        };

        Self {
            min_rooms,
            max_rooms,
            min_area,
            max_area,
            price,
            floor,
        }
    }
}

/// Symmetric `[value * (1 - t), value * (1 + t)]` band for a percentage tolerance
#[inline]
pub fn tolerance_band(value: f64, tolerance_percent: f64) -> (f64, f64) {
    let t = tolerance_percent / 100.0;
    (value * (1.0 - t), value * (1.0 + t))
}

/// Stage 1: room count
#[inline]
pub fn matches_rooms(offer: &MarketOffer, window: &SimilarityWindow) -> bool {
    offer.rooms >= window.min_rooms && offer.rooms <= window.max_rooms
}

/// Stage 2: living area within tolerance
#[inline]
pub fn matches_area(offer: &MarketOffer, window: &SimilarityWindow) -> bool {
    offer.area >= window.min_area && offer.area <= window.max_area
}

/// Stage 3: price within tolerance, skipped when the subject has no desired price
#[inline]
pub fn matches_price(offer: &MarketOffer, window: &SimilarityWindow) -> bool {
    match window.price {
        Some((min_price, max_price)) => offer.price >= min_price && offer.price <= max_price,
        None => true,
    }
}

/// Stage 4: same floor, only when requested
///
/// Offers with an unknown floor cannot prove they are on the same floor and
/// are rejected while the constraint is active.
#[inline]
pub fn matches_floor(offer: &MarketOffer, window: &SimilarityWindow) -> bool {
    match window.floor {
        Some(floor) => offer.floor == Some(floor),
        None => true,
    }
}

/// All attribute stages combined (everything except distance)
#[inline]
pub fn matches_window(offer: &MarketOffer, window: &SimilarityWindow) -> bool {
    matches_rooms(offer, window)
        && matches_area(offer, window)
        && matches_price(offer, window)
        && matches_floor(offer, window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OfferSource, RepairType, RoomPolicy};
    use chrono::Utc;

    fn create_test_apartment(desired_price: Option<f64>) -> Apartment {
        Apartment {
            id: Some(1),
            user_id: Some(1),
            city_id: 1,
            address: "Lenina 1".to_string(),
            area: 50.0,
            rooms: 2,
            floor: 3,
            total_floors: 9,
            has_balcony: true,
            repair_type: RepairType::Euro,
            description: String::new(),
            desired_price,
            latitude: None,
            longitude: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn create_test_offer(rooms: u32, area: f64, price: f64, floor: Option<u32>) -> MarketOffer {
        MarketOffer {
            id: 1,
            city_id: 1,
            source: OfferSource::Avito,
            external_id: None,
            address: "Mira 5".to_string(),
            area,
            rooms,
            floor,
            price,
            url: None,
            is_active: true,
            additional_info: None,
            latitude: None,
            longitude: None,
            parsed_at: Utc::now(),
        }
    }

    #[test]
    fn test_window_bounds() {
        let apartment = create_test_apartment(Some(40000.0));
        let window = SimilarityWindow::for_apartment(&apartment, &FilterConfig::default());

        assert_eq!((window.min_rooms, window.max_rooms), (2, 2));
        assert!((window.min_area - 40.0).abs() < 1e-9);
        assert!((window.max_area - 60.0).abs() < 1e-9);
        let (min_price, max_price) = window.price.unwrap();
        assert!((min_price - 28000.0).abs() < 1e-6);
        assert!((max_price - 52000.0).abs() < 1e-6);
        assert_eq!(window.floor, None);
    }

    #[test]
    fn test_area_bounds_inclusive() {
        let apartment = create_test_apartment(None);
        let window = SimilarityWindow::for_apartment(&apartment, &FilterConfig::default());

        assert!(matches_area(&create_test_offer(2, 40.0, 1.0, None), &window));
        assert!(matches_area(&create_test_offer(2, 60.0, 1.0, None), &window));
        assert!(!matches_area(&create_test_offer(2, 60.5, 1.0, None), &window));
    }

    #[test]
    fn test_price_filter_skipped_without_desired_price() {
        let apartment = create_test_apartment(None);
        let window = SimilarityWindow::for_apartment(&apartment, &FilterConfig::default());

        assert!(matches_price(&create_test_offer(2, 50.0, 1_000_000.0, None), &window));
    }

    #[test]
    fn test_room_policies() {
        let apartment = create_test_apartment(None);
        let exact = SimilarityWindow::for_apartment(&apartment, &FilterConfig::default());
        let adjacent = SimilarityWindow::for_apartment(
            &apartment,
            &FilterConfig { room_policy: RoomPolicy::Adjacent, ..FilterConfig::default() },
        );

        let three_rooms = create_test_offer(3, 50.0, 1.0, None);
        assert!(!matches_rooms(&three_rooms, &exact));
        assert!(matches_rooms(&three_rooms, &adjacent));
        assert!(!matches_rooms(&create_test_offer(4, 50.0, 1.0, None), &adjacent));
    }

    #[test]
    fn test_same_floor_filter() {
        let apartment = create_test_apartment(None);
        let config = FilterConfig { include_same_floor: true, ..FilterConfig::default() };
        let window = SimilarityWindow::for_apartment(&apartment, &config);

        assert!(matches_floor(&create_test_offer(2, 50.0, 1.0, Some(3)), &window));
        assert!(!matches_floor(&create_test_offer(2, 50.0, 1.0, Some(4)), &window));
        assert!(!matches_floor(&create_test_offer(2, 50.0, 1.0, None), &window));

        let any_floor = SimilarityWindow::for_apartment(&apartment, &FilterConfig::default());
        assert!(matches_floor(&create_test_offer(2, 50.0, 1.0, None), &any_floor));
    }
}
