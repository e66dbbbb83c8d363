// Integration tests for Fair Rent

use fair_rent::core::{Analyzer, AnalysisError};
use fair_rent::models::{
    AnalysisReport, Apartment, Confidence, FilterConfig, MarketOffer, OfferSource,
    RecommendationCategory, RepairType, RoomPolicy,
};
use chrono::Utc;

const MOSCOW: (f64, f64) = (55.7558, 37.6173);

fn create_apartment(lat: Option<f64>, lon: Option<f64>) -> Apartment {
    Apartment {
        id: Some(1),
        user_id: Some(10),
        city_id: 1,
        address: "Tverskaya 1".to_string(),
        area: 50.0,
        rooms: 2,
        floor: 3,
        total_floors: 9,
        has_balcony: true,
        repair_type: RepairType::Cosmetic,
        description: String::new(),
        desired_price: Some(40000.0),
        latitude: lat,
        longitude: lon,
        created_at: Some(Utc::now()),
        updated_at: None,
    }
}

fn create_offer(id: i64, area: f64, price: f64, location: Option<(f64, f64)>) -> MarketOffer {
    MarketOffer {
        id,
        city_id: 1,
        source: OfferSource::Avito,
        external_id: Some(format!("avito-{}", id)),
        address: format!("Offer street {}", id),
        area,
        rooms: 2,
        floor: Some((id % 9 + 1) as u32),
        price,
        url: Some(format!("https://example.com/offers/{}", id)),
        is_active: true,
        additional_info: None,
        latitude: location.map(|l| l.0),
        longitude: location.map(|l| l.1),
        parsed_at: Utc::now(),
    }
}

/// Deterministic pool scattered around Moscow with varied areas, prices and rooms
fn create_pool(size: usize) -> Vec<MarketOffer> {
    let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
    let mut next = move || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (seed >> 33) as f64 / (1u64 << 31) as f64
    };

    (0..size)
        .map(|i| {
            let location = if i % 7 == 0 {
                None
            } else {
                Some((MOSCOW.0 + (next() - 0.5) * 0.4, MOSCOW.1 + (next() - 0.5) * 0.6))
            };
            let mut offer = create_offer(i as i64, 30.0 + next() * 40.0, 25000.0 + next() * 30000.0, location);
            offer.rooms = 1 + (i % 3) as u32;
            offer
        })
        .collect()
}

fn scenario_pool() -> Vec<MarketOffer> {
    vec![
        create_offer(1, 45.0, 35000.0, None),
        create_offer(2, 48.0, 37000.0, None),
        create_offer(3, 50.0, 40000.0, None),
        create_offer(4, 52.0, 42000.0, None),
        create_offer(5, 60.0, 70000.0, None),
    ]
}

fn no_distance() -> FilterConfig {
    FilterConfig {
        max_distance_km: 0.0,
        ..FilterConfig::default()
    }
}

#[test]
fn test_integration_scenario_fair_price() {
    let analyzer = Analyzer::new(no_distance());
    let analysis = analyzer
        .analyze(&create_apartment(None, None), scenario_pool())
        .unwrap();
    let result = &analysis.result;

    // The 70,000 offer is the only one outside the price window
    assert_eq!(result.count, 4);
    assert_eq!(result.median_price, 38500.0);
    assert_eq!(result.fair_price, 38500.0);
    assert_eq!(result.price_range, "35,000 - 42,000");
    assert_eq!(result.price_difference_absolute, 1500.0);
    assert!((result.price_difference_percent - 3.896).abs() < 0.001);
    assert_eq!(result.recommendation_category, RecommendationCategory::Success);
    assert_eq!(result.confidence, Confidence::High);
    assert!(result.recommendation_text.contains("Widen the search radius"));
    assert!(analysis.offers.iter().all(|o| o.offer.price < 70000.0));
}

#[test]
fn test_integration_empty_pool() {
    let analysis = Analyzer::default()
        .analyze(&create_apartment(Some(MOSCOW.0), Some(MOSCOW.1)), vec![])
        .unwrap();

    assert_eq!(analysis.result.count, 0);
    assert_eq!(analysis.result.min_price, 0.0);
    assert_eq!(analysis.result.max_price, 0.0);
    assert_eq!(analysis.result.avg_price_per_area, 0.0);
    assert_eq!(analysis.result.recommendation_category, RecommendationCategory::Info);
    assert_eq!(analysis.result.confidence, Confidence::Low);
    assert!(analysis.offers.is_empty());
}

#[test]
fn test_integration_no_matches_is_not_an_error() {
    let pool = vec![
        create_offer(1, 120.0, 39000.0, None),
        create_offer(2, 50.0, 150000.0, None),
    ];

    let analysis = Analyzer::default()
        .analyze(&create_apartment(None, None), pool)
        .unwrap();

    assert_eq!(analysis.result.count, 0);
    assert_eq!(analysis.total_candidates, 2);
    assert_eq!(analysis.result.recommendation_category, RecommendationCategory::Info);
}

#[test]
fn test_integration_coordless_offer_sorts_last() {
    let config = FilterConfig {
        max_distance_km: 5.0,
        ..FilterConfig::default()
    };
    let apartment = create_apartment(Some(MOSCOW.0), Some(MOSCOW.1));
    let pool = vec![
        create_offer(1, 50.0, 39000.0, None),
        create_offer(2, 50.0, 41000.0, Some(MOSCOW)),
        create_offer(3, 50.0, 40000.0, Some(MOSCOW)),
    ];

    let (offers, _) = Analyzer::new(config).similar_offers(&apartment, pool).unwrap();

    let ids: Vec<i64> = offers.iter().map(|o| o.offer.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
    assert_eq!(offers[0].distance_km, Some(0.0));
    assert_eq!(offers[2].distance_km, None);
}

#[test]
fn test_integration_distance_filter_excludes_far_offers() {
    let apartment = create_apartment(Some(MOSCOW.0), Some(MOSCOW.1));
    let pool = vec![
        create_offer(1, 50.0, 40000.0, Some((55.76, 37.62))),
        // Saint Petersburg
        create_offer(2, 50.0, 40000.0, Some((59.9343, 30.3351))),
    ];

    let analysis = Analyzer::default().analyze(&apartment, pool).unwrap();
    assert_eq!(analysis.result.count, 1);
    assert_eq!(analysis.offers[0].offer.id, 1);
}

#[test]
fn test_integration_subject_without_coordinates_disables_distance() {
    let pool = vec![
        create_offer(1, 50.0, 40000.0, Some((55.76, 37.62))),
        create_offer(2, 50.0, 40000.0, Some((59.9343, 30.3351))),
    ];

    let analysis = Analyzer::default()
        .analyze(&create_apartment(None, None), pool)
        .unwrap();

    assert_eq!(analysis.result.count, 2);
    assert!(analysis.offers.iter().all(|o| o.distance_km.is_none()));
}

#[test]
fn test_integration_inactive_offers_ignored() {
    let mut pool = scenario_pool();
    pool[0].is_active = false;

    let analysis = Analyzer::new(no_distance())
        .analyze(&create_apartment(None, None), pool)
        .unwrap();

    assert_eq!(analysis.result.count, 3);
    assert_eq!(analysis.result.median_price, 40000.0);
}

#[test]
fn test_integration_ordering_property() {
    let apartment = create_apartment(Some(MOSCOW.0), Some(MOSCOW.1));
    let config = FilterConfig {
        max_distance_km: 20.0,
        max_results: 1000,
        room_policy: RoomPolicy::Adjacent,
        ..FilterConfig::default()
    };

    let (offers, _) = Analyzer::new(config).similar_offers(&apartment, create_pool(500)).unwrap();
    assert!(!offers.is_empty());

    for pair in offers.windows(2) {
        match (pair[0].distance_km, pair[1].distance_km) {
            (Some(a), Some(b)) => {
                assert!(a <= b);
                if a == b {
                    assert!(pair[0].price() <= pair[1].price());
                }
            }
            // Untagged offers only ever follow tagged ones
            (None, Some(_)) => panic!("offer without distance sorted before one with distance"),
            (Some(_), None) => {}
            (None, None) => assert!(pair[0].price() <= pair[1].price()),
        }
    }
}

#[test]
fn test_integration_statistics_bounds_property() {
    let apartment = create_apartment(Some(MOSCOW.0), Some(MOSCOW.1));

    for radius in [1.0, 5.0, 10.0, 25.0] {
        let config = FilterConfig {
            max_distance_km: radius,
            ..FilterConfig::default()
        };
        let result = Analyzer::new(config).analyze(&apartment, create_pool(300)).unwrap().result;

        if result.count > 0 {
            assert!(result.min_price <= result.median_price && result.median_price <= result.max_price);
            assert!(result.min_price <= result.avg_price && result.avg_price <= result.max_price);
        }
    }
}

#[test]
fn test_integration_idempotence() {
    let apartment = create_apartment(Some(MOSCOW.0), Some(MOSCOW.1));
    let pool = create_pool(200);
    let analyzer = Analyzer::default();

    let first = analyzer.analyze(&apartment, pool.clone()).unwrap();
    let second = analyzer.analyze(&apartment, pool).unwrap();

    assert_eq!(first.result, second.result);
    let first_ids: Vec<i64> = first.offers.iter().map(|o| o.offer.id).collect();
    let second_ids: Vec<i64> = second.offers.iter().map(|o| o.offer.id).collect();
    assert_eq!(first_ids, second_ids);
}

#[test]
fn test_integration_distance_monotonicity() {
    let apartment = create_apartment(Some(MOSCOW.0), Some(MOSCOW.1));
    let pool = create_pool(400);

    let mut previous = 0;
    for radius in [0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0] {
        let config = FilterConfig {
            max_distance_km: radius,
            max_results: 1000,
            ..FilterConfig::default()
        };
        let count = Analyzer::new(config).analyze(&apartment, pool.clone()).unwrap().result.count;
        assert!(count >= previous, "radius {} returned {} < {}", radius, count, previous);
        previous = count;
    }
}

#[test]
fn test_integration_tolerance_monotonicity() {
    let apartment = create_apartment(Some(MOSCOW.0), Some(MOSCOW.1));
    let pool = create_pool(400);

    let mut previous = 0;
    for tolerance in [0.0, 5.0, 10.0, 20.0, 40.0, 80.0] {
        let config = FilterConfig {
            area_tolerance_percent: tolerance,
            max_results: 1000,
            ..FilterConfig::default()
        };
        let count = Analyzer::new(config).analyze(&apartment, pool.clone()).unwrap().result.count;
        assert!(count >= previous, "area tolerance {} returned {} < {}", tolerance, count, previous);
        previous = count;
    }

    let mut previous = 0;
    for tolerance in [0.0, 5.0, 10.0, 30.0, 60.0] {
        let config = FilterConfig {
            price_tolerance_percent: tolerance,
            max_results: 1000,
            ..FilterConfig::default()
        };
        let count = Analyzer::new(config).analyze(&apartment, pool.clone()).unwrap().result.count;
        assert!(count >= previous, "price tolerance {} returned {} < {}", tolerance, count, previous);
        previous = count;
    }
}

#[test]
fn test_integration_max_results_truncates_after_ordering() {
    let apartment = create_apartment(Some(MOSCOW.0), Some(MOSCOW.1));
    let pool = vec![
        create_offer(1, 50.0, 40000.0, Some((55.80, 37.6173))),
        create_offer(2, 50.0, 40000.0, Some((55.76, 37.6173))),
        create_offer(3, 50.0, 40000.0, Some((55.78, 37.6173))),
    ];
    let config = FilterConfig {
        max_results: 2,
        ..FilterConfig::default()
    };

    let (offers, total) = Analyzer::new(config).similar_offers(&apartment, pool).unwrap();

    assert_eq!(total, 3);
    let ids: Vec<i64> = offers.iter().map(|o| o.offer.id).collect();
    assert_eq!(ids, vec![2, 3]);
}

#[test]
fn test_integration_invalid_subject() {
    let mut apartment = create_apartment(None, None);
    apartment.total_floors = 2;

    let err = Analyzer::default().analyze(&apartment, scenario_pool()).unwrap_err();
    assert!(matches!(err, AnalysisError::Validation(_)));
}

#[test]
fn test_integration_report_from_result() {
    let analysis = Analyzer::new(no_distance())
        .analyze(&create_apartment(None, None), scenario_pool())
        .unwrap();

    let report = AnalysisReport::from_result(1, &analysis.result);
    assert_eq!(report.apartment_id, 1);
    assert_eq!(report.similar_offers_count, 4);
    assert_eq!(report.fair_price, 38500.0);
    assert_eq!(report.price_difference, 3.9);
    assert_eq!(report.recommendation, analysis.result.recommendation_text);
}
