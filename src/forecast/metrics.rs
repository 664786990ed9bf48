//! Derived business metrics
//!
//! Pricing and surplus rules applied to model outputs. Every function takes
//! the price it works on as an argument; nothing here reads shared state.

use crate::domain::{
    CombinedSummary, DerivedMetrics, Prediction, RevenueSummary, WastageSummary, WindowForecast,
};

/// First and last hour (inclusive) of the evening peak
pub const PEAK_HOURS: std::ops::RangeInclusive<u32> = 18..=21;
/// Multiplier applied to prices in the peak or on a demand surge
pub const SURGE_FACTOR: f64 = 1.2;
/// Daily demand above which the daily view surges the price
pub const DAILY_SURGE_DEMAND: f64 = 2000.0;
/// Discount suggested to clear wasted production
pub const CLEARANCE_DISCOUNT: f64 = 2.0;
/// Divisor of the demand-indexed price
pub const DEMAND_PRICE_DIVISOR: f64 = 300.0;

pub fn is_peak_hour(hour: u32) -> bool {
    PEAK_HOURS.contains(&hour)
}

/// Hourly view: surcharge prices during the evening peak
pub fn peak_hour_price(price: f64, hour: u32) -> f64 {
    if is_peak_hour(hour) {
        price * SURGE_FACTOR
    } else {
        price
    }
}

/// Daily view: surcharge prices when demand exceeds the threshold
pub fn daily_surge_price(price: f64, demand: f64) -> f64 {
    price * if demand > DAILY_SURGE_DEMAND { SURGE_FACTOR } else { 1.0 }
}

/// production - demand, unclamped
pub fn surplus(production: f64, demand: f64) -> f64 {
    production - demand
}

/// Unused production at one point, never negative
pub fn point_wastage(production: f64, demand: f64) -> f64 {
    surplus(production, demand).max(0.0)
}

/// Net surplus over a window, floored at zero.
///
/// Deficits at some points offset excess at others before the floor applies.
pub fn aggregate_wastage(production: &[f64], demand: &[f64]) -> f64 {
    let net: f64 = production
        .iter()
        .zip(demand.iter())
        .map(|(p, d)| surplus(*p, *d))
        .sum();
    net.max(0.0)
}

pub fn revenue(production: &[f64], price_per_unit: f64) -> f64 {
    production.iter().sum::<f64>() * price_per_unit
}

pub fn suggested_price(wastage: f64, price_per_unit: f64) -> f64 {
    if wastage > 0.0 {
        price_per_unit - CLEARANCE_DISCOUNT
    } else {
        price_per_unit
    }
}

pub fn wastage_suggestion(wastage: f64, price_per_unit: f64) -> String {
    if wastage > 0.0 {
        format!(
            "Sell at {}/unit to clear inventory.",
            suggested_price(wastage, price_per_unit)
        )
    } else {
        "No wastage".to_string()
    }
}

pub fn demand_indexed_price(demand: f64) -> f64 {
    demand / DEMAND_PRICE_DIVISOR
}

/// Metrics for a single prediction at `price_per_unit`
pub fn derive(prediction: &Prediction, price_per_unit: f64) -> DerivedMetrics {
    let wastage = point_wastage(prediction.production, prediction.demand);
    DerivedMetrics {
        surplus: surplus(prediction.production, prediction.demand),
        revenue: prediction.production * price_per_unit,
        wastage,
        suggested_price: suggested_price(wastage, price_per_unit),
    }
}

pub fn revenue_summary(window: &WindowForecast, price_per_unit: f64) -> RevenueSummary {
    let production = window.production();
    RevenueSummary {
        total_revenue: revenue(&production, price_per_unit),
        price_per_unit,
        predicted_production: production,
    }
}

pub fn wastage_summary(window: &WindowForecast, price_per_unit: f64) -> WastageSummary {
    let wastage = aggregate_wastage(&window.production(), &window.demand());
    WastageSummary {
        total_energy_produced: window.total_production(),
        total_energy_demand: window.total_demand(),
        total_wastage: wastage,
        suggestion: wastage_suggestion(wastage, price_per_unit),
    }
}

pub fn combined_summary(window: &WindowForecast, price_per_unit: f64) -> CombinedSummary {
    let production = window.production();
    let wastage = aggregate_wastage(&production, &window.demand());
    CombinedSummary {
        total_revenue: revenue(&production, price_per_unit),
        total_energy_produced: window.total_production(),
        total_energy_demand: window.total_demand(),
        total_wastage: wastage,
        suggested_price: suggested_price(wastage, price_per_unit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WindowPoint;
    use chrono::Utc;
    use proptest::prelude::*;
    use rstest::rstest;

    fn window(demand: &[f64], production: &[f64]) -> WindowForecast {
        WindowForecast {
            location: "London".to_string(),
            points: demand
                .iter()
                .zip(production.iter())
                .map(|(d, p)| WindowPoint {
                    timestamp: Utc::now(),
                    demand: *d,
                    production: *p,
                })
                .collect(),
        }
    }

    #[rstest]
    #[case(17, 10.0)]
    #[case(18, 12.0)]
    #[case(19, 12.0)]
    #[case(20, 12.0)]
    #[case(21, 12.0)]
    #[case(22, 10.0)]
    #[case(0, 10.0)]
    fn test_peak_hour_price(#[case] hour: u32, #[case] expected: f64) {
        assert_eq!(peak_hour_price(10.0, hour), expected);
    }

    #[rstest]
    #[case(2000.0, 5.0)]
    #[case(2000.5, 6.0)]
    #[case(100.0, 5.0)]
    fn test_daily_surge_price(#[case] demand: f64, #[case] expected: f64) {
        assert_eq!(daily_surge_price(5.0, demand), expected);
    }

    #[test]
    fn test_reference_window() {
        let demand = [100.0, 2200.0];
        let production = [150.0, 2000.0];

        assert_eq!(point_wastage(production[0], demand[0]), 50.0);
        assert_eq!(point_wastage(production[1], demand[1]), 0.0);
        assert_eq!(aggregate_wastage(&production, &demand), 0.0);

        let summary = wastage_summary(&window(&demand, &production), 8.0);
        assert_eq!(summary.total_wastage, 0.0);
        assert_eq!(summary.suggestion, "No wastage");
        assert_eq!(summary.total_energy_produced, 2150.0);
        assert_eq!(summary.total_energy_demand, 2300.0);
    }

    #[test]
    fn test_wastage_triggers_clearance_price() {
        let w = window(&[100.0, 200.0], &[300.0, 250.0]);
        let combined = combined_summary(&w, 8.0);
        assert_eq!(combined.total_wastage, 250.0);
        assert_eq!(combined.suggested_price, 6.0);
        assert_eq!(combined.total_revenue, 550.0 * 8.0);

        let wastage = wastage_summary(&w, 8.0);
        assert_eq!(wastage.suggestion, "Sell at 6/unit to clear inventory.");
    }

    #[test]
    fn test_derive_single_point() {
        let metrics = derive(
            &Prediction {
                demand: 120.0,
                production: 100.0,
                price: 4.0,
            },
            8.0,
        );
        assert_eq!(metrics.surplus, -20.0);
        assert_eq!(metrics.wastage, 0.0);
        assert_eq!(metrics.revenue, 800.0);
        assert_eq!(metrics.suggested_price, 8.0);
    }

    #[test]
    fn test_price_and_revenue_not_clamped() {
        assert_eq!(suggested_price(1.0, 1.0), -1.0);
        assert_eq!(revenue(&[10.0, -30.0], 2.0), -40.0);
    }

    #[test]
    fn test_revenue_summary_keeps_series() {
        let summary = revenue_summary(&window(&[1.0, 1.0], &[3.0, 4.5]), 8.0);
        assert_eq!(summary.predicted_production, vec![3.0, 4.5]);
        assert_eq!(summary.total_revenue, 60.0);
        assert_eq!(summary.price_per_unit, 8.0);
    }

    #[test]
    fn test_demand_indexed_price() {
        assert_eq!(demand_indexed_price(600.0), 2.0);
    }

    proptest! {
        #[test]
        fn prop_wastage_never_negative(p in -1e6f64..1e6, d in -1e6f64..1e6) {
            prop_assert!(point_wastage(p, d) >= 0.0);
            prop_assert_eq!(point_wastage(p, d), (p - d).max(0.0));
        }

        #[test]
        fn prop_aggregate_wastage_never_negative(
            rows in proptest::collection::vec((0.0f64..5000.0, 0.0f64..5000.0), 0..40)
        ) {
            let (production, demand): (Vec<f64>, Vec<f64>) = rows.into_iter().unzip();
            prop_assert!(aggregate_wastage(&production, &demand) >= 0.0);
        }

        #[test]
        fn prop_revenue_is_sum_times_price(
            production in proptest::collection::vec(0.0f64..5000.0, 0..40),
            price in 0.0f64..100.0
        ) {
            let expected = production.iter().sum::<f64>() * price;
            prop_assert_eq!(revenue(&production, price), expected);
        }

        #[test]
        fn prop_peak_hours_surge(hour in 0u32..24, price in 0.0f64..1000.0) {
            let expected = if (18..=21).contains(&hour) { price * 1.2 } else { price };
            prop_assert_eq!(peak_hour_price(price, hour), expected);
        }

        #[test]
        fn prop_daily_surge(demand in 0.0f64..5000.0, price in 0.0f64..1000.0) {
            let expected = if demand > 2000.0 { price * 1.2 } else { price };
            prop_assert_eq!(daily_surge_price(price, demand), expected);
        }
    }
}
