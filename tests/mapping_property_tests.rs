use luxr::core::mapping::{BrightnessCurve, lux_to_brightness};
use proptest::prelude::*;

/// Curve endpoints with `max_lux` strictly above `min_lux`.
fn curve_strategy() -> impl Strategy<Value = (f64, f64)> {
    (0.0..1000.0f64, 1.0..100_000.0f64).prop_map(|(min, span)| (min, min + span))
}

fn gamma_strategy() -> impl Strategy<Value = f64> {
    0.1..=5.0f64
}

proptest! {
    /// Every reading maps into the valid brightness range
    #[test]
    fn test_output_is_always_in_range(
        (min, max) in curve_strategy(),
        gamma in gamma_strategy(),
        lux in -1_000.0..300_000.0f64,
    ) {
        let level = lux_to_brightness(lux, min, max, gamma);
        prop_assert!((1..=100).contains(&level), "lux {lux} mapped to {level}");
    }

    /// More light never means a dimmer screen
    #[test]
    fn test_mapping_is_monotonic(
        (min, max) in curve_strategy(),
        gamma in gamma_strategy(),
        a in 0.0..200_000.0f64,
        b in 0.0..200_000.0f64,
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            lux_to_brightness(low, min, max, gamma) <= lux_to_brightness(high, min, max, gamma)
        );
    }

    /// Readings outside the curve clamp to its ends
    #[test]
    fn test_out_of_range_clamps(
        (min, max) in curve_strategy(),
        gamma in gamma_strategy(),
        below in 0.0..1.0f64,
        above in 0.0..1_000.0f64,
    ) {
        prop_assert_eq!(lux_to_brightness(min * below, min, max, gamma), 1);
        prop_assert_eq!(lux_to_brightness(max + above, min, max, gamma), 100);
    }

    /// A steeper gamma dims mid-range readings
    #[test]
    fn test_higher_gamma_is_never_brighter(
        (min, max) in curve_strategy(),
        g1 in gamma_strategy(),
        g2 in gamma_strategy(),
        t in 0.0..=1.0f64,
    ) {
        let (soft, steep) = if g1 <= g2 { (g1, g2) } else { (g2, g1) };
        let lux = min + (max - min) * t;
        prop_assert!(
            lux_to_brightness(lux, min, max, steep) <= lux_to_brightness(lux, min, max, soft)
        );
    }
}

#[test]
fn test_default_curve_reference_points() {
    let curve = BrightnessCurve::new(5.0, 500.0, 0.6);

    assert_eq!(curve.brightness_for(0.0), 1);
    assert_eq!(curve.brightness_for(5.0), 1);
    assert_eq!(curve.brightness_for(10.0), 6);
    assert_eq!(curve.brightness_for(50.0), 24);
    assert_eq!(curve.brightness_for(100.0), 37);
    assert_eq!(curve.brightness_for(250.0), 66);
    assert_eq!(curve.brightness_for(500.0), 100);
    assert_eq!(curve.brightness_for(10_000.0), 100);
}

#[test]
fn test_linear_gamma_is_proportional() {
    let curve = BrightnessCurve::new(0.0, 1000.0, 1.0);
    assert_eq!(curve.brightness_for(250.0), 25);
    assert_eq!(curve.brightness_for(500.0), 50);
    assert_eq!(curve.brightness_for(999.0), 100);
}
