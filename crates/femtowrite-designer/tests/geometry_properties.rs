use femtowrite_core::constants::CONTINUITY_TOLERANCE;
use femtowrite_core::Point3;
use femtowrite_designer::segments::{circular_arc, line, sine_arc};
use femtowrite_designer::{
    Sampling, SineOffsets, Transform, TransformStack, Waveguide, WaveguideParameters,
};
use proptest::prelude::*;

fn sampling() -> Sampling {
    Sampling::with_spacing(0.05).unwrap()
}

proptest! {
    #[test]
    fn arc_chord_matches_sweep(
        radius in 1.0f64..40.0,
        sweep in 0.01f64..3.0,
        heading in -3.1f64..3.1,
        left in any::<bool>(),
    ) {
        let start = Point3::new(1.0, 2.0, 0.05);
        let signed = if left { radius } else { -radius };
        let arc = circular_arc(start, heading, signed, sweep, sampling()).unwrap();

        let end = *arc.points.last().unwrap();
        let chord = start.distance_to(&end);
        let expected = 2.0 * radius * (sweep / 2.0).sin();
        prop_assert!((chord - expected).abs() < 1e-9);
        prop_assert_eq!(arc.points[0], start);
        for p in &arc.points {
            prop_assert!((p.distance_to(&arc.center) - radius).abs() < 1e-9);
            prop_assert_eq!(p.z, start.z);
        }
    }

    #[test]
    fn line_hits_both_ends(
        x in -10.0f64..10.0,
        y in -10.0f64..10.0,
        dx in 0.1f64..20.0,
    ) {
        let start = Point3::new(x, y, 0.0);
        let end = Point3::new(x + dx, y, 0.0);
        let points = line(start, end, sampling()).unwrap();
        prop_assert!(points.len() >= 2);
        prop_assert_eq!(points[0], start);
        prop_assert_eq!(*points.last().unwrap(), end);
    }

    #[test]
    fn sine_arc_reaches_offset(dx in 0.5f64..10.0, dy in -0.5f64..0.5) {
        prop_assume!(dy.abs() > 1e-3);
        let start = Point3::new(0.0, 1.0, 0.03);
        let points = sine_arc(start, 0.0, SineOffsets::new(dx, dy, 0.0), sampling()).unwrap();
        let end = *points.last().unwrap();
        prop_assert!(end.approx_eq(&Point3::new(dx, 1.0 + dy, 0.03), 1e-9));
    }

    #[test]
    fn affine_stack_round_trips(
        angle in -3.1f64..3.1,
        ox in -50.0f64..50.0,
        oy in -50.0f64..50.0,
        flip_x in any::<bool>(),
        x in -20.0f64..20.0,
        y in -20.0f64..20.0,
    ) {
        let stack = TransformStack::new()
            .with(Transform::index_compensation(1.5)).unwrap()
            .with(Transform::flip(flip_x, false)).unwrap()
            .with(Transform::rotation(angle)).unwrap()
            .with(Transform::translation([ox, oy, 0.0])).unwrap();
        let inverse = stack.inverse().unwrap();
        let p = Point3::new(x, y, 0.035);
        let back = inverse.apply_point(stack.apply_point(p));
        prop_assert!(back.approx_eq(&p, 1e-9));
    }

    #[test]
    fn chained_waveguide_is_continuous(dy in 0.01f64..0.2, arm in 0.0f64..3.0) {
        let params = WaveguideParameters {
            arm_length: arm,
            point_spacing: Some(0.05),
            ..Default::default()
        };
        let mut wg = Waveguide::new(params);
        wg.start([0.0, 1.0, 0.035]).unwrap()
            .linear([2.0, 0.0, 0.0]).unwrap()
            .arc_mzi(dy).unwrap()
            .arc_bend(-dy).unwrap()
            .bridge(3.0, 0.1, 0.01).unwrap()
            .linear([1.0, 0.0, 0.0]).unwrap();
        let wg = wg.end().unwrap();

        for pair in wg.segments().windows(2) {
            let end = pair[0].last().unwrap().position;
            let start = pair[1].first().unwrap().position;
            prop_assert!(end.approx_eq(&start, CONTINUITY_TOLERANCE));
        }
        prop_assert_eq!(wg.end_point(), wg.start_point());
    }
}

#[test]
fn test_transform_order_enforced() {
    let err = TransformStack::new()
        .with(Transform::rotation(0.1))
        .unwrap()
        .with(Transform::flip(true, false))
        .unwrap_err();
    assert!(err.to_string().contains("flip"));
}

#[test]
fn test_translation_round_trip() {
    let stack = TransformStack::new()
        .with(Transform::translation([3.0, -4.0, 0.5]))
        .unwrap();
    let p = Point3::new(1.0, 2.0, 0.0);
    let moved = stack.apply_point(p);
    assert_eq!(moved, Point3::new(4.0, -2.0, 0.5));
    assert_eq!(stack.inverse().unwrap().apply_point(moved), p);
}

#[test]
fn test_oversampled_segment_is_rejected() {
    let mut wg = Waveguide::new(WaveguideParameters {
        point_spacing: Some(1e-12),
        ..Default::default()
    });
    wg.start([0.0, 1.0, 0.035]).unwrap();
    let err = wg.linear([100.0, 0.0, 0.0]).unwrap_err();
    assert!(err.to_string().contains("points"));
}
