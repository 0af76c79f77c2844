use edition_core::geometry::{fragment_url, parse_coords, validate_coords};
use edition_core::{bounding_box, BoundingBox, CoreError};
use proptest::prelude::*;

#[test]
fn scenario_polygon_overflowing_both_axes() {
    let bbox = bounding_box(&[10, 10, 50, 60], 40, 40).unwrap();
    assert_eq!(bbox, BoundingBox { x: 10, y: 10, width: 30, height: 30 });
}

#[test]
fn scenario_circle_with_negative_origin() {
    let bbox = bounding_box(&[5, 5, 10], 100, 100).unwrap();
    assert_eq!(bbox, BoundingBox { x: 0, y: 0, width: 20, height: 20 });
}

// Moving a negative origin to 0 shifts the box instead of cropping it. The extent is
// kept on both axes; callers relying on exact crops must clamp the coordinates themselves.
#[test]
fn invariant_negative_origin_keeps_the_extent() {
    let bbox = bounding_box(&[-30, -10, 20, 40], 100, 100).unwrap();
    assert_eq!(bbox, BoundingBox { x: 0, y: 0, width: 50, height: 50 });
}

#[test]
fn invariant_origin_past_the_image_is_pulled_back() {
    let bbox = bounding_box(&[120, 10, 140, 30], 100, 100).unwrap();
    assert_eq!(bbox, BoundingBox { x: 80, y: 10, width: 20, height: 20 });
}

#[test]
fn invariant_malformed_coordinates_are_rejected() {
    for coords in [&[][..], &[1][..], &[1, 2, 3, 4, 5][..], &[5, 5, -1][..]] {
        assert!(
            matches!(bounding_box(coords, 100, 100), Err(CoreError::InvalidGeometry(_))),
            "{coords:?}"
        );
    }
    assert!(matches!(bounding_box(&[0, 0, 1, 1], 0, 100), Err(CoreError::InvalidGeometry(_))));
    assert!(validate_coords(&[0, 0, 10, 0, 10, 10]).is_ok());
}

#[test]
fn invariant_stored_coordinates_are_floored() {
    assert_eq!(parse_coords("10, 40.7,500,50").unwrap(), vec![10, 40, 500, 50]);
    assert_eq!(parse_coords("-0.5,3,2").unwrap(), vec![-1, 3, 2]);
    assert!(matches!(parse_coords("10,abc,3,4"), Err(CoreError::InvalidGeometry(_))));
    assert!(matches!(parse_coords(""), Err(CoreError::InvalidGeometry(_))));
}

#[test]
fn golden_fragment_url() {
    let bbox = BoundingBox { x: 10, y: 20, width: 30, height: 40 };
    assert_eq!(
        fragment_url("https://iiif.example.org/iiif/2/ms-12/", &bbox),
        "https://iiif.example.org/iiif/2/ms-12/10,20,30,40/full/0/default.jpg"
    );
}

proptest! {
    #[test]
    fn invariant_clamping_is_idempotent(
        x1 in -200i64..400, y1 in -200i64..400,
        x2 in -200i64..400, y2 in -200i64..400,
        max_w in 1i64..300, max_h in 1i64..300,
    ) {
        let once = bounding_box(&[x1, y1, x2, y2], max_w, max_h).unwrap();
        prop_assume!(once.x >= 0 && once.y >= 0);
        let twice = bounding_box(&once.to_coords(), max_w, max_h).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn invariant_clamped_box_stays_inside(
        cx in -100i64..300, cy in -100i64..300, r in 0i64..80,
        max_w in 1i64..300, max_h in 1i64..300,
    ) {
        let bbox = bounding_box(&[cx, cy, r], max_w, max_h).unwrap();
        prop_assert!(bbox.x + bbox.width <= max_w);
        prop_assert!(bbox.y + bbox.height <= max_h);
    }
}
