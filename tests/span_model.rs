use edition_core::{CoreError, Span};
use proptest::prelude::*;

proptest! {
    #[test]
    fn invariant_span_accepts_exactly_ordered_non_negative_bounds(start in -50i64..500, end in -50i64..500) {
        let made = Span::new(start, end);
        prop_assert_eq!(made.is_ok(), start >= 0 && end >= start);
        match made {
            Ok(span) => {
                prop_assert_eq!(span.len() as i64, end - start);
            }
            Err(err) => {
                prop_assert!(matches!(err, CoreError::InvalidSpan(_)));
            }
        }
    }

    #[test]
    fn invariant_overlap_is_symmetric(a in 0i64..100, b in 0i64..100, c in 0i64..100, d in 0i64..100) {
        let x = Span::new(a.min(b), a.max(b)).unwrap();
        let y = Span::new(c.min(d), c.max(d)).unwrap();
        prop_assert_eq!(x.overlaps(&y), y.overlaps(&x));
    }

    #[test]
    fn invariant_clamped_span_fits(start in 0i64..200, len in 0i64..200, max in 0usize..300) {
        let clamped = Span::clamp(&Span::new(start, start + len).unwrap(), max);
        prop_assert!(clamped.check_within(max).is_ok());
        prop_assert!(clamped.start() <= clamped.end());
    }
}

#[test]
fn invariant_empty_span_overlaps_nothing() {
    let empty = Span::new(4, 4).unwrap();
    assert!(empty.is_empty());
    assert!(!empty.overlaps(&Span::new(0, 10).unwrap()));
}

#[test]
fn invariant_span_past_the_text_is_invalid() {
    let span = Span::new(2, 12).unwrap();
    assert!(span.check_within(12).is_ok());
    assert!(matches!(span.check_within(11), Err(CoreError::InvalidSpan(_))));
}

#[test]
fn golden_span_wire_form() {
    let span = Span::new(3, 9).unwrap();
    assert_eq!(
        serde_json::to_value(span).unwrap(),
        serde_json::json!({"ptr_start": 3, "ptr_end": 9})
    );

    let back: Span = serde_json::from_str(r#"{"ptr_start": 3, "ptr_end": 9}"#).unwrap();
    assert_eq!(back, span);

    assert!(serde_json::from_str::<Span>(r#"{"ptr_start": 9, "ptr_end": 3}"#).is_err());
    assert!(serde_json::from_str::<Span>(r#"{"ptr_start": -1, "ptr_end": 3}"#).is_err());
}
