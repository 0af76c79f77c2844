use serde::{Deserialize, Serialize};

use crate::types::errors::{CoreError, CoreResult};

/// Axis-aligned pixel rectangle, `(x, y)` being the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl BoundingBox {
    /// The box as a two-point rectangle coordinate list.
    pub fn to_coords(&self) -> [i64; 4] {
        [
            self.x,
            self.y,
            self.x.saturating_add(self.width),
            self.y.saturating_add(self.height),
        ]
    }
}

/// Bounding box of a zone's coordinates, clamped to an image of `max_width` x `max_height`.
///
/// An even-length list is a flat `[x1, y1, x2, y2, ...]` polygon or rectangle; a
/// three-value list is a circle `(cx, cy, r)`.
///
/// Clamping runs in a fixed order. A negative origin is moved to 0 without shrinking the
/// extent, an origin beyond the image is pulled back by the extent, and only then is the
/// extent cut at the image border. Moving a negative origin to 0 therefore shifts the box
/// rather than cropping it, on both axes.
pub fn bounding_box(coords: &[i64], max_width: i64, max_height: i64) -> CoreResult<BoundingBox> {
    if max_width <= 0 || max_height <= 0 {
        return Err(CoreError::InvalidGeometry(format!(
            "image bounds {max_width}x{max_height} must be positive"
        )));
    }

    let (mut x, mut y, mut width, mut height) = envelope(coords)?;

    if x < 0 {
        x = 0;
    } else if x > max_width {
        x = max_width - width;
    }

    if y < 0 {
        y = 0;
    } else if y > max_height {
        y = max_height - height;
    }

    if checked(x.checked_add(width))? > max_width {
        width = checked(max_width.checked_sub(x))?;
    }
    if checked(y.checked_add(height))? > max_height {
        height = checked(max_height.checked_sub(y))?;
    }

    Ok(BoundingBox { x, y, width, height })
}

fn checked(value: Option<i64>) -> CoreResult<i64> {
    value.ok_or_else(|| CoreError::InvalidGeometry("coordinates out of range".into()))
}

/// Checks that a coordinate list describes a polygon, a rectangle or a circle.
pub fn validate_coords(coords: &[i64]) -> CoreResult<()> {
    envelope(coords).map(|_| ())
}

/// Unclamped `(min_x, min_y, width, height)`.
fn envelope(coords: &[i64]) -> CoreResult<(i64, i64, i64, i64)> {
    match coords.len() {
        0 => Err(CoreError::InvalidGeometry("empty coordinate list".into())),
        3 => {
            let (cx, cy, r) = (coords[0], coords[1], coords[2]);
            if r < 0 {
                return Err(CoreError::InvalidGeometry(format!("negative radius {r}")));
            }
            let diameter = checked(r.checked_mul(2))?;
            Ok((checked(cx.checked_sub(r))?, checked(cy.checked_sub(r))?, diameter, diameter))
        }
        n if n % 2 == 0 => {
            let mut points = coords.chunks_exact(2);
            // n >= 2 here, so there is a first point
            let (mut min_x, mut min_y) = match points.next() {
                Some(p) => (p[0], p[1]),
                None => return Err(CoreError::InvalidGeometry("empty coordinate list".into())),
            };
            let (mut max_x, mut max_y) = (min_x, min_y);
            for p in points {
                min_x = min_x.min(p[0]);
                max_x = max_x.max(p[0]);
                min_y = min_y.min(p[1]);
                max_y = max_y.max(p[1]);
            }
            Ok((
                min_x,
                min_y,
                checked(max_x.checked_sub(min_x))?,
                checked(max_y.checked_sub(min_y))?,
            ))
        }
        n => Err(CoreError::InvalidGeometry(format!(
            "{n} coordinates: expected x/y pairs or a circle (cx, cy, r)"
        ))),
    }
}

/// Parses a stored `"x1,y1,x2,y2,..."` list, flooring fractional pixels.
pub fn parse_coords(raw: &str) -> CoreResult<Vec<i64>> {
    let coords = raw
        .split(',')
        .map(|part| {
            let part = part.trim();
            let value: f64 = part
                .parse()
                .map_err(|_| CoreError::InvalidGeometry(format!("not a number: {part:?}")))?;
            let value = value.floor();
            // i64::MAX as f64 rounds up to 2^63, which is already out of range
            if !value.is_finite() || value < i64::MIN as f64 || value >= i64::MAX as f64 {
                return Err(CoreError::InvalidGeometry(format!("out of range: {part:?}")));
            }
            Ok(value as i64)
        })
        .collect::<CoreResult<Vec<i64>>>()?;

    validate_coords(&coords)?;
    Ok(coords)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_inside_bounds_is_untouched() {
        let bbox = bounding_box(&[10, 20, 30, 60], 100, 100).unwrap();
        assert_eq!(bbox, BoundingBox { x: 10, y: 20, width: 20, height: 40 });
    }

    #[test]
    fn polygon_envelope_uses_every_point() {
        // the first point is neither min nor max on x
        let bbox = bounding_box(&[50, 50, 10, 90, 80, 5], 200, 200).unwrap();
        assert_eq!(bbox, BoundingBox { x: 10, y: 5, width: 70, height: 85 });
    }

    #[test]
    fn origin_beyond_image_is_pulled_back() {
        let bbox = bounding_box(&[120, 10, 130, 20], 100, 100).unwrap();
        assert_eq!(bbox, BoundingBox { x: 90, y: 10, width: 10, height: 10 });
    }

    #[test]
    fn wrong_arity_is_rejected() {
        assert!(matches!(bounding_box(&[], 10, 10), Err(CoreError::InvalidGeometry(_))));
        assert!(matches!(bounding_box(&[1, 2, 3, 4, 5], 10, 10), Err(CoreError::InvalidGeometry(_))));
        assert!(matches!(bounding_box(&[1, 2, -3], 10, 10), Err(CoreError::InvalidGeometry(_))));
        assert!(matches!(bounding_box(&[1, 2, 3, 4], 0, 10), Err(CoreError::InvalidGeometry(_))));
    }

    #[test]
    fn parse_floors_fractional_pixels() {
        assert_eq!(parse_coords("10.9, 40,500.2,50").unwrap(), vec![10, 40, 500, 50]);
        assert!(matches!(parse_coords("10,abc"), Err(CoreError::InvalidGeometry(_))));
        assert!(matches!(parse_coords(""), Err(CoreError::InvalidGeometry(_))));
        assert!(matches!(parse_coords("1,2,3,4,5"), Err(CoreError::InvalidGeometry(_))));
        assert!(matches!(parse_coords("0,0,1e19,10"), Err(CoreError::InvalidGeometry(_))));
        assert!(matches!(parse_coords("inf,0,1,1"), Err(CoreError::InvalidGeometry(_))));
    }

    #[test]
    fn overflowing_extents_are_rejected() {
        let huge = i64::MAX / 2 + 1;
        assert!(matches!(bounding_box(&[0, 0, huge], 100, 100), Err(CoreError::InvalidGeometry(_))));
        assert!(matches!(
            bounding_box(&[i64::MIN, 0, 10], 100, 100),
            Err(CoreError::InvalidGeometry(_))
        ));
        assert!(matches!(
            bounding_box(&[-9_000_000_000_000_000_000, 0, 9_000_000_000_000_000_000, 10], 100, 100),
            Err(CoreError::InvalidGeometry(_))
        ));
        assert!(matches!(parse_coords("-9e18,0,9e18,10"), Err(CoreError::InvalidGeometry(_))));
    }

    #[test]
    fn wide_box_past_the_image_does_not_overflow() {
        let bbox = bounding_box(&[200, 0, i64::MAX - 1, 10], 100, 100).unwrap();
        assert_eq!(bbox.x, 100 - (i64::MAX - 201));
        assert_eq!(bbox.width, i64::MAX - 201);
    }
}
