//! Planar polyline helpers used to lay lanes out beside a road axis.
//!
//! All functions take the input by reference and return freshly allocated output.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        Point {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Unit normal of segment `a -> b`, the direction turned 90° counter-clockwise.
/// `None` for a zero-length segment.
fn segment_normal(a: &Point, b: &Point) -> Option<(f64, f64)> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = dx.hypot(dy);
    if len == 0.0 {
        return None;
    }
    Some((-dy / len, dx / len))
}

/// Shifts `points` sideways by `distance` along the averaged vertex normals.
///
/// Positive distances move to the left of the direction of travel in a y-up
/// frame. Fewer than two points are returned as is.
pub fn offset(points: &[Point], distance: f64) -> Vec<Point> {
    if points.len() < 2 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    points.iter()
        .enumerate()
        .map(|(i, point)| {
            let incoming = if i > 0 { segment_normal(&points[i - 1], point) } else { None };
            let outgoing = if i < last { segment_normal(point, &points[i + 1]) } else { None };

            let (nx, ny) = [incoming, outgoing].into_iter()
                .flatten()
                .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));

            let len = nx.hypot(ny);
            let len = if len == 0.0 { 1.0 } else { len };
            Point {
                x: point.x + nx / len * distance,
                y: point.y + ny / len * distance,
            }
        })
        .collect()
}

/// Midpoint and heading (radians, `atan2(dy, dx)`) of the longest segment.
///
/// Ties go to the earliest segment. With fewer than two points the first point
/// (or the origin) is returned with heading 0.
pub fn midpoint_and_heading(points: &[Point]) -> (Point, f64) {
    if points.len() < 2 {
        return (points.first().copied().unwrap_or_default(), 0.0);
    }

    let mut longest = 0;
    let mut longest_len = -1.0;
    for (i, pair) in points.windows(2).enumerate() {
        let len = pair[0].distance(&pair[1]);
        if len > longest_len {
            longest_len = len;
            longest = i;
        }
    }

    let a = &points[longest];
    let b = &points[longest + 1];
    (a.lerp(b, 0.5), (b.y - a.y).atan2(b.x - a.x))
}

/// Shortest decimal that round-trips, never in exponent form; -0 prints as 0.
fn write_coord(path: &mut String, value: f64) {
    path.push_str(&(value + 0.0).to_string());
}

/// Vector path `M x0 y0 L x1 y1 ...`; empty for no points.
pub fn to_path_string(points: &[Point]) -> String {
    let mut path = String::new();
    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            path.push(' ');
        }
        path.push(if i == 0 { 'M' } else { 'L' });
        path.push(' ');
        write_coord(&mut path, point.x);
        path.push(' ');
        write_coord(&mut path, point.y);
    }
    path
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use approx::assert_relative_eq;

    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|(x, y)| Point::new(*x, *y)).collect()
    }

    #[test]
    fn test_offset_degenerate_inputs_unchanged() {
        assert!(offset(&[], 5.0).is_empty());
        let single = pts(&[(3.0, 4.0)]);
        assert_eq!(offset(&single, -7.5), single);
    }

    #[test]
    fn test_offset_straight_segment() {
        let shifted = offset(&pts(&[(0.0, 0.0), (10.0, 0.0)]), 5.0);
        assert_eq!(shifted, pts(&[(0.0, 5.0), (10.0, 5.0)]));

        let other_side = offset(&pts(&[(0.0, 0.0), (10.0, 0.0)]), -5.0);
        assert_eq!(other_side, pts(&[(0.0, -5.0), (10.0, -5.0)]));
    }

    #[test]
    fn test_offset_right_angle_bend_uses_averaged_normal() {
        let shifted = offset(&pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]), 2.0);
        assert_relative_eq!(shifted[0].x, 0.0);
        assert_relative_eq!(shifted[0].y, 2.0);
        // Corner moves along the bisector (-1, 1) / sqrt(2).
        let diag = 2.0 / 2.0_f64.sqrt();
        assert_relative_eq!(shifted[1].x, 10.0 - diag, epsilon = 1e-12);
        assert_relative_eq!(shifted[1].y, diag, epsilon = 1e-12);
        assert_relative_eq!(shifted[2].x, 8.0);
        assert_relative_eq!(shifted[2].y, 10.0);
    }

    #[test]
    fn test_offset_reversing_path_does_not_divide_by_zero() {
        let shifted = offset(&pts(&[(0.0, 0.0), (10.0, 0.0), (0.0, 0.0)]), 3.0);
        // The turn-around vertex has cancelling normals and stays put.
        assert_eq!(shifted[1], Point::new(10.0, 0.0));
        assert!(shifted.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn test_offset_skips_zero_length_segments() {
        let shifted = offset(&pts(&[(0.0, 0.0), (0.0, 0.0), (10.0, 0.0)]), 1.0);
        assert_eq!(shifted, pts(&[(0.0, 0.0), (0.0, 1.0), (10.0, 1.0)]));
    }

    #[test]
    fn test_offset_keeps_input() {
        let axis = pts(&[(0.0, 0.0), (4.0, 3.0)]);
        let _ = offset(&axis, 1.0);
        assert_eq!(axis, pts(&[(0.0, 0.0), (4.0, 3.0)]));
    }

    #[test]
    fn test_midpoint_picks_longest_segment() {
        let (point, heading) = midpoint_and_heading(&pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 10.0)]));
        assert_eq!(point, Point::new(1.0, 5.0));
        assert_relative_eq!(heading, FRAC_PI_2);
    }

    #[test]
    fn test_midpoint_tie_goes_to_first() {
        let (point, heading) = midpoint_and_heading(&pts(&[(0.0, 0.0), (-2.0, 0.0), (-2.0, 2.0)]));
        assert_eq!(point, Point::new(-1.0, 0.0));
        assert_relative_eq!(heading, PI);
    }

    #[test]
    fn test_midpoint_degenerate_inputs() {
        assert_eq!(midpoint_and_heading(&[]), (Point::new(0.0, 0.0), 0.0));
        assert_eq!(midpoint_and_heading(&pts(&[(2.0, 3.0)])), (Point::new(2.0, 3.0), 0.0));
        assert_eq!(midpoint_and_heading(&pts(&[(2.0, 3.0), (2.0, 3.0)])), (Point::new(2.0, 3.0), 0.0));
    }

    #[test]
    fn test_path_string() {
        assert_eq!(to_path_string(&[]), "");
        assert_eq!(to_path_string(&pts(&[(1.0, 2.0)])), "M 1 2");
        assert_eq!(
            to_path_string(&pts(&[(0.0, 0.0), (10.5, -3.0), (-0.0, 7.25)])),
            "M 0 0 L 10.5 -3 L 0 7.25"
        );
        assert_eq!(
            to_path_string(&pts(&[(1e-7, 1e21)])),
            "M 0.0000001 1000000000000000000000"
        );
    }
}
