//! The quadrilateral between two starting positions.

use geo::{Intersects, LineString, Point, Polygon};

use crate::replay::Position;

/// Region between two bases, `half_width` tiles to either side of the line
/// joining them.
///
/// Points on the edge count as inside.
#[derive(Debug, Clone)]
pub struct Corridor {
    polygon: Polygon<f64>,
    corners: [Position; 4],
}

impl Corridor {
    /// Build the corridor. Returns `None` when the two positions coincide.
    #[must_use]
    pub fn between(first: Position, second: Position, half_width: f64) -> Option<Self> {
        let length = first.distance(&second);
        if length <= f64::EPSILON || !length.is_finite() {
            return None;
        }
        let dx = (first.x - second.x) / length;
        let dy = (first.y - second.y) / length;
        // Perpendicular to the line between the bases.
        let (px, py) = (dy * half_width, -dx * half_width);

        let c1 = Position::new(first.x + px, first.y + py);
        let c2 = Position::new(first.x - px, first.y - py);
        let c3 = Position::new(second.x + px, second.y + py);
        let c4 = Position::new(second.x - px, second.y - py);

        let corners = [c1, c2, c4, c3];
        let ring: Vec<(f64, f64)> = corners.iter().map(|c| (c.x, c.y)).collect();
        Some(Self {
            polygon: Polygon::new(LineString::from(ring), vec![]),
            corners,
        })
    }

    /// Corner points in ring order.
    #[must_use]
    pub const fn corners(&self) -> &[Position; 4] {
        &self.corners
    }

    /// Whether a position lies inside or on the edge.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        self.polygon.intersects(&Point::new(position.x, position.y))
    }
}
