//! Threat evaluation: distance from the bird to the nearest obstacle edge
//!
//! The plane around an obstacle rectangle splits into eight regions along its
//! (infinitely extended) sides. Corner regions measure to the corner, side
//! regions measure straight to that side. A point inside the rectangle is
//! already touching it and reports distance zero at the nearest side.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rect::Rect;

/// Nearest obstacle surface as seen from the bird
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threat {
    /// Distance from the bird's center to the contact point
    pub distance: f32,
    /// Closest point on the obstacle's edge
    pub point: Vec2,
}

impl Threat {
    /// A threat farther than anything on screen
    pub fn none() -> Self {
        Self {
            distance: f32::INFINITY,
            point: Vec2::ZERO,
        }
    }
}

/// Distance from a point to the closest edge of a rectangle
pub fn nearest_edge(p: Vec2, rect: &Rect) -> Threat {
    let (left, right, top, bottom) = (rect.left(), rect.right(), rect.top(), rect.bottom());

    if rect.contains(p) {
        // Project onto whichever side is closest
        let candidates = [
            (p.x - left, Vec2::new(left, p.y)),
            (right - p.x, Vec2::new(right, p.y)),
            (p.y - top, Vec2::new(p.x, top)),
            (bottom - p.y, Vec2::new(p.x, bottom)),
        ];
        let (_, point) = candidates
            .into_iter()
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .unwrap_or((0.0, p));
        return Threat {
            distance: 0.0,
            point,
        };
    }

    // Clamping handles the corner and side regions alike
    let point = Vec2::new(p.x.clamp(left, right), p.y.clamp(top, bottom));
    Threat {
        distance: p.distance(point),
        point,
    }
}

/// The nearest threat among all obstacles
pub fn closest_threat(p: Vec2, obstacles: impl IntoIterator<Item = Rect>) -> Threat {
    obstacles
        .into_iter()
        .map(|rect| nearest_edge(p, &rect))
        .fold(Threat::none(), |best, t| {
            if t.distance < best.distance { t } else { best }
        })
}
