//! Candidate selection strategies
//!
//! Every strategy is a pure function over facts collected from a single
//! candidate-set snapshot, so each one is testable without a browser. Ties
//! always go to the candidate that appears first in set order.

use steadyhand_core_types::{BoundingBox, Point, Viewport};

use crate::types::AttributeMatcher;

/// Index picked by MOST_VISIBLE when no candidate is both visible and
/// entirely inside the viewport.
pub const MOST_VISIBLE_FALLBACK_INDEX: usize = 0;

/// Visibility and geometry of one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityFacts {
    pub visible: bool,
    pub bounding_box: Option<BoundingBox>,
}

impl VisibilityFacts {
    pub fn new(visible: bool, bounding_box: Option<BoundingBox>) -> Self {
        Self {
            visible,
            bounding_box,
        }
    }
}

pub fn select_first(len: usize) -> Option<usize> {
    (len > 0).then_some(0)
}

pub fn select_last(len: usize) -> Option<usize> {
    len.checked_sub(1)
}

pub fn select_index(len: usize, index: usize) -> Option<usize> {
    (index < len).then_some(index)
}

/// First candidate whose text contains `needle` (case-sensitive substring).
pub fn first_containing_text(texts: &[Option<String>], needle: &str) -> Option<usize> {
    texts
        .iter()
        .position(|text| text.as_deref().is_some_and(|t| t.contains(needle)))
}

/// First candidate whose attribute value satisfies the matcher.
pub fn first_matching_attribute(
    values: &[Option<String>],
    matcher: &AttributeMatcher,
) -> Option<usize> {
    values
        .iter()
        .position(|value| value.as_deref().is_some_and(|v| matcher.matches(v)))
}

/// Largest-area candidate among those visible and fully inside the viewport.
pub fn most_visible(facts: &[VisibilityFacts], viewport: &Viewport) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, fact) in facts.iter().enumerate() {
        if !fact.visible {
            continue;
        }
        let Some(bbox) = fact.bounding_box else {
            continue;
        };
        if !bbox.is_within(viewport) {
            continue;
        }
        let area = bbox.area();
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((index, area)),
        }
    }
    best.map(|(index, _)| index)
}

/// Candidate whose box center is nearest to `target`. Candidates without a
/// box are not eligible.
pub fn closest_to_point(boxes: &[Option<BoundingBox>], target: Point) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, bbox) in boxes.iter().enumerate() {
        let Some(bbox) = bbox else {
            continue;
        };
        let distance = bbox.center().distance_to(&target);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((index, distance)),
        }
    }
    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_boxes() -> Vec<BoundingBox> {
        vec![
            BoundingBox::new(0.0, 0.0, 50.0, 20.0),
            BoundingBox::new(100.0, 100.0, 200.0, 100.0),
            BoundingBox::new(500.0, 500.0, 10.0, 10.0),
        ]
    }

    #[test]
    fn first_and_last() {
        assert_eq!(select_first(3), Some(0));
        assert_eq!(select_last(3), Some(2));
        assert_eq!(select_last(0), None);
        assert_eq!(select_index(3, 2), Some(2));
        assert_eq!(select_index(3, 3), None);
    }

    #[test]
    fn most_visible_prefers_largest_area() {
        let facts: Vec<_> = sample_boxes()
            .into_iter()
            .map(|b| VisibilityFacts::new(true, Some(b)))
            .collect();
        let viewport = Viewport::new(800.0, 600.0);
        assert_eq!(most_visible(&facts, &viewport), Some(1));
    }

    #[test]
    fn most_visible_skips_hidden_and_overflowing() {
        let viewport = Viewport::new(800.0, 600.0);
        let facts = vec![
            VisibilityFacts::new(false, Some(BoundingBox::new(0.0, 0.0, 400.0, 400.0))),
            VisibilityFacts::new(true, Some(BoundingBox::new(700.0, 0.0, 200.0, 200.0))),
            VisibilityFacts::new(true, Some(BoundingBox::new(10.0, 10.0, 5.0, 5.0))),
            VisibilityFacts::new(true, None),
        ];
        assert_eq!(most_visible(&facts, &viewport), Some(2));
        assert_eq!(most_visible(&facts[..2], &viewport), None);
    }

    #[test]
    fn most_visible_tie_goes_to_first() {
        let viewport = Viewport::new(800.0, 600.0);
        let facts = vec![
            VisibilityFacts::new(true, Some(BoundingBox::new(0.0, 0.0, 10.0, 10.0))),
            VisibilityFacts::new(true, Some(BoundingBox::new(50.0, 50.0, 20.0, 5.0))),
            VisibilityFacts::new(true, Some(BoundingBox::new(100.0, 100.0, 5.0, 20.0))),
        ];
        assert_eq!(most_visible(&facts, &viewport), Some(0));
    }

    #[test]
    fn closest_to_viewport_center() {
        let boxes: Vec<_> = sample_boxes().into_iter().map(Some).collect();
        let center = Viewport::new(800.0, 600.0).center();
        assert_eq!(closest_to_point(&boxes, center), Some(2));
    }

    #[test]
    fn closest_ignores_missing_boxes_and_breaks_ties_by_order() {
        let target = Point::new(100.0, 100.0);
        let boxes = vec![
            None,
            Some(BoundingBox::new(80.0, 90.0, 20.0, 20.0)),
            Some(BoundingBox::new(100.0, 90.0, 20.0, 20.0)),
        ];
        assert_eq!(closest_to_point(&boxes, target), Some(1));
        assert_eq!(closest_to_point(&[None, None], target), None);
    }

    #[test]
    fn text_and_attribute_scans_pick_first_match() {
        let texts = vec![
            None,
            Some("Add to cart".to_string()),
            Some("Add to wishlist".to_string()),
        ];
        assert_eq!(first_containing_text(&texts, "Add to"), Some(1));
        assert_eq!(first_containing_text(&texts, "add to"), None);

        let values = vec![Some("row-7".to_string()), Some("row-12".to_string())];
        let pattern = AttributeMatcher::pattern(r"^row-\d{2}$").unwrap();
        assert_eq!(first_matching_attribute(&values, &pattern), Some(1));
        assert_eq!(
            first_matching_attribute(&values, &AttributeMatcher::exact("row-7")),
            Some(0)
        );
    }
}
