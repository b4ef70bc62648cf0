//! Viewport intersection observers.

use crate::Page;
use crate::layout::Rect;
use anyhow::{Result, bail};
use dom::NodeKey;
use serde::Serialize;
use std::rc::Rc;

/// Handle returned by [`Page::create_intersection_observer`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ObserverId(pub u64);

/// Offsets applied to each side of the viewport before intersecting.
/// Negative values shrink the root.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct RootMargin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl RootMargin {
    pub const fn bottom(bottom: f64) -> Self {
        Self {
            top: 0.0,
            right: 0.0,
            bottom,
            left: 0.0,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct IntersectionObserverInit {
    pub threshold: f64,
    pub root_margin: RootMargin,
}

impl IntersectionObserverInit {
    pub const fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            root_margin: RootMargin {
                top: 0.0,
                right: 0.0,
                bottom: 0.0,
                left: 0.0,
            },
        }
    }

    /// # Errors
    /// Returns an error if the threshold is outside `0.0..=1.0`.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            bail!("threshold {} is outside 0.0..=1.0", self.threshold);
        }
        Ok(())
    }
}

/// What an observer is told about one target.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct IntersectionEntry {
    pub target: NodeKey,
    pub is_intersecting: bool,
    pub ratio: f64,
    pub time: u64,
}

/// Observer callback. It may observe or unobserve targets, including its own.
pub type ObserverCallback = Rc<dyn Fn(&mut Page, &[IntersectionEntry], ObserverId) -> Result<()>>;

pub(crate) struct Observer {
    pub(crate) id: ObserverId,
    pub(crate) init: IntersectionObserverInit,
    pub(crate) callback: ObserverCallback,
    /// Targets in observation order with the last state reported for each.
    pub(crate) targets: Vec<(NodeKey, Option<bool>)>,
}

impl Observer {
    /// Compute the entries this observer must deliver for the given root.
    /// Records the new states.
    pub(crate) fn collect(
        &mut self,
        rect_of: impl Fn(NodeKey) -> Option<Rect>,
        viewport: Rect,
        time: u64,
    ) -> Vec<IntersectionEntry> {
        let margin = self.init.root_margin;
        let root = viewport.expand(margin.top, margin.right, margin.bottom, margin.left);
        let mut entries = Vec::new();
        for (target, last) in &mut self.targets {
            let (is_intersecting, ratio) = match rect_of(*target) {
                Some(rect) => measure(&rect, &root, self.init.threshold),
                None => (false, 0.0),
            };
            if *last != Some(is_intersecting) {
                *last = Some(is_intersecting);
                entries.push(IntersectionEntry {
                    target: *target,
                    is_intersecting,
                    ratio,
                    time,
                });
            }
        }
        entries
    }

    pub(crate) fn observe(&mut self, target: NodeKey) {
        if !self.targets.iter().any(|(node, _)| *node == target) {
            self.targets.push((target, None));
        }
    }

    pub(crate) fn unobserve(&mut self, target: NodeKey) {
        self.targets.retain(|(node, _)| *node != target);
    }

    pub(crate) fn has_unreported(&self) -> bool {
        self.targets.iter().any(|(_, last)| last.is_none())
    }
}

/// Intersection state and visible ratio of `target` against `root`.
pub fn measure(target: &Rect, root: &Rect, threshold: f64) -> (bool, f64) {
    let Some(overlap) = target.intersect(root) else {
        return (false, 0.0);
    };
    let area = target.area();
    if area <= 0.0 {
        return (true, 1.0);
    }
    let ratio = (overlap.area() / area).clamp(0.0, 1.0);
    let is_intersecting = if threshold <= 0.0 {
        ratio > 0.0
    } else {
        ratio >= threshold
    };
    (is_intersecting, ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_zero_needs_positive_overlap() {
        let root = Rect::new(0.0, 0.0, 100.0, 100.0);
        let touching = Rect::new(0.0, 100.0, 100.0, 50.0);
        let peeking = Rect::new(0.0, 99.0, 100.0, 50.0);
        assert_eq!(measure(&touching, &root, 0.0), (false, 0.0));
        assert!(measure(&peeking, &root, 0.0).0);
    }

    #[test]
    fn ratio_is_compared_against_threshold() {
        let root = Rect::new(0.0, 0.0, 100.0, 100.0);
        let half = Rect::new(0.0, 50.0, 100.0, 100.0);
        assert_eq!(measure(&half, &root, 0.5), (true, 0.5));
        assert_eq!(measure(&half, &root, 0.6), (false, 0.5));
    }

    #[test]
    fn empty_target_inside_root_counts_as_fully_visible() {
        let root = Rect::new(0.0, 0.0, 100.0, 100.0);
        let empty = Rect::new(0.0, 10.0, 100.0, 0.0);
        assert_eq!(measure(&empty, &root, 1.0), (true, 1.0));
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        assert!(IntersectionObserverInit::with_threshold(1.5).validate().is_err());
        assert!(IntersectionObserverInit::with_threshold(0.1).validate().is_ok());
    }
}
