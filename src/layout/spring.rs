//! Proportional distribution of free height among spring children.
//!
//! Fixed children consume their own size first. Springs with an explicit
//! ratio receive `ratio × remaining`; zero-ratio springs split whatever share
//! the explicit ratios leave unclaimed equally between them.

/// One child of a vertical-flow container, as seen by distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlowItem {
    /// A child without a fill ratio, with its current height.
    Fixed(f64),
    /// A child with a fill ratio (zero allowed).
    Spring(f64),
}

/// Target height for every spring, `None` for fixed children. While the
/// explicit ratios sum to at most 1, the targets add up to no more than
/// `max(0, available - fixed)`.
pub fn distribute(available: f64, items: &[FlowItem]) -> Vec<Option<f64>> {
    let mut sum_fixed = 0.0;
    let mut sum_ratio = 0.0;
    let mut zero_count = 0usize;
    for item in items {
        match *item {
            FlowItem::Fixed(size) => sum_fixed += size,
            FlowItem::Spring(ratio) if ratio > 0.0 => sum_ratio += ratio,
            FlowItem::Spring(_) => zero_count += 1,
        }
    }

    let remaining = (available - sum_fixed).max(0.0);
    let zero_share = if zero_count > 0 {
        (1.0 - sum_ratio).max(0.0) / zero_count as f64
    } else {
        0.0
    };

    log::debug!(
        "springs: remaining {:.3}mm, ratio sum {:.3}, {} zero-ratio (share {:.3})",
        remaining,
        sum_ratio,
        zero_count,
        zero_share
    );

    items
        .iter()
        .map(|item| match *item {
            FlowItem::Fixed(_) => None,
            FlowItem::Spring(ratio) if ratio > 0.0 => Some(ratio * remaining),
            FlowItem::Spring(_) => Some(zero_share * remaining),
        })
        .collect()
}
