//! # Page Break Decisions
//!
//! Every block placed on a page declares whether it may be split. The
//! cursor checks the block against the remaining space before anything is
//! drawn, so content flows into pages instead of being cut afterwards.

use tracing::debug;

use super::PAGE_HEIGHT;

/// Space kept free at the bottom of every page.
pub const BOTTOM_MARGIN: f64 = 20.0;

/// Lowest cursor position content may reach.
pub const CONTENT_BOTTOM: f64 = PAGE_HEIGHT - BOTTOM_MARGIN;

/// Cursor position on a continuation page, just below the abbreviated
/// header.
pub const RESET_Y: f64 = 40.0;

/// Whether a block may be partially rendered across a page boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPolicy {
    /// Moved whole to the next page when it does not fit. A block taller
    /// than a fresh page is split anyway.
    Atomic,
    /// Broken between its items (table rows, text lines, signers).
    Splittable,
}

/// Decide what to do when a block doesn't fit on the current page.
#[derive(Debug, Clone, PartialEq)]
pub enum BreakDecision {
    /// Place the entire block on the current page (it fits).
    Place,
    /// Move the entire block to the next page.
    MoveToNextPage,
    /// Split the block: place some items here, continue on the next page.
    Split {
        /// How many items fit on the current page.
        items_on_current_page: usize,
    },
}

/// Given the remaining space on a page and a list of item heights,
/// decide how to break.
///
/// `fresh_page_height` is the room a continuation page offers; an atomic
/// block that would not fit there either is treated as splittable.
/// `min_orphan_items` keeps a heading together with its first rows.
pub fn decide_break(
    remaining_height: f64,
    item_heights: &[f64],
    policy: BlockPolicy,
    fresh_page_height: f64,
    min_orphan_items: usize,
) -> BreakDecision {
    let total: f64 = item_heights.iter().sum();

    if total <= remaining_height {
        return BreakDecision::Place;
    }

    if policy == BlockPolicy::Atomic && total <= fresh_page_height {
        return BreakDecision::MoveToNextPage;
    }

    let fit_count = items_fitting(remaining_height, item_heights);

    // Orphan control: a heading alone at the bottom of a page.
    if fit_count < min_orphan_items && fit_count < item_heights.len() {
        return BreakDecision::MoveToNextPage;
    }

    if fit_count == 0 {
        return BreakDecision::MoveToNextPage;
    }

    BreakDecision::Split {
        items_on_current_page: fit_count,
    }
}

fn items_fitting(remaining_height: f64, item_heights: &[f64]) -> usize {
    let mut running = 0.0;
    let mut fit_count = 0;
    for &h in item_heights {
        if running + h > remaining_height {
            break;
        }
        running += h;
        fit_count += 1;
    }
    fit_count
}

/// The vertical cursor of the page being filled.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFlow {
    y: f64,
    /// Nothing but page furniture has been placed since the last break.
    fresh: bool,
    page_index: usize,
}

impl PageFlow {
    pub fn new(start_y: f64) -> Self {
        Self {
            y: start_y,
            fresh: false,
            page_index: 0,
        }
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Move the cursor down past placed content.
    pub fn advance(&mut self, dy: f64) {
        self.y += dy;
        self.fresh = false;
    }

    /// Move the cursor down past repeated furniture (a table header on a
    /// continuation page). The page still counts as fresh.
    pub fn skip(&mut self, dy: f64) {
        self.y += dy;
    }

    pub fn remaining(&self) -> f64 {
        (CONTENT_BOTTOM - self.y).max(0.0)
    }

    pub fn fits(&self, height: f64) -> bool {
        self.y + height <= CONTENT_BOTTOM
    }

    /// Room on a continuation page.
    pub fn fresh_page_height() -> f64 {
        CONTENT_BOTTOM - RESET_Y
    }

    /// Reset the cursor for a new page.
    pub fn break_page(&mut self) {
        self.page_index += 1;
        debug!(page = self.page_index + 1, from_y = self.y, "page break");
        self.y = RESET_Y;
        self.fresh = true;
    }

    /// Decide how to place a block at the cursor.
    ///
    /// A fresh page cannot get any emptier, so a move there becomes a
    /// placement of at least one item.
    pub fn plan(
        &self,
        item_heights: &[f64],
        policy: BlockPolicy,
        min_orphan_items: usize,
    ) -> BreakDecision {
        let decision = decide_break(
            self.remaining(),
            item_heights,
            policy,
            Self::fresh_page_height(),
            min_orphan_items,
        );
        if decision != BreakDecision::MoveToNextPage || !self.fresh {
            return decision;
        }
        let forced = items_fitting(self.remaining(), item_heights)
            .max(min_orphan_items)
            .max(1);
        if forced >= item_heights.len() {
            BreakDecision::Place
        } else {
            BreakDecision::Split {
                items_on_current_page: forced,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRESH: f64 = CONTENT_BOTTOM - RESET_Y;

    #[test]
    fn test_everything_fits() {
        let decision = decide_break(100.0, &[20.0, 30.0, 40.0], BlockPolicy::Splittable, FRESH, 1);
        assert_eq!(decision, BreakDecision::Place);
    }

    #[test]
    fn test_atomic_moves() {
        let decision = decide_break(50.0, &[20.0, 30.0, 40.0], BlockPolicy::Atomic, FRESH, 1);
        assert_eq!(decision, BreakDecision::MoveToNextPage);
    }

    #[test]
    fn test_split_at_right_point() {
        let decision = decide_break(55.0, &[20.0, 30.0, 40.0], BlockPolicy::Splittable, FRESH, 1);
        assert_eq!(
            decision,
            BreakDecision::Split {
                items_on_current_page: 2,
            }
        );
    }

    #[test]
    fn test_oversized_atomic_block_degrades_to_split() {
        let lines = vec![5.0; 60];
        let decision = decide_break(100.0, &lines, BlockPolicy::Atomic, FRESH, 1);
        assert_eq!(
            decision,
            BreakDecision::Split {
                items_on_current_page: 20,
            }
        );
    }

    #[test]
    fn test_orphan_control() {
        // Only the heading would fit; it moves with its first row.
        let decision = decide_break(20.0, &[18.0, 8.0, 8.0], BlockPolicy::Splittable, FRESH, 2);
        assert_eq!(decision, BreakDecision::MoveToNextPage);
    }

    #[test]
    fn test_nothing_fits() {
        let decision = decide_break(4.0, &[8.0, 8.0], BlockPolicy::Splittable, FRESH, 1);
        assert_eq!(decision, BreakDecision::MoveToNextPage);
    }

    #[test]
    fn test_flow_breaks_to_reset_offset() {
        let mut flow = PageFlow::new(270.0);
        assert!(!flow.fits(8.0));
        assert!(flow.fits(7.0));
        flow.break_page();
        assert_eq!(flow.y(), RESET_Y);
        assert_eq!(flow.page_index(), 1);
        assert!(flow.is_fresh());
        flow.skip(8.0);
        assert!(flow.is_fresh());
        flow.advance(8.0);
        assert!(!flow.is_fresh());
    }

    #[test]
    fn test_fresh_page_never_moves_again() {
        let mut flow = PageFlow::new(100.0);
        flow.break_page();
        // A single item taller than the page is placed rather than bounced.
        assert_eq!(
            flow.plan(&[400.0], BlockPolicy::Atomic, 1),
            BreakDecision::Place
        );
        assert_eq!(
            flow.plan(&[400.0, 10.0], BlockPolicy::Splittable, 1),
            BreakDecision::Split {
                items_on_current_page: 1,
            }
        );
    }
}
