// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Idle-size propagation: a measurement relay over nested wrapper levels.
//!
//! ## Overview
//!
//! The root of a draggable does not know the natural (idle) size of its
//! content: decorator wrappers (a return-animation wrapper, a scaling
//! wrapper) may sit between the root and the measured content and change
//! layout behavior. Each wrapper measures its own box and relays it toward
//! the root, and when wrappers nest, the deepest wrapper's measurement must
//! win — the ones above it merely forward.
//!
//! [`SizeChain`] models the protocol as an explicit reducer over an
//! attach-ordered stack of levels instead of per-wrapper mutable proxy flags:
//!
//! - [`attach`](SizeChain::attach) pushes a new deepest level (a wrapper
//!   mounting under the current deepest one);
//! - [`report`](SizeChain::report) records a level's own measurement;
//! - the reduced value, [`current`](SizeChain::current), is the measurement
//!   of the deepest level that has reported at least once;
//! - [`detach`](SizeChain::detach) removes a level; if it was authoritative,
//!   the next level up re-exposes its own last-known measurement.
//!
//! "Proxy mode" is therefore a derived property — a level is a proxy while a
//! deeper level has reported — and the relay does not depend on any
//! setup/teardown execution-order guarantee beyond the natural one: nested
//! wrappers attach outermost-first and detach deepest-first.
//!
//! At most one chain per draggable is supported. Sibling wrappers that are
//! not in an ancestor/descendant relationship are a caller error with
//! undefined (though memory-safe) results.
//!
//! Reporting `None` is meaningful: the level has no usable measurement, and
//! if it is authoritative the reduced value becomes unknown rather than
//! falling back to a shallower level.

use kurbo::Size;
use smallvec::SmallVec;

/// Identifier of a level in a [`SizeChain`].
///
/// Ids are never reused within one chain.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SizeLevelId(u64);

#[derive(Copy, Clone, Debug)]
struct Level {
    id: SizeLevelId,
    has_reported: bool,
    last: Option<Size>,
}

/// Measurement relay for one draggable's wrapper chain.
///
/// The draggable's root terminates the chain: it reads
/// [`current`](SizeChain::current) as the ghost size.
#[derive(Clone, Debug, Default)]
pub struct SizeChain {
    /// Root-to-deepest, in attach order.
    levels: SmallVec<[Level; 4]>,
    next_id: u64,
}

impl SizeChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new deepest level and return its id.
    pub fn attach(&mut self) -> SizeLevelId {
        let id = SizeLevelId(self.next_id);
        self.next_id += 1;
        self.levels.push(Level {
            id,
            has_reported: false,
            last: None,
        });
        id
    }

    /// Record a level's own measurement.
    ///
    /// Returns false if `id` does not refer to an attached level; the report
    /// is then dropped, matching the stale-handle tolerance of the other
    /// registries.
    pub fn report(&mut self, id: SizeLevelId, size: Option<Size>) -> bool {
        let Some(level) = self.levels.iter_mut().find(|l| l.id == id) else {
            return false;
        };
        level.has_reported = true;
        level.last = size;
        true
    }

    /// Remove a level (wrapper teardown). Returns false if `id` is stale.
    ///
    /// Detaching the deepest level is the supported teardown order; detaching
    /// a middle level is handled gracefully (the reduction simply no longer
    /// considers it).
    pub fn detach(&mut self, id: SizeLevelId) -> bool {
        let Some(pos) = self.levels.iter().position(|l| l.id == id) else {
            return false;
        };
        self.levels.remove(pos);
        true
    }

    /// The reduced measurement: the deepest level that has reported.
    ///
    /// `None` either because no level has reported yet or because the
    /// authoritative level reported an absent measurement.
    pub fn current(&self) -> Option<Size> {
        self.levels
            .iter()
            .rev()
            .find(|l| l.has_reported)
            .and_then(|l| l.last)
    }

    /// Derived proxy flag: whether a level deeper than `id` has reported.
    ///
    /// A proxy level's own reports are recorded but do not reach the root.
    /// Stale ids are reported as not proxies.
    pub fn is_proxy(&self, id: SizeLevelId) -> bool {
        let Some(pos) = self.levels.iter().position(|l| l.id == id) else {
            return false;
        };
        self.levels[pos + 1..].iter().any(|l| l.has_reported)
    }

    /// Number of attached levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether no level is attached.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(w: f64, h: f64) -> Size {
        Size::new(w, h)
    }

    #[test]
    fn single_level_reports_reach_the_root() {
        let mut chain = SizeChain::new();
        let a = chain.attach();
        assert_eq!(chain.current(), None);
        chain.report(a, Some(size(30.0, 20.0)));
        assert_eq!(chain.current(), Some(size(30.0, 20.0)));
    }

    #[test]
    fn deepest_reporter_wins_in_a_three_level_chain() {
        let mut chain = SizeChain::new();
        let a = chain.attach();
        let b = chain.attach();
        let c = chain.attach();

        chain.report(a, Some(size(100.0, 100.0)));
        chain.report(b, Some(size(50.0, 50.0)));
        chain.report(c, Some(size(10.0, 10.0)));
        assert_eq!(chain.current(), Some(size(10.0, 10.0)));

        // A shallower re-measure while deeper levels own the truth is
        // recorded but does not reach the root.
        chain.report(a, Some(size(999.0, 999.0)));
        assert_eq!(chain.current(), Some(size(10.0, 10.0)));
    }

    #[test]
    fn detaching_the_deepest_restores_the_next_level_up() {
        let mut chain = SizeChain::new();
        let b = chain.attach();
        let c = chain.attach();
        chain.report(b, Some(size(50.0, 50.0)));
        chain.report(c, Some(size(10.0, 10.0)));

        chain.detach(c);
        assert_eq!(chain.current(), Some(size(50.0, 50.0)));
    }

    #[test]
    fn unreported_deep_level_does_not_mask_a_shallower_report() {
        let mut chain = SizeChain::new();
        let a = chain.attach();
        let b = chain.attach();
        chain.report(a, Some(size(40.0, 40.0)));
        // b attached but has never measured: a's report stands.
        assert_eq!(chain.current(), Some(size(40.0, 40.0)));
        assert!(!chain.is_proxy(a));

        chain.report(b, Some(size(5.0, 5.0)));
        assert!(chain.is_proxy(a));
        assert_eq!(chain.current(), Some(size(5.0, 5.0)));
    }

    #[test]
    fn authoritative_absent_report_clears_the_value() {
        let mut chain = SizeChain::new();
        let a = chain.attach();
        let b = chain.attach();
        chain.report(a, Some(size(40.0, 40.0)));
        chain.report(b, None);
        // b owns the truth and has no usable measurement.
        assert_eq!(chain.current(), None);
    }

    #[test]
    fn detaching_after_absent_report_falls_back() {
        let mut chain = SizeChain::new();
        let a = chain.attach();
        let b = chain.attach();
        chain.report(a, Some(size(40.0, 40.0)));
        chain.report(b, None);
        chain.detach(b);
        assert_eq!(chain.current(), Some(size(40.0, 40.0)));
    }

    #[test]
    fn stale_ids_are_rejected() {
        let mut chain = SizeChain::new();
        let a = chain.attach();
        chain.detach(a);
        assert!(!chain.report(a, Some(size(1.0, 1.0))));
        assert!(!chain.detach(a));
        assert!(!chain.is_proxy(a));
        assert_eq!(chain.current(), None);
    }

    #[test]
    fn middle_detach_is_tolerated() {
        let mut chain = SizeChain::new();
        let a = chain.attach();
        let b = chain.attach();
        let c = chain.attach();
        chain.report(a, Some(size(1.0, 1.0)));
        chain.report(b, Some(size(2.0, 2.0)));
        chain.report(c, Some(size(3.0, 3.0)));

        chain.detach(b);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.current(), Some(size(3.0, 3.0)));
    }
}
