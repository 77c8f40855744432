//! Rank type and the rank arithmetic used by the hollow heap.
//!
//! A node's rank bounds the size of the subtree it heads: a node of rank `r`
//! has at least `φ^r` descendants, so ranks stay below `1.44 · log₂(n)`.
//! `u8` comfortably covers any heap that fits in memory and keeps nodes small.
//!
//! Ranks change in exactly two places:
//!
//! - A *ranked link* during delete-min makes one root the child of another
//!   root of equal rank; the winner's rank goes up by one ([`checked_increment`]).
//! - `decrease_key` gives the replacement node two less than the rank of the
//!   node it hollows ([`after_decrease`]).

/// Type alias for node rank.
pub type Rank = u8;

/// Maximum valid rank value.
pub const MAX_RANK: Rank = u8::MAX;

/// Number of rank slots a consolidation table needs before it has to grow.
///
/// Covers the common case without reallocating; deeper tables spill to the heap.
pub const INLINE_SLOTS: usize = 64;

/// Safely increment a rank value, panicking on overflow.
///
/// # Panics
///
/// Panics if `rank == MAX_RANK`, which would require more than 2¹⁷⁰ items.
///
/// # Example
///
/// ```rust
/// use hollow_heap::rank::{checked_increment, Rank};
///
/// let rank: Rank = 5;
/// assert_eq!(checked_increment(rank), 6);
/// ```
#[inline]
pub fn checked_increment(rank: Rank) -> Rank {
    rank.checked_add(1).expect(
        "rank overflow: ranks are bounded by 1.44·log₂(n), \
         so this indicates a corrupted heap",
    )
}

/// Rank of the node created by `decrease_key` to replace a node of rank `rank`.
///
/// The new node starts two ranks lower (never below zero); this keeps the rank
/// of every node logarithmic in its subtree size even though the hollowed node
/// is hung below the replacement.
///
/// ```rust
/// use hollow_heap::rank::after_decrease;
///
/// assert_eq!(after_decrease(5), 3);
/// assert_eq!(after_decrease(1), 0);
/// ```
#[inline]
pub fn after_decrease(rank: Rank) -> Rank {
    rank.saturating_sub(2)
}

/// Initial size of the rank table for a delete-min over `live` items.
///
/// This is `⌈log₂(live)⌉ + 1`; the table grows if a ranked link climbs past it.
#[inline]
pub fn table_size(live: usize) -> usize {
    let ceil_log2 = match live {
        0 | 1 => 0,
        n => (usize::BITS - (n - 1).leading_zeros()) as usize,
    };
    ceil_log2 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_increment() {
        assert_eq!(checked_increment(0), 1);
        assert_eq!(checked_increment(254), 255);
    }

    #[test]
    #[should_panic(expected = "rank overflow")]
    fn test_checked_increment_overflow() {
        checked_increment(MAX_RANK);
    }

    #[test]
    fn test_after_decrease() {
        assert_eq!(after_decrease(0), 0);
        assert_eq!(after_decrease(2), 0);
        assert_eq!(after_decrease(3), 1);
        assert_eq!(after_decrease(10), 8);
    }

    #[test]
    fn test_table_size() {
        assert_eq!(table_size(0), 1);
        assert_eq!(table_size(1), 1);
        assert_eq!(table_size(2), 2);
        assert_eq!(table_size(3), 3);
        assert_eq!(table_size(4), 3);
        assert_eq!(table_size(5), 4);
        assert_eq!(table_size(17), 6);
        assert_eq!(table_size(1 << 20), 21);
    }

    #[test]
    fn test_rank_type_size() {
        assert_eq!(std::mem::size_of::<Rank>(), 1);
    }
}
