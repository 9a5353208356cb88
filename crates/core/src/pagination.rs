//! Page marker computation for paginated views.

/// One slot in a pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMarker {
    Page(u32),
    Ellipsis,
}

/// Pages shown in full when there are at most this many.
const FULL_RANGE_LIMIT: u32 = 7;

/// Compute the markers to render for `current` out of `total` pages.
///
/// Returns nothing for a single page. Up to seven pages are all listed;
/// beyond that the first and last pages are always shown along with the
/// neighbours of `current`, and gaps collapse to an ellipsis. `current` is
/// clamped into `1..=total`.
///
/// ```
/// use easytrade_core::{PageMarker, page_markers};
///
/// assert_eq!(
///     page_markers(5, 10),
///     vec![
///         PageMarker::Page(1),
///         PageMarker::Ellipsis,
///         PageMarker::Page(4),
///         PageMarker::Page(5),
///         PageMarker::Page(6),
///         PageMarker::Ellipsis,
///         PageMarker::Page(10),
///     ]
/// );
/// ```
#[must_use]
pub fn page_markers(current: u32, total: u32) -> Vec<PageMarker> {
    if total <= 1 {
        return Vec::new();
    }
    if total <= FULL_RANGE_LIMIT {
        return (1..=total).map(PageMarker::Page).collect();
    }

    let current = current.clamp(1, total);
    let mut markers = vec![PageMarker::Page(1)];

    if current > 3 {
        markers.push(PageMarker::Ellipsis);
    }

    let start = current.saturating_sub(1).max(2);
    let end = current.saturating_add(1).min(total - 1);
    markers.extend((start..=end).map(PageMarker::Page));

    if current < total - 2 {
        markers.push(PageMarker::Ellipsis);
    }
    markers.push(PageMarker::Page(total));

    markers.dedup_by(|a, b| *a == PageMarker::Ellipsis && *b == PageMarker::Ellipsis);
    markers
}

/// Pagination state for a rendered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub current: u32,
    pub total: u32,
}

impl Pagination {
    #[must_use]
    pub fn new(current: u32, total: u32) -> Self {
        Self {
            current: current.clamp(1, total.max(1)),
            total,
        }
    }

    #[must_use]
    pub fn markers(&self) -> Vec<PageMarker> {
        page_markers(self.current, self.total)
    }

    /// Whether the "previous" control is enabled.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.current > 1
    }

    /// Whether the "next" control is enabled.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.current < self.total
    }

    #[must_use]
    pub const fn previous(&self) -> u32 {
        self.current.saturating_sub(1)
    }

    #[must_use]
    pub const fn next(&self) -> u32 {
        self.current.saturating_add(1)
    }

    /// Whether the control should render at all.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.total > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageMarker::{Ellipsis, Page};

    fn has_consecutive_ellipses(markers: &[PageMarker]) -> bool {
        markers
            .windows(2)
            .any(|w| w[0] == Ellipsis && w[1] == Ellipsis)
    }

    #[test]
    fn test_single_page_renders_nothing() {
        assert!(page_markers(1, 1).is_empty());
        assert!(page_markers(1, 0).is_empty());
    }

    #[test]
    fn test_small_totals_list_every_page() {
        assert_eq!(
            page_markers(3, 7),
            (1..=7).map(Page).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_first_of_ten() {
        let markers = page_markers(1, 10);
        assert_eq!(markers, vec![Page(1), Page(2), Ellipsis, Page(10)]);
        assert_eq!(markers.iter().filter(|m| **m == Ellipsis).count(), 1);
    }

    #[test]
    fn test_last_of_ten() {
        assert_eq!(
            page_markers(10, 10),
            vec![Page(1), Ellipsis, Page(9), Page(10)]
        );
    }

    #[test]
    fn test_near_edges_skip_ellipsis() {
        assert_eq!(
            page_markers(3, 10),
            vec![Page(1), Page(2), Page(3), Page(4), Ellipsis, Page(10)]
        );
        assert_eq!(
            page_markers(8, 10),
            vec![Page(1), Ellipsis, Page(7), Page(8), Page(9), Page(10)]
        );
    }

    #[test]
    fn test_current_is_clamped() {
        assert_eq!(page_markers(0, 10), page_markers(1, 10));
        assert_eq!(page_markers(99, 10), page_markers(10, 10));
    }

    #[test]
    fn test_never_consecutive_ellipses() {
        for total in 0..30 {
            for current in 0..=total + 1 {
                let markers = page_markers(current, total);
                assert!(!has_consecutive_ellipses(&markers), "{current}/{total}");
                if total > 1 {
                    assert_eq!(markers.first(), Some(&Page(1)));
                    assert_eq!(markers.last(), Some(&Page(total)));
                }
            }
        }
    }

    #[test]
    fn test_controls_disabled_at_bounds() {
        let first = Pagination::new(1, 4);
        assert!(!first.has_previous());
        assert!(first.has_next());

        let last = Pagination::new(4, 4);
        assert!(last.has_previous());
        assert!(!last.has_next());

        assert!(!Pagination::new(1, 1).is_visible());
    }

    #[test]
    fn test_largest_page_count_does_not_overflow() {
        assert_eq!(
            page_markers(u32::MAX, u32::MAX),
            vec![Page(1), Ellipsis, Page(u32::MAX - 1), Page(u32::MAX)]
        );

        let last = Pagination::new(u32::MAX, u32::MAX);
        assert!(!last.has_next());
        assert_eq!(last.next(), u32::MAX);
    }
}
