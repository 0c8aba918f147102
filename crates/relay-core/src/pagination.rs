pub const DEFAULT_PER_PAGE: u32 = 50;

/// Number of pages to walk for `total` matching items.
///
/// Always at least one, and always one more than the integer quotient, so an
/// exact multiple of `per_page` still requests a trailing (empty) page.
pub fn page_count(total: u64, per_page: u32) -> u64 {
    if per_page == 0 {
        return 1;
    }

    (total / u64::from(per_page)).saturating_add(1).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_total_still_fetches_one_page() {
        assert_eq!(page_count(0, DEFAULT_PER_PAGE), 1);
    }

    #[test]
    fn partial_last_page_is_counted() {
        assert_eq!(page_count(120, DEFAULT_PER_PAGE), 3);
        assert_eq!(page_count(49, DEFAULT_PER_PAGE), 1);
        assert_eq!(page_count(51, DEFAULT_PER_PAGE), 2);
    }

    #[test]
    fn exact_multiple_adds_trailing_page() {
        assert_eq!(page_count(50, DEFAULT_PER_PAGE), 2);
        assert_eq!(page_count(100, DEFAULT_PER_PAGE), 3);
    }

    #[test]
    fn matches_floor_plus_one_for_a_range_of_totals() {
        for total in 0..=1_000u64 {
            let expected = (total / 50 + 1).max(1);
            assert_eq!(page_count(total, 50), expected, "total = {total}");
        }
    }

    #[test]
    fn zero_page_size_collapses_to_single_page() {
        assert_eq!(page_count(500, 0), 1);
    }

    #[test]
    fn huge_totals_do_not_overflow() {
        assert_eq!(page_count(u64::MAX, 1), u64::MAX);
    }
}
