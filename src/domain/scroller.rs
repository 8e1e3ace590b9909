//! Page scroller: the bounded list of page links shown under a paged table.

use crate::domain::entities::table::PageScrollEntry;

/// Number of pages needed for `total_items` rows.
pub fn total_pages(total_items: i64, page_size: i64) -> i64 {
    total_items / page_size + i64::from(total_items % page_size != 0)
}

/// Page numbers to expose, `None` marking an ellipsis.
///
/// The window is forced odd so it centres on `current_page`. Inputs are not
/// validated: a window below 5 yields overlapping runs. Arithmetic saturates,
/// so pages far outside `1..=total_pages` never overflow.
///
/// # Panics
///
/// Panics if `page_size` is zero.
pub fn page_numbers(
    max_window: i64,
    total_items: i64,
    page_size: i64,
    current_page: i64,
) -> Vec<Option<i64>> {
    let max_window = if max_window % 2 == 0 {
        max_window + 1
    } else {
        max_window
    };
    let total_pages = total_pages(total_items, page_size);

    if total_pages <= max_window {
        return (1..=total_pages).map(Some).collect();
    }

    let run = max_window.saturating_sub(4);

    // Near the start: leading run, then the last page.
    if current_page < run {
        let mut pages: Vec<_> = (1..=max_window - 2).map(Some).collect();
        pages.push(None);
        pages.push(Some(total_pages));
        return pages;
    }

    // Near the end: first page, then the trailing run.
    if total_pages.saturating_sub(current_page).saturating_add(1) < run {
        let first = total_pages
            .saturating_sub(max_window.saturating_sub(3))
            .saturating_add(1);
        let mut pages = vec![Some(1), None];
        pages.extend((first..=total_pages).map(Some));
        return pages;
    }

    let first = current_page.saturating_sub(run / 2);
    let mut pages = vec![Some(1), None];
    pages.extend((first..first.saturating_add(run)).map(Some));
    pages.push(None);
    pages.push(Some(total_pages));
    pages
}

pub fn scroll(
    max_window: i64,
    total_items: i64,
    page_size: i64,
    current_page: i64,
) -> Vec<PageScrollEntry> {
    page_numbers(max_window, total_items, page_size, current_page)
        .into_iter()
        .map(|page| match page {
            Some(page) => PageScrollEntry::page(page),
            None => PageScrollEntry::ellipsis(),
        })
        .collect()
}
