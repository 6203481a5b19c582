/// One page of an ordered sequence. `page_number` is 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages
    }

    /// "Page x of y", never "of 0".
    pub fn caption(&self) -> String {
        format!("Page {} of {}", self.page_number, self.total_pages.max(1))
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            total_pages: self.total_pages,
        }
    }
}

pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// Clamp a requested page into `[1, max(total_pages, 1)]`.
pub fn clamp_page(page_number: usize, total_pages: usize) -> usize {
    page_number.clamp(1, total_pages.max(1))
}

/// Pages past the end (or page 0) yield no items; callers clamp first.
pub fn paginate<T>(items: Vec<T>, page_number: usize, page_size: usize) -> Page<T> {
    let total_pages = total_pages(items.len(), page_size);
    let items = match page_number.checked_sub(1) {
        Some(index) if page_size > 0 => items
            .into_iter()
            .skip(index.saturating_mul(page_size))
            .take(page_size)
            .collect(),
        _ => Vec::new(),
    };

    Page {
        items,
        page_number,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn third_page_of_twenty_three() {
        let page = paginate((1..=23).collect(), 3, 5);
        assert_eq!(page.items, vec![11, 12, 13, 14, 15]);
        assert_eq!(page.total_pages, 5);
        assert!(page.has_previous());
        assert!(page.has_next());
    }

    #[test]
    fn last_page_is_partial() {
        let page = paginate((1..=23).collect(), 5, 5);
        assert_eq!(page.items, vec![21, 22, 23]);
        assert!(!page.has_next());
    }

    #[test]
    fn empty_input_has_no_pages() {
        let page = paginate(Vec::<u32>::new(), 1, 5);
        assert!(page.is_empty());
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.caption(), "Page 1 of 1");
        assert!(!page.has_previous());
        assert!(!page.has_next());
    }

    #[test]
    fn out_of_range_pages_are_empty() {
        assert!(paginate(vec![1, 2, 3], 4, 1).is_empty());
        assert!(paginate(vec![1, 2, 3], 0, 1).is_empty());
        assert!(paginate(vec![1, 2, 3], usize::MAX, 2).is_empty());
        assert_eq!(paginate(vec![1, 2, 3], 1, 0).total_pages, 0);
    }

    #[test]
    fn clamping() {
        assert_eq!(clamp_page(0, 5), 1);
        assert_eq!(clamp_page(9, 5), 5);
        assert_eq!(clamp_page(3, 0), 1);
        assert_eq!(clamp_page(3, 5), 3);
    }
}
