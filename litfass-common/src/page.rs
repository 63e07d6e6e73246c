use serde::{Deserialize, Deserializer, Serialize};

/// Every paginated listing in the core uses this fixed page size.
pub const PAGE_SIZE: u32 = 10;

/// 1-based page number. Zero is clamped to 1 rather than rejected so that a
/// sloppy client sees the first page instead of an error.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct PageNumber(u32);

impl PageNumber {
    pub const FIRST: Self = Self(1);

    #[must_use]
    pub fn new(page: u32) -> Self {
        Self(page.max(1))
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn is_first(self) -> bool {
        self.0 == 1
    }

    /// Offset of the first item on this page.
    #[must_use]
    pub fn offset(self) -> u64 {
        u64::from(self.0 - 1) * u64::from(PAGE_SIZE)
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

impl<'de> Deserialize<'de> for PageNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = u32::deserialize(deserializer)?;
        Ok(PageNumber::new(inner))
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Pagination {
    #[must_use]
    pub fn new(page: PageNumber, total_items: u64) -> Self {
        let total_pages = total_items
            .div_ceil(u64::from(PAGE_SIZE))
            .try_into()
            .unwrap_or(u32::MAX);

        Self {
            current_page: page.get(),
            total_pages,
            page_size: PAGE_SIZE,
            total_items,
            has_next: page.get() < total_pages,
            has_previous: page.get() > 1,
        }
    }
}

/// Slices one page out of a fully materialized sequence. Pages past the end
/// come back empty, never as an error.
#[must_use]
pub fn page_slice<T>(items: Vec<T>, page: PageNumber) -> (Vec<T>, Pagination) {
    let total_items = items.len() as u64;
    let pagination = Pagination::new(page, total_items);

    let start = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let sliced = items
        .into_iter()
        .skip(start)
        .take(PAGE_SIZE as usize)
        .collect();

    (sliced, pagination)
}

#[cfg(test)]
mod tests {
    use crate::page::{PAGE_SIZE, PageNumber, Pagination, page_slice};

    #[test]
    fn zero_page_is_clamped() {
        assert_eq!(PageNumber::new(0), PageNumber::FIRST);
        assert_eq!(PageNumber::new(1), PageNumber::FIRST);
        assert_eq!(PageNumber::new(7).get(), 7);
        assert_eq!(PageNumber::default(), PageNumber::FIRST);
    }

    #[test]
    fn twenty_three_items_make_three_pages() {
        let items: Vec<u32> = (0..23).collect();

        let (page_one, info) = page_slice(items.clone(), PageNumber::new(1));
        assert_eq!(page_one.len(), PAGE_SIZE as usize);
        assert_eq!(
            info,
            Pagination {
                current_page: 1,
                total_pages: 3,
                page_size: PAGE_SIZE,
                total_items: 23,
                has_next: true,
                has_previous: false,
            }
        );

        let (page_three, info) = page_slice(items.clone(), PageNumber::new(3));
        assert_eq!(page_three, [20, 21, 22]);
        assert!(!info.has_next);
        assert!(info.has_previous);

        let (page_four, info) = page_slice(items, PageNumber::new(4));
        assert!(page_four.is_empty());
        assert!(!info.has_next);
    }

    #[test]
    fn empty_sequence_has_no_pages() {
        let (page, info) = page_slice(Vec::<u32>::new(), PageNumber::FIRST);

        assert!(page.is_empty());
        assert_eq!(info.total_pages, 0);
        assert!(!info.has_next);
        assert!(!info.has_previous);
    }

    #[test]
    fn offsets_step_by_page_size() {
        assert_eq!(PageNumber::new(1).offset(), 0);
        assert_eq!(PageNumber::new(2).offset(), u64::from(PAGE_SIZE));
        assert_eq!(PageNumber::new(5).offset(), u64::from(4 * PAGE_SIZE));
    }
}
