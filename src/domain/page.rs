//! Paging and slicing primitives.
//!
//! A [`Page`] carries its total match count and derives page-count metadata
//! from it. A [`Slice`] skips the count query: the store fetches one row past
//! the requested size and uses the overflow purely as a has-next probe.

use serde::Serialize;

use super::error::DomainError;

/// Sort direction for an ordered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A sort on a single entity field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F> Sort<F> {
    pub fn asc(field: F) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: F) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }
}

/// A request for one page of results: zero-based page index, positive page
/// size and an optional sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest<F> {
    page: u32,
    size: u32,
    sort: Option<Sort<F>>,
}

impl<F> PageRequest<F> {
    /// Create a page request. The size must be at least one.
    pub fn of(page: u32, size: u32) -> Result<Self, DomainError> {
        if size == 0 {
            return Err(DomainError::validation("Page size must be at least 1"));
        }

        Ok(Self {
            page,
            size,
            sort: None,
        })
    }

    /// Attach a sort order to the request
    pub fn sorted_by(mut self, sort: Sort<F>) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sort(&self) -> Option<&Sort<F>> {
        self.sort.as_ref()
    }

    /// Number of rows to skip for this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// One page of results plus the total match count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    content: Vec<T>,
    number: u32,
    size: u32,
    total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, number: u32, size: u32, total_elements: u64) -> Self {
        Self {
            content,
            number,
            size,
            total_elements,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    /// Zero-based index of this page
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    /// Total page count, `ceil(total_elements / size)`
    pub fn total_pages(&self) -> u64 {
        self.total_elements.div_ceil(u64::from(self.size))
    }

    pub fn is_first(&self) -> bool {
        self.number == 0
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.number) + 1 < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    /// Convert the page contents, keeping the paging metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
        }
    }
}

/// One slice of results with a has-next flag but no total count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice<T> {
    content: Vec<T>,
    number: u32,
    size: u32,
    has_next: bool,
}

impl<T> Slice<T> {
    /// Build a slice from rows fetched with a `size + 1` limit. An overflow
    /// row proves a next slice exists and is dropped from the content.
    pub fn from_fetched(mut rows: Vec<T>, number: u32, size: u32) -> Self {
        let has_next = rows.len() > size as usize;
        rows.truncate(size as usize);

        Self {
            content: rows,
            number,
            size,
            has_next,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn is_first(&self) -> bool {
        self.number == 0
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    /// Convert the slice contents, keeping the slicing metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Slice<U> {
        Slice {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            has_next: self.has_next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestField {
        Name,
    }

    #[test]
    fn test_page_request_rejects_zero_size() {
        assert!(PageRequest::<TestField>::of(0, 0).is_err());
        assert!(PageRequest::<TestField>::of(0, 1).is_ok());
    }

    #[test]
    fn test_page_request_offset() {
        let request = PageRequest::<TestField>::of(2, 3).unwrap();
        assert_eq!(request.offset(), 6);
        assert_eq!(request.size(), 3);
    }

    #[test]
    fn test_page_request_sort() {
        let request = PageRequest::of(0, 3)
            .unwrap()
            .sorted_by(Sort::desc(TestField::Name));

        let sort = request.sort().unwrap();
        assert_eq!(sort.field, TestField::Name);
        assert_eq!(sort.direction, SortDirection::Desc);
    }

    #[test]
    fn test_page_metadata_rounds_up() {
        // 7 elements at size 3 -> pages of 3, 3, 1
        let page = Page::new(vec![1, 2, 3], 0, 3, 7);

        assert_eq!(page.total_pages(), 3);
        assert!(page.is_first());
        assert!(page.has_next());
        assert!(!page.has_previous());
        assert!(!page.is_last());
    }

    #[test]
    fn test_page_metadata_last_page() {
        let page = Page::new(vec![7], 2, 3, 7);

        assert!(!page.is_first());
        assert!(!page.has_next());
        assert!(page.is_last());
        assert!(page.has_previous());
    }

    #[test]
    fn test_page_exact_multiple() {
        let page = Page::new(vec![1, 2, 3], 1, 3, 6);

        assert_eq!(page.total_pages(), 2);
        assert!(!page.has_next());
        assert!(page.is_last());
    }

    #[test]
    fn test_empty_page() {
        let page = Page::<i32>::new(Vec::new(), 0, 3, 0);

        assert_eq!(page.total_pages(), 0);
        assert!(page.is_first());
        assert!(!page.has_next());
        assert!(page.is_last());
    }

    #[test]
    fn test_page_map_keeps_metadata() {
        let page = Page::new(vec![1, 2, 3], 0, 3, 7).map(|n| n * 10);

        assert_eq!(page.content(), &[10, 20, 30]);
        assert_eq!(page.total_elements(), 7);
        assert_eq!(page.total_pages(), 3);
    }

    #[test]
    fn test_slice_overflow_row_marks_has_next() {
        // 4 rows fetched for size 3 -> the probe row is dropped
        let slice = Slice::from_fetched(vec![1, 2, 3, 4], 0, 3);

        assert_eq!(slice.content(), &[1, 2, 3]);
        assert!(slice.has_next());
        assert!(slice.is_first());
    }

    #[test]
    fn test_slice_exact_size_has_no_next() {
        let slice = Slice::from_fetched(vec![1, 2, 3], 0, 3);

        assert_eq!(slice.content(), &[1, 2, 3]);
        assert!(!slice.has_next());
    }

    #[test]
    fn test_slice_map() {
        let slice = Slice::from_fetched(vec![1, 2, 3, 4], 1, 3).map(|n| n + 1);

        assert_eq!(slice.content(), &[2, 3, 4]);
        assert!(slice.has_next());
        assert!(!slice.is_first());
    }
}
