use once_cell::sync::OnceCell;

/// Default page size in bytes, used until [`set_page_size`] is called.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

static PAGE_SIZE: OnceCell<usize> = OnceCell::new();

/// Sets the process-wide page size.
///
/// Must be called before any [`crate::heap_file::HeapFile`] is opened.
/// Once the page size has been read (or set), further calls are a no-op:
/// the first writer wins and the value is immutable for the rest of the
/// process's life.
pub fn set_page_size(size: usize) {
    if PAGE_SIZE.set(size).is_err() {
        log::warn!(
            "page size already set to {}, ignoring request to set it to {}",
            page_size(),
            size
        );
    }
}

/// Returns the process-wide page size, defaulting to [`DEFAULT_PAGE_SIZE`]
/// if [`set_page_size`] was never called.
pub fn page_size() -> usize {
    *PAGE_SIZE.get_or_init(|| DEFAULT_PAGE_SIZE)
}
