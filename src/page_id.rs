use std::fmt;

/// Identifies a page uniquely within the database as `(table_id,
/// page_number)`. `table_id` is the stable hash of the table's absolute
/// backing file path (see `Catalog::table_id_for_path`); `page_number` is
/// the page's offset within that file, in units of the configured page
/// size.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub struct PageId {
    pub table_id: i64,
    pub page_number: usize,
}

impl PageId {
    pub fn new(table_id: i64, page_number: usize) -> Self {
        Self {
            table_id,
            page_number,
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "page<{:x}:{}>", self.table_id, self.page_number)
    }
}
