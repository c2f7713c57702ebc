use crate::transaction_id::TransactionId;

/// A fixed-size byte container: the unit of I/O, caching and locking.
///
/// `dirty_by` is set by whichever transaction last mutated the page's
/// tuple payload and cleared on flush; `before_image` is a snapshot of the
/// page's bytes as they stood at load time (or immediately after the last
/// flush), kept around for abort-revert and as the hook a future WAL
/// would use to record undo information.
#[derive(Clone)]
pub struct Page {
    data: Vec<u8>,
    dirty_by: Option<TransactionId>,
    before_image: Vec<u8>,
}

impl Page {
    /// A freshly initialized, all-zero page of `page_size` bytes. Used
    /// both for genuinely new pages and for the "read past end of file"
    /// auto-extend case in `PageStore::read_page`.
    pub fn empty(page_size: usize) -> Self {
        let data = vec![0u8; page_size];
        Self {
            before_image: data.clone(),
            data,
            dirty_by: None,
        }
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            before_image: data.clone(),
            data,
            dirty_by: None,
        }
    }

    pub fn page_size(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn dirty_by(&self) -> Option<TransactionId> {
        self.dirty_by
    }

    pub fn mark_dirty(&mut self, txn: TransactionId) {
        self.dirty_by = Some(txn);
    }

    /// Called by `BufferPool::flush_page` after a successful write:
    /// clears the dirty marker and snapshots the flushed bytes as the new
    /// before-image, so a later abort within the *next* transaction can
    /// cleanly revert to this state.
    pub fn mark_flushed(&mut self) {
        self.dirty_by = None;
        self.before_image = self.data.clone();
    }

    /// Revert-by-reload: replace the cached bytes wholesale, typically
    /// with a fresh read from the page store.
    pub fn reload(&mut self, data: Vec<u8>) {
        self.before_image = data.clone();
        self.data = data;
        self.dirty_by = None;
    }

    // --- minimal slotted tuple layout ---
    //
    // A used-slot bitmap header followed by fixed-size tuple slots,
    // addressed by an opaque `tuple_size` rather than a schema.

    pub fn slot_count(&self, tuple_size: usize) -> usize {
        Self::slot_count_for(self.data.len(), tuple_size)
    }

    /// How many `tuple_size`-byte slots fit in a page of `page_size`
    /// bytes once the used-slot bitmap header is accounted for. Exposed
    /// standalone so callers can validate a tuple size against a page
    /// size before any `Page` exists (e.g. at table-creation time).
    pub fn slot_count_for(page_size: usize, tuple_size: usize) -> usize {
        (page_size * 8) / (tuple_size * 8 + 1)
    }

    fn header_len(&self, tuple_size: usize) -> usize {
        (self.slot_count(tuple_size) + 7) / 8
    }

    fn slot_offset(&self, tuple_size: usize, slot: usize) -> usize {
        self.header_len(tuple_size) + slot * tuple_size
    }

    pub fn is_slot_used(&self, tuple_size: usize, slot: usize) -> bool {
        let byte_index = slot / 8;
        let bit_index = slot % 8;
        (self.data[byte_index] & (1 << (7 - bit_index))) != 0
    }

    fn set_slot_used(&mut self, slot: usize, used: bool) {
        let byte_index = slot / 8;
        let bit_index = slot % 8;
        if used {
            self.data[byte_index] |= 1 << (7 - bit_index);
        } else {
            self.data[byte_index] &= !(1 << (7 - bit_index));
        }
    }

    pub fn find_free_slot(&self, tuple_size: usize) -> Option<usize> {
        (0..self.slot_count(tuple_size)).find(|&slot| !self.is_slot_used(tuple_size, slot))
    }

    pub fn read_slot(&self, tuple_size: usize, slot: usize) -> Vec<u8> {
        let start = self.slot_offset(tuple_size, slot);
        self.data[start..start + tuple_size].to_vec()
    }

    pub fn write_slot(&mut self, tuple_size: usize, slot: usize, bytes: &[u8]) {
        assert_eq!(bytes.len(), tuple_size, "tuple payload size mismatch");
        let start = self.slot_offset(tuple_size, slot);
        self.data[start..start + tuple_size].copy_from_slice(bytes);
        self.set_slot_used(slot, true);
    }

    pub fn clear_slot(&mut self, tuple_size: usize, slot: usize) {
        let start = self.slot_offset(tuple_size, slot);
        for b in &mut self.data[start..start + tuple_size] {
            *b = 0;
        }
        self.set_slot_used(slot, false);
    }
}
