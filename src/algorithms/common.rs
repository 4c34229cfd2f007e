use crate::grid::Cell;

/// Fixed-capacity FIFO of cells backed by a single preallocated buffer.
///
/// Flood fill visits each cell at most once, so a capacity of `width * height`
/// can never be exceeded in correct operation. A push past capacity is logged
/// and the cell dropped.
pub struct CellQueue {
    elements: Vec<Cell>,
    head: usize,
    tail: usize,
    count: usize,
}

impl CellQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        CellQueue {
            elements: vec![Cell::new(0, 0); capacity],
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.elements.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns `false` if the queue was full and `cell` was dropped.
    pub fn push(&mut self, cell: Cell) -> bool {
        if self.count >= self.capacity() {
            tracing::error!("Flood fill queue overflow; dropping ({}, {})", cell.x, cell.y);
            return false;
        }
        self.elements[self.tail] = cell;
        self.tail = (self.tail + 1) % self.capacity();
        self.count += 1;
        true
    }

    pub fn pop(&mut self) -> Option<Cell> {
        if self.is_empty() {
            return None;
        }
        let cell = self.elements[self.head];
        self.head = (self.head + 1) % self.capacity();
        self.count -= 1;
        Some(cell)
    }
}
