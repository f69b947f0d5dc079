//! Shelf packing with space reclamation.
//!
//! The texture is cut into horizontal shelves stacked from the top. Each
//! shelf tracks its free horizontal spans; the area below the last shelf is
//! the unused region new shelves are cut from. Freed rectangles return to
//! their shelf's span list, and a shelf that becomes empty merges with empty
//! neighbours or goes back to the unused region.

/// A rectangle handed out by [`ShelfAllocator::allocate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Allocation {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Allocation {
    pub fn intersects(&self, other: &Allocation) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    x: u32,
    width: u32,
}

#[derive(Debug, Clone)]
struct Shelf {
    y: u32,
    height: u32,
    /// Free spans sorted by `x`, never adjacent
    free: Vec<Span>,
    allocated: usize,
}

impl Shelf {
    fn new(y: u32, height: u32, width: u32) -> Self {
        Self {
            y,
            height,
            free: vec![Span { x: 0, width }],
            allocated: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.allocated == 0
    }

    /// Smallest free span that holds `width`.
    fn best_span(&self, width: u32) -> Option<usize> {
        self.free
            .iter()
            .enumerate()
            .filter(|(_, span)| span.width >= width)
            .min_by_key(|(_, span)| span.width)
            .map(|(i, _)| i)
    }

    fn take(&mut self, span_idx: usize, width: u32) -> u32 {
        let span = &mut self.free[span_idx];
        let x = span.x;
        span.x += width;
        span.width -= width;
        if span.width == 0 {
            self.free.remove(span_idx);
        }
        self.allocated += 1;
        x
    }

    fn give_back(&mut self, x: u32, width: u32) {
        let pos = self.free.partition_point(|span| span.x < x);
        self.free.insert(pos, Span { x, width });

        // Coalesce with the following span, then the preceding one
        if pos + 1 < self.free.len()
            && self.free[pos].x + self.free[pos].width == self.free[pos + 1].x
        {
            self.free[pos].width += self.free[pos + 1].width;
            self.free.remove(pos + 1);
        }
        if pos > 0 && self.free[pos - 1].x + self.free[pos - 1].width == self.free[pos].x {
            self.free[pos - 1].width += self.free[pos].width;
            self.free.remove(pos);
        }
        self.allocated -= 1;
    }
}

/// Shelf allocator over a `width x height` texture.
#[derive(Debug, Clone)]
pub struct ShelfAllocator {
    width: u32,
    height: u32,
    /// Sorted by `y`, contiguous from 0 to `unused_top`
    shelves: Vec<Shelf>,
    unused_top: u32,
}

impl ShelfAllocator {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            shelves: Vec::new(),
            unused_top: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn shelf_count(&self) -> usize {
        self.shelves.len()
    }

    /// Top of the region no shelf has claimed yet.
    pub fn unused_top(&self) -> u32 {
        self.unused_top
    }

    pub fn clear(&mut self) {
        self.shelves.clear();
        self.unused_top = 0;
    }

    /// Find room for a `width x height` rectangle.
    ///
    /// Order of preference: a snug occupied shelf, an empty shelf (split to
    /// size), a new shelf from the unused region, any taller occupied shelf.
    pub fn allocate(&mut self, width: u32, height: u32) -> Option<Allocation> {
        if width == 0 || height == 0 || width > self.width || height > self.height {
            return None;
        }

        // Shelves up to 1.5x the request count as snug
        let snug_limit = height + height / 2;
        if let Some(idx) = self.best_occupied_shelf(width, height, snug_limit) {
            return Some(self.place(idx, width, height));
        }

        if let Some(idx) = self.best_empty_shelf(height) {
            self.split_shelf(idx, height);
            return Some(self.place(idx, width, height));
        }

        if self.unused_top + height <= self.height {
            let idx = self.shelves.len();
            self.shelves.push(Shelf::new(self.unused_top, height, self.width));
            self.unused_top += height;
            return Some(self.place(idx, width, height));
        }

        let idx = self.best_occupied_shelf(width, height, u32::MAX)?;
        Some(self.place(idx, width, height))
    }

    /// Return a rectangle from [`allocate`](Self::allocate).
    pub fn deallocate(&mut self, alloc: Allocation) {
        let Ok(idx) = self.shelves.binary_search_by_key(&alloc.y, |shelf| shelf.y) else {
            log::warn!("Deallocating rectangle on unknown shelf y={}", alloc.y);
            return;
        };
        self.shelves[idx].give_back(alloc.x, alloc.width);
        if self.shelves[idx].is_empty() {
            self.reclaim_shelf(idx);
        }
    }

    fn best_occupied_shelf(&self, width: u32, height: u32, max_height: u32) -> Option<usize> {
        self.shelves
            .iter()
            .enumerate()
            .filter(|(_, shelf)| {
                !shelf.is_empty()
                    && shelf.height >= height
                    && shelf.height <= max_height
                    && shelf.best_span(width).is_some()
            })
            .min_by_key(|(_, shelf)| shelf.height - height)
            .map(|(i, _)| i)
    }

    fn best_empty_shelf(&self, height: u32) -> Option<usize> {
        self.shelves
            .iter()
            .enumerate()
            .filter(|(_, shelf)| shelf.is_empty() && shelf.height >= height)
            .min_by_key(|(_, shelf)| shelf.height)
            .map(|(i, _)| i)
    }

    fn place(&mut self, idx: usize, width: u32, height: u32) -> Allocation {
        let shelf = &mut self.shelves[idx];
        let span_idx = shelf.best_span(width).unwrap_or_default();
        let x = shelf.take(span_idx, width);
        Allocation {
            x,
            y: shelf.y,
            width,
            height,
        }
    }

    /// Cut an empty shelf down to `height`, leaving the rest as an empty shelf.
    fn split_shelf(&mut self, idx: usize, height: u32) {
        let shelf = &mut self.shelves[idx];
        if shelf.height == height {
            return;
        }
        let rest = Shelf::new(shelf.y + height, shelf.height - height, self.width);
        shelf.height = height;
        self.shelves.insert(idx + 1, rest);
    }

    /// Merge an emptied shelf with empty neighbours, then hand trailing empty
    /// shelves back to the unused region.
    fn reclaim_shelf(&mut self, idx: usize) {
        if idx + 1 < self.shelves.len() && self.shelves[idx + 1].is_empty() {
            let next = self.shelves.remove(idx + 1);
            self.shelves[idx].height += next.height;
        }
        if idx > 0 && self.shelves[idx - 1].is_empty() {
            let current = self.shelves.remove(idx);
            self.shelves[idx - 1].height += current.height;
        }

        while self.shelves.last().is_some_and(Shelf::is_empty) {
            if let Some(last) = self.shelves.pop() {
                self.unused_top = last.y;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_shelves_stack_downwards() {
        let mut packer = ShelfAllocator::new(64, 64);
        let a = packer.allocate(40, 10).unwrap();
        let b = packer.allocate(40, 10).unwrap();
        assert_eq!((a.x, a.y), (0, 0));
        assert_eq!((b.x, b.y), (0, 10));
        assert_eq!(packer.unused_top(), 20);
    }

    #[test]
    fn test_snug_shelf_is_reused() {
        let mut packer = ShelfAllocator::new(64, 64);
        packer.allocate(10, 12).unwrap();
        let b = packer.allocate(10, 10).unwrap();
        assert_eq!((b.x, b.y), (10, 0), "10px glyph fits the 12px shelf");
        assert_eq!(packer.shelf_count(), 1);
    }

    #[test]
    fn test_freed_span_is_reused() {
        let mut packer = ShelfAllocator::new(30, 10);
        let a = packer.allocate(10, 10).unwrap();
        let _b = packer.allocate(10, 10).unwrap();
        let _c = packer.allocate(10, 10).unwrap();
        assert!(packer.allocate(10, 10).is_none());

        packer.deallocate(a);
        assert_eq!(packer.allocate(10, 10), Some(a));
    }

    #[test]
    fn test_empty_trailing_shelves_return_to_unused_region() {
        let mut packer = ShelfAllocator::new(32, 32);
        let a = packer.allocate(8, 8).unwrap();
        let b = packer.allocate(8, 16).unwrap();
        packer.deallocate(b);
        assert_eq!(packer.unused_top(), 8);
        packer.deallocate(a);
        assert_eq!(packer.unused_top(), 0);
        assert_eq!(packer.shelf_count(), 0);
    }

    #[test]
    fn test_empty_neighbours_merge_and_split() {
        let mut packer = ShelfAllocator::new(16, 40);
        let a = packer.allocate(16, 10).unwrap();
        let b = packer.allocate(16, 10).unwrap();
        let keep = packer.allocate(16, 20).unwrap();
        packer.deallocate(a);
        packer.deallocate(b);

        // The two emptied 10px shelves merged into one 20px shelf at the top
        let tall = packer.allocate(16, 18).unwrap();
        assert_eq!(tall.y, 0);
        assert!(!tall.intersects(&keep));
    }

    #[test]
    fn test_oversized_requests_fail() {
        let mut packer = ShelfAllocator::new(16, 16);
        assert!(packer.allocate(17, 1).is_none());
        assert!(packer.allocate(1, 17).is_none());
        assert!(packer.allocate(0, 4).is_none());
    }
}
