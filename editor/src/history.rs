use image::RgbaImage;

/// Linear undo history of full-buffer snapshots, scoped to one slide.
/// Simplicity over memory: each entry is a complete raster copy, not a
/// diff. New edits after an undo truncate everything past the pointer.
pub struct History {
    entries: Vec<RgbaImage>,
    index: usize,
}

impl History {
    pub fn new(initial: RgbaImage) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops everything and starts over with a single entry. Used when
    /// switching slides; there is no cross-slide undo.
    pub fn reset(&mut self, initial: RgbaImage) {
        self.entries.clear();
        self.entries.push(initial);
        self.index = 0;
    }

    /// Records the buffer state after a completed edit, discarding any
    /// redoable entries first.
    pub fn snapshot(&mut self, state: RgbaImage) {
        self.entries.truncate(self.index + 1);
        self.entries.push(state);
        self.index = self.entries.len() - 1;
    }

    /// Steps back one entry, or no-op at the boundary.
    pub fn undo(&mut self) -> Option<&RgbaImage> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(&self.entries[self.index])
    }

    pub fn redo(&mut self) -> Option<&RgbaImage> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(&self.entries[self.index])
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(tag: u8) -> RgbaImage {
        RgbaImage::from_pixel(2, 2, image::Rgba([tag, tag, tag, 255]))
    }

    #[test]
    fn n_edits_give_n_plus_one_entries() {
        let mut history = History::new(frame(0));
        for tag in 1..=5 {
            history.snapshot(frame(tag));
        }
        assert_eq!(history.len(), 6);
    }

    #[test]
    fn undo_is_noop_at_boundary() {
        let mut history = History::new(frame(0));
        assert!(history.undo().is_none());
        history.snapshot(frame(1));
        assert_eq!(history.undo().unwrap().get_pixel(0, 0)[0], 0);
        assert!(history.undo().is_none());
    }

    #[test]
    fn new_edit_after_undo_truncates_future() {
        let mut history = History::new(frame(0));
        history.snapshot(frame(1));
        history.snapshot(frame(2));
        history.undo();
        history.undo();
        history.snapshot(frame(9));
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert_eq!(history.undo().unwrap().get_pixel(0, 0)[0], 0);
        assert_eq!(history.redo().unwrap().get_pixel(0, 0)[0], 9);
    }

    #[test]
    fn reset_leaves_single_entry() {
        let mut history = History::new(frame(0));
        history.snapshot(frame(1));
        history.snapshot(frame(2));
        history.reset(frame(7));
        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
