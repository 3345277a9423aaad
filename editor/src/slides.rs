use slateink_shared::{reindex_slides, Slide};

/// Ordered collection of slides with a cursor. The deck stores
/// serialized snapshots only; loading a slide's raster into the live
/// surface is the session's job.
pub struct SlideDeck {
    slides: Vec<Slide>,
    current: usize,
}

impl SlideDeck {
    pub fn new() -> Self {
        Self {
            slides: vec![Slide::blank(0)],
            current: 0,
        }
    }

    /// Builds a deck from persisted slides, falling back to a single
    /// blank slide when the note has none.
    pub fn from_slides(slides: Vec<Slide>) -> Self {
        if slides.is_empty() {
            return Self::new();
        }
        Self {
            slides,
            current: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &Slide {
        &self.slides[self.current]
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// Appends a blank slide and navigates to it.
    pub fn add_slide(&mut self) -> usize {
        let order = self.slides.len() as u32;
        self.slides.push(Slide::blank(order));
        self.current = self.slides.len() - 1;
        self.current
    }

    /// Bounds-checked navigation; out-of-range requests are no-ops.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.slides.len() {
            return false;
        }
        self.current = index;
        true
    }

    pub fn next(&mut self) -> bool {
        if self.current + 1 >= self.slides.len() {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn previous(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Writes the serialized buffer and searchable text into the
    /// current slide.
    pub fn store_current(&mut self, canvas_data: String, text: Option<String>) {
        let order = self.current as u32;
        self.slides[self.current] = Slide {
            canvas_data,
            order,
            text,
        };
    }

    /// Replaces the whole collection (server representation is
    /// authoritative after a save), clamping the cursor.
    pub fn replace(&mut self, slides: Vec<Slide>) {
        self.slides = if slides.is_empty() {
            vec![Slide::blank(0)]
        } else {
            slides
        };
        self.current = self.current.min(self.slides.len() - 1);
    }

    /// Snapshot of the collection with contiguous order indexes, ready
    /// to be sent to the store.
    pub fn to_payload_slides(&self) -> Vec<Slide> {
        let mut slides = self.slides.clone();
        reindex_slides(&mut slides);
        slides
    }

    /// Case-insensitive substring match over each slide's stored text,
    /// returned in slide order. Navigation is the caller's move.
    pub fn search_text(&self, query: &str) -> Vec<usize> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.slides
            .iter()
            .enumerate()
            .filter(|(_, slide)| {
                slide
                    .text
                    .as_deref()
                    .map(|text| text.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
            .map(|(index, _)| index)
            .collect()
    }
}

impl Default for SlideDeck {
    fn default() -> Self {
        Self::new()
    }
}
