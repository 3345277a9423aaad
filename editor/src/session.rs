use image::Rgba;

use slateink_shared::{Note, NotePayload};

use crate::error::EditorError;
use crate::geometry::{screen_to_buffer, Point, Rect};
use crate::glyphs;
use crate::history::History;
use crate::slides::SlideDeck;
use crate::surface::{StrokeStyle, Surface, Theme};
use crate::tools::{EraserMode, PointerMode, ShapeKind, Tool, ToolState};

/// Selections narrower or shorter than this (in buffer units) cannot
/// be sent to the analyze endpoint.
pub const MIN_SELECTION_EDGE: f64 = 10.0;

/// A committed text run. The raster is the source of truth once drawn;
/// this record exists to hit-test for re-edit and reposition.
#[derive(Clone, Debug)]
pub struct TextAnnotation {
    pub position: Point,
    pub content: String,
    pub font_size: f64,
    pub color: Rgba<u8>,
}

impl TextAnnotation {
    pub fn bounding_box(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            glyphs::text_width(&self.content, self.font_size),
            glyphs::text_height(self.font_size),
        )
    }
}

#[derive(Clone, Debug)]
pub struct ShapeAnnotation {
    pub kind: ShapeKind,
    pub start: Point,
    pub end: Point,
    pub color: Rgba<u8>,
    pub width: f64,
}

/// Text being typed or re-edited; nothing is rasterized until commit.
#[derive(Clone, Debug)]
pub struct PendingText {
    pub position: Point,
    pub content: String,
    /// Index into the annotation list when re-editing committed text.
    pub editing: Option<usize>,
}

/// All mutable state of one open note-editing session. One instance
/// per open note; handlers receive it explicitly instead of reaching
/// for globals.
pub struct EditorSession {
    surface: Surface,
    history: History,
    deck: SlideDeck,
    pub tools: ToolState,
    mode: PointerMode,
    selection: Option<Rect>,
    pending_text: Option<PendingText>,
    texts: Vec<TextAnnotation>,
    shapes: Vec<ShapeAnnotation>,
    note_id: Option<String>,
    title: String,
    search_matches: Vec<usize>,
    search_cursor: usize,
}

impl EditorSession {
    pub fn new(width: u32, height: u32, theme: Theme) -> Self {
        let surface = Surface::new(width, height, theme);
        let history = History::new(surface.snapshot());
        Self {
            surface,
            history,
            deck: SlideDeck::new(),
            tools: ToolState::default(),
            mode: PointerMode::Idle,
            selection: None,
            pending_text: None,
            texts: Vec::new(),
            shapes: Vec::new(),
            note_id: None,
            title: "Untitled Note".to_string(),
            search_matches: Vec::new(),
            search_cursor: 0,
        }
    }

    /// Opens an existing note: deck from its slides, first slide loaded
    /// into the surface.
    pub fn from_note(note: &Note, width: u32, height: u32, theme: Theme) -> Result<Self, EditorError> {
        let mut session = Self::new(width, height, theme);
        session.note_id = Some(note.id.clone());
        session.title = note.title.clone();
        session.deck = SlideDeck::from_slides(note.slides.clone());
        session.load_current_slide()?;
        Ok(session)
    }

    // --- accessors ---

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn deck(&self) -> &SlideDeck {
        &self.deck
    }

    pub fn note_id(&self) -> Option<&str> {
        self.note_id.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn selection(&self) -> Option<Rect> {
        self.selection
    }

    pub fn pending_text(&self) -> Option<&PendingText> {
        self.pending_text.as_ref()
    }

    pub fn text_annotations(&self) -> &[TextAnnotation] {
        &self.texts
    }

    pub fn shape_annotations(&self) -> &[ShapeAnnotation] {
        &self.shapes
    }

    /// Maps a pointer position on the displayed element to buffer
    /// coordinates; the backing resolution may differ from the element
    /// size.
    pub fn map_pointer(&self, screen: Point, display_width: f64, display_height: f64) -> Point {
        screen_to_buffer(
            screen,
            display_width,
            display_height,
            self.surface.width(),
            self.surface.height(),
        )
    }

    // --- tool switching ---

    pub fn set_tool(&mut self, tool: Tool) {
        if tool == self.tools.active_tool {
            return;
        }
        if self.tools.active_tool == Tool::Selection {
            self.selection = None;
        }
        if self.tools.active_tool == Tool::Text {
            self.pending_text = None;
        }
        self.surface.cancel_shape_preview();
        self.mode = PointerMode::Idle;
        self.tools.active_tool = tool;
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.surface.set_theme(theme);
    }

    // --- pointer dispatch ---

    pub fn pointer_down(&mut self, point: Point) {
        match self.tools.active_tool {
            Tool::Selection => {
                self.selection = Some(Rect::from_corners(point, point));
                self.mode = PointerMode::Selecting { anchor: point };
            }
            Tool::Text => {
                if let Some(index) = self.hit_text(point) {
                    let annotation = &self.texts[index];
                    self.pending_text = Some(PendingText {
                        position: annotation.position,
                        content: annotation.content.clone(),
                        editing: Some(index),
                    });
                    self.mode = PointerMode::DraggingText { index, grab: point };
                } else {
                    self.pending_text = Some(PendingText {
                        position: point,
                        content: String::new(),
                        editing: None,
                    });
                    self.mode = PointerMode::Idle;
                }
            }
            Tool::Shape => {
                if self.tools.shape_kind == ShapeKind::None {
                    return;
                }
                self.surface.begin_shape_preview();
                self.mode = PointerMode::ShapePreview { anchor: point };
            }
            Tool::Pen => {
                let style = self.pen_style();
                self.surface.begin_stroke(point, style);
                self.mode = PointerMode::Stroking;
            }
            Tool::Eraser => {
                match self.tools.eraser_mode {
                    EraserMode::Stroke => {
                        let style = self.eraser_style();
                        self.surface.begin_stroke(point, style);
                    }
                    EraserMode::Point => {
                        self.surface.erase_point(point, self.tools.eraser_width);
                    }
                }
                self.mode = PointerMode::Erasing;
            }
        }
    }

    /// `modifier` gates text repositioning only; everything else is
    /// decided by the mode opened on pointer-down.
    pub fn pointer_move(&mut self, point: Point, modifier: bool) {
        match self.mode.clone() {
            PointerMode::Idle => {}
            PointerMode::Selecting { anchor } => {
                self.selection = Some(Rect::from_corners(anchor, point));
            }
            PointerMode::Stroking => {
                let style = self.pen_style();
                self.surface.extend_stroke(point, style);
            }
            PointerMode::Erasing => match self.tools.eraser_mode {
                EraserMode::Stroke => {
                    let style = self.eraser_style();
                    self.surface.extend_stroke(point, style);
                }
                EraserMode::Point => {
                    self.surface.erase_point(point, self.tools.eraser_width);
                }
            },
            PointerMode::ShapePreview { anchor } => {
                let style = self.pen_style();
                self.surface
                    .draw_shape_preview(anchor, point, self.tools.shape_kind, style);
            }
            PointerMode::DraggingText { index, grab } => {
                if modifier {
                    let dx = point.x - grab.x;
                    let dy = point.y - grab.y;
                    if let Some(pending) = self.pending_text.as_mut() {
                        pending.position.x += dx;
                        pending.position.y += dy;
                    }
                }
                // Track the pointer even when not dragging, so a later
                // modifier-held move applies only its own delta.
                self.mode = PointerMode::DraggingText { index, grab: point };
            }
        }
    }

    pub fn pointer_up(&mut self, point: Point) {
        match std::mem::replace(&mut self.mode, PointerMode::Idle) {
            PointerMode::Idle => {}
            // The rectangle stays up for the analyze action.
            PointerMode::Selecting { .. } => {}
            PointerMode::Stroking | PointerMode::Erasing => {
                self.surface.end_stroke();
                self.record_edit();
            }
            PointerMode::ShapePreview { anchor } => {
                let style = self.pen_style();
                let kind = self.tools.shape_kind;
                self.surface.commit_shape(anchor, point, kind, style);
                self.shapes.push(ShapeAnnotation {
                    kind,
                    start: anchor,
                    end: point,
                    color: style.color,
                    width: style.width,
                });
                self.record_edit();
            }
            PointerMode::DraggingText { .. } => {}
        }
    }

    // --- text commit ---

    /// Rasterizes the pending text. Re-edits clear the old run's
    /// bounding box first and update the stored annotation in place.
    /// Empty content cancels.
    pub fn commit_text(&mut self, content: &str) {
        let Some(pending) = self.pending_text.take() else {
            return;
        };
        let content = content.trim_end();
        if content.is_empty() {
            return;
        }
        let font_size = self.tools.font_size;
        let color = self.tools.color;
        if let Some(index) = pending.editing {
            let old_box = self.texts[index].bounding_box();
            self.surface.clear_rect(old_box);
            self.texts[index] = TextAnnotation {
                position: pending.position,
                content: content.to_string(),
                font_size,
                color,
            };
        } else {
            self.texts.push(TextAnnotation {
                position: pending.position,
                content: content.to_string(),
                font_size,
                color,
            });
        }
        self.surface
            .place_text(pending.position, content, font_size, color);
        self.record_edit();
    }

    pub fn cancel_text(&mut self) {
        self.pending_text = None;
    }

    fn hit_text(&self, point: Point) -> Option<usize> {
        self.texts
            .iter()
            .enumerate()
            .rev()
            .find(|(_, annotation)| annotation.bounding_box().contains(point))
            .map(|(index, _)| index)
    }

    // --- whole-canvas actions ---

    pub fn clear_canvas(&mut self) {
        self.surface.clear();
        self.selection = None;
        self.pending_text = None;
        self.texts.clear();
        self.shapes.clear();
        // The slide's stored text goes with the pixels.
        self.deck.store_current(String::new(), None);
        self.record_edit();
    }

    pub fn undo(&mut self) {
        if let Some(snapshot) = self.history.undo() {
            self.surface.restore(snapshot);
        }
    }

    pub fn redo(&mut self) {
        if let Some(snapshot) = self.history.redo() {
            self.surface.restore(snapshot);
        }
    }

    // --- selection ---

    pub fn selection_valid(&self) -> bool {
        matches!(
            self.selection,
            Some(rect) if rect.width >= MIN_SELECTION_EDGE && rect.height >= MIN_SELECTION_EDGE
        )
    }

    /// Cleared after a completed analyze query, per the UI flow.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    // --- slides ---

    /// Serializes the live buffer plus searchable text into the
    /// current slide.
    pub fn sync_current_slide(&mut self) -> Result<(), EditorError> {
        let data = self.surface.export_data_url()?;
        // Annotation records don't survive navigation (the raster is
        // the source of truth), so an empty list keeps whatever text
        // the slide already stored instead of erasing it.
        let text = if self.texts.is_empty() {
            self.deck.current().text.clone()
        } else {
            Some(
                self.texts
                    .iter()
                    .map(|annotation| annotation.content.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
            )
        };
        self.deck.store_current(data, text);
        Ok(())
    }

    fn load_current_slide(&mut self) -> Result<(), EditorError> {
        let data = self.deck.current().canvas_data.clone();
        if data.is_empty() {
            self.surface.clear();
        } else {
            self.surface.load_data_url(&data)?;
        }
        self.history.reset(self.surface.snapshot());
        self.texts.clear();
        self.shapes.clear();
        self.selection = None;
        self.pending_text = None;
        self.mode = PointerMode::Idle;
        Ok(())
    }

    pub fn add_slide(&mut self) -> Result<usize, EditorError> {
        self.sync_current_slide()?;
        let index = self.deck.add_slide();
        self.load_current_slide()?;
        Ok(index)
    }

    /// No-op (Ok(false)) when out of range.
    pub fn go_to_slide(&mut self, index: usize) -> Result<bool, EditorError> {
        if index >= self.deck.len() {
            return Ok(false);
        }
        if index == self.deck.current_index() {
            return Ok(true);
        }
        self.sync_current_slide()?;
        self.deck.go_to(index);
        self.load_current_slide()?;
        Ok(true)
    }

    pub fn next_slide(&mut self) -> Result<bool, EditorError> {
        self.go_to_slide(self.deck.current_index() + 1)
    }

    pub fn previous_slide(&mut self) -> Result<bool, EditorError> {
        match self.deck.current_index() {
            0 => Ok(false),
            index => self.go_to_slide(index - 1),
        }
    }

    // --- search ---

    /// Runs a text search over stored slide text and resets the result
    /// cursor. The live slide is synced first so its annotations count.
    pub fn run_search(&mut self, query: &str) -> Result<&[usize], EditorError> {
        self.sync_current_slide()?;
        self.search_matches = self.deck.search_text(query);
        self.search_cursor = 0;
        Ok(&self.search_matches)
    }

    /// Navigates to the next match, cycling modulo the match count.
    pub fn next_match(&mut self) -> Result<Option<usize>, EditorError> {
        if self.search_matches.is_empty() {
            return Ok(None);
        }
        let index = self.search_matches[self.search_cursor % self.search_matches.len()];
        self.search_cursor += 1;
        self.go_to_slide(index)?;
        Ok(Some(index))
    }

    // --- persistence glue ---

    pub fn to_payload(&mut self) -> Result<NotePayload, EditorError> {
        self.sync_current_slide()?;
        Ok(NotePayload {
            title: self.title.clone(),
            slides: self.deck.to_payload_slides(),
        })
    }

    /// Adopts the server's representation after a successful save.
    pub fn apply_saved(&mut self, note: &Note) -> Result<(), EditorError> {
        log::debug!("note {} saved with {} slides", note.id, note.slides.len());
        self.note_id = Some(note.id.clone());
        self.title = note.title.clone();
        self.deck.replace(note.slides.clone());
        self.load_current_slide()
    }

    pub fn export_pdf(&mut self) -> Result<Vec<u8>, EditorError> {
        self.sync_current_slide()?;
        crate::export::slides_to_pdf(
            self.deck.slides(),
            self.surface.width(),
            self.surface.height(),
        )
    }

    // --- internals ---

    fn record_edit(&mut self) {
        self.history.snapshot(self.surface.snapshot());
    }

    fn pen_style(&self) -> StrokeStyle {
        StrokeStyle {
            color: self.tools.color,
            width: self.tools.stroke_width,
        }
    }

    fn eraser_style(&self) -> StrokeStyle {
        StrokeStyle {
            color: self.surface.theme().background(),
            width: self.tools.eraser_width,
        }
    }
}
