use image::Rgba;

use crate::geometry::Point;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tool {
    Pen,
    Eraser,
    Selection,
    Text,
    Shape,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EraserMode {
    /// Re-strokes the path with the background color.
    Stroke,
    /// Paints background circles at pointer samples, no interpolation.
    Point,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Line,
    Triangle,
    None,
}

/// Active tool plus its parameters. Process-local, never persisted.
#[derive(Clone, Debug)]
pub struct ToolState {
    pub active_tool: Tool,
    pub color: Rgba<u8>,
    pub stroke_width: f64,
    pub eraser_width: f64,
    pub eraser_mode: EraserMode,
    pub font_size: f64,
    pub font_family: String,
    pub shape_kind: ShapeKind,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            active_tool: Tool::Pen,
            color: Rgba([0, 0, 0, 255]),
            stroke_width: 2.0,
            eraser_width: 10.0,
            eraser_mode: EraserMode::Stroke,
            font_size: 16.0,
            font_family: "Arial".to_string(),
            shape_kind: ShapeKind::None,
        }
    }
}

/// In-flight pointer interaction. Variants are mutually exclusive; the
/// active tool decides which one a pointer-down opens.
#[derive(Clone, Debug, PartialEq)]
pub enum PointerMode {
    Idle,
    Stroking,
    Erasing,
    Selecting { anchor: Point },
    ShapePreview { anchor: Point },
    DraggingText { index: usize, grab: Point },
}
