use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Header carrying the identity resolved by the fronting auth layer.
pub const USER_ID_HEADER: &str = "x-user-id";

/// One raster page of a note. `canvas_data` is an opaque encoded
/// snapshot of the drawing surface (a PNG data URL in practice); an
/// empty string means a blank slide.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub canvas_data: String,
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Slide {
    pub fn blank(order: u32) -> Self {
        Self {
            canvas_data: String::new(),
            order,
            text: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub slides: Vec<Slide>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of note create and update requests.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NotePayload {
    pub title: String,
    pub slides: Vec<Slide>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AnalyzeRequest {
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AnalyzeResponse {
    pub response: String,
}

/// Error payload shared by every non-2xx response.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ErrorBody {
    pub error: String,
}

/// Strips a `data:...;base64,` prefix, returning the bare payload.
/// Text without a prefix is returned unchanged.
pub fn strip_data_url(image: &str) -> &str {
    let trimmed = image.trim();
    if !trimmed.starts_with("data:") {
        return trimmed;
    }
    match trimmed.split_once(',') {
        Some((_, payload)) => payload,
        None => trimmed,
    }
}

/// Re-indexes slides by array position so `order` is unique and
/// contiguous regardless of what the caller accumulated.
pub fn reindex_slides(slides: &mut [Slide]) {
    for (index, slide) in slides.iter_mut().enumerate() {
        slide.order = index as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_data_url_removes_prefix() {
        assert_eq!(strip_data_url("data:image/png;base64,aGVsbG8="), "aGVsbG8=");
        assert_eq!(strip_data_url("aGVsbG8="), "aGVsbG8=");
        assert_eq!(strip_data_url("  raw  "), "raw");
    }

    #[test]
    fn reindex_makes_order_contiguous() {
        let mut slides = vec![Slide::blank(7), Slide::blank(7), Slide::blank(0)];
        reindex_slides(&mut slides);
        let orders: Vec<u32> = slides.iter().map(|slide| slide.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn slide_wire_names_are_camel_case() {
        let slide = Slide {
            canvas_data: "data:image/png;base64,xyz".into(),
            order: 1,
            text: Some("integral".into()),
        };
        let json = serde_json::to_value(&slide).unwrap();
        assert!(json.get("canvasData").is_some());
        assert!(json.get("text").is_some());
    }
}
