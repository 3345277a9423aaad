use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{ImageFormat, RgbImage};

use slateink_shared::{strip_data_url, Slide};

use crate::error::EditorError;

/// Renders every slide to a PDF page, one image per page at the
/// slide's pixel dimensions. Slides are decoded up front, so a page is
/// never emitted before its raster is ready; blank slides become
/// background-only pages at the canvas size.
pub fn slides_to_pdf(slides: &[Slide], width: u32, height: u32) -> Result<Vec<u8>, EditorError> {
    let mut pages = Vec::with_capacity(slides.len().max(1));
    for slide in slides {
        pages.push(decode_slide(slide, width, height)?);
    }
    if pages.is_empty() {
        pages.push(RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255])));
    }
    write_pdf(&pages)
}

fn decode_slide(slide: &Slide, width: u32, height: u32) -> Result<RgbImage, EditorError> {
    if slide.canvas_data.is_empty() {
        return Ok(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([255, 255, 255]),
        ));
    }
    let bytes = BASE64
        .decode(strip_data_url(&slide.canvas_data))
        .map_err(|error| EditorError::InvalidSlideData(error.to_string()))?;
    Ok(image::load_from_memory(&bytes)?.to_rgb8())
}

/// Hand-assembled single-pass PDF: catalog, page tree, then one page
/// object, content stream and JPEG XObject per slide, followed by the
/// xref table. JPEG streams embed directly under /DCTDecode.
fn write_pdf(pages: &[RgbImage]) -> Result<Vec<u8>, EditorError> {
    let mut out: Vec<u8> = Vec::new();
    let object_count = 2 + pages.len() * 3;
    let mut offsets: Vec<usize> = Vec::with_capacity(object_count);

    out.extend_from_slice(b"%PDF-1.4\n");

    offsets.push(out.len());
    out.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

    let kids: Vec<String> = (0..pages.len())
        .map(|index| format!("{} 0 R", 3 + index * 3))
        .collect();
    offsets.push(out.len());
    out.extend_from_slice(
        format!(
            "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
            kids.join(" "),
            pages.len()
        )
        .as_bytes(),
    );

    for (index, page) in pages.iter().enumerate() {
        let page_id = 3 + index * 3;
        let content_id = page_id + 1;
        let image_id = page_id + 2;
        let width = page.width();
        let height = page.height();

        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "{page_id} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {width} {height}] \
                 /Contents {content_id} 0 R /Resources << /XObject << /Im0 {image_id} 0 R >> >> >>\nendobj\n"
            )
            .as_bytes(),
        );

        let content = format!("q\n{width} 0 0 {height} 0 0 cm\n/Im0 Do\nQ\n");
        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "{content_id} 0 obj\n<< /Length {} >>\nstream\n{content}endstream\nendobj\n",
                content.len()
            )
            .as_bytes(),
        );

        let jpeg = encode_jpeg(page)?;
        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "{image_id} 0 obj\n<< /Type /XObject /Subtype /Image /Width {width} /Height {height} \
                 /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
                jpeg.len()
            )
            .as_bytes(),
        );
        out.extend_from_slice(&jpeg);
        out.extend_from_slice(b"\nendstream\nendobj\n");
    }

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", object_count + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_start}\n%%EOF\n",
            object_count + 1
        )
        .as_bytes(),
    );
    Ok(out)
}

fn encode_jpeg(page: &RgbImage) -> Result<Vec<u8>, EditorError> {
    let mut bytes = Vec::new();
    page.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
        haystack
            .windows(needle.len())
            .filter(|window| *window == needle)
            .count()
    }

    #[test]
    fn every_slide_becomes_a_page() {
        let slides = vec![Slide::blank(0), Slide::blank(1), Slide::blank(2)];
        let pdf = slides_to_pdf(&slides, 64, 48).unwrap();
        assert!(pdf.starts_with(b"%PDF-1.4"));
        assert!(pdf.ends_with(b"%%EOF\n"));
        assert_eq!(count_occurrences(&pdf, b"/Type /Page /"), 3);
        assert_eq!(count_occurrences(&pdf, b"/Filter /DCTDecode"), 3);
    }

    #[test]
    fn empty_deck_still_produces_one_page() {
        let pdf = slides_to_pdf(&[], 64, 48).unwrap();
        assert_eq!(count_occurrences(&pdf, b"/Type /Page /"), 1);
    }

    #[test]
    fn garbage_slide_data_is_rejected() {
        let slide = Slide {
            canvas_data: "data:image/png;base64,!!!".into(),
            order: 0,
            text: None,
        };
        let result = slides_to_pdf(&[slide], 64, 48);
        assert!(matches!(result, Err(EditorError::InvalidSlideData(_))));
    }
}
