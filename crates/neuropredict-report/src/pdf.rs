//! Single-document PDF report: header, assessment timestamp, risk status,
//! disclaimer, and the patient data as entered.

use chrono::{DateTime, Local};
use neuropredict_core::{PredictionResult, ReadableInput, format};
use printpdf::{BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rgb};
use thiserror::Error;
use tracing::info;

pub const REPORT_FILENAME: &str = "neuropredict_report.pdf";

const TITLE: &str = "NeuroPredict AI - Risk Assessment Report";
const DISCLAIMER: &str = "Disclaimer: This tool is for educational and screening purposes only. \
                          It does not constitute medical advice.";

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 20.0;
const ROW_H: f32 = 8.0;
const COL_W: f32 = (PAGE_W - 2.0 * MARGIN) / 2.0;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("pdf error: {0}")]
    Pdf(#[from] printpdf::Error),
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

/// `"Elevated Risk Detected (72.4%)"`.
fn status_line(result: &PredictionResult) -> String {
    let payload = format(result);
    format!("{} ({})", payload.title, payload.probability_text)
}

/// Lay out `n` data cells two per row, returning `(column, row)` per cell.
fn grid(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n).map(|i| (i % 2, i / 2))
}

/// Render a report stamped with the current local time.
pub fn render_report(
    input: &ReadableInput,
    result: &PredictionResult,
) -> Result<Vec<u8>, ReportError> {
    render_report_at(input, result, Local::now())
}

pub fn render_report_at(
    input: &ReadableInput,
    result: &PredictionResult,
    assessed_at: DateTime<Local>,
) -> Result<Vec<u8>, ReportError> {
    let (doc, page, layer) = PdfDocument::new(TITLE, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
        italic: doc.add_builtin_font(BuiltinFont::HelveticaOblique)?,
    };

    let mut layer = doc.get_page(page).get_layer(layer);
    let mut pages = 1;
    page_header(&layer, &fonts, pages);

    let mut y = PAGE_H - MARGIN - 20.0;

    layer.set_fill_color(rgb(0, 0, 0));
    layer.use_text(
        format!("Assessment Date: {}", assessed_at.format("%Y-%m-%d %H:%M")),
        12.0,
        Mm(MARGIN),
        Mm(y),
        &fonts.bold,
    );
    y -= 14.0;

    let status_color = if result.positive {
        rgb(239, 68, 68)
    } else {
        rgb(16, 185, 129)
    };
    layer.set_fill_color(status_color);
    layer.use_text(status_line(result), 14.0, Mm(MARGIN), Mm(y), &fonts.bold);
    y -= 10.0;

    layer.set_fill_color(rgb(100, 100, 100));
    layer.use_text(DISCLAIMER, 8.0, Mm(MARGIN), Mm(y), &fonts.italic);
    y -= 16.0;

    layer.set_fill_color(rgb(0, 0, 0));
    layer.use_text("Patient Data Input:", 12.0, Mm(MARGIN), Mm(y), &fonts.bold);
    y -= 10.0;

    let mut top = y;
    let mut row_offset = 0;
    for ((col, row), field) in grid(input.len()).zip(input.iter()) {
        let mut cell_y = top - (row - row_offset) as f32 * ROW_H;
        if cell_y < MARGIN + 10.0 {
            let (next_page, next_layer) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            layer = doc.get_page(next_page).get_layer(next_layer);
            pages += 1;
            page_header(&layer, &fonts, pages);
            top = PAGE_H - MARGIN - 20.0;
            row_offset = row;
            cell_y = top;
        }
        layer.set_fill_color(rgb(0, 0, 0));
        layer.use_text(
            format!("{}: {}", field.label, field.value),
            10.0,
            Mm(MARGIN + col as f32 * COL_W),
            Mm(cell_y),
            &fonts.regular,
        );
    }

    let bytes = doc.save_to_bytes()?;
    info!(fields = input.len(), pages, bytes = bytes.len(), "rendered report");
    Ok(bytes)
}

fn page_header(layer: &PdfLayerReference, fonts: &Fonts, page_no: usize) {
    layer.set_fill_color(rgb(99, 102, 241));
    layer.use_text(TITLE, 15.0, Mm(MARGIN + 25.0), Mm(PAGE_H - MARGIN), &fonts.bold);

    layer.set_fill_color(rgb(128, 128, 128));
    layer.use_text(
        format!("Page {page_no}"),
        8.0,
        Mm(PAGE_W / 2.0 - 5.0),
        Mm(10.0),
        &fonts.italic,
    );
}
