//! PDF rendering of the case table.

use std::io::BufWriter;
use std::ops::Range;

use chrono::NaiveDate;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use super::{ExportError, ExportResult};
use crate::models::CaseRecord;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_LEFT_MM: f32 = 15.0;
const TOP_MM: f32 = 280.0;
const ROW_HEIGHT_MM: f32 = 6.0;

/// Table rows on the first page (below the title block).
pub const ROWS_FIRST_PAGE: usize = 40;
/// Table rows on every following page.
pub const ROWS_PER_PAGE: usize = 43;

/// Column titles and x offsets (mm from the left margin).
const COLUMNS: &[(&str, f32)] = &[
    ("Date", 0.0),
    ("Patient ID", 25.0),
    ("Surgery", 60.0),
    ("ASA", 120.0),
    ("Technique", 135.0),
    ("Duration (m)", 165.0),
];

/// Document title for an export made on `date`.
pub fn pdf_title(date: NaiveDate) -> String {
    format!("OT Case Log Export - {}", date.format("%Y-%m-%d"))
}

/// Split `rows` table rows into per-page index ranges. Always at least one page.
pub fn paginate(rows: usize) -> Vec<Range<usize>> {
    let mut pages = vec![0..rows.min(ROWS_FIRST_PAGE)];
    let mut start = pages[0].end;
    while start < rows {
        let end = (start + ROWS_PER_PAGE).min(rows);
        pages.push(start..end);
        start = end;
    }
    pages
}

/// Table cells for one record, in column order. Free text is passed
/// through [`latin1_only`].
pub fn table_row(record: &CaseRecord) -> [String; 6] {
    let d = &record.details;
    [
        d.date.format("%d/%m/%Y").to_string(),
        truncate(&latin1_only(&d.patient_id), 16),
        truncate(&latin1_only(&d.surgery_type), 34),
        d.asa_grade.to_string(),
        truncate(&latin1_only(&d.anesthesia_technique), 16),
        d.duration.to_string(),
    ]
}

/// Render records as an A4 table. Returns PDF bytes.
///
/// Text is set in the builtin Helvetica faces, which only carry the Latin-1
/// repertoire. Characters outside it (Devanagari, CJK, emoji) are printed
/// as `?`; the CSV export keeps them intact.
pub fn render_case_table_pdf(
    records: &[CaseRecord],
    export_date: NaiveDate,
) -> ExportResult<Vec<u8>> {
    let title = pdf_title(export_date);
    let (doc, page1, layer1) =
        PdfDocument::new(&title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Pdf(format!("font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Pdf(format!("font error: {e}")))?;

    let pages = paginate(records.len());
    for (page_no, range) in pages.iter().enumerate() {
        let layer = if page_no == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            doc.get_page(page).get_layer(layer)
        };

        let mut y = TOP_MM;
        if page_no == 0 {
            layer.use_text(&title, 14.0, Mm(MARGIN_LEFT_MM), Mm(y), &bold);
            y -= 7.0;
            layer.use_text(
                format!("Total cases: {}", records.len()),
                9.0,
                Mm(MARGIN_LEFT_MM),
                Mm(y),
                &font,
            );
            y -= 10.0;
        }

        let header: Vec<String> = COLUMNS.iter().map(|(name, _)| name.to_string()).collect();
        draw_row(&layer, &header, y, &bold);
        y -= ROW_HEIGHT_MM;

        for record in &records[range.clone()] {
            draw_row(&layer, &table_row(record), y, &font);
            y -= ROW_HEIGHT_MM;
        }

        if pages.len() > 1 {
            layer.use_text(
                format!("Page {} of {}", page_no + 1, pages.len()),
                8.0,
                Mm(MARGIN_LEFT_MM),
                Mm(10.0),
                &font,
            );
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ExportError::Pdf(format!("save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ExportError::Pdf(format!("buffer error: {e}")))
}

fn draw_row(layer: &PdfLayerReference, cells: &[String], y: f32, font: &IndirectFontRef) {
    for ((_, x), cell) in COLUMNS.iter().zip(cells) {
        layer.use_text(cell.as_str(), 9.0, Mm(MARGIN_LEFT_MM + x), Mm(y), font);
    }
}

/// Replace every character the builtin fonts cannot draw with `?`.
pub fn latin1_only(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ' '..='~' | '\u{a0}'..='\u{ff}' => c,
            _ => '?',
        })
        .collect()
}

/// Shorten to `max` characters, marking the cut with "...".
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
