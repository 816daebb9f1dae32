//! PDF serialisation of laid-out pages.

use printpdf::{
  BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
  Point,
};

use crate::{
  Error, Result,
  layout::{self, DrawOp, FontStyle, PAGE_HEIGHT, PAGE_WIDTH, Page, PrintJob},
};

const LAYER: &str = "intenciones";

fn mm(pt: f32) -> Mm { Mm(pt * 25.4 / 72.0) }

fn pdf_error(e: impl std::fmt::Display) -> Error { Error::Pdf(e.to_string()) }

struct Fonts {
  regular: IndirectFontRef,
  bold:    IndirectFontRef,
  italic:  IndirectFontRef,
}

impl Fonts {
  fn load(doc: &PdfDocumentReference) -> Result<Self> {
    Ok(Self {
      regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
      bold:    doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?,
      italic:  doc.add_builtin_font(BuiltinFont::HelveticaOblique).map_err(pdf_error)?,
    })
  }

  fn get(&self, style: FontStyle) -> &IndirectFontRef {
    match style {
      FontStyle::Regular => &self.regular,
      FontStyle::Bold => &self.bold,
      FontStyle::Italic => &self.italic,
    }
  }
}

/// Render the day's intention sheet for `job` as PDF bytes.
pub fn print_day(job: &PrintJob) -> Result<Vec<u8>> {
  let total = layout::measure(job);
  let pages = layout::render(job, total);

  let title = format!("Intenciones {}", job.date.format("%Y-%m-%d"));
  let (doc, first_page, first_layer) =
    PdfDocument::new(title, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), LAYER);
  let fonts = Fonts::load(&doc)?;

  for page in &pages {
    let layer = if page.number == 1 {
      doc.get_page(first_page).get_layer(first_layer)
    } else {
      let (index, layer) = doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), LAYER);
      doc.get_page(index).get_layer(layer)
    };
    draw(&layer, &fonts, page);
  }

  let bytes = doc.save_to_bytes().map_err(pdf_error)?;
  tracing::info!(date = %job.date, pages = total, bytes = bytes.len(), "day sheet printed");
  Ok(bytes)
}

fn draw(layer: &PdfLayerReference, fonts: &Fonts, page: &Page) {
  for op in &page.ops {
    match op {
      DrawOp::Text { x, y, size, style, text } => {
        layer.use_text(text.as_str(), *size, mm(*x), mm(*y), fonts.get(*style));
      }
      DrawOp::Rule { x1, y1, x2, y2, width } => {
        layer.set_outline_thickness(*width);
        layer.add_line(Line {
          points:    vec![
            (Point::new(mm(*x1), mm(*y1)), false),
            (Point::new(mm(*x2), mm(*y2)), false),
          ],
          is_closed: false,
        });
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use intenciones_core::category::CategoryKind;

  use super::*;
  use crate::test_helpers::{category, mass, row};

  #[test]
  fn produces_a_pdf_document() {
    let m = mass(1, "2025-03-09", "07:00", "PM");
    let c = category(1, "Difuntos", CategoryKind::Difuntos, 1);
    let job = PrintJob {
      date:       NaiveDate::from_ymd_opt(2025, 3, 9).unwrap(),
      rows:       vec![row(1, &m, &c, "Juan, Pedro")],
      masses:     vec![m],
      preface:    Some("Parroquia".into()),
      printed_by: "marta".into(),
      printed_at: NaiveDate::from_ymd_opt(2025, 3, 9).unwrap().and_hms_opt(8, 0, 0).unwrap(),
    };

    let bytes = print_day(&job).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
  }
}
