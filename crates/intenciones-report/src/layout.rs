//! Page layout for the daily intention sheet.
//!
//! Everything here is measured in PDF points on a US-Letter page, origin at
//! the bottom-left corner. Text width is estimated from a fixed average glyph
//! advance, so the same [`PrintJob`] always produces the same pages.
//!
//! Content is flattened into indivisible units (a heading, one grid row, one
//! table row, a paragraph) which the paginator places top to bottom. Headings
//! are chained to the unit that follows them and never end a page on their
//! own. [`measure`] and [`render`] share that pass, so the page count printed
//! in every footer matches the pages actually drawn.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use intenciones_core::{
  category::{Category, CategoryKind},
  intention::IntentionRow,
  mass::Mass,
};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;

const MARGIN_X: f32 = 50.0;
const FRAME_INSET: f32 = 24.0;
const HEADER_BASELINE: f32 = 742.0;
const HEADER_RULE_Y: f32 = 732.0;
const CONTENT_TOP: f32 = 718.0;
const CONTENT_BOTTOM: f32 = 80.0;
const FOOTER_BASELINE: f32 = 40.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN_X;
const INDENT: f32 = 20.0;
const CELL_PAD: f32 = 8.0;

/// Average Helvetica advance as a fraction of the font size.
const GLYPH_EM: f32 = 0.5;
const LEADING: f32 = 1.3;

const HEADER_SIZE: f32 = 16.0;
const MASS_SIZE: f32 = 13.0;
const GROUP_SIZE: f32 = 11.0;
const BODY_SIZE: f32 = 11.0;
const NOTE_SIZE: f32 = 10.0;
const FOOTER_SIZE: f32 = 9.0;

const MASS_GAP: f32 = 16.0;
const GROUP_GAP: f32 = 8.0;
const ROW_GAP: f32 = 3.0;

// ─── Public types ────────────────────────────────────────────────────────────

/// Everything needed to print one day.
#[derive(Debug, Clone)]
pub struct PrintJob {
  pub date:       NaiveDate,
  pub masses:     Vec<Mass>,
  /// Intentions for `masses`; rows for other Masses are ignored.
  pub rows:       Vec<IntentionRow>,
  /// Printed once, under the header of the first page.
  pub preface:    Option<String>,
  pub printed_by: String,
  pub printed_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
  Regular,
  Bold,
  Italic,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
  /// `y` is the text baseline.
  Text { x: f32, y: f32, size: f32, style: FontStyle, text: String },
  Rule { x1: f32, y1: f32, x2: f32, y2: f32, width: f32 },
}

impl DrawOp {
  /// Convert a unit-relative op (y measured downward from the unit top) to
  /// page coordinates.
  fn placed(&self, top: f32) -> DrawOp {
    match self {
      DrawOp::Text { x, y, size, style, text } => {
        DrawOp::Text { x: *x, y: top - y, size: *size, style: *style, text: text.clone() }
      }
      DrawOp::Rule { x1, y1, x2, y2, width } => {
        DrawOp::Rule { x1: *x1, y1: top - y1, x2: *x2, y2: top - y2, width: *width }
      }
    }
  }
}

#[derive(Debug, Clone)]
pub struct Page {
  /// 1-based.
  pub number: usize,
  pub ops:    Vec<DrawOp>,
}

// ─── Passes ──────────────────────────────────────────────────────────────────

/// Number of pages `job` needs.
pub fn measure(job: &PrintJob) -> usize { paginate(&build_units(job)).len() }

/// Lay out `job`, numbering footers out of `total` pages.
pub fn render(job: &PrintJob, total: usize) -> Vec<Page> {
  let units = build_units(job);
  paginate(&units)
    .into_iter()
    .enumerate()
    .map(|(i, placed)| {
      let number = i + 1;
      let mut ops = page_chrome(job, number, total);
      for (idx, top) in placed {
        ops.extend(units[idx].ops.iter().map(|op| op.placed(top)));
      }
      Page { number, ops }
    })
    .collect()
}

// ─── Units ───────────────────────────────────────────────────────────────────

/// An indivisible block. Its ops use y offsets measured down from its top.
#[derive(Debug)]
struct Unit {
  /// Space above the unit, dropped at the top of a page.
  gap:            f32,
  height:         f32,
  keep_with_next: bool,
  ops:            Vec<DrawOp>,
}

impl Unit {
  /// Side-by-side cells of wrapped lines sharing one baseline grid.
  fn row(gap: f32, size: f32, style: FontStyle, cells: Vec<(f32, Vec<String>)>) -> Self {
    let lead = size * LEADING;
    let tallest = cells.iter().map(|(_, lines)| lines.len()).max().unwrap_or(0);
    let ops = cells
      .into_iter()
      .flat_map(|(x, lines)| {
        lines.into_iter().enumerate().map(move |(n, text)| DrawOp::Text {
          x,
          y: (n as f32 + 1.0) * lead - size * 0.3,
          size,
          style,
          text,
        })
      })
      .collect();
    Unit { gap, height: tallest as f32 * lead, keep_with_next: false, ops }
  }

  fn lines(gap: f32, x: f32, size: f32, style: FontStyle, lines: Vec<String>) -> Self {
    Self::row(gap, size, style, vec![(x, lines)])
  }

  fn line(gap: f32, x: f32, size: f32, style: FontStyle, text: impl Into<String>) -> Self {
    Self::lines(gap, x, size, style, vec![text.into()])
  }

  fn keep(mut self) -> Self {
    self.keep_with_next = true;
    self
  }

  fn underlined(mut self, x1: f32, x2: f32) -> Self {
    let y = self.height;
    self.ops.push(DrawOp::Rule { x1, y1: y, x2, y2: y, width: 0.5 });
    self
  }
}

fn build_units(job: &PrintJob) -> Vec<Unit> {
  let mut units = Vec::new();

  if let Some(preface) = job.preface.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
    for line in wrap(preface, CONTENT_WIDTH, NOTE_SIZE) {
      units.push(Unit::line(0.0, MARGIN_X, NOTE_SIZE, FontStyle::Italic, line));
    }
  }

  let mut masses: Vec<&Mass> = job.masses.iter().collect();
  masses.sort_by_key(|m| (m.chronological_key(), m.id));

  if masses.is_empty() {
    units.push(Unit::line(
      MASS_GAP,
      MARGIN_X,
      BODY_SIZE,
      FontStyle::Regular,
      "No hay misas registradas para este día.",
    ));
  }

  for mass in masses {
    units.push(
      Unit::line(MASS_GAP, MARGIN_X, MASS_SIZE, FontStyle::Bold, format!("MISA {}", mass.time_label()))
        .keep(),
    );

    let groups = group_by_category(job.rows.iter().filter(|r| r.intention.mass_id == mass.id));
    if groups.is_empty() {
      units.push(Unit::line(
        ROW_GAP,
        MARGIN_X + INDENT,
        BODY_SIZE,
        FontStyle::Regular,
        "No hay intenciones.",
      ));
      continue;
    }
    for (category, rows) in groups {
      push_group(&mut units, category, &rows);
    }
  }

  units
}

/// Groups ordered by (display order, name, id); rows by creation time.
fn group_by_category<'a>(
  rows: impl Iterator<Item = &'a IntentionRow>,
) -> Vec<(&'a Category, Vec<&'a IntentionRow>)> {
  let mut groups: BTreeMap<(i64, &str, i64), (&Category, Vec<&IntentionRow>)> = BTreeMap::new();
  for row in rows {
    let c = &row.category;
    groups
      .entry((c.display_order, c.name.as_str(), c.id))
      .or_insert_with(|| (c, Vec::new()))
      .1
      .push(row);
  }
  groups
    .into_values()
    .map(|(category, mut rows)| {
      rows.sort_by_key(|r| (r.intention.created_at, r.intention.id));
      (category, rows)
    })
    .collect()
}

fn push_group(units: &mut Vec<Unit>, category: &Category, rows: &[&IntentionRow]) {
  units.push(
    Unit::line(GROUP_GAP, MARGIN_X + INDENT / 2.0, GROUP_SIZE, FontStyle::Bold, category.name.clone())
      .keep(),
  );
  // Only the first note line rides with the heading and only the last with
  // the content, so a long note still breaks across pages.
  let notes = wrap(&category.extra_text, CONTENT_WIDTH - INDENT, NOTE_SIZE);
  let last = notes.len().saturating_sub(1);
  for (n, line) in notes.into_iter().enumerate() {
    let unit = Unit::line(0.0, MARGIN_X + INDENT, NOTE_SIZE, FontStyle::Italic, line);
    units.push(if n == 0 || n == last { unit.keep() } else { unit });
  }

  match category.kind {
    CategoryKind::Difuntos => name_grid(units, rows, 3),
    CategoryKind::Salud => name_grid(units, rows, 2),
    CategoryKind::AccionDeGracias => thanksgiving_table(units, rows),
    CategoryKind::Varios | CategoryKind::General => prose(units, rows),
  }
}

/// Individual names listed in the petitions. A row that lists none still
/// gets one cell with its whole wording.
fn names(rows: &[&IntentionRow]) -> Vec<String> {
  rows
    .iter()
    .flat_map(|r| {
      let listed: Vec<String> = r
        .intention
        .petitions
        .split([',', ';', '\n'])
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_owned)
        .collect();
      if listed.is_empty() {
        let whole = format!("{} {}", r.base_phrase.trim(), r.intention.petitions.trim());
        vec![whole.trim().to_owned()]
      } else {
        listed
      }
    })
    .collect()
}

fn name_grid(units: &mut Vec<Unit>, rows: &[&IntentionRow], columns: usize) {
  let left = MARGIN_X + INDENT;
  let cell = (CONTENT_WIDTH - INDENT) / columns as f32;
  let names = names(rows);

  for chunk in names.chunks(columns) {
    let cells = chunk
      .iter()
      .enumerate()
      .map(|(col, name)| (left + col as f32 * cell, wrap(name, cell - CELL_PAD, BODY_SIZE)))
      .collect();
    units.push(Unit::row(ROW_GAP, BODY_SIZE, FontStyle::Regular, cells));
  }
}

fn thanksgiving_table(units: &mut Vec<Unit>, rows: &[&IntentionRow]) {
  let left = MARGIN_X + INDENT;
  let width = CONTENT_WIDTH - INDENT;
  let split = width * 0.65;

  units.push(
    Unit::row(ROW_GAP, BODY_SIZE, FontStyle::Bold, vec![
      (left, vec!["Intención".to_owned()]),
      (left + split, vec!["Ofrece".to_owned()]),
    ])
    .underlined(left, left + width)
    .keep(),
  );

  for row in rows {
    let intention = format!("{} {}", row.base_phrase.trim(), row.intention.petitions.trim());
    units.push(Unit::row(ROW_GAP, BODY_SIZE, FontStyle::Regular, vec![
      (left, wrap(&intention, split - CELL_PAD, BODY_SIZE)),
      (left + split, wrap(&row.intention.offered_by, width - split, BODY_SIZE)),
    ]));
  }
}

fn prose(units: &mut Vec<Unit>, rows: &[&IntentionRow]) {
  let left = MARGIN_X + INDENT;
  let per_unit = max_lines(BODY_SIZE);

  for row in rows {
    let text = format!(
      "{} {}. Ofrece: {}.",
      row.base_phrase.trim(),
      row.intention.petitions.trim().trim_end_matches('.'),
      row.intention.offered_by.trim().trim_end_matches('.'),
    );
    let lines = wrap(&text, CONTENT_WIDTH - INDENT, BODY_SIZE);
    for (n, chunk) in lines.chunks(per_unit).enumerate() {
      let gap = if n == 0 { ROW_GAP } else { 0.0 };
      units.push(Unit::lines(gap, left, BODY_SIZE, FontStyle::Regular, chunk.to_vec()));
    }
  }
}

/// Lines of `size` text that fit in an empty content band.
fn max_lines(size: f32) -> usize {
  (((CONTENT_TOP - CONTENT_BOTTOM) / (size * LEADING)).floor() as usize).max(1)
}

// ─── Pagination ──────────────────────────────────────────────────────────────

/// For each page, the units on it and the y of each unit's top edge.
fn paginate(units: &[Unit]) -> Vec<Vec<(usize, f32)>> {
  let mut pages = Vec::new();
  let mut current: Vec<(usize, f32)> = Vec::new();
  let mut cursor = CONTENT_TOP;
  let mut start = 0;

  while start < units.len() {
    let mut end = start;
    while units[end].keep_with_next && end + 1 < units.len() {
      end += 1;
    }

    let fresh = current.is_empty();
    let needed: f32 = units[start..=end]
      .iter()
      .enumerate()
      .map(|(k, u)| if k == 0 && fresh { u.height } else { u.gap + u.height })
      .sum();

    // An oversized chain still goes on a fresh page rather than looping.
    if !fresh && cursor - needed < CONTENT_BOTTOM {
      pages.push(std::mem::take(&mut current));
      cursor = CONTENT_TOP;
    }

    for (idx, unit) in units.iter().enumerate().take(end + 1).skip(start) {
      if !current.is_empty() {
        cursor -= unit.gap;
      }
      current.push((idx, cursor));
      cursor -= unit.height;
    }
    start = end + 1;
  }

  pages.push(current);
  pages
}

// ─── Page chrome ─────────────────────────────────────────────────────────────

fn rule(x1: f32, y1: f32, x2: f32, y2: f32, width: f32) -> DrawOp {
  DrawOp::Rule { x1, y1, x2, y2, width }
}

/// Frame, running header and footer for page `number` of `total`.
fn page_chrome(job: &PrintJob, number: usize, total: usize) -> Vec<DrawOp> {
  let (left, right) = (FRAME_INSET, PAGE_WIDTH - FRAME_INSET);
  let (bottom, top) = (FRAME_INSET, PAGE_HEIGHT - FRAME_INSET);
  let page_label = format!("Página {number} de {total}");

  vec![
    rule(left, bottom, right, bottom, 0.8),
    rule(right, bottom, right, top, 0.8),
    rule(right, top, left, top, 0.8),
    rule(left, top, left, bottom, 0.8),
    DrawOp::Text {
      x:     MARGIN_X,
      y:     HEADER_BASELINE,
      size:  HEADER_SIZE,
      style: FontStyle::Bold,
      text:  format!("INTENCIONES — {}", job.date.format("%Y-%m-%d")),
    },
    rule(MARGIN_X, HEADER_RULE_Y, PAGE_WIDTH - MARGIN_X, HEADER_RULE_Y, 0.5),
    DrawOp::Text {
      x:     MARGIN_X,
      y:     FOOTER_BASELINE,
      size:  FOOTER_SIZE,
      style: FontStyle::Regular,
      text:  format!(
        "Impreso por {} el {}",
        job.printed_by,
        job.printed_at.format("%Y-%m-%d %H:%M")
      ),
    },
    DrawOp::Text {
      x:     PAGE_WIDTH - MARGIN_X - text_width(&page_label, FOOTER_SIZE),
      y:     FOOTER_BASELINE,
      size:  FOOTER_SIZE,
      style: FontStyle::Regular,
      text:  page_label,
    },
  ]
}

// ─── Text metrics ────────────────────────────────────────────────────────────

fn text_width(text: &str, size: f32) -> f32 { text.chars().count() as f32 * size * GLYPH_EM }

/// Greedy word wrap to `width` points. Words longer than a line are split;
/// line breaks in `text` are kept.
pub(crate) fn wrap(text: &str, width: f32, size: f32) -> Vec<String> {
  let max = ((width / (size * GLYPH_EM)).floor() as usize).max(1);
  let mut lines = Vec::new();

  for paragraph in text.lines() {
    let mut line = String::new();
    let mut len = 0;
    for word in paragraph.split_whitespace() {
      let chars: Vec<char> = word.chars().collect();
      for piece in chars.chunks(max) {
        if len > 0 && len + 1 + piece.len() > max {
          lines.push(std::mem::take(&mut line));
          len = 0;
        }
        if len > 0 {
          line.push(' ');
          len += 1;
        }
        line.extend(piece);
        len += piece.len();
      }
    }
    if !line.is_empty() {
      lines.push(line);
    }
  }

  lines
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_helpers::{category, mass, row};

  fn job(masses: Vec<Mass>, rows: Vec<IntentionRow>) -> PrintJob {
    PrintJob {
      date: NaiveDate::from_ymd_opt(2025, 3, 9).unwrap(),
      masses,
      rows,
      preface: None,
      printed_by: "marta".into(),
      printed_at: NaiveDate::from_ymd_opt(2025, 3, 8).unwrap().and_hms_opt(17, 30, 0).unwrap(),
    }
  }

  fn texts(page: &Page) -> Vec<&str> {
    page
      .ops
      .iter()
      .filter_map(|op| match op {
        DrawOp::Text { text, .. } => Some(text.as_str()),
        DrawOp::Rule { .. } => None,
      })
      .collect()
  }

  fn find<'a>(pages: &'a [Page], needle: &str) -> Vec<&'a DrawOp> {
    pages
      .iter()
      .flat_map(|p| p.ops.iter())
      .filter(|op| matches!(op, DrawOp::Text { text, .. } if text == needle))
      .collect()
  }

  fn baseline(op: &DrawOp) -> f32 {
    match op {
      DrawOp::Text { y, .. } => *y,
      DrawOp::Rule { y1, .. } => *y1,
    }
  }

  #[test]
  fn wrap_breaks_on_words() {
    // 10pt at half-em glyphs: 20 characters per 100pt.
    let lines = wrap("Por el eterno descanso de Juan Rojas", 100.0, 10.0);
    assert_eq!(lines, ["Por el eterno", "descanso de Juan", "Rojas"]);
    assert!(lines.iter().all(|l| l.chars().count() <= 20));
  }

  #[test]
  fn wrap_splits_overlong_words_and_keeps_newlines() {
    let lines = wrap("abcdefghijklmnopqrstuvwxy\nfin", 100.0, 10.0);
    assert_eq!(lines, ["abcdefghijklmnopqrst", "uvwxy", "fin"]);
  }

  #[test]
  fn measure_matches_render_across_pages() {
    let m = mass(1, "2025-03-09", "07:00", "AM");
    let c = category(1, "Intenciones varias", CategoryKind::Varios, 1);
    let rows = (1..=120).map(|i| row(i, &m, &c, &format!("Petición número {i}"))).collect();
    let job = job(vec![m], rows);

    let total = measure(&job);
    assert!(total >= 2, "expected several pages, got {total}");
    let pages = render(&job, total);
    assert_eq!(pages.len(), total);

    for page in &pages {
      let t = texts(page);
      assert!(t.contains(&"INTENCIONES — 2025-03-09"));
      assert!(t.contains(&format!("Página {} de {total}", page.number).as_str()));
      assert!(t.contains(&"Impreso por marta el 2025-03-08 17:30"));
    }
  }

  #[test]
  fn content_stays_inside_band() {
    let m = mass(1, "2025-03-09", "07:00", "AM");
    let c = category(1, "Varios", CategoryKind::Varios, 1);
    let rows = (1..=80).map(|i| row(i, &m, &c, "Por la familia")).collect();
    let job = job(vec![m], rows);

    for page in render(&job, measure(&job)) {
      for op in &page.ops[8..] {
        let y = baseline(op);
        assert!(y <= CONTENT_TOP && y >= CONTENT_BOTTOM, "op outside band: {op:?}");
      }
    }
  }

  #[test]
  fn headings_never_end_a_page() {
    let c = category(1, "Varios", CategoryKind::Varios, 1);
    let masses: Vec<Mass> =
      (1..=12).map(|i| mass(i, "2025-03-09", &format!("{:02}:00", i), "AM")).collect();
    let rows = masses
      .iter()
      .flat_map(|m| (0..6).map(move |k| (m, m.id * 10 + k)))
      .map(|(m, id)| row(id, m, &c, "Por la familia"))
      .collect();
    let job = job(masses, rows);

    for page in render(&job, measure(&job)) {
      let t = texts(&page);
      let last = t.last().copied().unwrap_or_default();
      assert!(!last.starts_with("MISA "), "page {} ends on {last}", page.number);
      assert_ne!(last, "Varios");
    }
  }

  #[test]
  fn masses_print_in_clock_order_and_empty_ones_say_so() {
    let evening = mass(1, "2025-03-09", "07:00", "PM");
    let noon = mass(2, "2025-03-09", "12:00", "PM");
    let morning = mass(3, "2025-03-09", "09:00", "AM");
    let c = category(1, "Varios", CategoryKind::Varios, 1);
    let job = job(vec![evening.clone(), noon, morning], vec![row(1, &evening, &c, "Ana")]);

    let pages = render(&job, 1);
    let headings: Vec<_> =
      texts(&pages[0]).into_iter().filter(|t| t.starts_with("MISA ")).collect();
    assert_eq!(headings, ["MISA 09:00 AM", "MISA 12:00 PM", "MISA 07:00 PM"]);
    assert_eq!(find(&pages, "No hay intenciones.").len(), 2);
  }

  #[test]
  fn groups_follow_display_order() {
    let m = mass(1, "2025-03-09", "07:00", "AM");
    let salud = category(1, "Salud", CategoryKind::Salud, 2);
    let difuntos = category(2, "Difuntos", CategoryKind::Difuntos, 1);
    let rows = vec![row(1, &m, &salud, "Ana"), row(2, &m, &difuntos, "Juan")];
    let pages = render(&job(vec![m], rows), 1);

    let t = texts(&pages[0]);
    let pos = |s: &str| t.iter().position(|x| *x == s).unwrap();
    assert!(pos("Difuntos") < pos("Salud"));
  }

  #[test]
  fn deceased_names_fill_three_columns() {
    let m = mass(1, "2025-03-09", "07:00", "AM");
    let c = category(1, "Difuntos", CategoryKind::Difuntos, 1);
    let rows = vec![row(1, &m, &c, "Juan; Pedro\nLuis, Ana")];
    let pages = render(&job(vec![m], rows), 1);

    let [juan, pedro, luis, ana] = ["Juan", "Pedro", "Luis", "Ana"].map(|n| find(&pages, n)[0]);
    assert_eq!(baseline(juan), baseline(pedro));
    assert_eq!(baseline(juan), baseline(luis));
    assert!(baseline(ana) < baseline(juan));
    let x = |op: &DrawOp| match op {
      DrawOp::Text { x, .. } => *x,
      DrawOp::Rule { x1, .. } => *x1,
    };
    assert!(x(juan) < x(pedro) && x(pedro) < x(luis));
    assert_eq!(x(ana), x(juan));
  }

  #[test]
  fn health_names_fill_two_columns() {
    let m = mass(1, "2025-03-09", "07:00", "AM");
    let c = category(1, "Salud", CategoryKind::Salud, 1);
    let rows = vec![row(1, &m, &c, "Ana, Rosa, Luis")];
    let pages = render(&job(vec![m], rows), 1);

    let ana = baseline(find(&pages, "Ana")[0]);
    assert_eq!(baseline(find(&pages, "Rosa")[0]), ana);
    assert!(baseline(find(&pages, "Luis")[0]) < ana);
  }

  #[test]
  fn thanksgiving_is_a_table() {
    let m = mass(1, "2025-03-09", "07:00", "AM");
    let c = category(1, "Acción de gracias", CategoryKind::AccionDeGracias, 1);
    let rows = vec![row(1, &m, &c, "sus 50 años de matrimonio")];
    let pages = render(&job(vec![m], rows), 1);

    let head = baseline(find(&pages, "Intención")[0]);
    assert_eq!(baseline(find(&pages, "Ofrece")[0]), head);
    let t = texts(&pages[0]);
    assert!(t.contains(&"Familia Rojas"));
    assert!(t.iter().any(|l| l.starts_with("Por el eterno descanso de sus 50")));
  }

  #[test]
  fn prose_carries_phrase_petitions_and_offerer() {
    let m = mass(1, "2025-03-09", "07:00", "AM");
    let c = category(1, "Cumpleaños", CategoryKind::General, 1);
    let rows = vec![row(1, &m, &c, "Carmen.")];
    let pages = render(&job(vec![m], rows), 1);
    assert_eq!(
      find(&pages, "Por el eterno descanso de Carmen. Ofrece: Familia Rojas.").len(),
      1
    );
  }

  #[test]
  fn preface_and_extra_text_print_once() {
    let m = mass(1, "2025-03-09", "07:00", "AM");
    let mut c = category(1, "Varios", CategoryKind::Varios, 1);
    c.extra_text = "Oremos al Señor".into();
    let rows = (1..=90).map(|i| row(i, &m, &c, "Por la familia")).collect();
    let mut job = job(vec![m], rows);
    job.preface = Some("Parroquia San José".into());

    let pages = render(&job, measure(&job));
    assert!(pages.len() >= 2);
    assert!(texts(&pages[0]).contains(&"Parroquia San José"));
    assert!(pages[1..].iter().all(|p| !texts(p).contains(&"Parroquia San José")));
    assert_eq!(find(&pages, "Oremos al Señor").len(), 1);
  }

  #[test]
  fn long_category_note_breaks_across_pages() {
    let m = mass(1, "2025-03-09", "07:00", "AM");
    let mut c = category(1, "Varios", CategoryKind::Varios, 1);
    c.extra_text = (1..=70).map(|i| format!("Nota {i}")).collect::<Vec<_>>().join("\n");
    let job = job(vec![m.clone()], vec![row(1, &m, &c, "Por la familia")]);

    let pages = render(&job, measure(&job));
    assert!(pages.len() >= 2, "expected the note to spill over, got {}", pages.len());
    for page in &pages {
      for op in &page.ops[8..] {
        let y = baseline(op);
        assert!(y <= CONTENT_TOP && y >= CONTENT_BOTTOM, "op outside band: {op:?}");
      }
    }
    for i in 1..=70 {
      assert_eq!(find(&pages, &format!("Nota {i}")).len(), 1, "Nota {i}");
    }
    assert_eq!(
      find(&pages, "Por el eterno descanso de Por la familia. Ofrece: Familia Rojas.").len(),
      1
    );
  }

  #[test]
  fn name_grid_keeps_rows_without_names() {
    let m = mass(1, "2025-03-09", "07:00", "AM");
    let c = category(1, "Difuntos", CategoryKind::Difuntos, 1);
    let rows = vec![row(1, &m, &c, ",;"), row(2, &m, &c, "Juan")];
    let pages = render(&job(vec![m], rows), 1);

    assert_eq!(find(&pages, "Por el eterno descanso de ,;").len(), 1);
    assert_eq!(find(&pages, "Juan").len(), 1);
  }

  #[test]
  fn empty_day_still_renders_a_page() {
    let job = job(Vec::new(), Vec::new());
    assert_eq!(measure(&job), 1);
    let pages = render(&job, 1);
    assert!(texts(&pages[0]).contains(&"No hay misas registradas para este día."));
  }
}
