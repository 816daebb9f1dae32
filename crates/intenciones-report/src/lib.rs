//! Downloadable reports over parish intentions.
//!
//! Two outputs, both pure and synchronous:
//!
//! - [`export_csv`] — one CSV row per intention, for the admin range export
//!   and a staff member's own export.
//! - [`print_day`] — the day's printable intention sheet as a PDF, laid out
//!   by [`layout`] and drawn with the builtin Helvetica family.

pub mod error;
mod export;
pub mod layout;
mod pdf;

pub use error::{Error, Result};
pub use export::{CsvColumns, export_csv};
pub use layout::PrintJob;
pub use pdf::print_day;

// ─── Shared test helpers ──────────────────────────────────────────────────────
