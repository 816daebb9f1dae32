//! Singleton key/value settings.

/// The settings rows the application reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
  /// Free text printed atop every print document.
  PdfPreface,
  /// `YYYY-MM-DD` upper bound of the most recent bulk deletion; the lower
  /// bound of the next one.
  LastDeletion,
}

impl Setting {
  /// The key column value.
  pub fn key(self) -> &'static str {
    match self {
      Setting::PdfPreface => "pdf_texto_global",
      Setting::LastDeletion => "last_deletion",
    }
  }
}
