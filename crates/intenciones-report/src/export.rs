//! CSV export of intention listings.

use intenciones_core::intention::IntentionRow;

use crate::{Error, Result};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Which column set to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvColumns {
  /// Every intention in range, with the submitting user.
  Admin,
  /// A staff member's own intentions; the submitter column is omitted.
  Own,
}

impl CsvColumns {
  fn header(self) -> Vec<&'static str> {
    let mut header = vec![
      "misa_fecha",
      "misa_hora",
      "categoria",
      "ofrece",
      "intencion_base",
      "peticiones",
    ];
    if self == CsvColumns::Admin {
      header.push("funcionario");
    }
    header.extend(["fecha_creado", "fecha_actualizado"]);
    header
  }
}

/// Serialise `rows` as UTF-8 CSV, keeping their order.
pub fn export_csv(rows: &[IntentionRow], columns: CsvColumns) -> Result<Vec<u8>> {
  let mut writer = csv::Writer::from_writer(Vec::new());
  writer.write_record(columns.header())?;

  for row in rows {
    let i = &row.intention;
    let mut record = vec![
      row.mass.date.to_string(),
      row.mass.time_label(),
      row.category.name.clone(),
      i.offered_by.clone(),
      row.base_phrase.clone(),
      i.petitions.clone(),
    ];
    if columns == CsvColumns::Admin {
      record.push(row.submitter.clone());
    }
    record.push(i.created_at.format(TIMESTAMP_FORMAT).to_string());
    record.push(i.updated_at.format(TIMESTAMP_FORMAT).to_string());
    writer.write_record(&record)?;
  }

  let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
  tracing::debug!(rows = rows.len(), ?columns, bytes = bytes.len(), "csv exported");
  Ok(bytes)
}
