pub mod admin;
pub mod funcionario;
pub mod login;

use axum::{
  http::{HeaderValue, header},
  response::{IntoResponse, Response},
};
use intenciones_core::Error as DomainError;

use crate::error::Error;

/// A downloadable file response.
pub(crate) fn attachment(
  content_type: &'static str,
  filename: &str,
  body: Vec<u8>,
) -> Result<Response, Error> {
  let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
    .map_err(|e| Error::Internal(e.to_string()))?;
  Ok(
    (
      [
        (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
        (header::CONTENT_DISPOSITION, disposition),
      ],
      body,
    )
      .into_response(),
  )
}

/// Parse a numeric id posted from a `<select>`; a blank or garbled value
/// counts as missing.
pub(crate) fn form_id(raw: &str, field: &'static str) -> Result<i64, DomainError> {
  raw.trim().parse().map_err(|_| DomainError::MissingField(field))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_ids_are_missing_fields() {
    assert_eq!(form_id(" 12 ", "misa"), Ok(12));
    assert_eq!(form_id("", "misa"), Err(DomainError::MissingField("misa")));
    assert_eq!(form_id("x", "categoría"), Err(DomainError::MissingField("categoría")));
  }

  #[test]
  fn attachments_carry_disposition() {
    let resp = attachment("text/csv; charset=utf-8", "mis_intenciones.csv", b"a,b\n".to_vec()).unwrap();
    assert_eq!(
      resp.headers().get(header::CONTENT_DISPOSITION).unwrap(),
      "attachment; filename=\"mis_intenciones.csv\""
    );
  }
}
