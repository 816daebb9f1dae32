//! Server-rendered pages.
//!
//! Pages are assembled with `format!`; every user-supplied value passes
//! through [`escape`].

use std::fmt::Write as _;

use axum::response::Html;
use chrono::{NaiveDate, NaiveDateTime};
use intenciones_core::{
  category::Category,
  intention::IntentionRow,
  mass::Mass,
  phrase::BasePhrase,
  user::{Role, User},
};

use crate::flash::{Flash, Level};

pub fn escape(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      c => out.push(c),
    }
  }
  out
}

fn page(title: &str, user: Option<&User>, flashes: &[Flash], body: &str) -> Html<String> {
  let nav = match user {
    Some(u) => format!(
      r#"<nav><span>{} ({})</span> <a href="/">Inicio</a> <a href="/logout">Salir</a></nav>"#,
      escape(&u.username),
      u.role
    ),
    None => String::new(),
  };
  let mut messages = String::new();
  for f in flashes {
    let class = match f.level {
      Level::Success => "ok",
      Level::Error => "error",
    };
    let _ = write!(messages, r#"<p class="flash {class}">{}</p>"#, escape(&f.message));
  }

  Html(format!(
    r#"<!doctype html>
<html lang="es">
<head><meta charset="utf-8"><title>{title}</title></head>
<body>
{nav}
<h1>{title}</h1>
{messages}
{body}
</body>
</html>"#,
    title = escape(title),
  ))
}

fn post_button(action: &str, label: &str) -> String {
  format!(
    r#"<form method="post" action="{action}" style="display:inline"><button>{label}</button></form>"#
  )
}

fn active_label(active: bool) -> &'static str { if active { "Activo" } else { "Inactivo" } }

fn with_state(label: &str, active: bool) -> String {
  if active { label.to_owned() } else { format!("{label} (inactiva)") }
}

fn options<T>(items: &[T], selected: Option<i64>, f: impl Fn(&T) -> (i64, String)) -> String {
  items
    .iter()
    .map(|item| {
      let (id, label) = f(item);
      let sel = if selected == Some(id) { " selected" } else { "" };
      format!(r#"<option value="{id}"{sel}>{}</option>"#, escape(&label))
    })
    .collect()
}

// ─── Login ────────────────────────────────────────────────────────────────────

pub fn login(flashes: &[Flash]) -> Html<String> {
  page(
    "Iniciar sesión",
    None,
    flashes,
    r#"<form method="post" action="/login">
<label>Usuario <input name="username" required></label>
<label>Contraseña <input name="password" type="password" required></label>
<button>Entrar</button>
</form>"#,
  )
}

// ─── Admin ────────────────────────────────────────────────────────────────────

pub struct AdminPage<'a> {
  pub user:          &'a User,
  pub flashes:       &'a [Flash],
  pub users:         &'a [User],
  pub masses:        &'a [Mass],
  pub categories:    &'a [Category],
  pub phrases:       &'a [BasePhrase],
  pub preface:       &'a str,
  pub last_deletion: Option<&'a str>,
}

pub fn admin(p: &AdminPage<'_>) -> Html<String> {
  let mut body = String::new();

  // Users
  body.push_str("<section><h2>Usuarios</h2><table>");
  for u in p.users {
    let _ = write!(
      body,
      r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}{}
<form method="post" action="/admin/users/password/{id}" style="display:inline"><input name="password" type="password" placeholder="Nueva contraseña" required><button>Cambiar</button></form></td></tr>"#,
      escape(&u.username),
      u.role,
      active_label(u.active),
      post_button(&format!("/admin/users/toggle/{}", u.id), "Activar/Inactivar"),
      post_button(&format!("/admin/users/delete/{}", u.id), "Eliminar"),
      id = u.id,
    );
  }
  let _ = write!(
    body,
    r#"</table>
<form method="post" action="/admin/users/create">
<input name="username" placeholder="Usuario" required>
<input name="password" type="password" placeholder="Contraseña" required>
<select name="role"><option value="{f}">{f}</option><option value="{a}">{a}</option></select>
<button>Crear usuario</button>
</form></section>"#,
    f = Role::Funcionario,
    a = Role::Admin,
  );

  // Masses
  body.push_str("<section><h2>Misas</h2><table>");
  for m in p.masses {
    let _ = write!(
      body,
      "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
      m.date,
      m.time_label(),
      post_button(&format!("/admin/misas/delete/{}", m.id), "Eliminar"),
    );
  }
  body.push_str(
    r#"</table>
<form method="post" action="/admin/misas/create">
<input name="fecha" type="date" required>
<input name="hora" placeholder="0700" required>
<select name="ampm"><option>AM</option><option>PM</option></select>
<button>Crear misa</button>
</form></section>"#,
  );

  // Categories
  body.push_str("<section><h2>Categorías</h2><table>");
  for c in p.categories {
    let _ = write!(
      body,
      r#"<tr><td><form method="post" action="/admin/categorias/edit/{id}">
<input name="nombre" value="{name}" required>
<input name="descripcion" value="{desc}">
<textarea name="texto_adicional">{extra}</textarea>
<input name="orden" type="number" value="{order}">
<button>Guardar</button></form></td><td>{kind}</td><td>{active}</td><td>{toggle}{delete}</td></tr>"#,
      id = c.id,
      name = escape(&c.name),
      desc = escape(&c.description),
      extra = escape(&c.extra_text),
      order = c.display_order,
      kind = c.kind.as_str(),
      active = active_label(c.active),
      toggle = post_button(&format!("/admin/categorias/toggle/{}", c.id), "Activar/Inactivar"),
      delete = post_button(&format!("/admin/categorias/delete/{}", c.id), "Eliminar"),
    );
  }
  body.push_str(
    r#"</table>
<form method="post" action="/admin/categorias/create">
<input name="nombre" placeholder="Nombre" required>
<input name="descripcion" placeholder="Descripción">
<textarea name="texto_adicional" placeholder="Texto adicional"></textarea>
<input name="orden" type="number" value="0">
<button>Crear categoría</button>
</form></section>"#,
  );

  // Base phrases
  body.push_str("<section><h2>Frases base</h2><table>");
  for b in p.phrases {
    let _ = write!(
      body,
      "<tr><td>{}</td><td>{}</td><td>{}{}</td></tr>",
      escape(&b.phrase),
      active_label(b.active),
      post_button(&format!("/admin/intencion_base/toggle/{}", b.id), "Activar/Inactivar"),
      post_button(&format!("/admin/intencion_base/delete/{}", b.id), "Eliminar"),
    );
  }
  body.push_str(
    r#"</table>
<form method="post" action="/admin/intencion_base/create">
<input name="frase" placeholder="Frase" required>
<button>Crear frase</button>
</form></section>"#,
  );

  // Settings, export and purge
  let _ = write!(
    body,
    r#"<section><h2>Configuración</h2>
<form method="post" action="/admin/settings/pdf_text">
<textarea name="pdf_texto_global">{preface}</textarea>
<button>Guardar texto del PDF</button>
</form>
<h3>Exportar CSV</h3>
<form method="post" action="/admin/export_csv">
<input name="desde" type="date" required> <input name="hasta" type="date" required>
<button>Exportar</button>
</form>
<h3>Eliminar intenciones</h3>
<p>Última eliminación: {last}</p>
<form method="post" action="/admin/delete_range">
<input name="hasta" type="date" required>
<button>Eliminar hasta esta fecha</button>
</form></section>"#,
    preface = escape(p.preface),
    last = escape(p.last_deletion.unwrap_or("Nunca")),
  );

  page("Administración", Some(p.user), p.flashes, &body)
}

// ─── Funcionario ──────────────────────────────────────────────────────────────

pub struct StaffPage<'a> {
  pub user:       &'a User,
  pub flashes:    &'a [Flash],
  pub day:        NaiveDate,
  pub masses:     &'a [Mass],
  pub categories: &'a [Category],
  pub phrases:    &'a [BasePhrase],
  pub own:        &'a [IntentionRow],
  pub now:        NaiveDateTime,
}

pub fn staff(p: &StaffPage<'_>) -> Html<String> {
  let mut body = String::new();

  let _ = write!(
    body,
    r#"<form method="get" action="/funcionario">
<input name="dia" type="date" value="{day}"><button>Ver día</button>
</form>"#,
    day = p.day,
  );

  if p.masses.is_empty() {
    body.push_str("<p>No hay misas para este día.</p>");
  } else {
    let _ = write!(
      body,
      r#"<section><h2>Registrar intención</h2>
<form method="post" action="/funcionario/registrar">
<select name="misa_id">{masses}</select>
<select name="categoria_id">{categories}</select>
<select name="int_base_id">{phrases}</select>
<input name="ofrece" placeholder="Ofrece" maxlength="200" required>
<textarea name="peticiones" placeholder="Peticiones" maxlength="250" required></textarea>
<button>Registrar</button>
</form></section>"#,
      masses = options(p.masses, None, |m| (m.id, format!("{} {}", m.date, m.time_label()))),
      categories = options(p.categories, None, |c| (c.id, c.name.clone())),
      phrases = options(p.phrases, None, |b| (b.id, b.phrase.clone())),
    );
  }

  let _ = write!(
    body,
    r#"<section><h2>Imprimir</h2>
<form method="post" action="/funcionario/print_day">
<input name="dia" type="date" value="{day}"><button>PDF del día</button>
</form>
<form method="post" action="/funcionario/export_csv">
<input name="desde" type="date" required> <input name="hasta" type="date" required>
<button>Exportar mis intenciones</button>
</form></section>"#,
    day = p.day,
  );

  body.push_str("<section><h2>Mis intenciones</h2><table>");
  for r in p.own {
    let edit = if p.now <= r.mass.scheduled_at() {
      format!(r#"<a href="/funcionario/editar/{}">Editar</a>"#, r.intention.id)
    } else {
      String::new()
    };
    let _ = write!(
      body,
      "<tr><td>{} {}</td><td>{}</td><td>{}</td><td>{} {}</td><td>{}</td></tr>",
      r.mass.date,
      r.mass.time_label(),
      escape(&r.category.name),
      escape(&r.intention.offered_by),
      escape(&r.base_phrase),
      escape(&r.intention.petitions),
      edit,
    );
  }
  body.push_str("</table></section>");

  page("Intenciones", Some(p.user), p.flashes, &body)
}

pub struct EditPage<'a> {
  pub user:       &'a User,
  pub flashes:    &'a [Flash],
  pub row:        &'a IntentionRow,
  pub categories: &'a [Category],
  pub phrases:    &'a [BasePhrase],
}

pub fn edit(p: &EditPage<'_>) -> Html<String> {
  let i = &p.row.intention;
  let body = format!(
    r#"<p>Misa: {date} {time}</p>
<form method="post" action="/funcionario/editar/{id}">
<select name="categoria_id">{categories}</select>
<select name="int_base_id">{phrases}</select>
<input name="ofrece" value="{offered}" maxlength="200" required>
<textarea name="peticiones" maxlength="250" required>{petitions}</textarea>
<button>Guardar</button>
</form>"#,
    date = p.row.mass.date,
    time = p.row.mass.time_label(),
    id = i.id,
    categories = options(p.categories, Some(i.category_id), |c| (c.id, with_state(&c.name, c.active))),
    phrases = options(p.phrases, Some(i.base_phrase_id), |b| (b.id, with_state(&b.phrase, b.active))),
    offered = escape(&i.offered_by),
    petitions = escape(&i.petitions),
  );
  page("Editar intención", Some(p.user), p.flashes, &body)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn escapes_markup() {
    assert_eq!(escape(r#"<b>"Ana" & 'Luis'</b>"#), "&lt;b&gt;&quot;Ana&quot; &amp; &#39;Luis&#39;&lt;/b&gt;");
  }

  #[test]
  fn flashes_are_rendered_escaped() {
    let flashes = [Flash { level: Level::Error, message: "<x>".into() }];
    let Html(html) = login(&flashes);
    assert!(html.contains(r#"<p class="flash error">&lt;x&gt;</p>"#));
  }
}
