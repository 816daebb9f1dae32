//! SQL schema for the parish SQLite store.
//!
//! Table and column names follow the parish's existing database so an old
//! `data.db` keeps its meaning. Executed once at connection startup.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT    NOT NULL UNIQUE,
    password_hash TEXT    NOT NULL,              -- argon2 PHC string
    role          TEXT    NOT NULL CHECK (role IN ('admin', 'funcionario')),
    active        INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS categorias (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    nombre          TEXT    NOT NULL UNIQUE,
    descripcion     TEXT    NOT NULL DEFAULT '',
    texto_adicional TEXT    NOT NULL DEFAULT '',
    active          INTEGER NOT NULL DEFAULT 1,
    orden           INTEGER NOT NULL DEFAULT 0,
    tipo            TEXT    NOT NULL DEFAULT 'general'  -- CategoryKind tag
);

CREATE TABLE IF NOT EXISTS intencion_base (
    id     INTEGER PRIMARY KEY AUTOINCREMENT,
    frase  TEXT    NOT NULL COLLATE NOCASE UNIQUE,
    active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS misas (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    fecha TEXT NOT NULL,                          -- YYYY-MM-DD
    hora  TEXT NOT NULL,                          -- HH:MM as typed
    ampm  TEXT NOT NULL CHECK (ampm IN ('AM', 'PM'))
);

CREATE TABLE IF NOT EXISTS intenciones (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    misa_id           INTEGER NOT NULL REFERENCES misas(id),
    categoria_id      INTEGER NOT NULL REFERENCES categorias(id),
    ofrece            TEXT    NOT NULL,
    intencion_base_id INTEGER NOT NULL REFERENCES intencion_base(id),
    peticiones        TEXT    NOT NULL,
    fecha_creado      TEXT    NOT NULL,           -- local YYYY-MM-DDTHH:MM:SS
    fecha_actualizado TEXT    NOT NULL,
    funcionario_id    INTEGER NOT NULL REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS misas_fecha_idx             ON misas(fecha);
CREATE INDEX IF NOT EXISTS intenciones_misa_idx        ON intenciones(misa_id);
CREATE INDEX IF NOT EXISTS intenciones_funcionario_idx ON intenciones(funcionario_id);

PRAGMA user_version = 1;
";
