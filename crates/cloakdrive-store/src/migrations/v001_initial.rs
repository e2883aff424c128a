//! v001 -- Initial schema creation.
//!
//! Creates `folders`, `files` and `share_links`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Folders (self-referencing hierarchy, owner-scoped)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS folders (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    name       TEXT NOT NULL,
    parent_id  TEXT,                          -- nullable FK -> folders(id), NULL = root
    owner      TEXT NOT NULL,                 -- identity string
    created_at TEXT NOT NULL,                 -- RFC-3339

    FOREIGN KEY (parent_id) REFERENCES folders(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_folders_owner_parent ON folders(owner, parent_id);

-- ----------------------------------------------------------------
-- Files (metadata + key material; ciphertext lives in the blob store)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS files (
    id             TEXT PRIMARY KEY NOT NULL, -- UUID v4
    filename       TEXT NOT NULL,
    file_type      TEXT NOT NULL,
    size_label     TEXT NOT NULL,             -- e.g. "5.20 MB"
    size_bytes     INTEGER NOT NULL,
    owner          TEXT NOT NULL,
    folder_id      TEXT,                      -- nullable FK -> folders(id)
    storage_path   TEXT NOT NULL UNIQUE,      -- blob store object name
    salt_hex       TEXT NOT NULL,             -- 16-byte KDF salt
    encryption_key TEXT NOT NULL,             -- hex key, or hex wrapped key
    key_wrapped    INTEGER NOT NULL DEFAULT 0,
    nonce_hex      TEXT NOT NULL,             -- 12-byte nonce
    uploaded_at    TEXT NOT NULL,

    FOREIGN KEY (folder_id) REFERENCES folders(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_files_owner_folder ON files(owner, folder_id);

-- ----------------------------------------------------------------
-- Share links
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS share_links (
    id            TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    file_id       TEXT NOT NULL,              -- FK -> files(id)
    token         TEXT NOT NULL UNIQUE,       -- base64url capability
    password_hash TEXT,                       -- Argon2id PHC string
    expires_at    TEXT,                       -- RFC-3339, NULL = never
    created_at    TEXT NOT NULL,

    FOREIGN KEY (file_id) REFERENCES files(id) ON DELETE CASCADE
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
