//! SQL schema for the Grove SQLite store.
//!
//! Executed once at connection startup. Nodes are never hard-deleted: a
//! non-NULL `deleted_at` hides a row from every query.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,       -- argon2 PHC string
    created_at    TEXT NOT NULL
);

-- Personal trees: one forest per user, linked by parent pointers only.
CREATE TABLE IF NOT EXISTS nodes (
    id          INTEGER PRIMARY KEY,
    user_id     INTEGER NOT NULL REFERENCES users(id),
    parent_id   INTEGER REFERENCES nodes(id),
    node_type   TEXT NOT NULL CHECK (node_type IN ('folder', 'text')),
    title       TEXT NOT NULL CHECK (length(title) BETWEEN 1 AND 255),
    content     TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    deleted_at  TEXT,
    CHECK (node_type = 'text' OR content = '')
);

CREATE TABLE IF NOT EXISTS domains (
    id          INTEGER PRIMARY KEY,
    owner_id    INTEGER NOT NULL REFERENCES users(id),
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    join_code   TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS domain_members (
    domain_id   INTEGER NOT NULL REFERENCES domains(id),
    user_id     INTEGER NOT NULL REFERENCES users(id),
    role        TEXT NOT NULL CHECK (role IN ('owner', 'admin', 'member')),
    joined_at   TEXT NOT NULL,
    PRIMARY KEY (domain_id, user_id)
);

-- Shared trees. Published copies carry no link back to their source.
CREATE TABLE IF NOT EXISTS domain_nodes (
    id             INTEGER PRIMARY KEY,
    domain_id      INTEGER NOT NULL REFERENCES domains(id),
    parent_id      INTEGER REFERENCES domain_nodes(id),
    node_type      TEXT NOT NULL CHECK (node_type IN ('folder', 'text')),
    title          TEXT NOT NULL CHECK (length(title) BETWEEN 1 AND 255),
    content        TEXT NOT NULL DEFAULT '',
    comments_count INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,
    deleted_at     TEXT,
    CHECK (node_type = 'text' OR content = '')
);

CREATE TABLE IF NOT EXISTS domain_node_comments (
    id             INTEGER PRIMARY KEY,
    domain_node_id INTEGER NOT NULL REFERENCES domain_nodes(id),
    user_id        INTEGER NOT NULL REFERENCES users(id),
    content        TEXT NOT NULL,
    created_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS nodes_owner_parent_idx        ON nodes(user_id, parent_id);
CREATE INDEX IF NOT EXISTS domain_nodes_owner_parent_idx ON domain_nodes(domain_id, parent_id);
CREATE INDEX IF NOT EXISTS domain_members_user_idx       ON domain_members(user_id);
CREATE INDEX IF NOT EXISTS comments_node_idx             ON domain_node_comments(domain_node_id);

PRAGMA user_version = 1;
";
