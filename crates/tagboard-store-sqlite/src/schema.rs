//! SQL schema for the Tagboard SQLite store.
//!
//! Executed once per connection at startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA busy_timeout = 2000;
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS accounts (
    account_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    external_identity TEXT NOT NULL UNIQUE,
    created_at        TEXT NOT NULL
);

-- No uniqueness on the channel reference: directory metadata is stored as
-- given on every proposal.
CREATE TABLE IF NOT EXISTS creators (
    creator_id           INTEGER PRIMARY KEY AUTOINCREMENT,
    external_channel_ref TEXT NOT NULL,
    handle               TEXT,
    display_name         TEXT NOT NULL,
    description          TEXT NOT NULL,
    created_at           TEXT NOT NULL
);

-- name keeps the first writer's casing; name_key is its lowercase fold and
-- carries the uniqueness.
CREATE TABLE IF NOT EXISTS tags (
    tag_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT NOT NULL,
    name_key   TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

-- Accounts are referenced by id only.
CREATE TABLE IF NOT EXISTS assignments (
    assignment_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    creator_id          INTEGER NOT NULL REFERENCES creators(creator_id),
    tag_id              INTEGER NOT NULL REFERENCES tags(tag_id),
    proposer_account_id INTEGER NOT NULL,
    created_at          TEXT NOT NULL,
    UNIQUE (creator_id, tag_id)
);

CREATE TABLE IF NOT EXISTS votes (
    account_id    INTEGER NOT NULL,
    assignment_id INTEGER NOT NULL REFERENCES assignments(assignment_id),
    value         INTEGER NOT NULL CHECK (value IN (1, -1)),
    updated_at    TEXT NOT NULL,
    PRIMARY KEY (account_id, assignment_id)
);

CREATE INDEX IF NOT EXISTS assignments_creator_idx ON assignments(creator_id);
CREATE INDEX IF NOT EXISTS votes_assignment_idx    ON votes(assignment_id);

PRAGMA user_version = 1;
";
