//! [`SqliteStore`], the SQLite implementation of [`TagStore`].

use std::{
  path::Path,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _, Transaction, TransactionBehavior};

use tagboard_core::{
  account::Account,
  creator::{Creator, NewCreator},
  id::{AccountId, AssignmentId, CreatorId, TagId},
  store::{AssignOutcome, TagStore},
  tag::{Tag, TagListing, TagName},
  vote::{Vote, VoteValue},
};

use crate::{
  Error, Result,
  encode::{
    RawAccount, RawAssignOutcome, RawAssignment, RawCreator, RawTag,
    RawTagListing, encode_dt, is_unique_violation,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tagboard store backed by a single SQLite file.
///
/// Clones share one reference-counted connection. Separate
/// `open` calls on the same path produce independent connections that
/// coordinate only through SQLite's locking.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Occupy the connection thread for `period`.
  #[cfg(test)]
  pub(crate) async fn stall(&self, period: std::time::Duration) -> Result<()> {
    self
      .conn
      .call(move |_| {
        std::thread::sleep(period);
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `body` in an `IMMEDIATE` transaction on the connection thread.
  ///
  /// If the awaiting future is dropped first (its deadline expired), the
  /// call is abandoned: it rolls back instead of committing, whether the
  /// drop lands before the thread picks the call up or while `body` runs.
  async fn write<T, F>(&self, body: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Transaction<'_>) -> rusqlite::Result<T> + Send + 'static,
  {
    let guard = AbandonOnDrop::default();
    let abandoned = guard.0.clone();

    let out = self
      .conn
      .call(move |conn| {
        abandoned.check()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        abandoned.check()?;
        let out = body(&tx)?;
        abandoned.check()?;
        tx.commit()?;
        Ok(out)
      })
      .await?;

    drop(guard);
    Ok(out)
  }
}

// ─── Abandonment ─────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("store call abandoned by its caller")]
struct Abandoned;

#[derive(Clone, Default)]
struct AbandonFlag(Arc<AtomicBool>);

impl AbandonFlag {
  fn check(&self) -> tokio_rusqlite::Result<()> {
    if self.0.load(Ordering::Acquire) {
      tracing::debug!("skipping abandoned store call");
      return Err(tokio_rusqlite::Error::Other(Box::new(Abandoned)));
    }
    Ok(())
  }
}

/// Raises its flag when dropped. Once the call has returned nothing reads
/// the flag again, so only a drop mid-call has any effect.
#[derive(Default)]
struct AbandonOnDrop(AbandonFlag);

impl Drop for AbandonOnDrop {
  fn drop(&mut self) { self.0.0.store(true, Ordering::Release); }
}

// ─── Transaction helpers ─────────────────────────────────────────────────────

/// Look a row up by its unique key, inserting it if absent.
///
/// A writer that slipped in between the lookup and the insert surfaces as a
/// uniqueness violation; the winner's row is then read back and returned.
fn find_or_insert<T>(
  conn: &Connection,
  find: impl Fn(&Connection) -> rusqlite::Result<Option<T>>,
  insert: impl FnOnce(&Connection) -> rusqlite::Result<T>,
) -> rusqlite::Result<T> {
  if let Some(found) = find(conn)? {
    return Ok(found);
  }
  match insert(conn) {
    Ok(created) => Ok(created),
    Err(e) if is_unique_violation(&e) => find(conn)?.ok_or(e),
    Err(e) => Err(e),
  }
}

fn row_exists(conn: &Connection, sql: &str, id: i64) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(sql, rusqlite::params![id], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

// ─── TagStore impl ───────────────────────────────────────────────────────────

impl TagStore for SqliteStore {
  type Error = Error;

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn ensure_account(&self, external_identity: &str) -> Result<Account> {
    let identity = external_identity.to_owned();
    let now = encode_dt(Utc::now());

    let raw: RawAccount = self
      .write(move |tx| {
        find_or_insert(
          tx,
          |c| {
            c.query_row(
              &format!(
                "SELECT {} FROM accounts WHERE external_identity = ?1",
                RawAccount::COLUMNS
              ),
              rusqlite::params![identity],
              RawAccount::from_row,
            )
            .optional()
          },
          |c| {
            c.execute(
              "INSERT INTO accounts (external_identity, created_at) VALUES (?1, ?2)",
              rusqlite::params![identity, now],
            )?;
            Ok(RawAccount {
              account_id:        c.last_insert_rowid(),
              external_identity: identity.clone(),
              created_at:        now.clone(),
            })
          },
        )
      })
      .await?;

    raw.into_account()
  }

  // ── Creators ──────────────────────────────────────────────────────────────

  async fn create_creator(&self, input: NewCreator) -> Result<Creator> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let NewCreator {
      external_channel_ref,
      handle,
      display_name,
      description,
    } = input;

    let (channel, handle_col, name, desc) = (
      external_channel_ref.clone(),
      handle.clone(),
      display_name.clone(),
      description.clone(),
    );
    let creator_id: i64 = self
      .write(move |tx| {
        tx.execute(
          "INSERT INTO creators
             (external_channel_ref, handle, display_name, description, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![channel, handle_col, name, desc, at_str],
        )?;
        Ok(tx.last_insert_rowid())
      })
      .await?;

    Ok(Creator {
      creator_id: CreatorId(creator_id),
      external_channel_ref,
      handle,
      display_name,
      description,
      created_at,
    })
  }

  async fn get_creator(&self, id: CreatorId) -> Result<Option<Creator>> {
    let raw: Option<RawCreator> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM creators c WHERE c.creator_id = ?1",
                RawCreator::COLUMNS
              ),
              rusqlite::params![id.0],
              RawCreator::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCreator::into_creator).transpose()
  }

  // ── Tags ──────────────────────────────────────────────────────────────────

  async fn resolve_tag(&self, name: &TagName) -> Result<Tag> {
    let display = name.display().to_owned();
    let key = name.key().to_owned();
    let now = encode_dt(Utc::now());

    let raw: RawTag = self
      .write(move |tx| {
        find_or_insert(
          tx,
          |c| {
            c.query_row(
              &format!("SELECT {} FROM tags WHERE name_key = ?1", RawTag::COLUMNS),
              rusqlite::params![key],
              RawTag::from_row,
            )
            .optional()
          },
          |c| {
            c.execute(
              "INSERT INTO tags (name, name_key, created_at) VALUES (?1, ?2, ?3)",
              rusqlite::params![display, key, now],
            )?;
            Ok(RawTag {
              tag_id:     c.last_insert_rowid(),
              name:       display.clone(),
              created_at: now.clone(),
            })
          },
        )
      })
      .await?;

    tracing::trace!(tag_id = raw.tag_id, "resolve_tag committed");
    raw.into_tag()
  }

  // ── Assignments ───────────────────────────────────────────────────────────

  async fn insert_assignment(
    &self,
    creator_id: CreatorId,
    tag_id: TagId,
    proposer: AccountId,
  ) -> Result<AssignOutcome> {
    let now = encode_dt(Utc::now());

    let raw: RawAssignOutcome = self
      .write(move |tx| {
        if !row_exists(tx, "SELECT 1 FROM creators WHERE creator_id = ?1", creator_id.0)? {
          return Ok(RawAssignOutcome::MissingCreator);
        }
        if !row_exists(tx, "SELECT 1 FROM tags WHERE tag_id = ?1", tag_id.0)? {
          return Ok(RawAssignOutcome::MissingTag);
        }

        let inserted = tx.execute(
          "INSERT INTO assignments (creator_id, tag_id, proposer_account_id, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![creator_id.0, tag_id.0, proposer.0, now],
        );

        match inserted {
          Ok(_) => Ok(RawAssignOutcome::Created(RawAssignment {
            assignment_id:       tx.last_insert_rowid(),
            creator_id:          creator_id.0,
            tag_id:              tag_id.0,
            proposer_account_id: proposer.0,
            created_at:          now,
          })),
          Err(e) if is_unique_violation(&e) => {
            let existing: i64 = tx.query_row(
              "SELECT assignment_id FROM assignments
               WHERE creator_id = ?1 AND tag_id = ?2",
              rusqlite::params![creator_id.0, tag_id.0],
              |r| r.get(0),
            )?;
            Ok(RawAssignOutcome::Duplicate(existing))
          }
          Err(e) => Err(e),
        }
      })
      .await?;

    raw.into_outcome()
  }

  // ── Votes ─────────────────────────────────────────────────────────────────

  async fn upsert_vote(
    &self,
    account_id: AccountId,
    assignment_id: AssignmentId,
    value: VoteValue,
  ) -> Result<Option<Vote>> {
    let updated_at = Utc::now();
    let at_str = encode_dt(updated_at);

    let written: bool = self
      .write(move |tx| {
        if !row_exists(
          tx,
          "SELECT 1 FROM assignments WHERE assignment_id = ?1",
          assignment_id.0,
        )? {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO votes (account_id, assignment_id, value, updated_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (account_id, assignment_id)
           DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
          rusqlite::params![account_id.0, assignment_id.0, value.as_i64(), at_str],
        )?;
        Ok(true)
      })
      .await?;

    Ok(written.then_some(Vote {
      account_id,
      assignment_id,
      value,
      updated_at,
    }))
  }

  async fn delete_vote(
    &self,
    account_id: AccountId,
    assignment_id: AssignmentId,
  ) -> Result<bool> {
    let removed: usize = self
      .write(move |tx| {
        tx.execute(
          "DELETE FROM votes WHERE account_id = ?1 AND assignment_id = ?2",
          rusqlite::params![account_id.0, assignment_id.0],
        )
      })
      .await?;
    Ok(removed > 0)
  }

  async fn score(&self, assignment_id: AssignmentId) -> Result<Option<i64>> {
    let score: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT (SELECT COALESCE(SUM(v.value), 0)
                         FROM votes v
                        WHERE v.assignment_id = a.assignment_id)
                 FROM assignments a
                WHERE a.assignment_id = ?1",
              rusqlite::params![assignment_id.0],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(score)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn list_tags(&self, creator_id: CreatorId) -> Result<Vec<TagListing>> {
    let raws: Vec<RawTagListing> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT
             a.assignment_id, a.tag_id, t.name, a.proposer_account_id,
             (SELECT COALESCE(SUM(v.value), 0)
                FROM votes v
               WHERE v.assignment_id = a.assignment_id) AS score,
             a.created_at
           FROM assignments a
           JOIN tags t ON t.tag_id = a.tag_id
           WHERE a.creator_id = ?1
           ORDER BY a.assignment_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![creator_id.0], |row| {
            Ok(RawTagListing {
              assignment_id:       row.get(0)?,
              tag_id:              row.get(1)?,
              name:                row.get(2)?,
              proposer_account_id: row.get(3)?,
              score:               row.get(4)?,
              created_at:          row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTagListing::into_listing).collect()
  }

  async fn search_creators(&self, fragment_key: &str) -> Result<Vec<Creator>> {
    let fragment = fragment_key.to_owned();

    let raws: Vec<RawCreator> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {}
             FROM creators c
            WHERE EXISTS (
                    SELECT 1
                      FROM assignments a
                      JOIN tags t ON t.tag_id = a.tag_id
                     WHERE a.creator_id = c.creator_id
                       AND instr(t.name_key, ?1) > 0)
            ORDER BY c.creator_id",
          RawCreator::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![fragment], RawCreator::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCreator::into_creator).collect()
  }
}
