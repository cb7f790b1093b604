//! Integration tests for `SqliteStore`, in memory and on disk.

use std::{collections::HashSet, path::Path, time::Duration};

use tagboard_core::{
  Error as CoreError,
  creator::NewCreator,
  deadline::Deadline,
  id::{AccountId, AssignmentId, CreatorId, TagId},
  store::{AssignOutcome, StoreFailure, TagStore},
  tag::TagName,
  vote::VoteValue,
};
use tokio::task::JoinSet;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn tag(name: &str) -> TagName { TagName::parse(name).unwrap() }

async fn creator(s: &SqliteStore, channel: &str) -> CreatorId {
  s.create_creator(NewCreator::new(channel, "Channel", "about"))
    .await
    .unwrap()
    .creator_id
}

async fn assignment(s: &SqliteStore, c: CreatorId, name: &str) -> AssignmentId {
  let t = s.resolve_tag(&tag(name)).await.unwrap();
  match s.insert_assignment(c, t.tag_id, AccountId(1)).await.unwrap() {
    AssignOutcome::Created(a) => a.assignment_id,
    other => panic!("expected a new assignment, got {other:?}"),
  }
}

/// Open `n` independent stores on the same file. Opened one after another so
/// that schema initialisation never races.
async fn handles(path: &Path, n: usize) -> Vec<SqliteStore> {
  let mut out = Vec::with_capacity(n);
  for _ in 0..n {
    out.push(SqliteStore::open(path).await.expect("on-disk store"));
  }
  out
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ensure_account_is_idempotent() {
  let s = store().await;

  let first = s.ensure_account("google|123").await.unwrap();
  let again = s.ensure_account("google|123").await.unwrap();
  let other = s.ensure_account("google|456").await.unwrap();

  assert_eq!(first.account_id, again.account_id);
  assert_eq!(first.created_at, again.created_at);
  assert_ne!(first.account_id, other.account_id);

  assert_eq!(again.external_identity, "google|123");
}

// ─── Creators ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_creator() {
  let s = store().await;

  let mut input = NewCreator::new("UC123", "Some Channel", "videos");
  input.handle = Some("@somechannel".into());
  let created = s.create_creator(input).await.unwrap();
  assert_eq!(created.creator_id, CreatorId(1));

  let fetched = s.get_creator(created.creator_id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
  assert_eq!(fetched.handle.as_deref(), Some("@somechannel"));
}

#[tokio::test]
async fn same_channel_twice_gives_two_creators() {
  let s = store().await;
  let a = creator(&s, "UC123").await;
  let b = creator(&s, "UC123").await;
  assert_ne!(a, b);
}

// ─── Tags ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn resolve_tag_folds_case_and_keeps_first_casing() {
  let s = store().await;

  let first = s.resolve_tag(&tag("Gaming")).await.unwrap();
  let lower = s.resolve_tag(&tag("gaming")).await.unwrap();
  let padded = s.resolve_tag(&tag("  GAMING ")).await.unwrap();

  assert_eq!(first.tag_id, TagId(1));
  assert_eq!(lower.tag_id, first.tag_id);
  assert_eq!(padded.tag_id, first.tag_id);
  assert_eq!(padded.name, "Gaming");
}

// ─── Assignments ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_assignment_reports_existing_id() {
  let s = store().await;
  let c = creator(&s, "UC1").await;
  let id = assignment(&s, c, "Gaming").await;

  let t = s.resolve_tag(&tag("gaming")).await.unwrap();
  let outcome = s.insert_assignment(c, t.tag_id, AccountId(2)).await.unwrap();
  assert!(matches!(outcome, AssignOutcome::Duplicate(existing) if existing == id));

  let listed = s.list_tags(c).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].proposer_account_id, AccountId(1));
}

#[tokio::test]
async fn assignment_requires_existing_creator_and_tag() {
  let s = store().await;
  let c = creator(&s, "UC1").await;
  let t = s.resolve_tag(&tag("Music")).await.unwrap();

  assert!(matches!(
    s.insert_assignment(CreatorId(404), t.tag_id, AccountId(1)).await.unwrap(),
    AssignOutcome::MissingCreator
  ));
  assert!(matches!(
    s.insert_assignment(c, TagId(404), AccountId(1)).await.unwrap(),
    AssignOutcome::MissingTag
  ));
  assert!(s.list_tags(c).await.unwrap().is_empty());
}

// ─── Votes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn vote_upsert_overwrites_in_place() {
  let s = store().await;
  let c = creator(&s, "UC1").await;
  let id = assignment(&s, c, "Gaming").await;

  s.upsert_vote(AccountId(7), id, VoteValue::Up).await.unwrap().unwrap();
  assert_eq!(s.score(id).await.unwrap(), Some(1));

  let flipped = s
    .upsert_vote(AccountId(7), id, VoteValue::Down)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(flipped.value, VoteValue::Down);
  assert_eq!(s.score(id).await.unwrap(), Some(-1));
}

#[tokio::test]
async fn vote_on_unknown_assignment_writes_nothing() {
  let s = store().await;
  let written = s
    .upsert_vote(AccountId(7), AssignmentId(9), VoteValue::Up)
    .await
    .unwrap();
  assert!(written.is_none());
  assert_eq!(s.score(AssignmentId(9)).await.unwrap(), None);
}

#[tokio::test]
async fn delete_vote_reports_whether_a_row_went() {
  let s = store().await;
  let c = creator(&s, "UC1").await;
  let id = assignment(&s, c, "Gaming").await;

  assert!(!s.delete_vote(AccountId(7), id).await.unwrap());
  s.upsert_vote(AccountId(7), id, VoteValue::Down).await.unwrap();
  assert!(s.delete_vote(AccountId(7), id).await.unwrap());
  assert_eq!(s.score(id).await.unwrap(), Some(0));
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_tags_end_to_end() {
  let s = store().await;
  let c = creator(&s, "UC1").await;
  assert_eq!(c, CreatorId(1));

  let t = s.resolve_tag(&tag("Gaming")).await.unwrap();
  assert_eq!(t.tag_id, TagId(1));
  let AssignOutcome::Created(a) =
    s.insert_assignment(c, t.tag_id, AccountId(7)).await.unwrap()
  else {
    panic!("expected a new assignment");
  };
  assert_eq!(a.assignment_id, AssignmentId(1));

  s.upsert_vote(AccountId(7), a.assignment_id, VoteValue::Up).await.unwrap();
  s.upsert_vote(AccountId(9), a.assignment_id, VoteValue::Down).await.unwrap();

  let listing = s.list_tags(c).await.unwrap();
  assert_eq!(listing.len(), 1);
  assert_eq!(listing[0].assignment_id, AssignmentId(1));
  assert_eq!(listing[0].tag_id, TagId(1));
  assert_eq!(listing[0].name, "Gaming");
  assert_eq!(listing[0].proposer_account_id, AccountId(7));
  assert_eq!(listing[0].score, 0);
}

#[tokio::test]
async fn list_tags_orders_by_assignment_and_ignores_other_creators() {
  let s = store().await;
  let c = creator(&s, "UC1").await;
  let other = creator(&s, "UC2").await;
  assignment(&s, c, "Zebra").await;
  assignment(&s, other, "Cooking").await;
  assignment(&s, c, "Apple").await;

  let names: Vec<_> = s
    .list_tags(c)
    .await
    .unwrap()
    .into_iter()
    .map(|l| l.name)
    .collect();
  assert_eq!(names, ["Zebra", "Apple"]);
  assert!(s.list_tags(CreatorId(77)).await.unwrap().is_empty());
}

#[tokio::test]
async fn search_matches_fragments_of_folded_names() {
  let s = store().await;
  let runner = creator(&s, "UC1").await;
  let cook = creator(&s, "UC2").await;
  let both = creator(&s, "UC3").await;
  assignment(&s, runner, "Speedrunning").await;
  assignment(&s, cook, "Cooking").await;
  assignment(&s, both, "Cooking").await;
  assignment(&s, both, "Speedrunning").await;

  let ids = |v: Vec<tagboard_core::creator::Creator>| {
    v.into_iter().map(|c| c.creator_id).collect::<Vec<_>>()
  };

  assert_eq!(ids(s.search_creators("speedrunning").await.unwrap()), [runner, both]);
  assert_eq!(ids(s.search_creators("run").await.unwrap()), [runner, both]);
  assert_eq!(ids(s.search_creators("cook").await.unwrap()), [cook, both]);
  assert!(s.search_creators("knitting").await.unwrap().is_empty());
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn decode_failures_are_not_unavailability() {
  let e = crate::Error::DateParse("garbage".into());
  assert!(!e.is_unavailable());
  assert!(crate::Error::Database(tokio_rusqlite::Error::ConnectionClosed).is_unavailable());
}

// ─── Deadlines ───────────────────────────────────────────────────────────────

/// Keep the connection thread busy long enough for a short deadline to expire
/// while the next call is still queued behind it.
fn stall_for(s: &SqliteStore, period: Duration) -> tokio::task::JoinHandle<()> {
  let s = s.clone();
  tokio::spawn(async move { s.stall(period).await.unwrap() })
}

#[tokio::test]
async fn timed_out_writes_never_land() {
  let s = store().await;
  let short = Deadline::new(Duration::from_millis(50));

  let busy = stall_for(&s, Duration::from_millis(300));
  tokio::time::sleep(Duration::from_millis(20)).await;
  let out = short
    .run(
      "create_creator",
      s.create_creator(NewCreator::new("UC1", "A", "about")),
    )
    .await;
  assert!(matches!(out, Err(CoreError::Timeout { .. })), "got {out:?}");
  busy.await.unwrap();

  // Calls run in order, so the abandoned one has been through the thread.
  assert!(s.get_creator(CreatorId(1)).await.unwrap().is_none());
  assert_eq!(creator(&s, "UC1").await, CreatorId(1));
}

#[tokio::test]
async fn retry_after_timed_out_assignment_creates_it() {
  let s = store().await;
  let c = creator(&s, "UC1").await;
  let t = s.resolve_tag(&tag("Gaming")).await.unwrap();
  let short = Deadline::new(Duration::from_millis(50));

  let busy = stall_for(&s, Duration::from_millis(300));
  tokio::time::sleep(Duration::from_millis(20)).await;
  let out = short
    .run(
      "assign_tag",
      s.insert_assignment(c, t.tag_id, AccountId(1)),
    )
    .await;
  assert!(matches!(out, Err(CoreError::Timeout { .. })), "got {out:?}");
  busy.await.unwrap();

  assert!(s.list_tags(c).await.unwrap().is_empty());
  assert!(matches!(
    s.insert_assignment(c, t.tag_id, AccountId(1)).await.unwrap(),
    AssignOutcome::Created(_)
  ));
}

// ─── Concurrency on a shared file ────────────────────────────────────────────

#[tokio::test]
async fn racing_ensure_account_yields_one_account() {
  let dir = tempfile::tempdir().unwrap();
  let stores = handles(&dir.path().join("tagboard.db"), 8).await;

  let mut set = JoinSet::new();
  for s in stores.iter().cloned() {
    set.spawn(async move { s.ensure_account("google|race").await.unwrap().account_id });
  }
  let ids: HashSet<_> = set.join_all().await.into_iter().collect();
  assert_eq!(ids.len(), 1);
}

#[tokio::test]
async fn racing_resolve_tag_yields_one_tag() {
  let dir = tempfile::tempdir().unwrap();
  let stores = handles(&dir.path().join("tagboard.db"), 8).await;

  let spellings = ["Gaming", "gaming", "GAMING", "GaMiNg"];
  let mut set = JoinSet::new();
  for (i, s) in stores.iter().cloned().enumerate() {
    let name = tag(spellings[i % spellings.len()]);
    set.spawn(async move { s.resolve_tag(&name).await.unwrap().tag_id });
  }
  let ids: HashSet<_> = set.join_all().await.into_iter().collect();
  assert_eq!(ids.len(), 1);
}

#[tokio::test]
async fn racing_assignments_create_exactly_one() {
  let dir = tempfile::tempdir().unwrap();
  let stores = handles(&dir.path().join("tagboard.db"), 8).await;
  let c = creator(&stores[0], "UC1").await;
  let t = stores[0].resolve_tag(&tag("Gaming")).await.unwrap().tag_id;

  let mut set = JoinSet::new();
  for (i, s) in stores.iter().cloned().enumerate() {
    set.spawn(async move { s.insert_assignment(c, t, AccountId(i as i64)).await.unwrap() });
  }
  let outcomes = set.join_all().await;

  let created: Vec<_> = outcomes
    .iter()
    .filter_map(|o| match o {
      AssignOutcome::Created(a) => Some(a.assignment_id),
      _ => None,
    })
    .collect();
  assert_eq!(created.len(), 1);
  assert!(outcomes.iter().all(|o| match o {
    AssignOutcome::Created(_) => true,
    AssignOutcome::Duplicate(id) => *id == created[0],
    _ => false,
  }));
  assert_eq!(stores[1].list_tags(c).await.unwrap().len(), 1);
}

#[tokio::test]
async fn racing_votes_from_one_account_leave_one_row() {
  let dir = tempfile::tempdir().unwrap();
  let stores = handles(&dir.path().join("tagboard.db"), 6).await;
  let c = creator(&stores[0], "UC1").await;
  let id = assignment(&stores[0], c, "Gaming").await;

  let mut set = JoinSet::new();
  for (i, s) in stores.iter().cloned().enumerate() {
    let value = if i % 2 == 0 { VoteValue::Up } else { VoteValue::Down };
    set.spawn(async move { s.upsert_vote(AccountId(7), id, value).await.unwrap() });
  }
  set.join_all().await;

  // Whichever write landed last, one account contributes exactly one vote.
  let score = stores[2].score(id).await.unwrap().unwrap();
  assert!(score == 1 || score == -1, "score was {score}");
}

#[tokio::test]
async fn data_survives_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("tagboard.db");

  let (account, c) = {
    let s = SqliteStore::open(&path).await.unwrap();
    let account = s.ensure_account("google|1").await.unwrap().account_id;
    let c = creator(&s, "UC1").await;
    let id = assignment(&s, c, "Gaming").await;
    s.upsert_vote(account, id, VoteValue::Up).await.unwrap();
    (account, c)
  };

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.ensure_account("google|1").await.unwrap().account_id, account);
  let listing = s.list_tags(c).await.unwrap();
  assert_eq!(listing.len(), 1);
  assert_eq!(listing[0].score, 1);
}
