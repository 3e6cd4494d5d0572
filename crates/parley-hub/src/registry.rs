//! Registry: the shared member table and coordinator state.
//!
//! One instance per running hub, shared via `Arc` by every connection
//! worker and the sweeper. All state sits behind a single mutex:
//! admission, removal, re-election, sweeping and every consistent read
//! are mutually exclusive. Delivery under the lock is safe because
//! [`Endpoint::send_line`](crate::Endpoint::send_line) only enqueues.
//!
//! Invariants:
//! - no members ⇔ no coordinator
//! - member identifiers are distinct
//! - after the coordinator leaves, the earliest-admitted remaining member
//!   takes over

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::HubError;
use crate::log::MessageLog;
use crate::session::Session;
use crate::stats::{HubStats, StatsSnapshot};
use crate::types::ClientId;

/// Notification texts sent by the hub itself.
pub mod notice {
    use std::fmt::Display;

    /// Sent to a member promoted by re-election.
    pub const PROMOTED: &str = "You are now the new coordinator.";

    pub fn left(id: impl Display) -> String {
        format!("{id} has left the chat")
    }

    pub fn new_coordinator(id: impl Display) -> String {
        format!("New coordinator assigned: {id}")
    }

    pub fn user_not_found(id: impl Display) -> String {
        format!("User {id} not found.")
    }
}

/// One line of the member listing, taken under the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: ClientId,
    pub origin: String,
    pub is_coordinator: bool,
}

struct Inner {
    /// Insertion order is election order.
    members: IndexMap<ClientId, Session>,
    coordinator: Option<ClientId>,
    log: MessageLog,
}

pub struct Registry {
    inner: Mutex<Inner>,
    stats: HubStats,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                members: IndexMap::new(),
                coordinator: None,
                log: MessageLog::new(),
            }),
            stats: HubStats::default(),
        }
    }

    // ── Membership ───────────────────────────────────────────────────

    /// Register a session under its identifier and return the coordinator
    /// as of this admission.
    ///
    /// Fails without touching the table if the identifier is taken. The
    /// first member admitted into an empty registry becomes coordinator.
    pub fn admit(&self, session: Session) -> Result<ClientId, HubError> {
        self.admit_with(session, |_| None)
    }

    /// Like [`admit`](Self::admit), but `welcome` may produce a first line
    /// for the newcomer. It is delivered before the lock is released, so
    /// no notice about later membership changes can overtake it.
    pub fn admit_with<F>(&self, session: Session, welcome: F) -> Result<ClientId, HubError>
    where
        F: FnOnce(&ClientId) -> Option<String>,
    {
        let mut inner = self.inner.lock();
        let id = session.id().clone();

        if inner.members.contains_key(&id) {
            self.stats.rejected.inc();
            debug!(id = %id, "admission rejected: identifier in use");
            return Err(HubError::DuplicateIdentifier { id });
        }

        let coordinator = match &inner.coordinator {
            Some(current) => current.clone(),
            None => {
                info!(id = %id, "coordinator assigned");
                id.clone()
            }
        };
        if let Some(line) = welcome(&coordinator) {
            session.deliver(&line);
        }
        inner.members.insert(id.clone(), session);
        inner.coordinator = Some(coordinator.clone());
        self.stats.admitted.inc();
        info!(id = %id, members = inner.members.len(), "member joined");
        Ok(coordinator)
    }

    /// Remove a member by identifier. Returns `false` if it was not present.
    ///
    /// Remaining members are told who left; if the coordinator left, a new
    /// one is elected immediately.
    pub fn remove(&self, id: &str) -> bool {
        let mut inner = self.inner.lock();
        self.remove_locked(&mut inner, id).is_some()
    }

    /// Remove `session` only if it is still the registration on file for
    /// its identifier.
    ///
    /// Connection workers call this on disconnect; a worker whose session
    /// was already evicted (and whose identifier may since have been taken
    /// by a new connection) must not remove the newcomer.
    pub fn leave(&self, session: &Session) -> bool {
        let mut inner = self.inner.lock();
        let current = inner
            .members
            .get(session.id())
            .is_some_and(|s| s.same_registration(session));
        if !current {
            return false;
        }
        self.remove_locked(&mut inner, session.id().as_str()).is_some()
    }

    /// Evict every member whose endpoint is no longer alive.
    ///
    /// Dead members are picked from one consistent view and removed through
    /// the same path as a voluntary departure, all inside one critical
    /// section. Returns the evicted identifiers in election order.
    pub fn sweep(&self) -> Vec<ClientId> {
        let mut inner = self.inner.lock();
        let dead: Vec<ClientId> = inner
            .members
            .iter()
            .filter(|(_, session)| !session.is_alive())
            .map(|(id, _)| id.clone())
            .collect();

        for id in &dead {
            if self.remove_locked(&mut inner, id.as_str()).is_some() {
                self.stats.evicted.inc();
                info!(id = %id, "evicted dead member");
            }
        }
        dead
    }

    fn remove_locked(&self, inner: &mut Inner, id: &str) -> Option<Session> {
        // shift_remove keeps the remaining members in admission order
        let (id, session) = inner.members.shift_remove_entry(id)?;
        session.close();
        self.stats.departed.inc();
        info!(id = %id, members = inner.members.len(), "member left");

        fan_out(&inner.members, &notice::left(&id));

        if inner.coordinator.as_ref() == Some(&id) {
            self.elect_locked(inner);
        }
        Some(session)
    }

    fn elect_locked(&self, inner: &mut Inner) {
        let Some((next_id, next)) = inner.members.first() else {
            inner.coordinator = None;
            info!("registry empty, no coordinator");
            return;
        };

        inner.coordinator = Some(next_id.clone());
        self.stats.elections.inc();
        info!(id = %next_id, "new coordinator elected");

        fan_out(&inner.members, &notice::new_coordinator(next_id));
        next.deliver(notice::PROMOTED);
    }

    // ── Views ────────────────────────────────────────────────────────

    /// Copy of the current membership, in admission order.
    pub fn snapshot(&self) -> IndexMap<ClientId, Session> {
        self.inner.lock().members.clone()
    }

    pub fn coordinator(&self) -> Option<ClientId> {
        self.inner.lock().coordinator.clone()
    }

    /// Member listing with origin and coordinator flag, from one view.
    pub fn roster(&self) -> Vec<RosterEntry> {
        let inner = self.inner.lock();
        inner
            .members
            .iter()
            .map(|(id, session)| RosterEntry {
                id: id.clone(),
                origin: session.origin(),
                is_coordinator: inner.coordinator.as_ref() == Some(id),
            })
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.lock().members.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().members.is_empty()
    }

    // ── Delivery ─────────────────────────────────────────────────────

    /// Deliver a line to one member. Returns `false` if it is not registered.
    pub fn deliver_to(&self, id: &str, line: &str) -> bool {
        let inner = self.inner.lock();
        match inner.members.get(id) {
            Some(session) => {
                session.deliver(line);
                true
            }
            None => false,
        }
    }

    /// Deliver several lines to one member with nothing interleaved.
    /// Returns `false` if it is not registered.
    pub fn deliver_all_to(&self, id: &str, lines: &[String]) -> bool {
        let inner = self.inner.lock();
        let Some(session) = inner.members.get(id) else {
            return false;
        };
        for line in lines {
            session.deliver(line);
        }
        true
    }

    /// Deliver a line to every current member. Returns how many were reached.
    pub fn fan_out(&self, line: &str) -> usize {
        let inner = self.inner.lock();
        fan_out(&inner.members, line)
    }

    /// Append a log entry and fan a line out, atomically with respect to
    /// membership changes.
    pub fn log_and_fan_out(&self, entry: String, line: &str) -> usize {
        let mut inner = self.inner.lock();
        inner.log.append(entry);
        fan_out(&inner.members, line)
    }

    /// Copy of the message log, oldest first.
    pub fn message_log(&self) -> Vec<String> {
        self.inner.lock().log.entries()
    }

    /// Number of logged messages.
    pub fn log_len(&self) -> usize {
        self.inner.lock().log.len()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub(crate) fn counters(&self) -> &HubStats {
        &self.stats
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Registry")
            .field("members", &inner.members.len())
            .field("coordinator", &inner.coordinator)
            .finish()
    }
}

fn fan_out(members: &IndexMap<ClientId, Session>, line: &str) -> usize {
    for session in members.values() {
        session.deliver(line);
    }
    members.len()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::session::testing::{session, RecordingEndpoint};

    fn id(s: &str) -> ClientId {
        ClientId::new(s).unwrap()
    }

    /// Admit members in order, returning their recording endpoints.
    fn populated(names: &[&str]) -> (Registry, Vec<Arc<RecordingEndpoint>>) {
        let registry = Registry::new();
        let mut endpoints = Vec::new();
        for name in names {
            let (s, ep) = session(name);
            registry.admit(s).unwrap();
            endpoints.push(ep);
        }
        (registry, endpoints)
    }

    #[test]
    fn first_admit_becomes_coordinator() {
        let registry = Registry::new();
        assert_eq!(registry.coordinator(), None);

        let (alice, _) = session("alice");
        assert_eq!(registry.admit(alice).unwrap(), id("alice"));
        assert_eq!(registry.coordinator(), Some(id("alice")));

        let (bob, _) = session("bob");
        assert_eq!(registry.admit(bob).unwrap(), id("alice"));
        assert_eq!(registry.coordinator(), Some(id("alice")));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn duplicate_admit_rejected_without_mutation() {
        let (registry, eps) = populated(&["alice"]);
        let (dup, dup_ep) = session("alice");

        let err = registry.admit(dup).unwrap_err();
        assert_eq!(err, HubError::DuplicateIdentifier { id: id("alice") });
        assert_eq!(registry.len(), 1);

        // The first registration is untouched
        registry.deliver_to("alice", "ping");
        assert_eq!(eps[0].lines(), vec!["ping".to_string()]);
        assert!(dup_ep.lines().is_empty());
        assert_eq!(registry.stats().rejected, 1);
    }

    #[test]
    fn remove_absent_is_noop() {
        let (registry, eps) = populated(&["alice"]);
        assert!(!registry.remove("nobody"));
        assert_eq!(registry.len(), 1);
        assert!(eps[0].lines().is_empty());
    }

    #[test]
    fn remove_notifies_remaining_and_closes() {
        let (registry, eps) = populated(&["alice", "bob", "carol"]);

        assert!(registry.remove("bob"));
        assert!(eps[1].was_closed());
        assert_eq!(eps[0].lines(), vec!["bob has left the chat".to_string()]);
        assert_eq!(eps[2].lines(), vec!["bob has left the chat".to_string()]);
        // Coordinator unchanged, no election
        assert_eq!(registry.coordinator(), Some(id("alice")));
        assert_eq!(registry.stats().elections, 0);
    }

    #[test]
    fn election_picks_earliest_remaining() {
        let (registry, eps) = populated(&["a", "b", "c"]);

        registry.remove("a");
        assert_eq!(registry.coordinator(), Some(id("b")));

        assert_eq!(
            eps[1].lines(),
            vec![
                "a has left the chat".to_string(),
                "New coordinator assigned: b".to_string(),
                "You are now the new coordinator.".to_string(),
            ]
        );
        assert_eq!(
            eps[2].lines(),
            vec![
                "a has left the chat".to_string(),
                "New coordinator assigned: b".to_string(),
            ]
        );
    }

    #[test]
    fn election_order_survives_middle_removal() {
        let (registry, _) = populated(&["a", "b", "c", "d"]);
        registry.remove("b");
        registry.remove("a");
        assert_eq!(registry.coordinator(), Some(id("c")));
    }

    #[test]
    fn removing_last_member_clears_coordinator() {
        let (registry, _) = populated(&["solo"]);
        registry.remove("solo");
        assert_eq!(registry.coordinator(), None);
        assert!(registry.is_empty());

        // Next admit starts a fresh term
        let (next, _) = session("next");
        registry.admit(next).unwrap();
        assert_eq!(registry.coordinator(), Some(id("next")));
    }

    #[test]
    fn readmitted_identifier_goes_to_back_of_line() {
        let (registry, _) = populated(&["a", "b"]);
        registry.remove("b");
        let (b2, _) = session("b");
        registry.admit(b2).unwrap();
        let (c, _) = session("c");
        registry.admit(c).unwrap();

        let order: Vec<_> = registry.snapshot().keys().cloned().collect();
        assert_eq!(order, vec![id("a"), id("b"), id("c")]);
    }

    #[test]
    fn sweep_evicts_dead_and_reelects() {
        let (registry, eps) = populated(&["alice", "bob", "carol"]);
        eps[0].kill();
        eps[2].kill();

        let evicted = registry.sweep();
        assert_eq!(evicted, vec![id("alice"), id("carol")]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.coordinator(), Some(id("bob")));
        assert!(eps[1]
            .lines()
            .contains(&"New coordinator assigned: bob".to_string()));

        let stats = registry.stats();
        assert_eq!(stats.evicted, 2);
        assert_eq!(stats.departed, 2);
        assert_eq!(stats.elections, 1);
    }

    #[test]
    fn sweep_with_no_dead_changes_nothing() {
        let (registry, eps) = populated(&["alice", "bob"]);
        let before: Vec<_> = registry.snapshot().keys().cloned().collect();

        assert!(registry.sweep().is_empty());

        let after: Vec<_> = registry.snapshot().keys().cloned().collect();
        assert_eq!(before, after);
        assert_eq!(registry.coordinator(), Some(id("alice")));
        assert!(registry.message_log().is_empty());
        assert!(eps.iter().all(|ep| ep.lines().is_empty()));
    }

    #[test]
    fn sweep_on_empty_registry() {
        let registry = Registry::new();
        assert!(registry.sweep().is_empty());
        assert_eq!(registry.coordinator(), None);
    }

    #[test]
    fn sweep_everyone_dead_leaves_no_coordinator() {
        let (registry, eps) = populated(&["a", "b"]);
        eps.iter().for_each(|ep| ep.kill());
        registry.sweep();
        assert!(registry.is_empty());
        assert_eq!(registry.coordinator(), None);
    }

    #[test]
    fn stale_leave_does_not_remove_newcomer() {
        let registry = Registry::new();
        let (old, old_ep) = session("alice");
        registry.admit(old.clone()).unwrap();

        old_ep.kill();
        registry.sweep();

        let (fresh, fresh_ep) = session("alice");
        registry.admit(fresh.clone()).unwrap();

        // The evicted worker finally notices and cleans up
        assert!(!registry.leave(&old));
        assert!(registry.contains("alice"));
        assert!(!fresh_ep.was_closed());

        assert!(registry.leave(&fresh));
        assert!(registry.is_empty());
    }

    #[test]
    fn roster_marks_coordinator() {
        let (registry, _) = populated(&["alice", "bob"]);
        let roster = registry.roster();
        assert_eq!(roster.len(), 2);
        assert!(roster[0].is_coordinator);
        assert!(!roster[1].is_coordinator);
        assert_eq!(roster[1].origin, "127.0.0.1:4000");
    }

    #[test]
    fn snapshot_is_detached() {
        let (registry, _) = populated(&["alice"]);
        let snap = registry.snapshot();
        registry.remove("alice");
        assert_eq!(snap.len(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn fan_out_counts_members() {
        let (registry, eps) = populated(&["a", "b", "c"]);
        assert_eq!(registry.fan_out("hey"), 3);
        assert!(eps.iter().all(|ep| ep.lines() == vec!["hey".to_string()]));
        assert!(!registry.deliver_to("zed", "hey"));
    }

    #[test]
    fn welcome_line_is_first_and_names_coordinator() {
        let (registry, _) = populated(&["alice"]);
        let (bob, bob_ep) = session("bob");

        let coordinator = registry
            .admit_with(bob, |c| Some(format!("coordinator is {c}")))
            .unwrap();
        assert_eq!(coordinator, id("alice"));

        registry.remove("alice");
        assert_eq!(
            bob_ep.lines(),
            vec![
                "coordinator is alice".to_string(),
                notice::left("alice"),
                notice::new_coordinator("bob"),
                notice::PROMOTED.to_string(),
            ]
        );
    }

    #[test]
    fn rejected_admission_gets_no_welcome() {
        let (registry, _) = populated(&["alice"]);
        let (dup, dup_ep) = session("alice");
        let called = std::cell::Cell::new(false);

        assert!(registry
            .admit_with(dup, |_| {
                called.set(true);
                Some("welcome".into())
            })
            .is_err());
        assert!(!called.get());
        assert!(dup_ep.lines().is_empty());
    }

    #[test]
    fn deliver_all_to_keeps_lines_together() {
        let (registry, eps) = populated(&["alice", "bob"]);
        let lines = vec!["one".to_string(), "two".to_string()];

        assert!(registry.deliver_all_to("bob", &lines));
        assert_eq!(eps[1].lines(), lines);
        assert!(eps[0].lines().is_empty());
        assert!(!registry.deliver_all_to("zed", &lines));
    }
}
