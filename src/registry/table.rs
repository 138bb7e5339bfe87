//! # Registry table.
//!
//! [`Registry`] owns the handler records and the index sets that order them.
//! It is a plain data structure: the service wraps it in a lock and never holds
//! that lock while a handler runs.
//!
//! ## Lookup order
//! ```text
//! lookup_matching(code, source, defaults)
//!   1. first   (registration order)    code-list empty or contains code, range matches
//!   2. single  (precedence, index)     exactly `code`, range matches
//!   3. multi   (precedence, index)     contains `code`, range matches
//!   4. default (precedence, index)     range matches; skipped if 1-3 claimed the
//!                                      event, unless defaults == Always
//!   5. last    (registration order)    same test as 1.
//! ```
//! Pinned entries are also members of their category but are visited only at
//! their pin, never twice.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use crate::error::EventError;
use crate::handlers::HandlerSpec;
use crate::policies::{DefaultDelivery, Placement};
use crate::registry::{ActiveCodes, Category, HandlerEntry, HandlerId};
use crate::types::{ProcId, StatusCode};

type SortKey = (u8, HandlerId);

/// Result of a successful deregistration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The entry is gone.
    Removed,
    /// The entry is unlinked; it is dropped once in-flight chains release it.
    Deferred,
}

/// Handler registry: records plus category/precedence indexes.
#[derive(Debug, Default)]
pub struct Registry {
    next_index: u64,
    entries: HashMap<HandlerId, Arc<HandlerEntry>>,
    names: HashMap<Arc<str>, HandlerId>,
    first: Vec<HandlerId>,
    last: Vec<HandlerId>,
    single: HashMap<StatusCode, BTreeSet<SortKey>>,
    multi: BTreeSet<SortKey>,
    defaults: BTreeSet<SortKey>,
    active: ActiveCodes,
    /// Unlinked entries still referenced by a chain.
    retiring: HashSet<HandlerId>,
    closed: bool,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler and returns its record.
    ///
    /// Fails with [`EventError::DuplicateName`] if the name is live, or
    /// [`EventError::ShutdownInProgress`] after [`Registry::teardown`]. No state
    /// changes on failure.
    pub fn register(&mut self, spec: HandlerSpec) -> Result<Arc<HandlerEntry>, EventError> {
        if self.closed {
            return Err(EventError::ShutdownInProgress);
        }
        if self.names.contains_key(&spec.name) {
            return Err(EventError::DuplicateName {
                name: spec.name.to_string(),
            });
        }

        let id = HandlerId(self.next_index);
        self.next_index += 1;
        let entry = Arc::new(HandlerEntry::new(id, spec));
        let key = entry.sort_key();

        match entry.category() {
            Category::Single(code) => {
                self.single.entry(code).or_default().insert(key);
            }
            Category::Multi => {
                self.multi.insert(key);
            }
            Category::Default => {
                self.defaults.insert(key);
            }
        }
        match entry.placement() {
            Placement::First => self.first.push(id),
            Placement::Last => self.last.push(id),
            Placement::Precedence(_) => {}
        }
        for code in entry.codes() {
            self.active.add(*code);
        }

        self.names.insert(Arc::clone(entry.name()), id);
        self.entries.insert(id, Arc::clone(&entry));
        Ok(entry)
    }

    /// Removes a registration.
    ///
    /// The entry disappears from every index immediately (later lookups never
    /// see it, active counts drop now). If an in-flight chain still holds it,
    /// the record itself is kept until [`Registry::release`] drops the last
    /// reference and [`Removal::Deferred`] is returned.
    pub fn deregister(&mut self, id: HandlerId) -> Result<Removal, EventError> {
        let entry = match self.entries.get(&id) {
            Some(e) if !self.retiring.contains(&id) => Arc::clone(e),
            _ => {
                return Err(EventError::NotFound {
                    handler: id.to_string(),
                });
            }
        };

        self.unlink(&entry);
        if entry.in_use() > 0 {
            self.retiring.insert(id);
            Ok(Removal::Deferred)
        } else {
            self.entries.remove(&id);
            Ok(Removal::Removed)
        }
    }

    /// Removes a registration by name; see [`Registry::deregister`].
    pub fn deregister_by_name(&mut self, name: &str) -> Result<(HandlerId, Removal), EventError> {
        let id = self
            .names
            .get(name)
            .copied()
            .ok_or_else(|| EventError::NotFound {
                handler: name.to_string(),
            })?;
        self.deregister(id).map(|r| (id, r))
    }

    /// Handlers that should see `code` reported by `source`, in dispatch order.
    pub fn lookup_matching(
        &self,
        code: StatusCode,
        source: &ProcId,
        defaults: DefaultDelivery,
    ) -> Vec<Arc<HandlerEntry>> {
        let mut plan = Vec::new();
        let mut claimed = false;

        for e in self.pinned(&self.first) {
            if e.wants(code, source) {
                claimed |= !e.codes().is_empty();
                plan.push(Arc::clone(e));
            }
        }

        if self.active.is_active(code) {
            let singles = self.single.get(&code).into_iter().flatten();
            for e in self.walk(singles) {
                if e.range().matches(source) {
                    claimed = true;
                    plan.push(Arc::clone(e));
                }
            }
            for e in self.walk(self.multi.iter()) {
                if e.codes().contains(&code) && e.range().matches(source) {
                    claimed = true;
                    plan.push(Arc::clone(e));
                }
            }
        }

        if !claimed || defaults.is_always() {
            for e in self.walk(self.defaults.iter()) {
                if e.range().matches(source) {
                    plan.push(Arc::clone(e));
                }
            }
        }

        for e in self.pinned(&self.last) {
            if e.wants(code, source) {
                plan.push(Arc::clone(e));
            }
        }
        plan
    }

    /// Marks every entry of `plan` as referenced by one more chain.
    pub fn acquire(&self, plan: &[Arc<HandlerEntry>]) {
        for e in plan {
            e.acquire();
        }
    }

    /// Drops one chain reference from every entry of `plan`.
    ///
    /// Returns the names of deferred removals that completed.
    pub fn release(&mut self, plan: &[Arc<HandlerEntry>]) -> Vec<Arc<str>> {
        let mut finished = Vec::new();
        for e in plan {
            if e.release() == 0 && self.retiring.remove(&e.id()) {
                self.entries.remove(&e.id());
                finished.push(Arc::clone(e.name()));
            }
        }
        finished
    }

    /// Closes the registry and drops every registration.
    ///
    /// Fails with [`EventError::HandlersInUse`] (and keeps the records) if any
    /// entry is still referenced by a chain. The registry stays closed either way.
    pub fn teardown(&mut self) -> Result<usize, EventError> {
        self.closed = true;

        let mut busy: Vec<String> = self
            .entries
            .values()
            .filter(|e| e.in_use() > 0)
            .map(|e| e.name().to_string())
            .collect();
        if !busy.is_empty() {
            busy.sort_unstable();
            return Err(EventError::HandlersInUse { names: busy });
        }

        let removed = self.entries.len() - self.retiring.len();
        self.entries.clear();
        self.names.clear();
        self.first.clear();
        self.last.clear();
        self.single.clear();
        self.multi.clear();
        self.defaults.clear();
        self.active.clear();
        self.retiring.clear();
        Ok(removed)
    }

    /// Returns a live entry by handle.
    pub fn get(&self, id: HandlerId) -> Option<&Arc<HandlerEntry>> {
        if self.retiring.contains(&id) {
            return None;
        }
        self.entries.get(&id)
    }

    /// Sorted names of live registrations.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.keys().map(|n| n.to_string()).collect();
        names.sort_unstable();
        names
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The active-code tracker.
    pub fn active(&self) -> &ActiveCodes {
        &self.active
    }

    // ---------------------------
    // Helpers
    // ---------------------------

    fn pinned<'a>(&'a self, ids: &'a [HandlerId]) -> impl Iterator<Item = &'a Arc<HandlerEntry>> {
        ids.iter().filter_map(|id| self.entries.get(id))
    }

    /// Category walk in key order, skipping pinned entries (visited at their pin).
    fn walk<'a>(
        &'a self,
        keys: impl Iterator<Item = &'a SortKey> + 'a,
    ) -> impl Iterator<Item = &'a Arc<HandlerEntry>> + 'a {
        keys.filter_map(|(_, id)| self.entries.get(id))
            .filter(|e| !e.placement().is_pinned())
    }

    /// Removes `entry` from names, indexes and active counts.
    fn unlink(&mut self, entry: &HandlerEntry) {
        let id = entry.id();
        let key = entry.sort_key();

        self.names.remove(entry.name());
        match entry.category() {
            Category::Single(code) => {
                if let Some(set) = self.single.get_mut(&code) {
                    set.remove(&key);
                    if set.is_empty() {
                        self.single.remove(&code);
                    }
                }
            }
            Category::Multi => {
                self.multi.remove(&key);
            }
            Category::Default => {
                self.defaults.remove(&key);
            }
        }
        self.first.retain(|x| *x != id);
        self.last.retain(|x| *x != id);
        for code in entry.codes() {
            self.active.remove(*code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{Flow, HandlerFn, HandlerRef, Notification};
    use crate::types::Range;

    const C7: StatusCode = StatusCode(7);
    const C8: StatusCode = StatusCode(8);
    const C9: StatusCode = StatusCode(9);

    fn noop() -> HandlerRef {
        HandlerFn::arc(|_n: &mut Notification| Ok(Flow::Continue))
    }

    fn spec(name: &str) -> HandlerSpec {
        HandlerSpec::new(name, noop())
    }

    fn src() -> ProcId {
        ProcId::new("job", 0)
    }

    fn order(plan: &[Arc<HandlerEntry>]) -> Vec<String> {
        plan.iter().map(|e| e.name().to_string()).collect()
    }

    fn lookup(reg: &Registry, code: StatusCode) -> Vec<String> {
        order(&reg.lookup_matching(code, &src(), DefaultDelivery::WhenUnclaimed))
    }

    #[test]
    fn test_duplicate_name_rejected_without_mutation() {
        let mut reg = Registry::new();
        reg.register(spec("h").with_code(C7)).unwrap();
        let err = reg.register(spec("h").with_code(C8)).unwrap_err();

        assert_eq!(err, EventError::DuplicateName { name: "h".into() });
        assert_eq!(reg.len(), 1);
        assert!(!reg.active().is_active(C8));
    }

    #[test]
    fn test_insertion_index_is_monotonic() {
        let mut reg = Registry::new();
        let a = reg.register(spec("a")).unwrap().id();
        let b = reg.register(spec("b")).unwrap().id();
        reg.deregister(a).unwrap();
        let c = reg.register(spec("a")).unwrap().id();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_category_by_code_count() {
        let mut reg = Registry::new();
        let d = reg.register(spec("d")).unwrap();
        let s = reg.register(spec("s").with_code(C7)).unwrap();
        let m = reg.register(spec("m").with_codes([C7, C8])).unwrap();
        assert_eq!(d.category(), Category::Default);
        assert_eq!(s.category(), Category::Single(C7));
        assert_eq!(m.category(), Category::Multi);
    }

    #[test]
    fn test_fixed_category_order() {
        let mut reg = Registry::new();
        reg.register(spec("last").with_placement(Placement::Last)).unwrap();
        reg.register(spec("multi").with_codes([C7, C8])).unwrap();
        reg.register(spec("dflt")).unwrap();
        reg.register(spec("single").with_code(C7)).unwrap();
        reg.register(spec("first").with_code(C7).with_placement(Placement::First))
            .unwrap();

        assert_eq!(lookup(&reg, C7), ["first", "single", "multi", "last"]);
        // C9 is claimed by nobody: defaults run, pinned-first (code 7 only) does not.
        assert_eq!(lookup(&reg, C9), ["dflt", "last"]);
    }

    #[test]
    fn test_pinned_first_without_codes_does_not_claim() {
        let mut reg = Registry::new();
        reg.register(spec("audit").with_placement(Placement::First)).unwrap();
        reg.register(spec("dflt")).unwrap();

        assert_eq!(lookup(&reg, C9), ["audit", "dflt"]);

        reg.register(spec("s").with_code(C9)).unwrap();
        assert_eq!(lookup(&reg, C9), ["audit", "s"]);
    }

    #[test]
    fn test_precedence_then_insertion_inside_category() {
        let mut reg = Registry::new();
        reg.register(spec("p50-a").with_code(C7).with_placement(Placement::Precedence(50)))
            .unwrap();
        reg.register(spec("p10").with_code(C7).with_placement(Placement::Precedence(10)))
            .unwrap();
        reg.register(spec("p50-b").with_code(C7).with_placement(Placement::Precedence(50)))
            .unwrap();
        reg.register(spec("p200").with_code(C7).with_placement(Placement::Precedence(200)))
            .unwrap();

        assert_eq!(lookup(&reg, C7), ["p10", "p50-a", "p50-b", "p200"]);
    }

    #[test]
    fn test_pinned_sequences_keep_registration_order() {
        let mut reg = Registry::new();
        reg.register(spec("f1").with_placement(Placement::First)).unwrap();
        reg.register(spec("l1").with_placement(Placement::Last)).unwrap();
        reg.register(spec("f2").with_placement(Placement::First)).unwrap();
        reg.register(spec("l2").with_placement(Placement::Last)).unwrap();

        assert_eq!(lookup(&reg, C7), ["f1", "f2", "l1", "l2"]);
    }

    #[test]
    fn test_pinned_entry_visited_once() {
        let mut reg = Registry::new();
        reg.register(spec("pinned").with_code(C7).with_placement(Placement::Last))
            .unwrap();
        assert_eq!(lookup(&reg, C7), ["pinned"]);
    }

    #[test]
    fn test_defaults_only_when_unclaimed() {
        let mut reg = Registry::new();
        reg.register(spec("dflt")).unwrap();
        assert_eq!(lookup(&reg, C7), ["dflt"]);

        reg.register(spec("s").with_code(C7)).unwrap();
        assert_eq!(lookup(&reg, C7), ["s"]);

        let always = reg.lookup_matching(C7, &src(), DefaultDelivery::Always);
        assert_eq!(order(&always), ["s", "dflt"]);
    }

    #[test]
    fn test_range_filters_every_category() {
        let mut reg = Registry::new();
        let only_b = Range::procs([ProcId::wildcard("b")]).unwrap();
        reg.register(spec("s").with_code(C7).with_range(only_b.clone()))
            .unwrap();
        reg.register(spec("d").with_range(only_b)).unwrap();
        reg.register(spec("any")).unwrap();

        // Source outside the range: the single-code handler does not match,
        // so the event stays unclaimed and the open default sees it.
        assert_eq!(lookup(&reg, C7), ["any"]);

        let from_b = reg.lookup_matching(C7, &ProcId::new("b", 4), DefaultDelivery::WhenUnclaimed);
        assert_eq!(order(&from_b), ["s"]);
    }

    #[test]
    fn test_empty_plan_when_nothing_matches() {
        let mut reg = Registry::new();
        reg.register(spec("s").with_code(C7)).unwrap();
        assert!(lookup(&reg, C9).is_empty());
    }

    #[test]
    fn test_lookup_is_deterministic() {
        let mut reg = Registry::new();
        for i in 0..20u8 {
            reg.register(
                spec(&format!("h{i}"))
                    .with_codes([C7, StatusCode(i32::from(i))])
                    .with_placement(Placement::Precedence(i % 3)),
            )
            .unwrap();
        }
        assert_eq!(lookup(&reg, C7), lookup(&reg, C7));
    }

    #[test]
    fn test_active_counts_track_live_subscribers() {
        let mut reg = Registry::new();
        let a = reg.register(spec("a").with_code(C7)).unwrap().id();
        let b = reg.register(spec("b").with_codes([C7, C8])).unwrap().id();
        reg.register(spec("dflt")).unwrap();

        assert_eq!(reg.active().count(C7), 2);
        assert_eq!(reg.active().count(C8), 1);
        assert_eq!(reg.active().len(), 2);

        reg.deregister(a).unwrap();
        assert_eq!(reg.active().count(C7), 1);
        reg.deregister(b).unwrap();
        assert!(reg.active().is_empty());
    }

    #[test]
    fn test_deregister_unknown_is_not_found() {
        let mut reg = Registry::new();
        let id = reg.register(spec("a")).unwrap().id();
        reg.deregister(id).unwrap();

        assert!(matches!(reg.deregister(id), Err(EventError::NotFound { .. })));
        assert!(matches!(
            reg.deregister_by_name("nope"),
            Err(EventError::NotFound { .. })
        ));
    }

    #[test]
    fn test_deregister_in_use_is_deferred() {
        let mut reg = Registry::new();
        let e = reg.register(spec("busy").with_code(C7)).unwrap();
        let plan = reg.lookup_matching(C7, &src(), DefaultDelivery::WhenUnclaimed);
        reg.acquire(&plan);

        assert_eq!(reg.deregister(e.id()).unwrap(), Removal::Deferred);
        assert!(reg.get(e.id()).is_none());
        assert!(!reg.active().is_active(C7));
        assert!(lookup(&reg, C7).is_empty());
        // The name is free again while the old record drains.
        reg.register(spec("busy").with_code(C8)).unwrap();

        let finished = reg.release(&plan);
        assert_eq!(finished.len(), 1);
        assert_eq!(&*finished[0], "busy");
        assert_eq!(e.in_use(), 0);
    }

    #[test]
    fn test_teardown_fails_loudly_on_in_use() {
        let mut reg = Registry::new();
        reg.register(spec("busy").with_code(C7)).unwrap();
        reg.register(spec("idle")).unwrap();
        let plan = reg.lookup_matching(C7, &src(), DefaultDelivery::WhenUnclaimed);
        reg.acquire(&plan);

        let err = reg.teardown().unwrap_err();
        assert_eq!(err, EventError::HandlersInUse { names: vec!["busy".into()] });
        assert!(matches!(reg.register(spec("x")), Err(EventError::ShutdownInProgress)));

        reg.release(&plan);
        assert_eq!(reg.teardown().unwrap(), 2);
        assert!(reg.is_empty());
    }
}
