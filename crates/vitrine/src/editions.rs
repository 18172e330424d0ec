//! Edition names for listing labels.
//!
//! Listings reference editions by numeric id. Names come from the page's own
//! edition list when it has one, otherwise from a lookup the host performs,
//! persisted for an hour through the host's key-value store.
//!
//! [`EditionDirectory::labels`] reads the directory's names each time a label
//! is resolved, so dimensions built before a lookup finishes pick the name up
//! on their next recount.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use vitrine_bridge::{EngineConfig, KeyValueStore, LookupCache, LookupState, Ticket, TtlCache};
use vitrine_seeker::Labels;

const CACHE_PREFIX: &str = "vitrine_edition_";

type Names = Rc<RefCell<BTreeMap<String, String>>>;

/// Edition id to name, combining embedded names and cached lookups.
#[derive(Debug)]
pub struct EditionDirectory<S> {
    embedded: BTreeMap<String, String>,
    lookups: LookupCache<String, S>,
    unspecified: String,
    /// Every name known so far; shared with the labels handed out.
    names: Names,
}

impl<S: KeyValueStore> EditionDirectory<S> {
    pub fn new(store: S, config: &EngineConfig) -> Self {
        let cache = TtlCache::new(store, config.cache_ttl_ms).with_prefix(CACHE_PREFIX);
        EditionDirectory {
            embedded: BTreeMap::new(),
            lookups: LookupCache::new(cache),
            unspecified: String::from("Não especificado"),
            names: Names::default(),
        }
    }

    /// Names the page already carries.
    pub fn embedded<I, K, V>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (id, name) in names {
            let (id, name) = (id.into(), name.into());
            self.names.borrow_mut().insert(id.clone(), name.clone());
            self.embedded.insert(id, name);
        }
        self
    }

    pub fn unspecified(mut self, label: impl Into<String>) -> Self {
        self.unspecified = label.into();
        self
    }

    /// Starts a lookup for an edition the directory cannot name yet.
    ///
    /// Returns `None` when the name is known, embedded or cached.
    pub fn request(&mut self, id: &str, now: u64) -> Option<Ticket> {
        if id == "0" || self.embedded.contains_key(id) {
            return None;
        }
        let ticket = self.lookups.request(id, now);
        if ticket.is_none() {
            self.learn(id);
        }
        ticket
    }

    /// Records a lookup outcome. Failures keep the `Ed.<id>` label and are
    /// retried on the next request.
    pub fn complete(&mut self, ticket: Ticket, result: Result<String, String>, now: u64) -> bool {
        let id = ticket.key().to_string();
        let accepted = self.lookups.complete(ticket, result, now);
        if accepted {
            self.learn(&id);
        }
        accepted
    }

    fn learn(&self, id: &str) {
        if let Some(name) = self.lookups.get(id) {
            self.names.borrow_mut().insert(id.to_string(), name.clone());
        }
    }

    pub fn state(&self, id: &str) -> LookupState<'_, String> {
        self.lookups.state(id)
    }

    pub fn name(&self, id: &str) -> Option<&str> {
        self.embedded
            .get(id)
            .or_else(|| self.lookups.get(id))
            .map(String::as_str)
    }

    /// Label resolver that follows the directory as names arrive.
    pub fn labels(&self) -> Labels {
        let names = self.names.clone();
        let unspecified = self.unspecified.clone();
        Labels::new().formatter(move |id| match names.borrow().get(id) {
            Some(name) => name.clone(),
            None if id == "0" => unspecified.clone(),
            None => format!("Ed.{id}"),
        })
    }
}

/// `"Ed.<id>"` labels with `0` as unspecified.
pub fn fallback_labels(unspecified: &str) -> Labels {
    Labels::new().table([("0", unspecified)]).prefix("Ed.")
}
