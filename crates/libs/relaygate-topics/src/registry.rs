use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::TopicError;
use crate::name::{database_name, validate_type_id};
use crate::store::TopicStore;

/// Handle handed out for a topic. The topic name is its identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicHandle {
    pub name: String,
    pub type_id: String,
}

#[derive(Debug)]
struct TopicEntry {
    type_id: String,
    database: String,
    destroyed: bool,
}

impl TopicEntry {
    fn handle(&self, name: &str) -> TopicHandle {
        TopicHandle { name: name.to_string(), type_id: self.type_id.clone() }
    }
}

struct Inner<S> {
    store: S,
    topics: BTreeMap<String, TopicEntry>,
}

impl<S: TopicStore> Inner<S> {
    fn install(
        &mut self,
        action: &str,
        name: &str,
        type_id: &str,
        create: bool,
    ) -> Result<(), TopicError> {
        log::info!("{action} topic {name}");
        let database = database_name(name);
        self.store.open_backing(&database, create)?;
        self.topics.insert(
            name.to_string(),
            TopicEntry { type_id: type_id.to_string(), database, destroyed: false },
        );
        Ok(())
    }

    /// Forget every topic destroyed since the last call.
    fn reap(&mut self) -> Result<(), TopicError> {
        let destroyed: Vec<String> = self
            .topics
            .iter()
            .filter(|(_, entry)| entry.destroyed)
            .map(|(name, _)| name.clone())
            .collect();

        for name in destroyed {
            log::info!("reaping topic {name}");
            self.store.remove_entry(&name)?;
            if let Some(entry) = self.topics.remove(&name) {
                self.store.drop_backing(&entry.database)?;
            }
        }
        Ok(())
    }
}

/// Named topic registry over a durable [`TopicStore`].
pub struct TopicRegistry<S> {
    inner: Mutex<Inner<S>>,
}

impl<S: TopicStore> TopicRegistry<S> {
    /// Open the registry, re-installing every topic recorded in the store.
    /// Entries whose backing store has gone missing (a crash between
    /// destroying a topic and removing its entry) are dropped.
    pub fn open(store: S) -> Result<Self, TopicError> {
        let mut inner = Inner { store, topics: BTreeMap::new() };

        for (name, type_id) in inner.store.entries()? {
            match inner.install("recreate", &name, &type_id, false) {
                Ok(()) => {}
                Err(TopicError::BackingStoreMissing { database }) => {
                    log::warn!("dropping topic {name}: backing store {database} is missing");
                    inner.store.remove_entry(&name)?;
                }
                Err(err) => return Err(err),
            }
        }

        Ok(Self { inner: Mutex::new(inner) })
    }

    fn lock(&self) -> MutexGuard<'_, Inner<S>> {
        self.inner.lock().expect("topic registry mutex poisoned")
    }

    pub fn create(&self, name: &str, type_id: &str) -> Result<TopicHandle, TopicError> {
        validate_type_id(type_id)?;

        let mut inner = self.lock();
        inner.reap()?;

        if inner.topics.contains_key(name) {
            return Err(TopicError::AlreadyExists { name: name.to_string() });
        }

        inner.install("create", name, type_id, true)?;
        if let Err(err) = inner.store.insert_entry(name, type_id) {
            log::warn!("failed to record topic {name}: {err}");
            if let Some(entry) = inner.topics.remove(name) {
                if let Err(drop_err) = inner.store.drop_backing(&entry.database) {
                    log::warn!("leaked backing store {}: {drop_err}", entry.database);
                }
            }
            return Err(err);
        }
        Ok(TopicHandle { name: name.to_string(), type_id: type_id.to_string() })
    }

    pub fn retrieve(&self, name: &str) -> Result<TopicHandle, TopicError> {
        let mut inner = self.lock();
        inner.reap()?;

        inner
            .topics
            .get(name)
            .map(|entry| entry.handle(name))
            .ok_or_else(|| TopicError::NotFound { name: name.to_string() })
    }

    pub fn list_all(&self) -> Result<BTreeMap<String, TopicHandle>, TopicError> {
        let mut inner = self.lock();
        inner.reap()?;

        Ok(inner.topics.iter().map(|(name, entry)| (name.clone(), entry.handle(name))).collect())
    }

    /// Mark a topic destroyed. It disappears on the next registry call.
    pub fn destroy(&self, name: &str) -> Result<(), TopicError> {
        let mut inner = self.lock();
        match inner.topics.get_mut(name) {
            Some(entry) if !entry.destroyed => {
                entry.destroyed = true;
                Ok(())
            }
            _ => Err(TopicError::NotFound { name: name.to_string() }),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().topics.values().filter(|entry| !entry.destroyed).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hand the store back, e.g. to reopen it.
    pub fn into_store(self) -> S {
        match self.inner.into_inner() {
            Ok(inner) => inner.store,
            Err(poisoned) => poisoned.into_inner().store,
        }
    }
}
