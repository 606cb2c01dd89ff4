//! Defect cache: one remote fetch per (stream, snapshot) key per build.
//!
//! The cache memoizes failures as well as successes: the first failed fetch
//! for a key is reported by its caller, and every later block sharing the
//! key gets a quiet `PreviouslyFailed` error instead of a retry.

use crate::error::RetrievalError;
use crate::models::defect::DefectRecord;
use crate::session::Session;
use std::collections::HashMap;
use std::rc::Rc;

enum CacheEntry {
    Loaded(Rc<[DefectRecord]>),
    Failed(String),
}

#[derive(Default)]
pub struct DefectCache {
    entries: HashMap<(String, Option<String>), CacheEntry>,
}

impl DefectCache {
    pub fn new() -> Self {
        DefectCache::default()
    }

    /// Return the cached defect sequence for the key, fetching it through
    /// `session` exactly once on first use.
    pub fn get_or_fetch(
        &mut self,
        session: &dyn Session,
        stream: &str,
        snapshot: Option<&str>,
    ) -> Result<Rc<[DefectRecord]>, RetrievalError> {
        let key = (stream.to_string(), snapshot.map(str::to_string));
        if let Some(entry) = self.entries.get(&key) {
            return match entry {
                CacheEntry::Loaded(defects) => Ok(Rc::clone(defects)),
                CacheEntry::Failed(message) => Err(RetrievalError::PreviouslyFailed {
                    message: message.clone(),
                }),
            };
        }

        match session.fetch(stream, snapshot) {
            Ok(defects) => {
                let defects: Rc<[DefectRecord]> = Rc::from(defects);
                self.entries.insert(key, CacheEntry::Loaded(Rc::clone(&defects)));
                Ok(defects)
            }
            Err(err) => {
                self.entries.insert(key, CacheEntry::Failed(err.to_string()));
                Err(err)
            }
        }
    }
}
