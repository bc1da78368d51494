//! Process-wide registry of backend logger names.
//!
//! A name can be held by one live logger at a time. Registering a taken name
//! fails unless the caller asks to replace the holder; a replaced holder's
//! later drop must not evict its successor, hence the generation ids.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, warn};

static REGISTRY: Mutex<BTreeMap<String, u64>> = Mutex::new(BTreeMap::new());
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// RAII claim on a logger name. Dropping it releases the name.
#[derive(Debug)]
pub struct Registration {
    name: String,
    id: u64,
}

impl Registration {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut registry = REGISTRY.lock();
        if registry.get(&self.name) == Some(&self.id) {
            registry.remove(&self.name);
            debug!(logger = %self.name, "released logger name");
        }
    }
}

/// Claim `name`. Returns `None` if it is taken and `replace` is false.
pub fn register(name: &str, replace: bool) -> Option<Registration> {
    let mut registry = REGISTRY.lock();

    if registry.contains_key(name) {
        if !replace {
            warn!(logger = name, "logger name already registered");
            return None;
        }
        debug!(logger = name, "replacing registered logger");
    }

    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    registry.insert(name.to_string(), id);
    Some(Registration {
        name: name.to_string(),
        id,
    })
}

pub fn is_registered(name: &str) -> bool {
    REGISTRY.lock().contains_key(name)
}
