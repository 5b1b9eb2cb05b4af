use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::sync::{LazyLock, Mutex, PoisonError};
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner for layer IDs.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Monotonic counter behind [`LayerId::fresh`].
static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Ids of layers that were removed from some document.
static RETIRED: LazyLock<Mutex<HashSet<LayerId>>> = LazyLock::new(Default::default);

/// Opaque, stable identifier of a layer.
/// Internally a 4-byte `Spur` index.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(Spur);

impl LayerId {
    /// Intern a string as a LayerId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        LayerId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Look up an already-interned id without creating one.
    pub fn lookup(s: &str) -> Option<Self> {
        INTERNER.get(s).map(LayerId)
    }

    /// Generate a never-before-seen ID with a type prefix (e.g. `text_12`).
    ///
    /// Candidates that were already interned (loaded documents, explicit ids)
    /// are skipped, so a fresh id never aliases a layer that existed earlier.
    pub fn fresh(prefix: &str) -> Self {
        loop {
            let n = COUNTER.fetch_add(1, Ordering::Relaxed);
            let candidate = format!("{prefix}_{n}");
            if INTERNER.get(&candidate).is_none() {
                return Self::intern(&candidate);
            }
        }
    }

    /// Record that the layer holding this id was removed. Undo may bring
    /// the same layer back, but no new layer may claim the id.
    pub fn retire(self) {
        RETIRED.lock().unwrap_or_else(PoisonError::into_inner).insert(self);
    }

    pub fn is_retired(self) -> bool {
        RETIRED.lock().unwrap_or_else(PoisonError::into_inner).contains(&self)
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LayerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LayerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(LayerId::intern(&s))
    }
}
