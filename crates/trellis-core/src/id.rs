use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);
static FRESH: AtomicU64 = AtomicU64::new(0);

/// Interned identifier shared by nodes, pins, keyframes and compositions.
///
/// Equality and hashing work on the interner key, so ids are cheap to keep in
/// selection sets and command payloads.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(Spur);

/// A composition uses the id of the node that stands for it in its parent.
pub type CompositionId = ItemId;

impl ItemId {
    pub fn intern(name: &str) -> Self {
        Self(INTERNER.get_or_intern(name))
    }

    /// Look up an id without interning. `None` if the name was never seen.
    pub fn existing(name: &str) -> Option<Self> {
        INTERNER.get(name).map(Self)
    }

    pub fn as_str(&self) -> &'static str {
        INTERNER.resolve(&self.0)
    }

    /// A new id no other call has produced, named `<kind>_<n>`.
    pub fn fresh(kind: &str) -> Self {
        loop {
            let n = FRESH.fetch_add(1, Ordering::Relaxed);
            let name = format!("{kind}_{n}");
            if Self::existing(&name).is_none() {
                return Self::intern(&name);
            }
        }
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({:?})", self.as_str())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ItemId {
    fn from(name: &str) -> Self {
        Self::intern(name)
    }
}

impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::intern(&name))
    }
}
