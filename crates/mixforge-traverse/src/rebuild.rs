//! Rebuilding container-like objects from reconstructed items.
//!
//! A sequence-like object whose items changed is rebuilt by the first
//! applicable strategy in [`RebuildStrategy::PRIORITY`] that succeeds. The
//! class's own `from_items` hook comes first; the builtin fallbacks keep the
//! flavor of the original where they can.

use std::sync::Arc;

use mixforge_core::{ClassDef, Heap, SequenceFlavor, Value};
use tracing::warn;

use crate::error::{Result, TraversalError};

/// One way of turning items back into a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildStrategy {
    /// The class's `from_items` hook
    FromItems,
    /// A builtin tuple, for tuple-like classes
    Tuple,
    /// A builtin set, for set-like classes
    Set,
    /// A builtin list
    List,
}

impl RebuildStrategy {
    /// Strategies in the order they are tried.
    pub const PRIORITY: [RebuildStrategy; 4] = [Self::FromItems, Self::Tuple, Self::Set, Self::List];

    fn applies(self, class: &ClassDef, flavor: SequenceFlavor) -> bool {
        match self {
            Self::FromItems => class.hooks().from_items.is_some(),
            Self::Tuple => flavor == SequenceFlavor::Tuple,
            Self::Set => flavor == SequenceFlavor::Set,
            Self::List => true,
        }
    }

    fn build(self, heap: &mut Heap, class: &ClassDef, items: &[Value]) -> anyhow::Result<Value> {
        Ok(match self {
            Self::FromItems => match &class.hooks().from_items {
                Some(hook) => hook(heap, items.to_vec())?,
                None => anyhow::bail!("{} has no from_items hook", class.key()),
            },
            Self::Tuple => heap.tuple(items.to_vec()),
            Self::Set => heap.set(items.to_vec()),
            Self::List => heap.list(items.to_vec()),
        })
    }
}

/// Rebuild a sequence-like object of `class` holding `items`.
///
/// Returns the new value together with the strategy that produced it. A
/// failing `from_items` hook is logged and the builtin fallback is used.
pub fn rebuild_sequence(
    heap: &mut Heap,
    class: &Arc<ClassDef>,
    flavor: SequenceFlavor,
    items: &[Value],
) -> Result<(Value, RebuildStrategy)> {
    let mut last_error = None;
    for strategy in RebuildStrategy::PRIORITY {
        if !strategy.applies(class, flavor) {
            continue;
        }
        match strategy.build(heap, class, items) {
            Ok(value) => {
                if strategy != RebuildStrategy::FromItems {
                    warn!(
                        class = %class.key(),
                        fallback = ?strategy,
                        "rebuilt container-like object as a builtin container"
                    );
                }
                return Ok((value, strategy));
            }
            Err(e) => {
                warn!(class = %class.key(), strategy = ?strategy, error = %e, "rebuild strategy failed");
                last_error = Some(e);
            }
        }
    }
    Err(TraversalError::Transform(last_error.unwrap_or_else(|| {
        anyhow::anyhow!("no rebuild strategy applies to {}", class.key())
    })))
}
