//! Lazily resolved layer-type handles.
//!
//! Layer types referenced by identifier do not have to exist at the time a
//! layer is declared; resolution happens at most once, on first access, and
//! the result is cached for the lifetime of the cell.

use std::fmt;
use std::sync::OnceLock;

/// A resolved layer type: a named, typed collection of parallel annotations
/// or structures attached to items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerType {
    pub id: String,
    pub structural: bool,
}

impl LayerType {
    pub fn new(id: impl Into<String>, structural: bool) -> Self {
        Self {
            id: id.into(),
            structural,
        }
    }
}

/// How a [`LayerTypeCell`] obtains its value on first access.
enum LayerTypeSource {
    /// Look the identifier up in a registry closure.
    ById {
        id: String,
        registry: Box<dyn Fn(&str) -> Option<LayerType> + Send + Sync>,
    },
    /// Construct directly through a factory closure.
    ByFactory(Box<dyn Fn() -> LayerType + Send + Sync>),
}

impl fmt::Debug for LayerTypeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerTypeSource::ById { id, .. } => f.debug_struct("ById").field("id", id).finish(),
            LayerTypeSource::ByFactory(_) => f.write_str("ByFactory"),
        }
    }
}

/// One-shot lazy cell for a layer type.
///
/// Resolution runs at most once even under concurrent first access; later
/// callers observe the cached value.
#[derive(Debug)]
pub struct LayerTypeCell {
    source: LayerTypeSource,
    resolved: OnceLock<Option<LayerType>>,
}

impl LayerTypeCell {
    /// Cell resolving the identifier against the given registry on first use.
    pub fn by_id(
        id: impl Into<String>,
        registry: impl Fn(&str) -> Option<LayerType> + Send + Sync + 'static,
    ) -> Self {
        Self {
            source: LayerTypeSource::ById {
                id: id.into(),
                registry: Box::new(registry),
            },
            resolved: OnceLock::new(),
        }
    }

    /// Cell constructing its value through a factory closure on first use.
    pub fn by_factory(factory: impl Fn() -> LayerType + Send + Sync + 'static) -> Self {
        Self {
            source: LayerTypeSource::ByFactory(Box::new(factory)),
            resolved: OnceLock::new(),
        }
    }

    /// Resolve (once) and return the layer type, `None` if the identifier is
    /// unknown to the registry.
    pub fn get(&self) -> Option<&LayerType> {
        self.resolved
            .get_or_init(|| match &self.source {
                LayerTypeSource::ById { id, registry } => registry(id),
                LayerTypeSource::ByFactory(factory) => Some(factory()),
            })
            .as_ref()
    }

    /// Whether resolution has already happened.
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_resolve_by_id() {
        let cell = LayerTypeCell::by_id("syntax", |id| {
            (id == "syntax").then(|| LayerType::new("syntax", true))
        });
        assert!(!cell.is_resolved());
        assert_eq!(cell.get().unwrap().id, "syntax");
        assert!(cell.is_resolved());
    }

    #[test]
    fn test_unknown_id_resolves_to_none() {
        let cell = LayerTypeCell::by_id("missing", |_| None);
        assert!(cell.get().is_none());
        assert!(cell.is_resolved());
    }

    #[test]
    fn test_factory_runs_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cell = LayerTypeCell::by_factory(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            LayerType::new("tokens", false)
        });

        assert_eq!(cell.get().unwrap().id, "tokens");
        assert_eq!(cell.get().unwrap().id, "tokens");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
