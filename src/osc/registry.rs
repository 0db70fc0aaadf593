//! Ordered collection of registered OSC methods.
//!
//! Registrations live in a single list in the order they were added; catch-all entries
//! (registered without a path) sit in that list wherever they were added, so candidate order
//! is plain registration order. Lookups work on a snapshot of the list, so a dispatch that is
//! already running is never affected by a concurrent `add` or `remove`.

use std::fmt;
use std::sync::Arc;

use derive_more::Display;
use tracing::debug;

use crate::error::ConfigError;
use crate::osc::dispatcher::{MethodCall, Verdict};
use crate::osc::pattern::Pattern;
use crate::osc::types::validate_signature;
use crate::shared::Shared;
use crate::traits::{Handler, WithUserData};

/// Stable handle for a registration, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{_0}")]
pub struct MethodId(u64);

pub struct Registration {
    id: MethodId,
    pattern: Option<Pattern>,
    types: Option<String>,
    handler: Box<dyn Handler>,
}

impl Registration {
    pub fn id(&self) -> MethodId {
        self.id
    }

    /// `None` for catch-all registrations.
    pub fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }

    /// `None` when the method accepts any arguments.
    pub fn types(&self) -> Option<&str> {
        self.types.as_deref()
    }

    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }

    fn accepts(&self, target: &Target<'_>) -> bool {
        let Some(own) = &self.pattern else {
            return true;
        };
        match target {
            Target::Path(path) => own.matches(path),
            // An incoming pattern can only be matched against a literal method path. Methods
            // that are patterns themselves only take the identical pattern.
            Target::Pattern(incoming) if own.is_literal() => incoming.matches(own.as_str()),
            Target::Pattern(incoming) => incoming.as_str() == own.as_str(),
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("pattern", &self.pattern.as_ref().map(Pattern::as_str))
            .field("types", &self.types)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
struct Methods {
    entries: Vec<Arc<Registration>>,
    next_id: u64,
}

impl Default for Methods {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

#[derive(Default)]
pub struct Registry {
    methods: Shared<Methods>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a closure. `pattern: None` matches every path, `types: None` accepts any
    /// arguments.
    pub fn add<F>(
        &self,
        pattern: Option<&str>,
        types: Option<&str>,
        handler: F,
    ) -> Result<MethodId, ConfigError>
    where
        F: Fn(&MethodCall<'_>) -> Verdict + Send + Sync + 'static,
    {
        self.add_handler(pattern, types, handler)
    }

    /// Registers a closure together with user data that is handed back on every call.
    pub fn add_with_data<U, F>(
        &self,
        pattern: Option<&str>,
        types: Option<&str>,
        user_data: U,
        handler: F,
    ) -> Result<MethodId, ConfigError>
    where
        U: Send + Sync + 'static,
        F: Fn(&MethodCall<'_>, &U) -> Verdict + Send + Sync + 'static,
    {
        self.add_handler(pattern, types, WithUserData::new(user_data, handler))
    }

    /// Registers any [`Handler`] implementation. Pattern and signature are checked before
    /// anything is stored.
    pub fn add_handler<H: Handler>(
        &self,
        pattern: Option<&str>,
        types: Option<&str>,
        handler: H,
    ) -> Result<MethodId, ConfigError> {
        let pattern = pattern.map(Pattern::parse).transpose()?;
        if let Some(types) = types {
            validate_signature(types)?;
        }

        let handler: Box<dyn Handler> = Box::new(handler);
        let id = self.methods.update(|methods| {
            let id = MethodId(methods.next_id);
            methods.next_id += 1;
            methods.entries.push(Arc::new(Registration {
                id,
                pattern,
                types: types.map(str::to_string),
                handler,
            }));
            id
        });

        debug!(%id, ?types, "method added");
        Ok(id)
    }

    /// Removes a registration. Removing the same id twice yields `NotFound` and leaves every
    /// other registration alone.
    pub fn remove(&self, id: MethodId) -> Result<(), ConfigError> {
        self.methods.try_update(|methods| {
            let index = methods
                .entries
                .iter()
                .position(|entry| entry.id == id)
                .ok_or(ConfigError::NotFound { id })?;
            methods.entries.remove(index);
            Ok(())
        })?;

        debug!(%id, "method removed");
        Ok(())
    }

    /// Removes every registration with exactly this path and signature (compared as written,
    /// not by what they match). Returns how many were removed.
    pub fn remove_matching(&self, pattern: Option<&str>, types: Option<&str>) -> usize {
        let removed = self.methods.update(|methods| {
            let before = methods.entries.len();
            methods.entries.retain(|entry| {
                entry.pattern.as_ref().map(Pattern::as_str) != pattern
                    || entry.types.as_deref() != types
            });
            before - methods.entries.len()
        });

        debug!(?pattern, ?types, removed, "methods removed");
        removed
    }

    /// Every registration that matches `path`, in registration order. The sequence is
    /// computed lazily from a snapshot taken now; call again for a fresh view.
    pub fn candidates_for<'p>(&self, path: &'p str) -> Candidates<'p> {
        Candidates::new(self.methods.snapshot(), Target::Path(path))
    }

    /// Like [`candidates_for`](Self::candidates_for), for an incoming address that is itself
    /// a pattern.
    pub fn candidates_for_pattern<'p>(&self, pattern: &'p Pattern) -> Candidates<'p> {
        Candidates::new(self.methods.snapshot(), Target::Pattern(pattern))
    }

    pub fn len(&self) -> usize {
        self.methods.with(|methods| methods.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

enum Target<'p> {
    Path(&'p str),
    Pattern(&'p Pattern),
}

pub struct Candidates<'p> {
    methods: Arc<Methods>,
    next: usize,
    target: Target<'p>,
}

impl<'p> Candidates<'p> {
    fn new(methods: Arc<Methods>, target: Target<'p>) -> Self {
        Self {
            methods,
            next: 0,
            target,
        }
    }
}

impl Iterator for Candidates<'_> {
    type Item = Arc<Registration>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(entry) = self.methods.entries.get(self.next) {
            self.next += 1;
            if entry.accepts(&self.target) {
                return Some(Arc::clone(entry));
            }
        }
        None
    }
}
