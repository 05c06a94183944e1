//! Destination handlers and the handler registry.
//!
//! A handler is attached to destinations by name, exact stack path, or a
//! regular expression over paths. The parser resolves each opened
//! destination to an ordered handler list and delivers the open brace,
//! every intervening token, and the close brace to each handler in
//! registration order.

use super::parser::Context;
use super::token::Token;
use crate::error::Result;
use regex::Regex;
use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

/// A shared handler reference. Handlers are compared by identity when
/// deduplicating registrations.
pub type HandlerRef = Rc<dyn Handler>;

/// A resolved, ordered handler list for one destination path.
pub type HandlerList = Rc<[HandlerRef]>;

/// A destination handler.
///
/// Called exactly once with the open brace of its frame, once per
/// ordinary token while the frame is active, and once with the close
/// brace; the token kind distinguishes the three. Handlers mutate the
/// frame, the document, or the stack through the context; writing a
/// property onto the parent frame is the idiomatic way to return a
/// computed value.
pub trait Handler {
    /// Handles one token of an active frame.
    fn on_token(
        &self,
        token: Token,
        source: &[u8],
        offset: usize,
        ctx: &mut Context<'_>,
    ) -> Result<()>;
}

/// A handler that ignores everything. Useful for destinations whose
/// content should be consumed without output.
pub struct NullHandler;

impl Handler for NullHandler {
    fn on_token(&self, _: Token, _: &[u8], _: usize, _: &mut Context<'_>) -> Result<()> {
        Ok(())
    }
}

/// Where a handler registration applies.
pub enum Destination {
    /// Every destination with this control name, at any depth
    Name(String),
    /// Exactly this stack path (e.g. `;rtf;fonttbl`)
    Path(String),
    /// Every destination whose path matches the pattern
    Pattern(Regex),
}

impl From<&str> for Destination {
    /// A string containing `;` is an exact path; anything else is a name.
    fn from(s: &str) -> Self {
        if s.contains(';') {
            Destination::Path(s.to_string())
        } else {
            Destination::Name(s.to_string())
        }
    }
}

impl From<String> for Destination {
    fn from(s: String) -> Self {
        Destination::from(s.as_str())
    }
}

impl From<Regex> for Destination {
    fn from(re: Regex) -> Self {
        Destination::Pattern(re)
    }
}

fn same_handler(a: &HandlerRef, b: &HandlerRef) -> bool {
    std::ptr::eq(
        Rc::as_ptr(a) as *const (),
        Rc::as_ptr(b) as *const (),
    )
}

/// The parser's handler registry.
///
/// Resolution for a `(name, path)` pair collects name registrations,
/// then exact-path registrations, then every pattern matching the path,
/// in registration order, deduplicated by handler identity. Results are
/// cached per path, including the empty result; any registration clears
/// the cache.
#[derive(Default)]
pub struct HandlerRegistry {
    by_name: HashMap<String, Vec<HandlerRef>>,
    by_path: HashMap<String, Vec<HandlerRef>>,
    by_pattern: Vec<(Regex, HandlerRef)>,
    cache: HashMap<String, HandlerList>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for a destination.
    ///
    /// Duplicate (destination, handler) pairs are ignored. The resolver
    /// cache is cleared on every call.
    pub fn register(&mut self, destination: Destination, handler: HandlerRef) {
        self.cache.clear();
        match destination {
            Destination::Name(name) => {
                let list = self.by_name.entry(name).or_default();
                if !list.iter().any(|h| same_handler(h, &handler)) {
                    list.push(handler);
                }
            }
            Destination::Path(path) => {
                let list = self.by_path.entry(path).or_default();
                if !list.iter().any(|h| same_handler(h, &handler)) {
                    list.push(handler);
                }
            }
            Destination::Pattern(re) => {
                let duplicate = self
                    .by_pattern
                    .iter()
                    .any(|(p, h)| p.as_str() == re.as_str() && same_handler(h, &handler));
                if !duplicate {
                    self.by_pattern.push((re, handler));
                }
            }
        }
    }

    /// Resolves the handler list for a destination.
    ///
    /// An empty list means the destination is unhandled; the empty
    /// result is cached like any other.
    pub fn resolve(&mut self, name: &str, path: &str) -> HandlerList {
        if let Some(list) = self.cache.get(path) {
            return Rc::clone(list);
        }

        let mut merged: Vec<HandlerRef> = Vec::new();
        let mut add = |merged: &mut Vec<HandlerRef>, handler: &HandlerRef| {
            if !merged.iter().any(|h| same_handler(h, handler)) {
                merged.push(Rc::clone(handler));
            }
        };

        if let Some(list) = self.by_name.get(name) {
            for handler in list {
                add(&mut merged, handler);
            }
        }
        if let Some(list) = self.by_path.get(path) {
            for handler in list {
                add(&mut merged, handler);
            }
        }
        for (pattern, handler) in &self.by_pattern {
            if pattern.is_match(path) {
                add(&mut merged, handler);
            }
        }

        let list: HandlerList = merged.into();
        self.cache.insert(path.to_string(), Rc::clone(&list));
        list
    }

    /// Returns true if a resolution for `path` is cached.
    #[cfg(test)]
    pub(crate) fn is_cached(&self, path: &str) -> bool {
        self.cache.contains_key(path)
    }
}

/// Typed per-handler scratch storage attached to a frame.
///
/// Keys are static strings; collaborating handlers own their key
/// namespace. Values are arbitrary typed state retrieved by downcast.
#[derive(Default)]
pub struct StateMap {
    entries: HashMap<&'static str, Box<dyn Any>>,
}

impl StateMap {
    /// Returns the state stored under `key`, if present with type `T`.
    pub fn get<T: 'static>(&self, key: &'static str) -> Option<&T> {
        self.entries.get(key).and_then(|v| v.downcast_ref())
    }

    /// Mutable access to the state stored under `key`.
    pub fn get_mut<T: 'static>(&mut self, key: &'static str) -> Option<&mut T> {
        self.entries.get_mut(key).and_then(|v| v.downcast_mut())
    }

    /// Stores `value` under `key`, replacing any previous state.
    pub fn insert<T: 'static>(&mut self, key: &'static str, value: T) {
        self.entries.insert(key, Box::new(value));
    }

    /// Removes and returns the state stored under `key`.
    pub fn remove<T: 'static>(&mut self, key: &'static str) -> Option<T> {
        let boxed = self.entries.remove(key)?;
        match boxed.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(other) => {
                // Wrong type requested; put it back untouched.
                self.entries.insert(key, other);
                None
            }
        }
    }

    /// Returns the state under `key`, inserting `init()` when absent.
    ///
    /// A slot holding a different type is replaced.
    pub fn get_or_insert_with<T: 'static>(
        &mut self,
        key: &'static str,
        init: impl FnOnce() -> T,
    ) -> &mut T {
        let slot = match self.entries.entry(key) {
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(Box::new(init()))
            }
            std::collections::hash_map::Entry::Occupied(entry) => {
                let slot = entry.into_mut();
                if !slot.is::<T>() {
                    *slot = Box::new(init());
                }
                slot
            }
        };
        match slot.downcast_mut::<T>() {
            Some(value) => value,
            // The slot was just filled or replaced with a T.
            None => unreachable!(),
        }
    }
}

impl std::fmt::Debug for StateMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;

    impl Handler for Probe {
        fn on_token(&self, _: Token, _: &[u8], _: usize, _: &mut Context<'_>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_destination_from_str() {
        assert!(matches!(Destination::from("fonttbl"), Destination::Name(_)));
        assert!(matches!(Destination::from(";rtf;fonttbl"), Destination::Path(_)));
    }

    #[test]
    fn test_resolution_order_and_dedup() {
        let mut registry = HandlerRegistry::new();
        let a: HandlerRef = Rc::new(Probe);
        let b: HandlerRef = Rc::new(Probe);

        registry.register(Destination::from("f"), Rc::clone(&a));
        registry.register(Destination::from(";rtf;fonttbl;f"), Rc::clone(&b));
        // Same handler again through a pattern: deduplicated on resolve.
        registry.register(
            Destination::Pattern(Regex::new(";fonttbl;f$").unwrap()),
            Rc::clone(&a),
        );

        let list = registry.resolve("f", ";rtf;fonttbl;f");
        assert_eq!(list.len(), 2);
        assert!(same_handler(&list[0], &a));
        assert!(same_handler(&list[1], &b));
    }

    #[test]
    fn test_duplicate_registration_ignored() {
        let mut registry = HandlerRegistry::new();
        let a: HandlerRef = Rc::new(Probe);

        registry.register(Destination::from("x"), Rc::clone(&a));
        registry.register(Destination::from("x"), Rc::clone(&a));

        let list = registry.resolve("x", ";rtf;x");
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_empty_resolution_is_cached() {
        let mut registry = HandlerRegistry::new();
        let list = registry.resolve("nothing", ";rtf;nothing");
        assert!(list.is_empty());
        assert!(registry.is_cached(";rtf;nothing"));
    }

    #[test]
    fn test_register_invalidates_cache() {
        let mut registry = HandlerRegistry::new();
        assert!(registry.resolve("x", ";rtf;x").is_empty());
        assert!(registry.is_cached(";rtf;x"));

        registry.register(Destination::from("x"), Rc::new(Probe));
        assert!(!registry.is_cached(";rtf;x"));
        assert_eq!(registry.resolve("x", ";rtf;x").len(), 1);
    }

    #[test]
    fn test_state_map_typed_access() {
        let mut state = StateMap::default();
        state.insert("counter", 3usize);

        assert_eq!(state.get::<usize>("counter"), Some(&3));
        assert_eq!(state.get::<String>("counter"), None);

        *state.get_or_insert_with("counter", || 0usize) += 1;
        assert_eq!(state.remove::<usize>("counter"), Some(4));
        assert_eq!(state.get::<usize>("counter"), None);
    }
}
