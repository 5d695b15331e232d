//! Route table
//!
//! One entry per structurally distinct pattern, each carrying its own method map.

use hyper::Method;

use super::matcher::{split_path, Pattern};
use super::params::Params;

/// Outcome of resolving a (method, path) pair
#[derive(Debug)]
pub enum Resolution<'t, H> {
    Matched { handler: &'t H, params: Params },
    /// The path matched but no handler exists for the method
    MethodNotAllowed { allowed: Vec<Method> },
    NoMatch,
}

#[derive(Debug)]
struct RouteEntry<H> {
    pattern: Pattern,
    /// Registration order is kept for the `Allow` header
    methods: Vec<(Method, H)>,
}

impl<H> RouteEntry<H> {
    fn handler_for(&self, method: &Method) -> Option<&H> {
        self.methods
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, handler)| handler)
    }
}

/// Registered routes, scanned in registration order
#[derive(Debug)]
pub struct RouteTable<H> {
    entries: Vec<RouteEntry<H>>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> RouteTable<H> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add `handler` for `method` on `pattern`
    ///
    /// A structurally equal pattern extends the existing entry; registering the same
    /// method twice replaces the earlier handler.
    pub fn register(&mut self, pattern: Pattern, method: Method, handler: H) {
        let entry = match self.entries.iter().position(|e| e.pattern == pattern) {
            Some(index) => &mut self.entries[index],
            None => {
                self.entries.push(RouteEntry {
                    pattern,
                    methods: Vec::new(),
                });
                let last = self.entries.len() - 1;
                &mut self.entries[last]
            }
        };

        match entry.methods.iter_mut().find(|(m, _)| *m == method) {
            Some(slot) => slot.1 = handler,
            None => entry.methods.push((method, handler)),
        }
    }

    /// Resolve a request
    ///
    /// The first entry (in registration order) that matches the path and has a
    /// handler for `method` wins. If entries match the path but none accepts the
    /// method, the union of their methods is returned.
    pub fn resolve(&self, method: &Method, path: &str) -> Resolution<'_, H> {
        let segments: Vec<&str> = split_path(path).collect();
        let mut allowed: Vec<Method> = Vec::new();

        for entry in &self.entries {
            let Some(params) = entry.pattern.match_segments(&segments) else {
                continue;
            };

            if let Some(handler) = entry.handler_for(method) {
                return Resolution::Matched { handler, params };
            }

            for (m, _) in &entry.methods {
                if !allowed.contains(m) {
                    allowed.push(m.clone());
                }
            }
        }

        if allowed.is_empty() {
            Resolution::NoMatch
        } else {
            Resolution::MethodNotAllowed { allowed }
        }
    }

    /// Number of distinct patterns
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
