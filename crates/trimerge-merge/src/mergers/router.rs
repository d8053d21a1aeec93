use std::collections::HashMap;
use std::fmt;

use tracing::debug;
use trimerge_types::Path;

use crate::dispatcher::Dispatcher;
use crate::error::{MergeError, MergeResult};
use crate::merger::{Merger, Outcome};

/// One segment of a route.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RouteSegment {
    /// Matches exactly this key.
    Key(String),
    /// Matches any single key.
    Wildcard,
}

impl RouteSegment {
    /// Parse a route from a JSON pointer, where a `*` segment is a wildcard.
    pub fn parse_route(pointer: &str) -> MergeResult<Vec<RouteSegment>> {
        Ok(Path::parse(pointer)?
            .segments()
            .iter()
            .map(|segment| match segment.as_str() {
                "*" => RouteSegment::Wildcard,
                key => RouteSegment::Key(key.to_string()),
            })
            .collect())
    }
}

impl fmt::Display for RouteSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteSegment::Key(key) => f.write_str(&key.replace('~', "~0").replace('/', "~1")),
            RouteSegment::Wildcard => f.write_str("*"),
        }
    }
}

struct RouteNode<V: Clone> {
    keys: HashMap<String, RouteNode<V>>,
    wildcard: Option<Box<RouteNode<V>>>,
    merger: Option<Box<dyn Merger<V>>>,
}

impl<V: Clone> RouteNode<V> {
    fn new() -> Self {
        Self {
            keys: HashMap::new(),
            wildcard: None,
            merger: None,
        }
    }

    fn child_mut(&mut self, segment: &RouteSegment) -> &mut RouteNode<V> {
        match segment {
            RouteSegment::Key(key) => {
                self.keys.entry(key.clone()).or_insert_with(RouteNode::new)
            }
            RouteSegment::Wildcard => {
                self.wildcard.get_or_insert_with(|| Box::new(RouteNode::new()))
            }
        }
    }

    fn child(&self, key: &str) -> Option<&RouteNode<V>> {
        self.keys.get(key).or(self.wildcard.as_deref())
    }
}

/// Delegates to mergers bound to specific paths.
///
/// Routes form a prefix tree of path segments. A node's path is walked one
/// segment at a time, preferring an exact key over a wildcard; there is no
/// backtracking into the wildcard branch once an exact key matched. The
/// router is not applicable to paths without a bound merger.
pub struct RouteMerger<V: Clone> {
    root: RouteNode<V>,
    routes: usize,
}

impl<V: Clone> Default for RouteMerger<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> RouteMerger<V> {
    pub fn new() -> Self {
        Self {
            root: RouteNode::new(),
            routes: 0,
        }
    }

    /// Bind `merger` to a route given as a JSON pointer (`*` for any key).
    pub fn with_route(
        mut self,
        pointer: &str,
        merger: impl Merger<V> + 'static,
    ) -> MergeResult<Self> {
        self.add_route(RouteSegment::parse_route(pointer)?, Box::new(merger))?;
        Ok(self)
    }

    /// Bind `merger` to `route`. Each route can be bound once.
    pub fn add_route(
        &mut self,
        route: Vec<RouteSegment>,
        merger: Box<dyn Merger<V>>,
    ) -> MergeResult<()> {
        let rendered = render_route(&route);
        let node = route.iter().fold(&mut self.root, |node, segment| node.child_mut(segment));
        if node.merger.is_some() {
            return Err(MergeError::DuplicateRoute { route: rendered });
        }
        debug!(route = %rendered, merger = merger.name(), "route registered");
        node.merger = Some(merger);
        self.routes += 1;
        Ok(())
    }

    /// Number of bound routes.
    pub fn route_count(&self) -> usize {
        self.routes
    }

    /// The merger bound to `path`, if any.
    fn lookup(&self, path: &Path) -> Option<&dyn Merger<V>> {
        let mut node = &self.root;
        for segment in path.segments() {
            node = node.child(segment)?;
        }
        node.merger.as_deref()
    }
}

fn render_route(route: &[RouteSegment]) -> String {
    route.iter().map(|segment| format!("/{segment}")).collect()
}

impl<V: Clone> Merger<V> for RouteMerger<V> {
    fn name(&self) -> &str {
        "router"
    }

    fn merge<'a>(
        &self,
        base: Option<&'a V>,
        left: Option<&'a V>,
        right: Option<&'a V>,
        path: &Path,
        dispatcher: &Dispatcher<V>,
    ) -> MergeResult<Outcome<'a, V>> {
        match self.lookup(path) {
            Some(merger) => merger.merge(base, left, right, path, dispatcher),
            None => Ok(Outcome::NotApplicable),
        }
    }
}
