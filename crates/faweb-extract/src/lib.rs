//! Handler-based structured extraction over parsed HTML trees.
//!
//! A [`Walker`] drives a pre-order traversal of a [`scraper`] document and
//! offers every node to an ordered list of [`Handler`]s. The first handler
//! whose `matches` returns true gets to `handle` the node and decides
//! whether the walk descends into that node's children; siblings are
//! visited regardless. Handlers accumulate whatever they extract in their
//! own state, so a single pass over one tree can feed several independent
//! extraction concerns without them interfering.

pub mod node;

use ego_tree::NodeRef;
use scraper::Node;

/// One extraction concern, applied to single tree nodes.
///
/// `matches` must be a cheap, side-effect-free structural test; `handle`
/// records whatever the handler extracts and returns whether the walk
/// should still descend into the node's children. Missing expected
/// structure inside `handle` is not an error: record nothing and return
/// `false`.
pub trait Handler {
    fn matches(&self, node: NodeRef<'_, Node>) -> bool;

    fn handle(&mut self, node: NodeRef<'_, Node>) -> bool;
}

/// Pre-order tree walker over an ordered handler list.
///
/// At most one handler fires per node (first match wins), so handler order
/// is part of the configuration, not an accident. A `false` return from
/// `handle` only prunes that node's subtree; the walk continues with its
/// siblings.
pub struct Walker<'h> {
    handlers: Vec<&'h mut dyn Handler>,
}

impl<'h> Walker<'h> {
    pub fn new(handlers: Vec<&'h mut dyn Handler>) -> Self {
        Self { handlers }
    }

    pub fn walk(&mut self, node: NodeRef<'_, Node>) {
        for handler in self.handlers.iter_mut() {
            if handler.matches(node) {
                if !handler.handle(node) {
                    return;
                }
                break;
            }
        }

        for child in node.children() {
            self.walk(child);
        }
    }
}
