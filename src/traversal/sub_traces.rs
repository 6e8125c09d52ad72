//! Pre-order iteration over the sub-trace tree.

use super::TreeIterator;
use crate::model::{SubTraceIndex, SubTraceRef, Trace};
use std::iter::FusedIterator;
use std::slice;

/// Pre-order iterator over a sub-trace and its descendant sub-traces
#[derive(Debug, Clone)]
pub struct SubTraceIter<'a> {
    trace: &'a Trace,
    stack: Vec<slice::Iter<'a, SubTraceIndex>>,
    depth: usize,
}

impl<'a> SubTraceIter<'a> {
    pub fn new(root: SubTraceRef<'a>) -> Self {
        let first = slice::from_ref(&root.node().index);
        Self {
            trace: root.trace(),
            stack: vec![first.iter()],
            depth: 0,
        }
    }

    pub fn empty(trace: &'a Trace) -> Self {
        Self {
            trace,
            stack: Vec::new(),
            depth: 0,
        }
    }
}

impl<'a> Iterator for SubTraceIter<'a> {
    type Item = SubTraceRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let cursor = self.stack.last_mut()?;
            let Some(idx) = cursor.next() else {
                self.stack.pop();
                continue;
            };

            let node = self.trace.sub_trace_node(*idx);
            self.depth = self.stack.len() - 1;
            if !node.children.is_empty() {
                self.stack.push(node.children.iter());
            }
            return Some(SubTraceRef::new(self.trace, node));
        }
    }
}

impl FusedIterator for SubTraceIter<'_> {}

impl TreeIterator for SubTraceIter<'_> {
    fn current_depth(&self) -> usize {
        self.depth
    }
}

impl Trace {
    /// Every sub-trace of this trace, pre-order from the root
    pub fn sub_traces(&self) -> SubTraceIter<'_> {
        match self.root() {
            Some(root) => SubTraceIter::new(root),
            None => SubTraceIter::empty(self),
        }
    }
}
