//! Pre-order iteration over one sub-trace's call tree.

use super::TreeIterator;
use crate::model::{CallableIndex, CallableRef, SubTraceRef, Trace};
use std::iter::FusedIterator;
use std::slice;

/// Pre-order iterator over a callable and its descendants.
///
/// Stays inside the sub-trace of its root; remote invocations are yielded
/// as leaves.
#[derive(Debug, Clone)]
pub struct CallableIter<'a> {
    trace: &'a Trace,
    stack: Vec<slice::Iter<'a, CallableIndex>>,
    depth: usize,
}

impl<'a> CallableIter<'a> {
    /// Start at `root` (depth 0)
    pub fn new(root: CallableRef<'a>) -> Self {
        let trace = root.trace();
        let first = slice::from_ref(&root.node().index);
        Self {
            trace,
            stack: vec![first.iter()],
            depth: 0,
        }
    }

    /// An iterator that yields nothing
    pub fn empty(trace: &'a Trace) -> Self {
        Self {
            trace,
            stack: Vec::new(),
            depth: 0,
        }
    }
}

impl<'a> Iterator for CallableIter<'a> {
    type Item = CallableRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let cursor = self.stack.last_mut()?;
            match cursor.next() {
                Some(idx) => {
                    let node = self.trace.callable_node(*idx);
                    self.depth = self.stack.len() - 1;
                    let children = node.children();
                    if !children.is_empty() {
                        self.stack.push(children.iter());
                    }
                    return Some(CallableRef::new(self.trace, node));
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

impl FusedIterator for CallableIter<'_> {}

impl TreeIterator for CallableIter<'_> {
    fn current_depth(&self) -> usize {
        self.depth
    }
}

impl<'a> CallableRef<'a> {
    /// This callable followed by its descendants, pre-order
    pub fn descendants(&self) -> CallableIter<'a> {
        CallableIter::new(*self)
    }
}

impl<'a> SubTraceRef<'a> {
    /// Every callable of this sub-trace, pre-order from its root
    pub fn callables(&self) -> CallableIter<'a> {
        match self.root() {
            Some(root) => CallableIter::new(root),
            None => CallableIter::empty(self.trace()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Location, MethodInvocation};
    use crate::utils::error::ModelError;

    // root
    // ├── a
    // │   └── a1
    // └── b
    fn small_trace() -> Trace {
        let mut trace = Trace::new(1);
        let st = trace.set_root(1, Location::new("h")).unwrap();
        let root = trace.set_root_callable(st, 0, MethodInvocation::new(10)).unwrap();
        let a = trace.add_callable(root, 1, MethodInvocation::new(5)).unwrap();
        trace.add_callable(a, 2, MethodInvocation::new(2)).unwrap();
        trace.add_callable(root, 7, MethodInvocation::new(3)).unwrap();
        trace
    }

    #[test]
    fn test_pre_order_with_depths() {
        let trace = small_trace();
        let mut iter = trace.root().unwrap().callables();
        assert_eq!(iter.current_depth(), 0);

        let mut seen = Vec::new();
        while let Some(c) = iter.next() {
            seen.push((c.timestamp(), iter.current_depth()));
        }
        assert_eq!(seen, vec![(0, 0), (1, 1), (2, 2), (7, 1)]);
    }

    #[test]
    fn test_exhaustion_is_an_error() {
        let trace = small_trace();
        let mut iter = trace.root().unwrap().callables();
        for _ in 0..4 {
            iter.try_next().unwrap();
        }
        assert_eq!(iter.try_next().unwrap_err(), ModelError::IteratorExhausted);
        assert_eq!(iter.try_next().unwrap_err(), ModelError::IteratorExhausted);
    }

    #[test]
    fn test_sub_trace_without_root_is_empty() {
        let mut trace = Trace::new(1);
        trace.set_root(1, Location::new("h")).unwrap();
        assert_eq!(trace.root().unwrap().callables().count(), 0);
    }
}
