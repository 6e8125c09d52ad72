//! Pre-order iteration over the call tree of a whole trace, crossing
//! sub-trace boundaries at remote invocations.

use super::callables::CallableIter;
use super::TreeIterator;
use crate::model::{CallableRef, Trace};
use std::iter::FusedIterator;

/// Iterator over every callable of a trace as if it were one tree.
///
/// Right after a remote invocation that is linked to a target sub-trace,
/// the target's call tree is visited as if nested under the invocation,
/// one level deeper. Afterwards the invoking sub-trace is resumed.
///
/// The linked invocation itself is yielded too, right before the target
/// root (at depth `p`, the root at `p + 1`). Consumers that render only
/// one node per hop should skip items where `is_sub_trace_invocation()`
/// holds; an iterator that replaces the invoker with the target root would
/// never produce them.
#[derive(Debug, Clone)]
pub struct TraceCallableIter<'a> {
    inner: CallableIter<'a>,

    /// Depth added to `inner`'s own depth
    offset: usize,

    /// Suspended iterators with the offset they ran at
    suspended: Vec<(CallableIter<'a>, usize)>,

    depth: usize,
}

impl<'a> TraceCallableIter<'a> {
    pub fn new(trace: &'a Trace) -> Self {
        let inner = match trace.root() {
            Some(root) => root.callables(),
            None => CallableIter::empty(trace),
        };
        Self {
            inner,
            offset: 0,
            suspended: Vec::new(),
            depth: 0,
        }
    }

    /// Continue inside the target sub-trace of `invoker`, if it has a tree
    fn descend(&mut self, invoker: CallableRef<'a>) {
        let Some(root) = invoker
            .target_sub_trace()
            .ok()
            .and_then(|target| target.root())
        else {
            return;
        };

        let outer = std::mem::replace(&mut self.inner, CallableIter::new(root));
        self.suspended.push((outer, self.offset));
        self.offset = self.depth + 1;
    }
}

impl<'a> Iterator for TraceCallableIter<'a> {
    type Item = CallableRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(callable) = self.inner.next() {
                self.depth = self.offset + self.inner.current_depth();
                if callable.is_sub_trace_invocation() {
                    self.descend(callable);
                }
                return Some(callable);
            }

            let (outer, offset) = self.suspended.pop()?;
            self.inner = outer;
            self.offset = offset;
        }
    }
}

impl FusedIterator for TraceCallableIter<'_> {}

impl TreeIterator for TraceCallableIter<'_> {
    fn current_depth(&self) -> usize {
        self.depth
    }
}

impl Trace {
    /// Every callable of this trace, crossing into invoked sub-traces
    pub fn callables(&self) -> TraceCallableIter<'_> {
        TraceCallableIter::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Location, MethodInvocation, RemoteInvocation};

    #[test]
    fn test_target_tree_is_nested_under_invocation() {
        // web: root -> [remote -> (db: q1 -> q2), after]
        let mut trace = Trace::new(1);
        let web = trace.set_root(1, Location::new("web")).unwrap();
        let root = trace.set_root_callable(web, 0, MethodInvocation::new(100)).unwrap();
        let remote = trace.add_callable(root, 1, RemoteInvocation::new(50)).unwrap();
        trace.add_callable(root, 60, MethodInvocation::new(5)).unwrap();
        let db = trace.invoke_sub_trace(remote, 2, Location::new("db")).unwrap();
        let q1 = trace.set_root_callable(db, 2, MethodInvocation::new(40)).unwrap();
        trace.add_callable(q1, 3, MethodInvocation::new(10)).unwrap();

        let mut iter = trace.callables();
        let mut seen = Vec::new();
        while let Some(c) = iter.next() {
            seen.push((c.timestamp(), iter.current_depth()));
        }
        assert_eq!(seen, vec![(0, 0), (1, 1), (2, 2), (3, 3), (60, 1)]);
    }

    #[test]
    fn test_target_without_root_is_skipped() {
        let mut trace = Trace::new(1);
        let web = trace.set_root(1, Location::new("web")).unwrap();
        let root = trace.set_root_callable(web, 0, MethodInvocation::new(100)).unwrap();
        let remote = trace.add_callable(root, 1, RemoteInvocation::new(50)).unwrap();
        trace.invoke_sub_trace(remote, 2, Location::new("db")).unwrap();
        trace.add_callable(root, 2, MethodInvocation::new(1)).unwrap();

        let depths: Vec<_> = {
            let mut iter = trace.callables();
            let mut out = Vec::new();
            while iter.next().is_some() {
                out.push(iter.current_depth());
            }
            out
        };
        assert_eq!(depths, vec![0, 1, 1]);
    }
}
