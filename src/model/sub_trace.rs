//! Sub-traces: the part of a trace that executed in one location.

use super::callable::CallableIndex;
use super::location::Location;
use crate::metrics::Memo;
use std::fmt;

/// Arena index of a sub-trace inside its trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubTraceIndex(pub(crate) u32);

impl SubTraceIndex {
    pub fn raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SubTraceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Node of the sub-trace tree
#[derive(Debug, Clone)]
pub struct SubTrace {
    pub(crate) index: SubTraceIndex,
    pub(crate) id: u64,
    pub(crate) location: Location,
    pub(crate) root: Option<CallableIndex>,
    pub(crate) parent: Option<SubTraceIndex>,
    pub(crate) children: Vec<SubTraceIndex>,
    pub(crate) invoker: Option<CallableIndex>,
    pub(crate) size: Memo<usize>,
    pub(crate) max_depth: Memo<usize>,
}

impl SubTrace {
    pub(crate) fn new(
        index: SubTraceIndex,
        id: u64,
        location: Location,
        parent: Option<SubTraceIndex>,
    ) -> Self {
        Self {
            index,
            id,
            location,
            root: None,
            parent,
            children: Vec::new(),
            invoker: None,
            size: Memo::new(),
            max_depth: Memo::new(),
        }
    }

    pub fn index(&self) -> SubTraceIndex {
        self.index
    }

    /// Caller-assigned id, unique within the trace
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Root callable; `None` until one is set
    pub fn root(&self) -> Option<CallableIndex> {
        self.root
    }

    /// `None` for the trace's root sub-trace
    pub fn parent(&self) -> Option<SubTraceIndex> {
        self.parent
    }

    /// Children in the order they were entered
    pub fn children(&self) -> &[SubTraceIndex] {
        &self.children
    }

    /// Remote invocation whose target this sub-trace is
    pub fn invoker(&self) -> Option<CallableIndex> {
        self.invoker
    }

    pub(crate) fn reset_memos(&mut self) {
        self.size.reset();
        self.max_depth.reset();
    }
}
