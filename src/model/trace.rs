//! The trace: arena owner of every sub-trace and callable plus the
//! interning registry, and the construction operations that keep the
//! tree invariants intact.

use super::callable::{AdditionalInfo, Callable, CallableIndex, CallableKind};
use super::location::Location;
use super::sub_trace::{SubTrace, SubTraceIndex};
use super::view::{CallableRef, SubTraceRef};
use crate::metrics::Memo;
use crate::registry::{Registry, Signature, SignatureId, StringId};
use crate::utils::error::{ModelError, ModelResult};
use rustc_hash::FxHashMap;

/// One logical invocation, possibly spanning several hosts
///
/// **Public** - built by callers through the construction operations below,
/// read through `SubTraceRef`/`CallableRef` views
#[derive(Debug, Clone)]
pub struct Trace {
    pub(crate) trace_id: u64,
    pub(crate) root: Option<SubTraceIndex>,
    pub(crate) sub_traces: Vec<SubTrace>,
    pub(crate) callables: Vec<Callable>,
    pub(crate) registry: Registry,
    pub(crate) size: Memo<usize>,

    /// Caller-assigned sub-trace id -> arena index
    sub_trace_ids: FxHashMap<u64, SubTraceIndex>,
}

impl Trace {
    /// Create an empty trace without a root sub-trace
    pub fn new(trace_id: u64) -> Self {
        Self::from_parts(trace_id, Registry::new())
    }

    /// Create an empty trace around an already populated registry
    pub(crate) fn from_parts(trace_id: u64, registry: Registry) -> Self {
        Self {
            trace_id,
            root: None,
            sub_traces: Vec::new(),
            callables: Vec::new(),
            registry,
            size: Memo::new(),
            sub_trace_ids: FxHashMap::default(),
        }
    }

    pub fn trace_id(&self) -> u64 {
        self.trace_id
    }

    /// Root sub-trace, once set
    pub fn root(&self) -> Option<SubTraceRef<'_>> {
        self.root.map(|idx| SubTraceRef::new(self, self.sub_trace_node(idx)))
    }

    /// View of a sub-trace of this trace
    ///
    /// # Errors
    /// * `ModelError::InvalidState` - the index does not belong to this trace
    pub fn sub_trace(&self, index: SubTraceIndex) -> ModelResult<SubTraceRef<'_>> {
        self.sub_traces
            .get(index.index())
            .map(|node| SubTraceRef::new(self, node))
            .ok_or_else(|| ModelError::invalid_state(format!("unknown sub-trace {}", index)))
    }

    /// View of a callable of this trace
    ///
    /// # Errors
    /// * `ModelError::InvalidState` - the index does not belong to this trace
    pub fn callable(&self, index: CallableIndex) -> ModelResult<CallableRef<'_>> {
        self.callables
            .get(index.index())
            .map(|node| CallableRef::new(self, node))
            .ok_or_else(|| ModelError::invalid_state(format!("unknown callable {}", index)))
    }

    /// Look up a sub-trace by its caller-assigned id
    pub fn find_sub_trace(&self, id: u64) -> Option<SubTraceRef<'_>> {
        self.sub_trace_ids
            .get(&id)
            .map(|idx| SubTraceRef::new(self, self.sub_trace_node(*idx)))
    }

    /// Number of sub-traces in the arena
    pub fn sub_trace_count(&self) -> usize {
        self.sub_traces.len()
    }

    /// Number of callables in the arena
    pub fn callable_count(&self) -> usize {
        self.callables.len()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn sub_trace_node(&self, index: SubTraceIndex) -> &SubTrace {
        &self.sub_traces[index.index()]
    }

    pub(crate) fn callable_node(&self, index: CallableIndex) -> &Callable {
        &self.callables[index.index()]
    }

    // ---------------------------------------------------------------------
    // Interning
    // ---------------------------------------------------------------------

    pub fn register_string(&mut self, value: Option<&str>) -> StringId {
        self.registry.register_string(value)
    }

    pub fn resolve_string(&self, id: StringId) -> ModelResult<Option<&str>> {
        self.registry.resolve_string(id)
    }

    pub fn register_signature<I, T>(
        &mut self,
        return_type: Option<&str>,
        package_name: Option<&str>,
        class_name: Option<&str>,
        method_name: Option<&str>,
        parameter_types: I,
    ) -> SignatureId
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.registry.register_signature(
            return_type,
            package_name,
            class_name,
            method_name,
            parameter_types,
        )
    }

    pub fn resolve_signature(&self, id: SignatureId) -> ModelResult<Signature> {
        self.registry.resolve_signature(id)
    }

    // ---------------------------------------------------------------------
    // Sub-trace tree
    // ---------------------------------------------------------------------

    /// Create the root sub-trace. Only allowed once.
    ///
    /// # Errors
    /// * `ModelError::InvalidState` - the root is already set
    pub fn set_root(&mut self, id: u64, location: Location) -> ModelResult<SubTraceIndex> {
        if self.root.is_some() {
            return Err(ModelError::invalid_state(format!(
                "trace {} already has a root sub-trace",
                self.trace_id
            )));
        }

        let index = self.push_sub_trace(id, location, None)?;
        self.root = Some(index);
        Ok(index)
    }

    /// Append a child sub-trace to `parent`
    ///
    /// # Errors
    /// * `ModelError::InvalidState` - unknown parent or duplicate id
    pub fn add_sub_trace(
        &mut self,
        parent: SubTraceIndex,
        id: u64,
        location: Location,
    ) -> ModelResult<SubTraceIndex> {
        self.sub_trace(parent)?;

        let index = self.push_sub_trace(id, location, Some(parent))?;
        self.sub_traces[parent.index()].children.push(index);
        Ok(index)
    }

    fn push_sub_trace(
        &mut self,
        id: u64,
        location: Location,
        parent: Option<SubTraceIndex>,
    ) -> ModelResult<SubTraceIndex> {
        if self.sub_trace_ids.contains_key(&id) {
            return Err(ModelError::invalid_state(format!(
                "sub-trace id {} is already used in trace {}",
                id, self.trace_id
            )));
        }

        let index = SubTraceIndex(self.sub_traces.len() as u32);
        self.sub_traces
            .push(SubTrace::new(index, id, location, parent));
        self.sub_trace_ids.insert(id, index);
        self.size.reset();
        Ok(index)
    }

    // ---------------------------------------------------------------------
    // Callable trees
    // ---------------------------------------------------------------------

    /// Set the root callable of a sub-trace. Only allowed once per sub-trace.
    ///
    /// # Errors
    /// * `ModelError::InvalidState` - unknown sub-trace or root already set
    /// * `ModelError::NotRegistered` - the callable references foreign ids
    pub fn set_root_callable(
        &mut self,
        sub_trace: SubTraceIndex,
        timestamp: i64,
        kind: impl Into<CallableKind>,
    ) -> ModelResult<CallableIndex> {
        if self.sub_trace(sub_trace)?.node().root.is_some() {
            return Err(ModelError::invalid_state(format!(
                "sub-trace {} already has a root callable",
                sub_trace
            )));
        }

        let index = self.push_callable(sub_trace, None, timestamp, kind.into())?;
        self.sub_traces[sub_trace.index()].root = Some(index);
        Ok(index)
    }

    /// Append a child callable to a nesting `parent`.
    /// The child joins the parent's sub-trace.
    ///
    /// # Errors
    /// * `ModelError::InvalidState` - unknown or non-nesting parent
    /// * `ModelError::NotRegistered` - the callable references foreign ids
    pub fn add_callable(
        &mut self,
        parent: CallableIndex,
        timestamp: i64,
        kind: impl Into<CallableKind>,
    ) -> ModelResult<CallableIndex> {
        let parent_ref = self.callable(parent)?;
        if !parent_ref.kind().is_nesting() {
            return Err(ModelError::invalid_state(format!(
                "{} {} cannot have children",
                parent_ref.kind().type_name(),
                parent
            )));
        }
        let sub_trace = parent_ref.node().sub_trace;

        let index = self.push_callable(sub_trace, Some(parent), timestamp, kind.into())?;

        let parent_node = &mut self.callables[parent.index()];
        parent_node.kind.reset_memos();
        if let Some(children) = parent_node.kind.children_mut() {
            children.push(index);
        }
        Ok(index)
    }

    fn push_callable(
        &mut self,
        sub_trace: SubTraceIndex,
        parent: Option<CallableIndex>,
        timestamp: i64,
        kind: CallableKind,
    ) -> ModelResult<CallableIndex> {
        self.check_registered(&kind)?;

        let index = CallableIndex(self.callables.len() as u32);
        self.callables.push(Callable {
            index,
            parent,
            sub_trace,
            timestamp,
            labels: Vec::new(),
            additional_information: Vec::new(),
            kind: kind.detached(),
        });

        self.sub_traces[sub_trace.index()].reset_memos();
        self.size.reset();
        Ok(index)
    }

    /// Every interned id carried by `kind` must come from this trace
    fn check_registered(&self, kind: &CallableKind) -> ModelResult<()> {
        if let Some(id) = kind
            .string_ids()
            .into_iter()
            .find(|id| id.index() >= self.registry.string_count())
        {
            return Err(ModelError::NotRegistered {
                kind: "string",
                id: id.raw(),
            });
        }
        if let Some(id) = kind.signature_id() {
            self.registry.signature_key(id)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Remote links
    // ---------------------------------------------------------------------

    /// Link a remote invocation to the sub-trace it invoked.
    ///
    /// The target must be a child of the invocation's own sub-trace and
    /// must not be linked to another invocation yet.
    ///
    /// # Errors
    /// * `ModelError::InvalidState` - any of the conditions above is violated
    pub fn set_target_sub_trace(
        &mut self,
        remote: CallableIndex,
        target: SubTraceIndex,
    ) -> ModelResult<()> {
        let caller = self.callable(remote)?;
        let containing = caller.node().sub_trace;
        match caller.kind() {
            CallableKind::Remote(r) if r.target_sub_trace.is_some() => {
                return Err(ModelError::invalid_state(format!(
                    "remote invocation {} already targets a sub-trace",
                    remote
                )));
            }
            CallableKind::Remote(_) => {}
            other => {
                return Err(ModelError::invalid_state(format!(
                    "{} {} cannot invoke a sub-trace",
                    other.type_name(),
                    remote
                )));
            }
        }

        let target_node = self.sub_trace(target)?.node();
        if target_node.parent != Some(containing) {
            return Err(ModelError::invalid_state(format!(
                "sub-trace {} is not a child of {}",
                target, containing
            )));
        }
        if target_node.invoker.is_some() {
            return Err(ModelError::invalid_state(format!(
                "sub-trace {} is already invoked",
                target
            )));
        }

        if let CallableKind::Remote(r) = &mut self.callables[remote.index()].kind {
            r.target_sub_trace = Some(target);
        }
        self.sub_traces[target.index()].invoker = Some(remote);
        Ok(())
    }

    /// Create a child sub-trace of the invocation's sub-trace and link it
    pub fn invoke_sub_trace(
        &mut self,
        remote: CallableIndex,
        id: u64,
        location: Location,
    ) -> ModelResult<SubTraceIndex> {
        let caller = self.callable(remote)?;
        if !matches!(caller.kind(), CallableKind::Remote(r) if r.target_sub_trace.is_none()) {
            return Err(ModelError::invalid_state(format!(
                "{} {} cannot invoke a new sub-trace",
                caller.kind().type_name(),
                remote
            )));
        }
        let containing = caller.node().sub_trace;

        let target = self.add_sub_trace(containing, id, location)?;
        self.set_target_sub_trace(remote, target)?;
        Ok(target)
    }

    /// Mark a sub-trace invocation as asynchronous (or not)
    ///
    /// # Errors
    /// * `ModelError::InvalidState` - the callable is not a remote invocation
    ///   linked to a target sub-trace
    pub fn set_async_invocation(
        &mut self,
        remote: CallableIndex,
        async_invocation: bool,
    ) -> ModelResult<()> {
        let caller = self.callable(remote)?;
        if !caller.is_sub_trace_invocation() {
            return Err(ModelError::invalid_state(format!(
                "{} {} is not a sub-trace invocation",
                caller.kind().type_name(),
                remote
            )));
        }

        if let CallableKind::Remote(r) = &mut self.callables[remote.index()].kind {
            r.async_invocation = async_invocation;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Callable attributes
    // ---------------------------------------------------------------------

    /// Intern `label` and attach it to a callable
    pub fn add_label(&mut self, callable: CallableIndex, label: &str) -> ModelResult<()> {
        self.callable(callable)?;
        let id = self.registry.register_string(Some(label));
        self.callables[callable.index()].labels.push(id);
        Ok(())
    }

    /// Attach an already interned label
    ///
    /// # Errors
    /// * `ModelError::NotRegistered` - the id is unknown to this trace
    pub fn add_label_id(&mut self, callable: CallableIndex, label: StringId) -> ModelResult<()> {
        self.callable(callable)?;
        self.registry.resolve_string(label)?;
        self.callables[callable.index()].labels.push(label);
        Ok(())
    }

    pub fn add_additional_information(
        &mut self,
        callable: CallableIndex,
        info: AdditionalInfo,
    ) -> ModelResult<()> {
        self.callable(callable)?;
        self.callables[callable.index()]
            .additional_information
            .push(info);
        Ok(())
    }

    /// Register a signature and attach it to a method invocation
    ///
    /// # Errors
    /// * `ModelError::InvalidState` - the callable is not a `MethodInvocation`
    pub fn set_signature<I, T>(
        &mut self,
        callable: CallableIndex,
        return_type: Option<&str>,
        package_name: Option<&str>,
        class_name: Option<&str>,
        method_name: Option<&str>,
        parameter_types: I,
    ) -> ModelResult<SignatureId>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let target = self.callable(callable)?;
        if !matches!(target.kind(), CallableKind::Method(_)) {
            return Err(ModelError::invalid_state(format!(
                "{} {} has no signature",
                target.kind().type_name(),
                callable
            )));
        }

        let id = self.register_signature(
            return_type,
            package_name,
            class_name,
            method_name,
            parameter_types,
        );
        if let CallableKind::Method(m) = &mut self.callables[callable.index()].kind {
            m.signature = Some(id);
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::variants::{LoggingInvocation, MethodInvocation, RemoteInvocation};

    fn loc(host: &str) -> Location {
        Location::new(host)
    }

    #[test]
    fn test_root_is_set_once() {
        let mut trace = Trace::new(1);
        trace.set_root(10, loc("a")).unwrap();
        let err = trace.set_root(11, loc("b")).unwrap_err();
        assert!(matches!(err, ModelError::InvalidState(_)));
        assert_eq!(trace.sub_trace_count(), 1);
    }

    #[test]
    fn test_duplicate_sub_trace_id_rejected() {
        let mut trace = Trace::new(1);
        let root = trace.set_root(10, loc("a")).unwrap();
        assert!(trace.add_sub_trace(root, 10, loc("b")).is_err());
        assert!(trace.add_sub_trace(root, 11, loc("b")).is_ok());
        assert_eq!(trace.find_sub_trace(11).unwrap().location().host(), "b");
    }

    #[test]
    fn test_leaf_cannot_have_children() {
        let mut trace = Trace::new(1);
        let st = trace.set_root(1, loc("a")).unwrap();
        let level = trace.register_string(Some("INFO"));
        let msg = trace.register_string(Some("hello"));
        let root = trace.set_root_callable(st, 0, MethodInvocation::new(10)).unwrap();
        let log = trace
            .add_callable(root, 1, LoggingInvocation::new(level, msg))
            .unwrap();

        let err = trace.add_callable(log, 2, MethodInvocation::new(1)).unwrap_err();
        assert!(matches!(err, ModelError::InvalidState(_)));
    }

    #[test]
    fn test_second_root_callable_rejected() {
        let mut trace = Trace::new(1);
        let st = trace.set_root(1, loc("a")).unwrap();
        trace.set_root_callable(st, 0, MethodInvocation::new(10)).unwrap();
        assert!(trace.set_root_callable(st, 0, MethodInvocation::new(10)).is_err());
    }

    #[test]
    fn test_foreign_string_id_rejected() {
        let mut other = Trace::new(2);
        other.register_string(Some("x"));
        let foreign = other.register_string(Some("y"));

        let mut trace = Trace::new(1);
        let st = trace.set_root(1, loc("a")).unwrap();
        let err = trace
            .set_root_callable(st, 0, LoggingInvocation::new(foreign, foreign))
            .unwrap_err();
        assert_eq!(err, ModelError::NotRegistered { kind: "string", id: 1 });
    }

    #[test]
    fn test_target_must_be_child_of_containing_sub_trace() {
        let mut trace = Trace::new(1);
        let st = trace.set_root(1, loc("a")).unwrap();
        let child = trace.add_sub_trace(st, 2, loc("b")).unwrap();
        let grandchild = trace.add_sub_trace(child, 3, loc("c")).unwrap();
        let root = trace.set_root_callable(st, 0, MethodInvocation::new(10)).unwrap();
        let remote = trace.add_callable(root, 1, RemoteInvocation::new(5)).unwrap();

        assert!(trace.set_target_sub_trace(remote, grandchild).is_err());
        trace.set_target_sub_trace(remote, child).unwrap();
        assert!(trace.set_target_sub_trace(remote, child).is_err());
        assert_eq!(trace.sub_trace(child).unwrap().node().invoker(), Some(remote));
    }

    #[test]
    fn test_only_remote_invocations_target_sub_traces() {
        let mut trace = Trace::new(1);
        let st = trace.set_root(1, loc("a")).unwrap();
        let child = trace.add_sub_trace(st, 2, loc("b")).unwrap();
        let root = trace.set_root_callable(st, 0, MethodInvocation::new(10)).unwrap();

        let err = trace.set_target_sub_trace(root, child).unwrap_err();
        assert!(matches!(err, ModelError::InvalidState(_)));
        assert!(trace.invoke_sub_trace(root, 3, loc("c")).is_err());
    }

    #[test]
    fn test_async_flag_requires_linked_invocation() {
        let mut trace = Trace::new(1);
        let st = trace.set_root(1, loc("a")).unwrap();
        let root = trace.set_root_callable(st, 0, MethodInvocation::new(10)).unwrap();
        let remote = trace.add_callable(root, 1, RemoteInvocation::new(4)).unwrap();

        assert!(matches!(
            trace.set_async_invocation(remote, true),
            Err(ModelError::InvalidState(_))
        ));
        assert!(trace.set_async_invocation(root, true).is_err());
        assert!(!trace.callable(remote).unwrap().is_async_invocation());

        trace.invoke_sub_trace(remote, 2, loc("b")).unwrap();
        trace.set_async_invocation(remote, true).unwrap();
        assert!(trace.callable(remote).unwrap().is_async_invocation());

        trace.set_async_invocation(remote, false).unwrap();
        assert!(!trace.callable(remote).unwrap().is_async_invocation());
    }

    #[test]
    fn test_readded_kind_drops_async_flag() {
        let mut trace = Trace::new(1);
        let st = trace.set_root(1, loc("a")).unwrap();
        let root = trace.set_root_callable(st, 0, MethodInvocation::new(10)).unwrap();
        let remote = trace.add_callable(root, 1, RemoteInvocation::new(4)).unwrap();
        trace.invoke_sub_trace(remote, 2, loc("b")).unwrap();
        trace.set_async_invocation(remote, true).unwrap();

        let copy = trace.callable(remote).unwrap().kind().clone();
        let again = trace.add_callable(root, 2, copy).unwrap();
        assert!(!trace.callable(again).unwrap().is_async_invocation());
        assert!(!trace.callable(again).unwrap().is_sub_trace_invocation());
    }

    #[test]
    fn test_signature_only_on_methods() {
        let mut trace = Trace::new(1);
        let st = trace.set_root(1, loc("a")).unwrap();
        let root = trace.set_root_callable(st, 0, MethodInvocation::new(10)).unwrap();
        let remote = trace.add_callable(root, 0, RemoteInvocation::new(1)).unwrap();

        let sig = trace
            .set_signature(root, Some("void"), Some("org.shop"), Some("Cart"), Some("checkout"), ["int"])
            .unwrap();
        assert_eq!(
            trace.resolve_signature(sig).unwrap().to_string(),
            "void org.shop.Cart.checkout(int)"
        );
        assert!(trace
            .set_signature(remote, None, None, None, Some("x"), Vec::<String>::new())
            .is_err());
    }
}
