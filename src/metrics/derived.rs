//! Derived, structure-dependent metrics.
//!
//! Sizes, depths and exclusive times are computed on first access and
//! cached on the node. Construction operations drop the affected caches.

use crate::model::{CallableKind, CallableRef, SubTraceRef, Trace};
use crate::traversal::TreeIterator;
use crate::utils::error::{ModelError, ModelResult};

impl<'a> SubTraceRef<'a> {
    /// Number of callables in this sub-trace, invoked sub-traces excluded
    pub fn size(&self) -> usize {
        *self.node().size.get_or_init(|| self.callables().count())
    }

    /// Longest root-to-leaf edge count inside this sub-trace.
    /// 0 for an empty sub-trace or a leaf root.
    pub fn max_depth(&self) -> usize {
        *self.node().max_depth.get_or_init(|| {
            let mut iter = self.callables();
            let mut deepest = 0;
            while iter.next().is_some() {
                deepest = deepest.max(iter.current_depth());
            }
            deepest
        })
    }
}

impl<'a> CallableRef<'a> {
    /// Number of transitive descendants inside the same sub-trace
    ///
    /// # Errors
    /// * `ModelError::InvalidState` - the callable cannot have children
    pub fn child_count(&self) -> ModelResult<usize> {
        if !self.kind().is_nesting() {
            return Err(ModelError::invalid_state(format!(
                "{} {} cannot have children",
                self.kind().type_name(),
                self.index()
            )));
        }
        Ok(self.descendants().count() - 1)
    }

    /// Response time minus the response times of direct timed children
    ///
    /// # Errors
    /// * `ModelError::InvalidState` - the callable is not timed, or the
    ///   difference does not fit in an `i64`
    pub fn exclusive_time(&self) -> ModelResult<i64> {
        let timed = self.kind().as_timed().ok_or_else(|| {
            ModelError::invalid_state(format!(
                "{} {} has no response time",
                self.kind().type_name(),
                self.index()
            ))
        })?;

        let timing = timed.timing();
        timing
            .exclusive_time
            .get_or_try_init(|| {
                let nested = self.checked_sum(self.children().filter_map(|c| c.response_time()))?;
                self.checked_diff(timing.response_time, nested)
            })
            .copied()
    }

    /// CPU time minus the CPU time of direct method invocation children.
    /// `None` when no CPU time was recorded.
    ///
    /// # Errors
    /// * `ModelError::InvalidState` - the callable is not a method invocation,
    ///   or the difference does not fit in an `i64`
    pub fn exclusive_cpu_time(&self) -> ModelResult<Option<i64>> {
        let method = match self.kind() {
            CallableKind::Method(m) => m,
            other => {
                return Err(ModelError::invalid_state(format!(
                    "{} {} has no CPU time",
                    other.type_name(),
                    self.index()
                )))
            }
        };

        method
            .exclusive_cpu_time
            .get_or_try_init(|| {
                let Some(cpu) = method.cpu_time else {
                    return Ok(None);
                };
                let nested = self.checked_sum(self.children().filter_map(|child| {
                    match child.kind() {
                        CallableKind::Method(m) => m.cpu_time,
                        _ => None,
                    }
                }))?;
                self.checked_diff(cpu, nested).map(Some)
            })
            .copied()
    }

    fn checked_sum(&self, mut times: impl Iterator<Item = i64>) -> ModelResult<i64> {
        times.try_fold(0i64, |acc, t| acc.checked_add(t)).ok_or_else(|| {
            ModelError::invalid_state(format!("child times of {} overflow", self.index()))
        })
    }

    fn checked_diff(&self, total: i64, nested: i64) -> ModelResult<i64> {
        total.checked_sub(nested).ok_or_else(|| {
            ModelError::invalid_state(format!(
                "exclusive time of {} overflows ({} - {})",
                self.index(),
                total,
                nested
            ))
        })
    }
}

impl Trace {
    /// Number of callables over every sub-trace
    pub fn size(&self) -> usize {
        *self
            .size
            .get_or_init(|| self.sub_traces().map(|st| st.size()).sum())
    }

    /// Deepest callable depth over the whole trace, crossing sub-trace
    /// boundaries. Not cached.
    pub fn max_call_depth(&self) -> usize {
        let mut iter = self.callables();
        let mut deepest = 0;
        while iter.next().is_some() {
            deepest = deepest.max(iter.current_depth());
        }
        deepest
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        DatabaseInvocation, Location, LoggingInvocation, MethodInvocation, RemoteInvocation, Trace,
    };
    use crate::utils::error::ModelError;

    #[test]
    fn test_exclusive_time_skips_untimed_children() {
        let mut trace = Trace::new(1);
        let st = trace.set_root(1, Location::new("h")).unwrap();
        let sql = trace.register_string(Some("SELECT 1"));
        let lvl = trace.register_string(Some("INFO"));
        let msg = trace.register_string(Some("m"));

        let root = trace.set_root_callable(st, 0, MethodInvocation::new(100)).unwrap();
        trace.add_callable(root, 1, MethodInvocation::new(30)).unwrap();
        trace.add_callable(root, 2, DatabaseInvocation::new(20, sql)).unwrap();
        trace.add_callable(root, 3, RemoteInvocation::new(15)).unwrap();
        trace.add_callable(root, 4, LoggingInvocation::new(lvl, msg)).unwrap();

        assert_eq!(trace.callable(root).unwrap().exclusive_time().unwrap(), 35);
    }

    #[test]
    fn test_childless_exclusive_time_is_response_time() {
        let mut trace = Trace::new(1);
        let st = trace.set_root(1, Location::new("h")).unwrap();
        let root = trace.set_root_callable(st, 0, MethodInvocation::new(12)).unwrap();
        assert_eq!(trace.callable(root).unwrap().exclusive_time().unwrap(), 12);
    }

    #[test]
    fn test_exclusive_time_refreshed_after_adding_child() {
        let mut trace = Trace::new(1);
        let st = trace.set_root(1, Location::new("h")).unwrap();
        let root = trace.set_root_callable(st, 0, MethodInvocation::new(50)).unwrap();
        assert_eq!(trace.callable(root).unwrap().exclusive_time().unwrap(), 50);
        assert_eq!(trace.root().unwrap().size(), 1);

        trace.add_callable(root, 1, MethodInvocation::new(20)).unwrap();
        assert_eq!(trace.callable(root).unwrap().exclusive_time().unwrap(), 30);
        assert_eq!(trace.root().unwrap().size(), 2);
        assert_eq!(trace.size(), 2);
    }

    #[test]
    fn test_exclusive_cpu_time() {
        let mut trace = Trace::new(1);
        let st = trace.set_root(1, Location::new("h")).unwrap();
        let root = trace
            .set_root_callable(st, 0, MethodInvocation::new(50).with_cpu_time(40))
            .unwrap();
        trace
            .add_callable(root, 1, MethodInvocation::new(20).with_cpu_time(15))
            .unwrap();
        let bare = trace.add_callable(root, 2, MethodInvocation::new(5)).unwrap();

        assert_eq!(trace.callable(root).unwrap().exclusive_cpu_time().unwrap(), Some(25));
        assert_eq!(trace.callable(bare).unwrap().exclusive_cpu_time().unwrap(), None);
    }

    #[test]
    fn test_extreme_times_report_overflow() {
        let mut trace = Trace::new(1);
        let st = trace.set_root(1, Location::new("h")).unwrap();
        let late = trace
            .set_root_callable(st, i64::MAX - 1, MethodInvocation::new(10))
            .unwrap();
        let low = trace
            .add_callable(late, 0, MethodInvocation::new(i64::MIN + 5).with_cpu_time(i64::MIN))
            .unwrap();
        trace
            .add_callable(low, 1, MethodInvocation::new(10).with_cpu_time(1))
            .unwrap();
        let huge = trace.add_callable(low, 2, MethodInvocation::new(i64::MAX)).unwrap();

        let late = trace.callable(late).unwrap();
        assert!(matches!(late.exit_time(), Err(ModelError::InvalidState(_))));

        let low = trace.callable(low).unwrap();
        assert!(matches!(low.exclusive_time(), Err(ModelError::InvalidState(_))));
        assert!(matches!(low.exclusive_cpu_time(), Err(ModelError::InvalidState(_))));

        let huge = trace.callable(huge).unwrap();
        assert_eq!(huge.exclusive_time().unwrap(), i64::MAX);
        assert!(matches!(huge.exit_time(), Err(ModelError::InvalidState(_))));
    }

    #[test]
    fn test_child_times_sum_overflow_is_reported() {
        let mut trace = Trace::new(1);
        let st = trace.set_root(1, Location::new("h")).unwrap();
        let root = trace.set_root_callable(st, 0, MethodInvocation::new(0)).unwrap();
        trace.add_callable(root, 1, MethodInvocation::new(i64::MAX)).unwrap();
        trace.add_callable(root, 2, MethodInvocation::new(1)).unwrap();

        assert!(matches!(
            trace.callable(root).unwrap().exclusive_time(),
            Err(ModelError::InvalidState(_))
        ));
    }

    #[test]
    fn test_child_count_requires_nesting() {
        let mut trace = Trace::new(1);
        let st = trace.set_root(1, Location::new("h")).unwrap();
        let root = trace.set_root_callable(st, 0, MethodInvocation::new(50)).unwrap();
        let remote = trace.add_callable(root, 1, RemoteInvocation::new(5)).unwrap();

        assert_eq!(trace.callable(root).unwrap().child_count().unwrap(), 1);
        assert!(matches!(
            trace.callable(remote).unwrap().child_count(),
            Err(ModelError::InvalidState(_))
        ));
    }

    #[test]
    fn test_leaf_root_has_zero_depth() {
        let mut trace = Trace::new(1);
        let st = trace.set_root(1, Location::new("h")).unwrap();
        trace.set_root_callable(st, 0, RemoteInvocation::new(5)).unwrap();
        assert_eq!(trace.root().unwrap().max_depth(), 0);
        assert_eq!(trace.root().unwrap().size(), 1);
    }
}
