use cta_trace::model::{CallableIndex, Location, MethodInvocation, RemoteInvocation, Trace};
use cta_trace::traversal::{CallableIter, TreeIterator};
use cta_trace::ModelError;
use pretty_assertions::assert_eq;

/// Grow a perfect `width`-ary method tree of `depth` levels below `root`
fn grow(trace: &mut Trace, root: CallableIndex, depth: usize, width: usize) {
    let mut frontier = vec![(root, 0)];
    while let Some((parent, level)) = frontier.pop() {
        if level == depth {
            continue;
        }
        for _ in 0..width {
            let child = trace
                .add_callable(parent, 0, MethodInvocation::new(1))
                .unwrap();
            frontier.push((child, level + 1));
        }
    }
}

fn perfect_trace(depth: usize, width: usize) -> Trace {
    let mut trace = Trace::new(1);
    let st = trace.set_root(1, Location::new("host")).unwrap();
    let root = trace
        .set_root_callable(st, 0, MethodInvocation::new(1))
        .unwrap();
    grow(&mut trace, root, depth, width);
    trace
}

fn collect_depths<I: TreeIterator>(mut iter: I) -> Vec<usize> {
    let mut depths = Vec::new();
    while iter.next().is_some() {
        depths.push(iter.current_depth());
    }
    depths
}

#[test]
fn test_perfect_tree_size_and_depth() {
    for (depth, width) in [(0, 4), (1, 1), (2, 3), (3, 2), (4, 3), (200, 1)] {
        let trace = perfect_trace(depth, width);
        let st = trace.root().unwrap();
        let expected: usize = (0..=depth).map(|i| width.pow(i as u32)).sum();

        assert_eq!(st.size(), expected, "size for d={} w={}", depth, width);
        assert_eq!(st.max_depth(), depth, "depth for d={} w={}", depth, width);
        assert_eq!(trace.size(), expected);
    }
}

#[test]
fn test_two_level_three_wide_tree() {
    let trace = perfect_trace(2, 3);
    let st = trace.root().unwrap();
    assert_eq!(st.size(), 13);
    assert_eq!(st.max_depth(), 2);
    assert_eq!(st.root().unwrap().child_count().unwrap(), 12);
}

#[test]
fn test_deep_chain_does_not_recurse() {
    let trace = perfect_trace(100_000, 1);
    let st = trace.root().unwrap();
    assert_eq!(st.size(), 100_001);
    assert_eq!(st.max_depth(), 100_000);
}

#[test]
fn test_cross_boundary_depth_increases_by_one_per_edge() {
    // Invocation at depth p = 2 into a target tree of depth q = 3
    let mut trace = Trace::new(1);
    let web = trace.set_root(1, Location::new("web")).unwrap();
    let root = trace
        .set_root_callable(web, 0, MethodInvocation::new(10))
        .unwrap();
    let mid = trace.add_callable(root, 1, MethodInvocation::new(8)).unwrap();
    let remote = trace.add_callable(mid, 2, RemoteInvocation::new(5)).unwrap();
    trace.add_callable(root, 9, MethodInvocation::new(1)).unwrap();

    let db = trace.invoke_sub_trace(remote, 2, Location::new("db")).unwrap();
    let target_root = trace
        .set_root_callable(db, 3, MethodInvocation::new(4))
        .unwrap();
    let mut tip = target_root;
    for ts in 4..7 {
        tip = trace.add_callable(tip, ts, MethodInvocation::new(1)).unwrap();
    }

    let mut iter = trace.callables();
    let mut seen = Vec::new();
    while let Some(c) = iter.next() {
        seen.push((c.timestamp(), iter.current_depth()));
    }

    assert_eq!(
        seen,
        vec![(0, 0), (1, 1), (2, 2), (3, 3), (4, 4), (5, 5), (6, 6), (9, 1)]
    );

    // Each sub-trace on its own stays local
    assert_eq!(trace.root().unwrap().max_depth(), 2);
    assert_eq!(trace.sub_trace(db).unwrap().max_depth(), 3);
    assert_eq!(trace.max_call_depth(), 6);
    assert_eq!(trace.size(), 8);
}

#[test]
fn test_cross_boundary_chain_of_hops() {
    let mut trace = Trace::new(1);
    let mut st = trace.set_root(0, Location::new("h0")).unwrap();
    for hop in 0..5u64 {
        let root = trace
            .set_root_callable(st, 0, MethodInvocation::new(10))
            .unwrap();
        let remote = trace.add_callable(root, 0, RemoteInvocation::new(5)).unwrap();
        st = trace
            .invoke_sub_trace(remote, hop + 1, Location::new(format!("h{}", hop + 1)))
            .unwrap();
    }

    let depths = collect_depths(trace.callables());
    assert_eq!(depths, (0..10).collect::<Vec<_>>());
    assert_eq!(trace.sub_traces().count(), 6);
}

#[test]
fn test_single_sub_trace_iterator_does_not_cross() {
    let mut trace = Trace::new(1);
    let web = trace.set_root(1, Location::new("web")).unwrap();
    let root = trace
        .set_root_callable(web, 0, MethodInvocation::new(10))
        .unwrap();
    let remote = trace.add_callable(root, 1, RemoteInvocation::new(5)).unwrap();
    let db = trace.invoke_sub_trace(remote, 2, Location::new("db")).unwrap();
    trace
        .set_root_callable(db, 2, MethodInvocation::new(4))
        .unwrap();

    assert_eq!(trace.root().unwrap().callables().count(), 2);
    assert_eq!(trace.callables().count(), 3);
}

#[test]
fn test_all_iterators_report_exhaustion() {
    let trace = perfect_trace(1, 2);

    let mut callables = CallableIter::new(trace.root().unwrap().root().unwrap());
    for _ in 0..3 {
        callables.try_next().unwrap();
    }
    assert_eq!(callables.try_next().unwrap_err(), ModelError::IteratorExhausted);

    let mut sub_traces = trace.sub_traces();
    sub_traces.try_next().unwrap();
    assert_eq!(sub_traces.try_next().unwrap_err(), ModelError::IteratorExhausted);

    let mut whole = trace.callables();
    for _ in 0..3 {
        whole.try_next().unwrap();
    }
    assert_eq!(whole.try_next().unwrap_err(), ModelError::IteratorExhausted);
    assert_eq!(whole.try_next().unwrap_err(), ModelError::IteratorExhausted);
}

#[test]
fn test_concrete_scenario_metrics() {
    let mut trace = Trace::new(1);
    let st = trace.set_root(1, Location::new("host")).unwrap();
    let m1 = trace
        .set_root_callable(st, 0, MethodInvocation::new(30))
        .unwrap();
    trace.add_callable(m1, 1, MethodInvocation::new(10)).unwrap();
    trace.add_callable(m1, 12, MethodInvocation::new(15)).unwrap();

    let sub_trace = trace.root().unwrap();
    assert_eq!(sub_trace.size(), 3);
    assert_eq!(sub_trace.max_depth(), 1);

    let m1 = trace.callable(m1).unwrap();
    assert_eq!(m1.child_count().unwrap(), 2);
    assert_eq!(m1.exclusive_time().unwrap(), 5);
}
