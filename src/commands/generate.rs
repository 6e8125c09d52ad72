//! Generate command implementation.
//!
//! The generate command:
//! 1. Validates the requested tree shape
//! 2. Builds synthetic traces (a perfect method tree per sub-trace, chained
//!    through remote invocations across hosts)
//! 3. Writes them as one binary trace stream

use super::models::GenerateArgs;
use crate::codec::TraceWriter;
use crate::model::{
    CallableIndex, DatabaseInvocation, Location, LoggingInvocation, MethodInvocation,
    RemoteInvocation, Trace,
};
use crate::utils::config::MAX_GENERATED_NODES;
use crate::utils::error::ModelError;
use anyhow::{Context, Result};
use log::{debug, info};
use std::fs::File;
use std::io::BufWriter;
use std::time::Instant;

const PACKAGE: &str = "org.example.shop";
const DB_RESPONSE_TIME: i64 = 2;

/// Execute the generate command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Invalid tree shape
/// * File create/write errors
pub fn execute_generate(args: GenerateArgs) -> Result<()> {
    let start_time = Instant::now();
    validate_args(&args)?;

    info!(
        "Generating {} trace(s): depth {}, width {}, {} remote hop(s)",
        args.count, args.depth, args.width, args.remote_hops
    );

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let mut writer = TraceWriter::new(BufWriter::new(file));

    for n in 0..args.count {
        let trace_id = n as u64 + 1;
        let trace = build_synthetic_trace(trace_id, &args)
            .with_context(|| format!("Failed to build trace {}", trace_id))?;
        debug!("Built trace {} with {} callables", trace_id, trace.size());

        writer
            .write(&trace)
            .with_context(|| format!("Failed to write trace {}", trace_id))?;
    }
    writer.into_inner().context("Failed to flush trace stream")?;

    info!("✓ Trace stream written to: {}", args.output.display());
    info!(
        "Generation completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Validate generate arguments
///
/// **Public** - can be called before execute_generate for early validation
pub fn validate_args(args: &GenerateArgs) -> Result<()> {
    if args.count == 0 {
        anyhow::bail!("count must be greater than 0");
    }

    if args.width == 0 {
        anyhow::bail!("width must be greater than 0");
    }

    match expected_size(args) {
        Some(nodes) if nodes <= MAX_GENERATED_NODES as u64 => Ok(()),
        _ => anyhow::bail!(
            "tree shape is too large (max {} callables per trace)",
            MAX_GENERATED_NODES
        ),
    }
}

/// Number of callables in a perfect `width`-ary tree of `depth` levels
/// below the root, or `None` on overflow
pub fn perfect_size(width: usize, depth: usize) -> Option<u64> {
    let width = width as u64;
    let mut total = 1u64;
    let mut level = 1u64;
    for _ in 0..depth {
        level = level.checked_mul(width)?;
        total = total.checked_add(level)?;
    }
    Some(total)
}

/// Callables in one synthetic trace: one perfect tree per sub-trace, one
/// remote invocation per hop, plus the logging and database leaves
pub fn expected_size(args: &GenerateArgs) -> Option<u64> {
    let hops = args.remote_hops as u64;
    perfect_size(args.width, args.depth)?
        .checked_mul(hops.checked_add(1)?)?
        .checked_add(hops.checked_add(2)?)
}

/// Build one synthetic trace
///
/// **Public** - also used by tests to get realistic multi-host traces
pub fn build_synthetic_trace(trace_id: u64, args: &GenerateArgs) -> Result<Trace, ModelError> {
    expected_size(args)
        .filter(|nodes| *nodes <= i64::MAX as u64)
        .ok_or_else(|| ModelError::invalid_state("tree shape overflows"))?;
    let tree_size = perfect_size(args.width, args.depth)
        .ok_or_else(|| ModelError::invalid_state("tree shape overflows"))? as i64;
    let root_times = root_response_times(tree_size, args.remote_hops);

    let mut trace = Trace::new(trace_id);
    let mut clock = Clock::default();
    let mut sub_trace = trace.set_root(0, synthetic_location(0))?;

    for hop in 0..=args.remote_hops {
        let mut response_time = root_times[hop];
        if hop == 0 {
            response_time += DB_RESPONSE_TIME;
        }

        let root = trace.set_root_callable(
            sub_trace,
            clock.tick(),
            MethodInvocation::new(response_time).with_cpu_time(tree_size),
        )?;
        trace.set_signature(
            root,
            Some("void"),
            Some(PACKAGE),
            Some(format!("Service{}", hop).as_str()),
            Some("handle"),
            ["java.lang.String"],
        )?;
        trace.add_label(root, "synthetic")?;

        grow_perfect_tree(&mut trace, root, args, &mut clock)?;
        if hop == 0 {
            add_leaves(&mut trace, root, &mut clock)?;
        }

        if hop < args.remote_hops {
            let next = synthetic_location(hop + 1);
            let endpoint = format!("http://{}/handle", next.host());
            let endpoint = trace.register_string(Some(endpoint.as_str()));
            let remote = trace.add_callable(
                root,
                clock.tick(),
                RemoteInvocation::new(root_times[hop + 1] + 1)
                    .with_target(endpoint)
                    .with_target_location(next.clone()),
            )?;
            sub_trace = trace.invoke_sub_trace(remote, hop as u64 + 1, next)?;
        }
    }

    Ok(trace)
}

/// Monotonic millisecond clock for synthetic timestamps
#[derive(Default)]
struct Clock(i64);

impl Clock {
    fn tick(&mut self) -> i64 {
        self.0 += 1;
        self.0
    }
}

fn synthetic_location(hop: usize) -> Location {
    Location::new(format!("host-{}", hop))
        .with_runtime_environment(format!("jvm-{}", hop))
        .with_application("shop")
        .with_business_transaction("checkout")
        .with_node_type(if hop == 0 { "frontend" } else { "backend" })
}

/// Response time of each hop's root: its own tree plus everything it invokes
fn root_response_times(tree_size: i64, hops: usize) -> Vec<i64> {
    let mut times = vec![tree_size; hops + 1];
    for hop in (0..hops).rev() {
        times[hop] += times[hop + 1] + 1;
    }
    times
}

/// Grow a perfect tree below `root`; every method gets an exclusive time of 1
fn grow_perfect_tree(
    trace: &mut Trace,
    root: CallableIndex,
    args: &GenerateArgs,
    clock: &mut Clock,
) -> Result<(), ModelError> {
    let mut frontier = vec![(root, 0usize)];

    while let Some((parent, level)) = frontier.pop() {
        if level == args.depth {
            continue;
        }

        let subtree = perfect_size(args.width, args.depth - level - 1).unwrap_or(1) as i64;
        for step in 0..args.width {
            let child = trace.add_callable(
                parent,
                clock.tick(),
                MethodInvocation::new(subtree)
                    .with_cpu_time(subtree)
                    .with_parameter_value(0, step.to_string()),
            )?;
            trace.set_signature(
                child,
                Some("void"),
                Some(PACKAGE),
                Some(format!("Level{}", level + 1).as_str()),
                Some(format!("step{}", step).as_str()),
                ["int"],
            )?;
            frontier.push((child, level + 1));
        }
    }

    Ok(())
}

fn add_leaves(trace: &mut Trace, root: CallableIndex, clock: &mut Clock) -> Result<(), ModelError> {
    let level = trace.register_string(Some("INFO"));
    let message = trace.register_string(Some("checkout started"));
    trace.add_callable(root, clock.tick(), LoggingInvocation::new(level, message))?;

    let sql = trace.register_string(Some("SELECT total FROM orders WHERE id = ?"));
    let product = trace.register_string(Some("PostgreSQL"));
    let version = trace.register_string(Some("15.4"));
    trace.add_callable(
        root,
        clock.tick(),
        DatabaseInvocation::new(DB_RESPONSE_TIME, sql)
            .prepared([(1, "42".to_string())])
            .with_product(product, version),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(depth: usize, width: usize, remote_hops: usize) -> GenerateArgs {
        GenerateArgs {
            depth,
            width,
            remote_hops,
            ..Default::default()
        }
    }

    #[test]
    fn test_perfect_size() {
        assert_eq!(perfect_size(3, 2), Some(13));
        assert_eq!(perfect_size(1, 4), Some(5));
        assert_eq!(perfect_size(7, 0), Some(1));
        assert_eq!(perfect_size(usize::MAX, 3), None);
    }

    #[test]
    fn test_validate_args_defaults() {
        assert!(validate_args(&GenerateArgs::default()).is_ok());
    }

    #[test]
    fn test_validate_args_zero_width() {
        assert!(validate_args(&args(2, 0, 0)).is_err());
    }

    #[test]
    fn test_validate_args_zero_count() {
        let args = GenerateArgs {
            count: 0,
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_too_large() {
        assert!(validate_args(&args(40, 10, 0)).is_err());
        assert!(validate_args(&args(2, 2, usize::MAX)).is_err());
        assert!(validate_args(&args(2, 2, usize::MAX - 1)).is_err());
        assert_eq!(expected_size(&args(2, 2, usize::MAX)), None);
    }

    #[test]
    fn test_build_rejects_overflowing_shape() {
        assert!(matches!(
            build_synthetic_trace(1, &args(1, 1, usize::MAX)),
            Err(ModelError::InvalidState(_))
        ));
    }

    #[test]
    fn test_synthetic_trace_shape() {
        let args = args(2, 3, 2);
        let trace = build_synthetic_trace(9, &args).unwrap();

        assert_eq!(trace.sub_trace_count(), 3);
        assert_eq!(trace.size() as u64, expected_size(&args).unwrap());

        let root = trace.root().unwrap();
        assert_eq!(root.size(), 13 + 3);
        assert_eq!(root.max_depth(), 2);

        let last = trace.find_sub_trace(2).unwrap();
        assert_eq!(last.size(), 13);
        assert_eq!(last.parent().unwrap().id(), 1);
        assert_eq!(last.invoker().unwrap().containing_sub_trace().id(), 1);

        // Two hops nest the last tree two levels below the first root
        assert_eq!(trace.max_call_depth(), 2 + 2 + 2);
    }

    #[test]
    fn test_synthetic_methods_have_unit_exclusive_time() {
        let trace = build_synthetic_trace(1, &args(2, 2, 1)).unwrap();
        for callable in trace.callables() {
            if callable.kind().is_nesting() {
                assert_eq!(callable.exclusive_time().unwrap(), 1);
                assert_eq!(callable.exclusive_cpu_time().unwrap(), Some(1));
            }
        }
    }
}
