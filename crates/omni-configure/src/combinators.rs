//! Configurator combinators.
//!
//! [`configure_nodes`] and [`configure_edges`] provide the per-node and
//! per-edge iteration pattern shared by every domain configurator: obtain
//! the adapter for the relevant point through the factory, run the
//! callback, normalize its output into a transaction list. The adapter for
//! an edge is always anchored at the edge's `from` point, since by protocol
//! convention the sender configures outbound behavior.
//!
//! [`ConfigureMultiple`] composes configurators in declaration order;
//! that ordering is load-bearing, because some configuration changes are
//! prerequisites for others (e.g. registering a library before selecting
//! it), so the output concatenation is identical no matter whether the
//! parts executed sequentially or in parallel.

use crate::{ConfigureError, Configurator};
use async_trait::async_trait;
use futures::future::{try_join_all, BoxFuture};
use omni_sdk::{OAppFactory, OAppSdk, SdkError};
use omni_types::{OmniEdge, OmniGraph, OmniNode, OmniTransaction};
use std::sync::Arc;

/// Execution policy for composed configurators.
///
/// Sequential is the default: it keeps provider request rates low and is
/// always safe. Parallel execution is an opt-in for well-provisioned RPC
/// setups; it never changes output ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
	#[default]
	Sequential,
	Parallel,
}

impl Execution {
	/// Reads the process-wide opt-in flag `OMNIWIRE_PARALLEL`.
	pub fn from_env() -> Self {
		match std::env::var("OMNIWIRE_PARALLEL") {
			Ok(value) if value == "1" || value.eq_ignore_ascii_case("true") => {
				Execution::Parallel
			}
			_ => Execution::Sequential,
		}
	}
}

/// Runs the callback for every node with an adapter bound to the node's
/// point.
///
/// `None` and empty results normalize to zero transactions. An empty graph
/// performs no factory calls and no callback calls. A callback error
/// aborts the whole configurator, attributed to the offending point.
pub async fn configure_nodes<N, E, F>(
	graph: &OmniGraph<N, E>,
	factory: &dyn OAppFactory,
	f: F,
) -> Result<Vec<OmniTransaction>, ConfigureError>
where
	F: Fn(
		&OmniNode<N>,
		Arc<dyn OAppSdk>,
	) -> BoxFuture<'static, Result<Option<Vec<OmniTransaction>>, SdkError>>,
{
	let mut transactions = Vec::new();

	for node in &graph.contracts {
		tracing::debug!(point = %node.point, "Configuring node");

		let sdk = factory
			.create(&node.point)
			.await
			.map_err(|source| ConfigureError::Node {
				point: node.point.clone(),
				source,
			})?;

		let emitted = f(node, sdk)
			.await
			.map_err(|source| ConfigureError::Node {
				point: node.point.clone(),
				source,
			})?;

		transactions.extend(emitted.into_iter().flatten());
	}

	Ok(transactions)
}

/// Runs the callback for every edge with an adapter bound to the edge's
/// `from` point.
///
/// Same normalization and error policy as [`configure_nodes`], with errors
/// attributed to the offending vector.
pub async fn configure_edges<N, E, F>(
	graph: &OmniGraph<N, E>,
	factory: &dyn OAppFactory,
	f: F,
) -> Result<Vec<OmniTransaction>, ConfigureError>
where
	F: Fn(
		&OmniEdge<E>,
		Arc<dyn OAppSdk>,
	) -> BoxFuture<'static, Result<Option<Vec<OmniTransaction>>, SdkError>>,
{
	let mut transactions = Vec::new();

	for edge in &graph.connections {
		tracing::debug!(vector = %edge.vector, "Configuring edge");

		let sdk = factory
			.create(&edge.vector.from)
			.await
			.map_err(|source| ConfigureError::Edge {
				vector: edge.vector.clone(),
				source,
			})?;

		let emitted = f(edge, sdk)
			.await
			.map_err(|source| ConfigureError::Edge {
				vector: edge.vector.clone(),
				source,
			})?;

		transactions.extend(emitted.into_iter().flatten());
	}

	Ok(transactions)
}

/// Ordered composition of configurators.
///
/// The resulting transaction list is always the concatenation of the
/// parts' results in declaration order, regardless of execution policy.
pub struct ConfigureMultiple<N, E> {
	configurators: Vec<Box<dyn Configurator<N, E>>>,
	execution: Execution,
}

impl<N: Send + Sync, E: Send + Sync> ConfigureMultiple<N, E> {
	/// Composes the given configurators with the execution policy taken
	/// from the process environment.
	pub fn new(configurators: Vec<Box<dyn Configurator<N, E>>>) -> Self {
		Self {
			configurators,
			execution: Execution::from_env(),
		}
	}

	pub fn with_execution(mut self, execution: Execution) -> Self {
		self.execution = execution;
		self
	}
}

#[async_trait]
impl<N: Send + Sync, E: Send + Sync> Configurator<N, E> for ConfigureMultiple<N, E> {
	async fn configure(
		&self,
		graph: &OmniGraph<N, E>,
		factory: &dyn OAppFactory,
	) -> Result<Vec<OmniTransaction>, ConfigureError> {
		match self.execution {
			Execution::Sequential => {
				let mut transactions = Vec::new();
				for configurator in &self.configurators {
					transactions.extend(configurator.configure(graph, factory).await?);
				}
				Ok(transactions)
			}
			Execution::Parallel => {
				// try_join_all resolves in declaration order even though the
				// parts run concurrently
				let results = try_join_all(
					self.configurators
						.iter()
						.map(|configurator| configurator.configure(graph, factory)),
				)
				.await?;

				Ok(results.into_iter().flatten().collect())
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MockFactory;
	use futures::FutureExt;
	use omni_types::{OmniPoint, OmniVector};
	use std::sync::atomic::{AtomicUsize, Ordering};

	fn graph_with_one_node() -> OmniGraph<(), ()> {
		OmniGraph {
			contracts: vec![OmniNode::new(OmniPoint::new(101u32, "0xA"), ())],
			connections: vec![],
		}
	}

	#[tokio::test]
	async fn test_empty_graph_invokes_nothing() {
		let graph: OmniGraph<(), ()> = OmniGraph::default();
		let factory = MockFactory::new();
		let calls = AtomicUsize::new(0);

		let node_result = configure_nodes(&graph, &factory, |_, _| {
			calls.fetch_add(1, Ordering::SeqCst);
			async { Ok(None) }.boxed()
		})
		.await
		.unwrap();

		let edge_result = configure_edges(&graph, &factory, |_, _| {
			calls.fetch_add(1, Ordering::SeqCst);
			async { Ok(None) }.boxed()
		})
		.await
		.unwrap();

		assert!(node_result.is_empty());
		assert!(edge_result.is_empty());
		assert_eq!(calls.load(Ordering::SeqCst), 0);
		assert_eq!(factory.created(), 0);
	}

	#[tokio::test]
	async fn test_callback_results_normalize_to_empty() {
		let graph = graph_with_one_node();
		let factory = MockFactory::new();

		let none = configure_nodes(&graph, &factory, |_, _| async { Ok(None) }.boxed())
			.await
			.unwrap();
		let empty = configure_nodes(&graph, &factory, |_, _| {
			async { Ok(Some(vec![])) }.boxed()
		})
		.await
		.unwrap();

		assert!(none.is_empty());
		assert!(empty.is_empty());
	}

	#[tokio::test]
	async fn test_nodes_callback_runs_once_per_node() {
		let graph = graph_with_one_node();
		let factory = MockFactory::new();
		let calls = AtomicUsize::new(0);

		configure_nodes(&graph, &factory, |node, _| {
			calls.fetch_add(1, Ordering::SeqCst);
			assert_eq!(node.point, OmniPoint::new(101u32, "0xA"));
			async { Ok(None) }.boxed()
		})
		.await
		.unwrap();

		assert_eq!(calls.load(Ordering::SeqCst), 1);

		// The same graph has no connections, so the edge variant is inert
		let edge_result = configure_edges(&graph, &factory, |_, _| {
			calls.fetch_add(1, Ordering::SeqCst);
			async { Ok(None) }.boxed()
		})
		.await
		.unwrap();

		assert!(edge_result.is_empty());
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_edges_anchor_sdk_at_from_point() {
		let from = OmniPoint::new(101u32, "0xA");
		let to = OmniPoint::new(102u32, "0xB");
		let graph: OmniGraph<(), ()> = OmniGraph {
			contracts: vec![
				OmniNode::new(from.clone(), ()),
				OmniNode::new(to.clone(), ()),
			],
			connections: vec![OmniEdge::new(OmniVector::new(from.clone(), to.clone()), ())],
		};
		let factory = MockFactory::new();

		configure_edges(&graph, &factory, |edge, sdk| {
			assert_eq!(sdk.point(), &edge.vector.from);
			async { Ok(None) }.boxed()
		})
		.await
		.unwrap();
	}

	#[tokio::test]
	async fn test_callback_error_aborts_with_context() {
		let graph = graph_with_one_node();
		let factory = MockFactory::new();

		let result = configure_nodes(&graph, &factory, |_, _| {
			async { Err(SdkError::Provider("boom".into())) }.boxed()
		})
		.await;

		let err = result.expect_err("callback errors must propagate");
		assert!(matches!(err, ConfigureError::Node { point, .. } if point == OmniPoint::new(101u32, "0xA")));
	}

	struct Labeled(&'static str);

	#[async_trait]
	impl Configurator<(), ()> for Labeled {
		async fn configure(
			&self,
			_graph: &OmniGraph<(), ()>,
			_factory: &dyn OAppFactory,
		) -> Result<Vec<OmniTransaction>, ConfigureError> {
			Ok(vec![
				OmniTransaction::new(OmniPoint::new(101u32, "0xA"), format!("{}-1", self.0)),
				OmniTransaction::new(OmniPoint::new(101u32, "0xA"), format!("{}-2", self.0)),
			])
		}
	}

	#[tokio::test]
	async fn test_composition_order_is_identical_under_both_policies() {
		let graph: OmniGraph<(), ()> = OmniGraph::default();
		let factory = MockFactory::new();

		let mut outputs = Vec::new();
		for execution in [Execution::Sequential, Execution::Parallel] {
			let composed =
				ConfigureMultiple::new(vec![Box::new(Labeled("first")), Box::new(Labeled("second"))])
					.with_execution(execution);

			let transactions = composed.configure(&graph, &factory).await.unwrap();
			let data: Vec<_> = transactions.into_iter().map(|t| t.data).collect();
			outputs.push(data);
		}

		assert_eq!(outputs[0], outputs[1]);
		assert_eq!(
			outputs[0],
			vec!["first-1", "first-2", "second-1", "second-2"]
		);
	}

	#[test]
	fn test_execution_defaults_to_sequential() {
		assert_eq!(Execution::default(), Execution::Sequential);
	}
}
