//! Graph construction module for the omniwire toolkit.
//!
//! This module provides the mutable [`GraphBuilder`] used to assemble and
//! reshape an [`OmniGraph`] while preserving its one integrity invariant:
//! no edge may exist without both of its endpoint nodes present. The
//! builder fails fast on violation and never leaves the graph in a
//! partially-invalid state.

use omni_types::{same_endpoint, OmniEdge, OmniGraph, OmniNode, OmniPoint, OmniVector};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during graph construction.
#[derive(Debug, Clone, Error)]
pub enum GraphError {
	/// An edge referenced a point with no corresponding node.
	#[error("Cannot add edge {vector}: {missing} is not in the graph. Please check that it is included in the declared contracts.")]
	MissingEndpoint {
		/// The vector of the offending edge.
		vector: OmniVector,
		/// The endpoint point absent from the node set.
		missing: OmniPoint,
	},
	/// A reconnect callback failed.
	#[error("Failed to reconnect {vector}: {reason}")]
	Reconnect { vector: OmniVector, reason: String },
}

/// Mutable builder for an [`OmniGraph`].
///
/// Nodes are keyed by point, edges by vector; both upsert on duplicate
/// keys with last write winning. Iteration order is insertion order, which
/// keeps transaction plans deterministic across runs.
#[derive(Debug)]
pub struct GraphBuilder<N, E> {
	nodes: HashMap<OmniPoint, OmniNode<N>>,
	node_order: Vec<OmniPoint>,
	edges: HashMap<OmniVector, OmniEdge<E>>,
	edge_order: Vec<OmniVector>,
}

impl<N: Clone, E: Clone> Default for GraphBuilder<N, E> {
	fn default() -> Self {
		Self::new()
	}
}

impl<N: Clone, E: Clone> GraphBuilder<N, E> {
	pub fn new() -> Self {
		Self {
			nodes: HashMap::new(),
			node_order: Vec::new(),
			edges: HashMap::new(),
			edge_order: Vec::new(),
		}
	}

	/// Builds a graph builder from an existing graph, revalidating its
	/// invariant in the process.
	pub fn from_graph(graph: OmniGraph<N, E>) -> Result<Self, GraphError> {
		let mut builder = Self::new();
		builder.add_nodes(graph.contracts);
		builder.add_edges(graph.connections)?;
		Ok(builder)
	}

	/// Upserts nodes by point; last write wins for duplicate points.
	pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = OmniNode<N>>) -> &mut Self {
		for node in nodes {
			if self.nodes.insert(node.point.clone(), node.clone()).is_none() {
				self.node_order.push(node.point.clone());
			}
		}
		self
	}

	/// Upserts edges by vector after validating that both endpoints exist.
	///
	/// Validation runs over the whole batch before any insertion, so a
	/// failed call leaves the edge set untouched.
	pub fn add_edges(&mut self, edges: impl IntoIterator<Item = OmniEdge<E>>) -> Result<&mut Self, GraphError> {
		let edges: Vec<_> = edges.into_iter().collect();

		for edge in &edges {
			for endpoint in [&edge.vector.from, &edge.vector.to] {
				if !self.nodes.contains_key(endpoint) {
					return Err(GraphError::MissingEndpoint {
						vector: edge.vector.clone(),
						missing: endpoint.clone(),
					});
				}
			}
		}

		for edge in edges {
			tracing::debug!(vector = %edge.vector, "Adding edge");
			if self.edges.insert(edge.vector.clone(), edge.clone()).is_none() {
				self.edge_order.push(edge.vector.clone());
			}
		}
		Ok(self)
	}

	/// Removes a node and every edge touching its point, on either side.
	pub fn remove_node_at(&mut self, point: &OmniPoint) -> &mut Self {
		let touching: Vec<OmniVector> = self
			.edge_order
			.iter()
			.filter(|vector| vector.from == *point || vector.to == *point)
			.cloned()
			.collect();

		for vector in touching {
			self.remove_edge_at(&vector);
		}

		if self.nodes.remove(point).is_some() {
			self.node_order.retain(|p| p != point);
		}
		self
	}

	/// Removes an edge by vector; a no-op when the edge is absent.
	pub fn remove_edge_at(&mut self, vector: &OmniVector) -> &mut Self {
		if self.edges.remove(vector).is_some() {
			self.edge_order.retain(|v| v != vector);
		}
		self
	}

	/// Regenerates edges in bulk: for every ordered pair of nodes
	/// (including self-pairs), the callback receives both nodes and the
	/// existing edge, if any. Returning `Some` replaces the edge (still
	/// subject to the endpoint invariant), returning `None` removes it.
	pub fn reconnect<F>(&mut self, mut f: F) -> Result<&mut Self, GraphError>
	where
		F: FnMut(&OmniNode<N>, &OmniNode<N>, Option<&OmniEdge<E>>) -> Result<Option<OmniEdge<E>>, GraphError>,
	{
		let points = self.node_order.clone();

		for from in &points {
			for to in &points {
				let vector = OmniVector::new(from.clone(), to.clone());
				// Both nodes are in the order list so the lookups cannot miss
				let Some(from_node) = self.nodes.get(from).cloned() else {
					continue;
				};
				let Some(to_node) = self.nodes.get(to).cloned() else {
					continue;
				};
				let existing = self.edges.get(&vector).cloned();

				match f(&from_node, &to_node, existing.as_ref())? {
					Some(edge) => {
						self.add_edges([edge])?;
					}
					None => {
						self.remove_edge_at(&vector);
					}
				}
			}
		}
		Ok(self)
	}

	pub fn get_node_at(&self, point: &OmniPoint) -> Option<&OmniNode<N>> {
		self.nodes.get(point)
	}

	pub fn get_edge_at(&self, vector: &OmniVector) -> Option<&OmniEdge<E>> {
		self.edges.get(vector)
	}

	/// Edges whose sending side is the given point.
	pub fn get_edges_from(&self, point: &OmniPoint) -> Vec<&OmniEdge<E>> {
		self.edge_order
			.iter()
			.filter(|vector| vector.from == *point)
			.filter_map(|vector| self.edges.get(vector))
			.collect()
	}

	/// Edges whose receiving side is the given point.
	pub fn get_edges_to(&self, point: &OmniPoint) -> Vec<&OmniEdge<E>> {
		self.edge_order
			.iter()
			.filter(|vector| vector.to == *point)
			.filter_map(|vector| self.edges.get(vector))
			.collect()
	}

	/// All nodes in insertion order.
	pub fn nodes(&self) -> Vec<&OmniNode<N>> {
		self.node_order
			.iter()
			.filter_map(|point| self.nodes.get(point))
			.collect()
	}

	/// All edges in insertion order.
	pub fn edges(&self) -> Vec<&OmniEdge<E>> {
		self.edge_order
			.iter()
			.filter_map(|vector| self.edges.get(vector))
			.collect()
	}

	/// Materializes the current state as an immutable graph value.
	pub fn graph(&self) -> OmniGraph<N, E> {
		OmniGraph {
			contracts: self.nodes().into_iter().cloned().collect(),
			connections: self.edges().into_iter().cloned().collect(),
		}
	}
}

/// Wraps a reconnect callback so it only touches cross-endpoint pairs,
/// passing loopback pairs (same endpoint) through unchanged.
pub fn ignore_loopbacks<N, E: Clone, F>(
	mut f: F,
) -> impl FnMut(&OmniNode<N>, &OmniNode<N>, Option<&OmniEdge<E>>) -> Result<Option<OmniEdge<E>>, GraphError>
where
	F: FnMut(&OmniNode<N>, &OmniNode<N>, Option<&OmniEdge<E>>) -> Result<Option<OmniEdge<E>>, GraphError>,
{
	move |from, to, existing| {
		if same_endpoint(&from.point, &to.point) {
			Ok(existing.cloned())
		} else {
			f(from, to, existing)
		}
	}
}

/// Wraps a reconnect callback so it only touches loopback pairs (same
/// endpoint), passing cross-endpoint pairs through unchanged.
pub fn only_loopbacks<N, E: Clone, F>(
	mut f: F,
) -> impl FnMut(&OmniNode<N>, &OmniNode<N>, Option<&OmniEdge<E>>) -> Result<Option<OmniEdge<E>>, GraphError>
where
	F: FnMut(&OmniNode<N>, &OmniNode<N>, Option<&OmniEdge<E>>) -> Result<Option<OmniEdge<E>>, GraphError>,
{
	move |from, to, existing| {
		if same_endpoint(&from.point, &to.point) {
			f(from, to, existing)
		} else {
			Ok(existing.cloned())
		}
	}
}
