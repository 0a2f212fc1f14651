//! Graph access for traversal steps.
//!
//! This module provides the [`GraphAccessor`] trait that abstracts the graph
//! operations steps need. The trait is object-safe and is shared by every
//! traversal spawned from one [`TraversalSource`](crate::TraversalSource).

use std::collections::BTreeMap;

use traverso_core::{Direction, EdgeId, ElementAddress, ElementKind, Value, VertexId};

/// Graph accessor error type.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GraphAccessError {
    /// The referenced vertex does not exist.
    #[error("vertex not found: {0}")]
    VertexNotFound(VertexId),
}

/// Result type for graph accessor operations.
pub type GraphAccessResult<T> = Result<T, GraphAccessError>;

/// A trait for accessing the graph during traversal execution.
pub trait GraphAccessor: Send + Sync {
    /// Returns the vertices adjacent to `vertex` in `direction`.
    ///
    /// An empty `labels` slice matches every edge label. Results are in a
    /// stable order.
    fn adjacent(
        &self,
        vertex: VertexId,
        direction: Direction,
        labels: &[String],
    ) -> GraphAccessResult<Vec<VertexId>>;

    /// Resolves an element address to the element's current value.
    ///
    /// Returns `None` if the element does not exist in this graph.
    fn resolve(&self, address: &ElementAddress) -> GraphAccessResult<Option<Value>>;
}

/// A null implementation of `GraphAccessor` that returns no results.
///
/// Used by anonymous traversals until they are attached to a traversal
/// that has a graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullGraphAccessor;

impl GraphAccessor for NullGraphAccessor {
    fn adjacent(
        &self,
        _vertex: VertexId,
        _direction: Direction,
        _labels: &[String],
    ) -> GraphAccessResult<Vec<VertexId>> {
        Ok(Vec::new())
    }

    fn resolve(&self, _address: &ElementAddress) -> GraphAccessResult<Option<Value>> {
        Ok(None)
    }
}

#[derive(Debug, Clone)]
struct EdgeRecord {
    id: EdgeId,
    label: String,
    source: VertexId,
    target: VertexId,
}

/// A small in-memory graph.
///
/// Edges are kept in insertion order, which is also the order adjacency is
/// reported in.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    vertices: BTreeMap<VertexId, BTreeMap<String, Value>>,
    edges: Vec<EdgeRecord>,
}

impl MemoryGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vertex with no properties.
    pub fn add_vertex(&mut self, id: impl Into<VertexId>) -> VertexId {
        let id = id.into();
        self.vertices.entry(id).or_default();
        id
    }

    /// Sets a property on a vertex, creating the vertex if needed.
    pub fn set_property(&mut self, id: VertexId, key: impl Into<String>, value: impl Into<Value>) {
        self.vertices.entry(id).or_default().insert(key.into(), value.into());
    }

    /// Adds a labelled edge from `source` to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphAccessError::VertexNotFound`] if either endpoint is missing.
    pub fn add_edge(
        &mut self,
        source: VertexId,
        target: VertexId,
        label: impl Into<String>,
    ) -> GraphAccessResult<EdgeId> {
        for endpoint in [source, target] {
            if !self.vertices.contains_key(&endpoint) {
                return Err(GraphAccessError::VertexNotFound(endpoint));
            }
        }
        let id = EdgeId::new(self.edges.len() as u64 + 1);
        self.edges.push(EdgeRecord { id, label: label.into(), source, target });
        Ok(id)
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

impl GraphAccessor for MemoryGraph {
    fn adjacent(
        &self,
        vertex: VertexId,
        direction: Direction,
        labels: &[String],
    ) -> GraphAccessResult<Vec<VertexId>> {
        if !self.vertices.contains_key(&vertex) {
            return Err(GraphAccessError::VertexNotFound(vertex));
        }
        let mut result = Vec::new();
        for edge in &self.edges {
            if !labels.is_empty() && !labels.contains(&edge.label) {
                continue;
            }
            if matches!(direction, Direction::Out | Direction::Both) && edge.source == vertex {
                result.push(edge.target);
            }
            if matches!(direction, Direction::In | Direction::Both) && edge.target == vertex {
                result.push(edge.source);
            }
        }
        Ok(result)
    }

    fn resolve(&self, address: &ElementAddress) -> GraphAccessResult<Option<Value>> {
        let resolved = match address.kind {
            ElementKind::Vertex => {
                let id = VertexId::new(address.element_id);
                self.vertices.contains_key(&id).then_some(Value::Vertex(id))
            }
            ElementKind::Edge => self
                .edges
                .iter()
                .find(|e| e.id.as_u64() == address.element_id)
                .map(|e| Value::edge(e.id, e.label.clone(), e.source, e.target)),
            ElementKind::Property => {
                let owner = VertexId::new(address.element_id);
                address.property_key.as_ref().and_then(|key| {
                    self.vertices
                        .get(&owner)
                        .and_then(|props| props.get(key))
                        .map(|value| Value::property(owner, key.clone(), value.clone()))
                })
            }
        };
        Ok(resolved)
    }
}
