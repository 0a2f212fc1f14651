//! Traversal sources.
//!
//! A [`TraversalSource`] spawns traversals bound to one graph, one strategy
//! set and one configuration.

use std::fmt;
use std::sync::Arc;

use traverso_core::{ElementAddress, Value, VertexId};

use crate::bytecode::{Argument, Instruction};
use crate::config::TraversalConfig;
use crate::error::ProcessResult;
use crate::graph::{GraphAccessor, NullGraphAccessor};
use crate::side_effects::SideEffects;
use crate::strategy::{TraversalStrategies, TraversalStrategy};
use crate::traversal::Traversal;
use crate::traverser::Traverser;

/// Spawns traversals over a graph.
#[derive(Clone)]
pub struct TraversalSource {
    graph: Arc<dyn GraphAccessor>,
    strategies: TraversalStrategies,
    config: TraversalConfig,
    side_effects: Option<SideEffects>,
}

impl TraversalSource {
    /// Creates a source over `graph` with the standard strategies.
    #[must_use]
    pub fn new(graph: Arc<dyn GraphAccessor>) -> Self {
        Self {
            graph,
            strategies: TraversalStrategies::standard(),
            config: TraversalConfig::default(),
            side_effects: None,
        }
    }

    /// Creates a source over an empty graph. Useful with `inject`.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Arc::new(NullGraphAccessor))
    }

    /// Replaces the strategy set.
    #[must_use]
    pub fn with_strategies(mut self, strategies: TraversalStrategies) -> Self {
        self.strategies = strategies;
        self
    }

    /// Adds a strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl TraversalStrategy + 'static) -> Self {
        self.strategies.add(strategy);
        self
    }

    /// Removes the strategy named `name`.
    #[must_use]
    pub fn without_strategy(mut self, name: &str) -> Self {
        self.strategies.remove(name);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: TraversalConfig) -> Self {
        self.config = config;
        self
    }

    /// Makes every spawned traversal share `side_effects`.
    ///
    /// Without this each traversal gets a fresh register.
    #[must_use]
    pub fn with_side_effects(mut self, side_effects: SideEffects) -> Self {
        self.side_effects = Some(side_effects);
        self
    }

    /// Returns the graph.
    #[must_use]
    pub fn graph(&self) -> &Arc<dyn GraphAccessor> {
        &self.graph
    }

    /// Returns the strategy set.
    #[must_use]
    pub fn strategies(&self) -> &TraversalStrategies {
        &self.strategies
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &TraversalConfig {
        &self.config
    }

    /// Spawns a traversal with no starts.
    #[must_use]
    pub fn traversal(&self) -> Traversal {
        Traversal::bound(
            Arc::clone(&self.graph),
            self.strategies.clone(),
            self.config.clone(),
            self.side_effects.clone().unwrap_or_default(),
        )
    }

    /// Spawns a traversal starting from `values`.
    #[must_use]
    pub fn inject<I, V>(&self, values: I) -> Traversal
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let arguments = values.iter().cloned().map(Argument::Value).collect();
        let mut traversal = self.traversal();
        traversal.push_source(
            Instruction::new("inject", arguments),
            values.into_iter().map(Traverser::new).collect(),
        );
        traversal
    }

    /// Spawns a traversal starting from the vertices `ids`.
    ///
    /// Ids with no vertex in the graph are skipped.
    ///
    /// # Errors
    ///
    /// Returns graph access errors.
    pub fn v(&self, ids: impl IntoIterator<Item = VertexId>) -> ProcessResult<Traversal> {
        let ids: Vec<VertexId> = ids.into_iter().collect();
        let arguments = ids.iter().map(|&id| Argument::Value(Value::Vertex(id))).collect();
        let starts = self.vertex_starts(ids)?;
        let mut traversal = self.traversal();
        traversal.push_source(Instruction::new("V", arguments), starts);
        Ok(traversal)
    }

    pub(crate) fn vertex_starts(&self, ids: Vec<VertexId>) -> ProcessResult<Vec<Traverser>> {
        let mut starts = Vec::with_capacity(ids.len());
        for id in ids {
            let address = ElementAddress::of(&Value::Vertex(id))?;
            if let Some(vertex) = self.graph.resolve(&address)? {
                starts.push(Traverser::new(vertex));
            }
        }
        Ok(starts)
    }
}

impl fmt::Debug for TraversalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraversalSource")
            .field("strategies", &self.strategies)
            .field("config", &self.config)
            .field("side_effects", &self.side_effects)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;
    use crate::strategy::SideEffectCapStrategy;

    #[test]
    fn v_skips_missing_vertices() {
        let mut graph = MemoryGraph::new();
        graph.add_vertex(1u64);
        let source = TraversalSource::new(Arc::new(graph));

        let mut traversal = source.v([VertexId::new(1), VertexId::new(2)]).unwrap();
        assert_eq!(traversal.values().unwrap(), vec![Value::Vertex(VertexId::new(1))]);
    }

    #[test]
    fn spawned_traversals_get_fresh_registers_by_default() {
        let source = TraversalSource::empty();
        let a = source.traversal();
        let b = source.traversal();
        assert!(!a.side_effects().same_register(b.side_effects()));

        let shared = SideEffects::new();
        let source = source.with_side_effects(shared.clone());
        assert!(source.traversal().side_effects().same_register(&shared));
    }

    #[test]
    fn strategy_set_is_configurable() {
        let source = TraversalSource::empty().without_strategy(SideEffectCapStrategy::NAME);
        assert!(!source.traversal().strategies().contains(SideEffectCapStrategy::NAME));
        let source = source.with_strategy(SideEffectCapStrategy);
        assert!(source.traversal().strategies().contains(SideEffectCapStrategy::NAME));
    }
}
