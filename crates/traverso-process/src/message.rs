//! Traversers in transit between partitions.
//!
//! In partitioned execution a traverser is shipped as the address of its
//! element plus its bookkeeping. The receiving partition resolves the
//! address against its own graph to rebuild the traverser.

use std::collections::BTreeMap;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};
use traverso_core::encoding::{decode_json, encode_json, Decoder, Encoder};
use traverso_core::{CoreError, ElementAddress};

use crate::error::{ProcessError, ProcessResult};
use crate::graph::GraphAccessor;
use crate::traverser::Traverser;

/// A traverser linearized for transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraverserMessage {
    /// Where the traverser's element lives.
    pub address: ElementAddress,
    /// The traverser's bulk.
    pub bulk: u64,
    /// The traverser's loop counters.
    pub loops: BTreeMap<String, u32>,
}

impl TraverserMessage {
    /// Linearizes `traverser`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownElement`] (wrapped) if the traverser does
    /// not carry a vertex, edge or property.
    pub fn of(traverser: &Traverser) -> ProcessResult<Self> {
        Ok(Self {
            address: ElementAddress::of(traverser.value())?,
            bulk: traverser.bulk(),
            loops: traverser.loop_counters().clone(),
        })
    }

    /// Rebuilds the traverser against `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownElement`] (wrapped) if the element does not
    /// exist in `graph`, and [`ProcessError::InvariantViolation`] for a zero
    /// bulk.
    pub fn resolve(self, graph: &dyn GraphAccessor) -> ProcessResult<Traverser> {
        let bulk = NonZeroU64::new(self.bulk)
            .ok_or_else(|| ProcessError::invariant("traverser bulk must be positive"))?;
        let value = graph.resolve(&self.address)?.ok_or_else(|| {
            CoreError::UnknownElement(format!(
                "{:?} {} is not in this partition",
                self.address.kind, self.address.element_id
            ))
        })?;
        Ok(Traverser::from_parts(value, bulk, self.loops))
    }
}

impl Encoder for TraverserMessage {
    fn encode_to(&self, buf: &mut Vec<u8>) -> Result<(), CoreError> {
        encode_json(self, buf)
    }
}

impl Decoder for TraverserMessage {
    fn decode(bytes: &[u8]) -> Result<Self, CoreError> {
        decode_json(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;
    use traverso_core::{Value, VertexId};

    #[test]
    fn ships_a_vertex_traverser() {
        let mut graph = MemoryGraph::new();
        let v = graph.add_vertex(4u64);

        let mut traverser = Traverser::new(v).with_bulk(3).unwrap();
        traverser.incr_loops("r");

        let bytes = TraverserMessage::of(&traverser).unwrap().encode().unwrap();
        let received = TraverserMessage::decode(&bytes).unwrap().resolve(&graph).unwrap();
        assert_eq!(received, traverser);
    }

    #[test]
    fn scalars_cannot_be_shipped() {
        let err = TraverserMessage::of(&Traverser::new(1i64)).unwrap_err();
        assert!(matches!(err, ProcessError::Core(CoreError::UnknownElement(_))));
    }

    #[test]
    fn missing_elements_are_reported() {
        let graph = MemoryGraph::new();
        let message = TraverserMessage::of(&Traverser::new(Value::Vertex(VertexId::new(9)))).unwrap();
        let err = message.resolve(&graph).unwrap_err();
        assert!(matches!(err, ProcessError::Core(CoreError::UnknownElement(_))));
    }

    #[test]
    fn zero_bulk_is_rejected() {
        let graph = MemoryGraph::new();
        let mut message =
            TraverserMessage::of(&Traverser::new(Value::Vertex(VertexId::new(9)))).unwrap();
        message.bulk = 0;
        assert!(matches!(message.resolve(&graph), Err(ProcessError::InvariantViolation(_))));
    }
}
