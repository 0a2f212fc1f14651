//! Preparation, validation and execution-mode checks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use traverso_core::{Value, VertexId};
use traverso_process::{
    Compare, ExecutionMode, MemoryGraph, ProcessError, ProcessResult, RepeatStep, Step, Translator,
    Traversal, TraversalConfig, TraversalSource, TraversalStrategy, Traverser, TraverserMessage,
};

fn anon() -> Traversal {
    Traversal::anonymous()
}

fn identity() -> Traversal {
    anon().identity().unwrap()
}

fn partitioned() -> TraversalSource {
    TraversalSource::empty()
        .with_config(TraversalConfig::new().with_mode(ExecutionMode::Partitioned))
}

#[test]
fn traversal_predicates_are_rejected_when_partitioned() {
    let err = partitioned()
        .inject([1i64])
        .repeat(identity())
        .unwrap()
        .until_traversal(identity())
        .unwrap_err();
    assert!(matches!(err, ProcessError::Configuration(_)));

    let err = partitioned().inject([1i64]).emit_traversal(identity()).unwrap_err();
    assert!(matches!(err, ProcessError::Configuration(_)));
}

#[test]
fn nested_traversal_predicates_fail_before_the_first_result() {
    let inner = anon().repeat(identity()).unwrap().until_traversal(identity()).unwrap();
    let mut t = partitioned().inject([1i64]).repeat(inner).unwrap().times(1).unwrap();

    let err = t.next_traverser().unwrap_err();
    assert!(matches!(err, ProcessError::Configuration(_)));
    assert!(!t.is_locked());
}

#[test]
fn loop_count_predicates_run_when_partitioned() {
    let mut t = partitioned().inject([1i64]).repeat(identity()).unwrap().times(2).unwrap();
    assert_eq!(t.values().unwrap(), vec![Value::Int(1)]);
}

#[test]
fn repeat_without_a_body_is_a_configuration_error() {
    let g = TraversalSource::empty();

    let mut t = g.inject([1i64]).until_loops(2).unwrap();
    assert!(matches!(t.next_traverser(), Err(ProcessError::Configuration(_))));

    let mut t = g.inject([1i64]).emit_all().unwrap();
    assert!(matches!(t.to_list(), Err(ProcessError::Configuration(_))));
}

#[test]
fn prepared_traversals_are_locked() {
    let mut t =
        TraversalSource::empty().inject([1i64]).repeat(identity()).unwrap().times(1).unwrap();
    t.iterate().unwrap();
    assert!(t.is_locked());

    let err = t.until_loops(3).unwrap_err();
    assert!(matches!(err, ProcessError::InvariantViolation(_)));
}

#[derive(Debug, Default)]
struct AppendFilter {
    runs: Arc<AtomicUsize>,
}

impl TraversalStrategy for AppendFilter {
    fn name(&self) -> &'static str {
        "AppendFilter"
    }

    fn apply(&self, traversal: &mut Traversal) -> ProcessResult<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        let steps = traversal.steps().len();
        let filter = anon().is(Compare::gt(1i64))?.steps()[0].duplicate();
        traversal.insert_step(steps, filter)
    }
}

#[test]
fn strategies_run_once_per_traversal() {
    let runs = Arc::new(AtomicUsize::new(0));
    let g = TraversalSource::empty().with_strategy(AppendFilter { runs: Arc::clone(&runs) });

    let mut t = g.inject([1i64, 2, 3]).identity().unwrap();
    assert_eq!(t.values().unwrap(), vec![Value::Int(2), Value::Int(3)]);
    assert_eq!(t.to_string(), "[IsStep(gt(1))]");

    t.reset();
    t.add_start(Traverser::new(5i64));
    assert_eq!(t.values().unwrap(), vec![Value::Int(5)]);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn loop_bodies_run_their_own_strategy_pass() {
    let runs = Arc::new(AtomicUsize::new(0));
    let g = TraversalSource::empty().with_strategy(AppendFilter { runs: Arc::clone(&runs) });

    // the appended filter drops 1 inside the body and again after the loop
    let mut t = g.inject([1i64, 2]).repeat(identity()).unwrap().times(2).unwrap();
    assert_eq!(t.values().unwrap(), vec![Value::Int(2)]);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

fn chain(len: u64) -> TraversalSource {
    let mut graph = MemoryGraph::new();
    let ids: Vec<VertexId> = (1..=len).map(|id| graph.add_vertex(id)).collect();
    for pair in ids.windows(2) {
        graph.add_edge(pair[0], pair[1], "next").unwrap();
    }
    TraversalSource::new(Arc::new(graph))
}

fn repeat_step(traversal: &Traversal) -> &RepeatStep {
    traversal.steps()[0].as_repeat().expect("first step is a repeat step")
}

#[test]
fn shipped_traversers_resume_their_loop_count() {
    let g = chain(4);

    let mut sent = Traverser::new(Value::Vertex(VertexId::new(2)));
    sent.incr_loops("hop");
    let message = TraverserMessage::of(&sent).unwrap();

    let received = message.resolve(&**g.graph()).unwrap();
    assert_eq!(received.loops("hop"), 1);

    let mut t = g
        .traversal()
        .repeat(anon().out(&["next"]).unwrap())
        .unwrap()
        .as_("hop")
        .unwrap()
        .times(2)
        .unwrap();
    t.add_start(received);

    let results = t.to_list().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].value(), &Value::Vertex(VertexId::new(3)));
    assert_eq!(results[0].loops("hop"), 0);
}

#[test]
fn unlabelled_loops_resume_after_a_round_trip() {
    let g = chain(4);
    let sender = g.traversal().repeat(anon().out(&["next"]).unwrap()).unwrap().times(2).unwrap();
    let mut receiver = Translator::new(g.clone()).round_trip(&sender).unwrap();

    let label = repeat_step(&sender).loop_label().to_owned();
    assert_eq!(repeat_step(&receiver).loop_label(), label);

    let mut sent = Traverser::new(Value::Vertex(VertexId::new(2)));
    sent.incr_loops(&label);
    let received = TraverserMessage::of(&sent).unwrap().resolve(&**g.graph()).unwrap();
    receiver.add_start(received);

    let results = receiver.to_list().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].value(), &Value::Vertex(VertexId::new(3)));
    assert!(results[0].loop_counters().is_empty());
}

#[test]
fn nested_loops_keep_separate_counters_after_a_round_trip() {
    let g = chain(8);
    let inner = anon().repeat(anon().out(&["next"]).unwrap()).unwrap().times(2).unwrap();
    let sender = g.v([VertexId::new(1)]).unwrap().repeat(inner).unwrap().times(3).unwrap();
    let mut receiver = Translator::new(g).round_trip(&sender).unwrap();

    let inner_label = |t: &Traversal| {
        let body = repeat_step(t).body().expect("body");
        repeat_step(body).loop_label().to_owned()
    };
    assert_eq!(inner_label(&receiver), inner_label(&sender));
    assert_ne!(inner_label(&receiver), repeat_step(&receiver).loop_label());

    let results = receiver.to_list().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].value(), &Value::Vertex(VertexId::new(7)));
    assert!(results[0].loop_counters().is_empty());
}
