//! Register sharing between a traversal and its loop bodies and predicates.

use traverso_core::Value;
use traverso_process::strategy::SideEffectCapStrategy;
use traverso_process::{RepeatPredicate, RepeatStep, SideEffects, Traversal, TraversalSource};

fn anon() -> Traversal {
    Traversal::anonymous()
}

fn repeat_step(traversal: &Traversal) -> &RepeatStep {
    traversal.steps()[0].as_repeat().expect("first step is a repeat step")
}

fn ints(values: &[i64]) -> Value {
    Value::Array(values.iter().map(|&v| Value::Int(v)).collect())
}

#[test]
fn body_writes_are_visible_to_the_parent() {
    let g = TraversalSource::empty();
    let mut t = g
        .inject([1i64, 2])
        .repeat(anon().store("seen").unwrap())
        .unwrap()
        .times(2)
        .unwrap();

    assert_eq!(t.values().unwrap(), vec![Value::Int(1), Value::Int(2)]);
    assert_eq!(t.side_effects().get("seen"), Some(ints(&[1, 1, 2, 2])));

    let body = repeat_step(&t).body().expect("body");
    assert!(body.side_effects().same_register(t.side_effects()));
}

#[test]
fn body_entries_merge_into_the_parent_register() {
    let g = TraversalSource::empty();

    let body = anon().identity().unwrap();
    body.side_effects().set("seeded", Value::from("body"));
    body.side_effects().set("shared", Value::from("body"));

    let parent = g.inject([1i64]);
    parent.side_effects().set("shared", Value::from("parent"));

    let t = parent.repeat(body).unwrap().times(1).unwrap();
    assert_eq!(t.side_effects().get("seeded"), Some(Value::from("body")));
    assert_eq!(t.side_effects().get("shared"), Some(Value::from("parent")));
}

#[test]
fn bodies_ending_in_store_pass_traversers_through() {
    let g = TraversalSource::empty();
    let mut t = g
        .inject([5i64])
        .repeat(anon().store("trail").unwrap())
        .unwrap()
        .times(3)
        .unwrap();

    assert_eq!(t.values().unwrap(), vec![Value::Int(5)]);
    assert_eq!(t.side_effects().get("trail"), Some(ints(&[5, 5, 5])));

    assert!(t.strategies().contains(SideEffectCapStrategy::NAME));
    let body = repeat_step(&t).body().expect("body");
    assert!(!body.strategies().contains(SideEffectCapStrategy::NAME));
    assert_eq!(body.to_string(), "[StoreStep(trail)]");
}

#[test]
fn top_level_store_is_capped() {
    let g = TraversalSource::empty();
    let mut t = g.inject([1i64, 2]).store("y").unwrap();

    assert_eq!(t.values().unwrap(), vec![ints(&[1, 2])]);
    assert_eq!(t.to_string(), "[StoreStep(y), CapStep(y)]");
}

#[test]
fn predicate_traversals_share_the_register() {
    let g = TraversalSource::empty();
    let mut t = g
        .inject([3i64])
        .repeat(anon().identity().unwrap())
        .unwrap()
        .until_traversal(anon().store("checked").unwrap())
        .unwrap();

    assert_eq!(t.values().unwrap(), vec![Value::Int(3)]);
    assert_eq!(t.side_effects().get("checked"), Some(ints(&[3])));
    assert_eq!(repeat_step(&t).stats().iterations, 1);
}

#[test]
fn rebinding_reaches_nested_traversals() {
    let g = TraversalSource::empty();
    let mut t = g
        .inject([1i64])
        .repeat(anon().store("seen").unwrap())
        .unwrap()
        .until_traversal(anon().identity().unwrap())
        .unwrap();

    let fresh = SideEffects::new();
    t.set_side_effects(fresh.clone());

    let step = repeat_step(&t);
    assert!(step.body().expect("body").side_effects().same_register(&fresh));
    let until = step.until_predicate().and_then(|p| match p {
        RepeatPredicate::Traversal(p) => Some(p.traversal()),
        RepeatPredicate::Loops(_) => None,
    });
    assert!(until.expect("traversal predicate").side_effects().same_register(&fresh));

    t.iterate().unwrap();
    assert_eq!(fresh.get("seen"), Some(ints(&[1])));
}

#[test]
fn shared_source_register_spans_traversals() {
    let shared = SideEffects::new();
    let g = TraversalSource::empty().with_side_effects(shared.clone());

    for value in [1i64, 2] {
        let mut t =
            g.inject([value]).repeat(anon().store("all").unwrap()).unwrap().times(1).unwrap();
        t.iterate().unwrap();
    }

    assert_eq!(shared.get("all"), Some(ints(&[1, 2])));
}
