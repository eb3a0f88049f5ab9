//! Visitor contract and composite ordering.

use indoc::indoc;
use saphyr_wire::{from_str, walk_sequence, Composite, Error, Identity, Node, Scalar, Visitor};

/// Replaces the string `nok` with `error`.
struct Flag;

impl Visitor for Flag {
    fn visit_scalar(&mut self, scalar: &Scalar) -> Result<Node, Error> {
        match scalar {
            Scalar::String(s) if s == "nok" => Ok(Node::from("error")),
            other => Ok(Node::Scalar(other.clone())),
        }
    }
}

/// Collapses an all-integer sequence to its sum; other sequences stay as they are.
struct Sum;

impl Visitor for Sum {
    fn visit_sequence(&mut self, items: &[Node]) -> Result<Node, Error> {
        let visited = walk_sequence(self, items)?;
        let numbers: Option<Vec<i64>> = visited
            .as_sequence()
            .unwrap_or_default()
            .iter()
            .map(Node::as_i64)
            .collect();
        Ok(numbers.map_or(visited, |numbers| Node::from(numbers.iter().sum::<i64>())))
    }
}

fn sample() -> Node {
    from_str(indoc! {"
        a: [1, 2, 3]
        b: ok
        c: [1, 2, nok]
        nested:
          - {x: 1.5, y: null}
          - [true, 'quoted']
    "})
    .unwrap()
}

#[test]
fn identity_reproduces_the_tree() {
    let input = sample();
    assert_eq!(Identity.visit(&input).unwrap(), input);
    assert_eq!(Composite::new().visit(&input).unwrap(), input);
}

#[test]
fn identity_keeps_key_order() {
    let input = from_str("z: 1\na: 2\nm: 3\n").unwrap();
    let output = Identity.visit(&input).unwrap();
    let keys: Vec<&str> = output.as_mapping().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, ["z", "a", "m"]);
}

#[test]
fn composite_feeds_each_stage_the_previous_output() {
    let input = from_str("a: [1, 2, 3]\nb: ok\nc: [1, 2, nok]\n").unwrap();
    let mut pipeline = Composite::new().then(Flag).then(Sum);
    let output = pipeline.visit(&input).unwrap();
    let staged = Sum.visit(&Flag.visit(&input).unwrap()).unwrap();
    assert_eq!(output, staged);
    assert_eq!(output.to_string(), "{a: 6, b: ok, c: [1, 2, error]}");
}

#[test]
fn composite_order_matters() {
    let input = from_str("c: [1, nok]\nd: [1, 2]\n").unwrap();
    let mut reversed = Composite::new().then(Sum).then(Flag);
    let output = reversed.visit(&input).unwrap();
    assert_eq!(output, Flag.visit(&Sum.visit(&input).unwrap()).unwrap());
    assert_eq!(output.to_string(), "{c: [1, error], d: 3}");
    let forward = Composite::new().then(Flag).then(Sum).visit(&input).unwrap();
    assert_eq!(forward.to_string(), "{c: [1, error], d: 3}");
}

#[test]
fn visitors_do_not_touch_their_input() {
    let input = sample();
    let before = input.clone();
    let _ = Composite::new().then(Flag).then(Sum).visit(&input).unwrap();
    assert_eq!(input, before);
}

#[test]
fn stage_errors_stop_the_pipeline() {
    struct Fail;
    impl Visitor for Fail {
        fn visit_scalar(&mut self, _: &Scalar) -> Result<Node, Error> {
            Err(Error::construction_msg("boom"))
        }
    }
    let mut pipeline = Composite::new().then(Fail).then(Sum);
    assert!(pipeline.visit(&Node::from(1)).is_err());
    assert_eq!(pipeline.len(), 2);
}
