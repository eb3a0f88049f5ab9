//! Print and path-table observers.

use indoc::indoc;
use saphyr_wire::{
    construct, from_str, Args, Composite, Identity, Node, PathTable, PrintVisitor, Registry,
    Visitor,
};

#[test]
fn path_table_lists_every_leaf() {
    let node = from_str(indoc! {"
        model:
          name: encoder
          layers: [64, 32]
        seed: ~
        empty: []
    "})
    .unwrap();
    let table = PathTable::new().render(&node).unwrap();
    assert_eq!(
        table,
        indoc! {"
            model.name, encoder
            model.layers[0], 64
            model.layers[1], 32
            seed, null
        "}
    );
}

#[test]
fn path_table_of_a_scalar_has_an_empty_path() {
    assert_eq!(PathTable::new().render(&Node::from(1.5)).unwrap(), ", 1.5\n");
}

#[test]
fn path_table_shows_constructed_objects() {
    let mut registry = Registry::new();
    registry.register_fn("pkg.Unit", |_: &Args| Ok(()));
    let node = from_str("unit: {class: pkg.Unit, builder: true}\n").unwrap();
    let built = construct(&registry, &node).unwrap();
    assert_eq!(PathTable::new().render(&built).unwrap(), "unit, <factory pkg.Unit>\n");
}

#[test]
fn printing_between_stages_keeps_the_tree() {
    let node = from_str("a: [1, x]\nb: {c: true}\n").unwrap();
    let (mut before, mut after) = (Vec::new(), Vec::new());
    let result = Composite::new()
        .then(PrintVisitor::new(&mut before))
        .then(Identity)
        .then(PrintVisitor::new(&mut after))
        .visit(&node);
    assert_eq!(result.unwrap(), node);
    assert_eq!(String::from_utf8(before).unwrap(), "{a: [1, x], b: {c: true}}\n");
    assert_eq!(String::from_utf8(after).unwrap(), "{a: [1, x], b: {c: true}}\n");
}
