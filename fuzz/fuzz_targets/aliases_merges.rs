#![no_main]

use libfuzzer_sys::fuzz_target;
use saphyr_wire::options::AliasLimits;
use saphyr_wire::{from_str, from_str_with_options, options, Identity, Visitor};

// Biases inputs toward anchors, aliases and `<<` merge keys, then checks that a
// loaded tree survives an identity pass unchanged.
fuzz_target!(|data: &[u8]| {
    if data.len() > 16 * 1024 {
        return;
    }
    let s = String::from_utf8_lossy(data);

    let yaml_alias = format!("a: &A {s}\nb: *A\nseq: &S [1, 2, 3]\nseq_alias: *S\n");
    let yaml_merge = format!(
        "base1: &B1 {{k: 1, v: {s}}}\nbase2: &B2 {{w: {s}}}\nmerged:\n  <<: [*B1, *B2]\n  extra: 3\n"
    );
    let tight = options! {
        alias_limits: AliasLimits {
            max_total_replayed_nodes: 256,
            max_alias_expansions_per_anchor: 8,
        },
    };

    for yaml in [&yaml_alias, &yaml_merge, &s.to_string()] {
        if let Ok(node) = from_str(yaml) {
            let copy = Identity.visit(&node).expect("identity never fails");
            assert_eq!(copy, node);
        }
        let _ = from_str_with_options(yaml, &tight);
    }
});
