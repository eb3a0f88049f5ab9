#![no_main]

use libfuzzer_sys::fuzz_target;
use saphyr_wire::options::DuplicateKeyPolicy;
use saphyr_wire::{from_str_with_options, options};

// Mappings with intentional duplicate keys under every policy.
fuzz_target!(|data: &[u8]| {
    if data.len() > 16 * 1024 {
        return;
    }
    let s = String::from_utf8_lossy(data);

    let yaml_top = format!("a: 1\na: 2\nkey: {s}\nkey: {s}\n");
    let yaml_nested = format!("outer:\n  inner: {{x: 1, x: 2}}\n  arr: [{{k: {s}}}, {{k: {s}}}]\n");

    for policy in [
        DuplicateKeyPolicy::Error,
        DuplicateKeyPolicy::FirstWins,
        DuplicateKeyPolicy::LastWins,
    ] {
        let opts = options! { duplicate_keys: policy };
        for yaml in [&yaml_top, &yaml_nested] {
            let loaded = from_str_with_options(yaml, &opts);
            if policy != DuplicateKeyPolicy::Error {
                // Keeping one of the duplicates never fails on the fixed prefix.
                if let Ok(node) = loaded {
                    assert!(node.as_mapping().is_some());
                }
            }
        }
    }
});
