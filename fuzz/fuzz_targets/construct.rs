#![no_main]

use libfuzzer_sys::fuzz_target;
use saphyr_wire::{construct, from_str, Args, PathTable, Registry};

// Arbitrary documents through construction and the path table. Unknown classes and
// bad arguments must come back as errors, never panics.
fuzz_target!(|data: &[u8]| {
    if data.len() > 16 * 1024 {
        return;
    }
    let s = String::from_utf8_lossy(data);

    let mut registry = Registry::new();
    registry
        .register::<Vec<i64>>("fuzz.Ints")
        .register_fn("fuzz.Echo", |args: &Args| Ok(args.to_node().to_string()));

    let wrapped = format!("spec: {{class: fuzz.Echo, args: {s}}}\n");
    for yaml in [s.as_ref(), wrapped.as_str()] {
        if let Ok(node) = from_str(yaml) {
            let _ = PathTable::new().render(&node);
            let _ = construct(&registry, &node);
        }
    }
});
