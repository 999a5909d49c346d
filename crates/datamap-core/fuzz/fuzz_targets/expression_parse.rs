//! Fuzzing target for expression compilation
//!
//! Compiling arbitrary source text must return an error or a compiled
//! expression, never panic.

#![no_main]

use datamap_core::expression::compile;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        if let Ok(compiled) = compile(source) {
            // The rendered form must compile again
            let rendered = compiled.root().to_string();
            let _ = compile(&rendered);
        }
    }

    let lossy = String::from_utf8_lossy(data);
    let _ = compile(&lossy);
});
