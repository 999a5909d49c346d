//! Fuzzing target for expression evaluation
//!
//! Evaluates arbitrary expressions against a fixed document and clock.

#![no_main]

use datamap_core::expression::{evaluate, Clock, Environment};
use libfuzzer_sys::fuzz_target;
use serde_json::json;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    if source.len() > 4096 {
        return;
    }

    let input = json!({
        "applicant": {
            "name": "ada lovelace",
            "gender": "F",
            "dob": "1815-12-10",
            "income": 1234.5,
            "tags": ["a", "b", null, 3]
        },
        "applicants": [{"ssn": "000"}, {}]
    });
    let value = json!("Ada");

    let mut env = Environment::new(Clock::fixed(chrono::DateTime::UNIX_EPOCH));
    env.bind_ref("input", &input).bind_ref("value", &value);

    let _ = evaluate(source, &env);
});
