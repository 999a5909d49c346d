//! Fuzzing target for streaming transforms
//!
//! Arbitrary bytes are fed to the streaming reader with a small rule set.
//! Malformed framing must surface as an error.

#![no_main]

use datamap_core::{stream_transform, MappingRule, MappingRuleBuilder, TransformKind};
use libfuzzer_sys::fuzz_target;

fn rules() -> Vec<MappingRule> {
    [
        MappingRuleBuilder::new("name").destination("person.name").transform(TransformKind::Capitalize),
        MappingRuleBuilder::new("gender").destination("person.gender").transform(TransformKind::MapGender),
        MappingRuleBuilder::new("amount")
            .destination("person.amount")
            .expression("value == nil ? 0 : toFloat(value) * 2"),
    ]
    .into_iter()
    .filter_map(|builder| builder.build().ok())
    .collect()
}

fuzz_target!(|data: &[u8]| {
    let rules = rules();
    let mut sink = Vec::new();
    if stream_transform(data, &mut sink, &rules).is_ok() {
        // Successful output is itself a single JSON object
        let output: serde_json::Value =
            serde_json::from_slice(&sink).expect("streamed output is valid JSON");
        assert!(output.is_object());
    }
});
