#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::Value;
use service_errors::binding::{bind_message, count_placeholders};

// Input layout: template, then NUL-separated string arguments.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let mut parts = text.split('\0');
    let template = parts.next().unwrap_or_default();
    let args: Vec<Value> = parts.map(Value::from).collect();

    let binding = bind_message(template, &args);
    assert!(binding.consumed <= args.len());
    assert!(binding.consumed <= count_placeholders(template));
    if binding.consumed == 0 {
        assert_eq!(binding.message, template);
    }
});
