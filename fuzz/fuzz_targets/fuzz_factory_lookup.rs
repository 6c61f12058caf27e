#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::Value;
use service_errors::{Arg, Definition, Factory, Registry};
use std::sync::{Arc, OnceLock};

fn factory() -> &'static Factory {
    static FACTORY: OnceLock<Factory> = OnceLock::new();
    FACTORY.get_or_init(|| {
        let registry = Registry::new()
            .with(Definition::new("E_FAIL", "FailError", "Fail %s: %d: %j"))
            .with(Definition::new("E_PLAIN", "PlainError", "Plain failure"));
        Factory::new(Some(Arc::new(registry))).expect("registry supplied")
    })
}

// Any JSON document is a lookup; the result must always be a usable error.
fuzz_target!(|data: &[u8]| {
    let Ok(lookup) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    let err = factory().create(lookup, vec![Arg::from("arg"), Arg::from(1)]);
    assert!(err.is_internal() || factory().registry().contains(err.code()));

    let _ = serde_json::to_string(&err);
    let _ = err.to_display_string();
});
