#![no_main]

use disparity_core::{canonicalize, canonicalize_to_text, parse};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Parsing arbitrary tool output must never panic
    if let Ok(parsed) = parse(text, "fuzz") {
        assert!(!parsed.mnemonic.is_empty());
    }

    // Canonical text is a fixed point
    let tokens = canonicalize(text);
    let again = canonicalize(&canonicalize_to_text(&tokens));
    assert_eq!(tokens, again);
});
