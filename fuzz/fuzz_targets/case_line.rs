#![no_main]

use disparity_core::{parse_case_line, parse_cases, HexInstruction};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let _ = parse_cases(text);

    for line in text.lines() {
        if let Ok(Some(case)) = parse_case_line(line) {
            // A rendered case parses back to itself
            let reparsed = parse_case_line(&case.to_line())
                .expect("rendered case line should parse")
                .expect("rendered case line should not be a comment");
            assert_eq!(reparsed.hex, case.hex);

            // Normalized hex is stable
            let hex = HexInstruction::parse(case.hex.as_str()).expect("normalized hex should parse");
            assert_eq!(hex, case.hex);
            assert_eq!(hex.bytes().len(), hex.len());
        }
    }
});
