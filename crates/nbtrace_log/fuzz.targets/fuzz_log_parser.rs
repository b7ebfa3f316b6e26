#![no_main]
use libfuzzer_sys::fuzz_target;
use nbtrace_log::LogParser;

fuzz_target!(|data: &[u8]| {
    // Arbitrary text must either parse or be rejected, never panic
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(log) = LogParser::parse_str("fuzz", text) {
            let _ = log.partition_by_notebook();
            let _ = log.discontinuities();
        }
    }
});
