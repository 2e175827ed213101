//! Fuzz target for export JSON parsing.
//!
//! Feeds arbitrary bytes to the export reader, checking for panics,
//! crashes, or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tracklift::ir::io_export_json::from_export_slice;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_export_slice(data);
});
