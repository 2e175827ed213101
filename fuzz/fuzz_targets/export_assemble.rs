//! Fuzz target for parsing followed by track assembly.
//!
//! Any export the reader accepts must assemble or fail cleanly.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tracklift::assemble::{assemble_export, AssembleOptions};
use tracklift::ir::io_export_json::from_export_slice;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    if let Ok(export) = from_export_slice(data) {
        let opts = AssembleOptions {
            skip_missing_media: true,
        };
        let _ = assemble_export(&export, &opts);
    }
});
