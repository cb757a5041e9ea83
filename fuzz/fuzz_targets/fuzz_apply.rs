#![no_main]

use libfuzzer_sys::fuzz_target;

// Applying arbitrary bytes as a patch must never panic; corrupt
// streams come back as errors.
fuzz_target!(|input: (&[u8], &[u8])| {
    let (old, patch) = input;
    let _ = bdx::patch::apply_buffers(old, patch);
});
