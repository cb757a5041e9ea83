#![no_main]

use bdx::diff::DiffContext;
use bdx::progress::NoopSink;
use bdx::wire::PatchWriter;
use libfuzzer_sys::fuzz_target;

// Diffing any pair of inputs and applying the result must reproduce
// the new input exactly.
fuzz_target!(|input: (&[u8], &[u8])| {
    let (old, new) = input;

    let mut writer = PatchWriter::new(Vec::new()).unwrap();
    DiffContext::new()
        .diff_buffers(old, new, |rec| writer.write_record(rec), &mut NoopSink)
        .unwrap();
    let patch = writer.into_inner();

    let rebuilt = bdx::patch::apply_buffers(old, &patch).unwrap();
    assert_eq!(rebuilt, new);
});
