#![no_main]

use std::sync::OnceLock;

use libfuzzer_sys::{fuzz_target, Corpus};

use tensor_fuzz_kit::{Harness, HarnessConfig, Profile, TargetError, Verdict};

static HARNESS: OnceLock<Harness> = OnceLock::new();

fn harness() -> &'static Harness {
    HARNESS.get_or_init(|| {
        let config = HarnessConfig::builder()
            .min_input_len(10)
            .profile(Profile::tensorflow())
            .build();
        Harness::new(config).expect("harness without a record directory")
    })
}

fuzz_target!(|data: &[u8]| -> Corpus {
    // End-to-end run of the harness with a reshape-style target: decode an
    // input tensor and a requested shape, reject mismatched element counts,
    // and treat a decoded tensor that disagrees with its own shape as a fault.
    let verdict = harness().run(data, |cursor| {
        let input = cursor.read_tensor();
        let rank = cursor.next_rank();
        let requested = cursor.read_shape(rank);

        let expected = input.num_elements();
        let stored = match (input.raw_bytes(), input.strings()) {
            (Some(bytes), _) => bytes.len() / input.dtype().element_size().unwrap_or(1),
            (None, Some(strings)) => strings.len(),
            (None, None) => return Err(TargetError::fault("tensor without storage")),
        };
        if stored != expected {
            return Err(TargetError::fault(format!(
                "stored {stored} elements for shape {:?}",
                input.shape().dims()
            )));
        }
        if requested.num_elements() != expected {
            return Err(TargetError::rejected("element count mismatch"));
        }
        Ok(())
    });

    match verdict {
        Verdict::Continue => Corpus::Keep,
        Verdict::Discard => Corpus::Reject,
    }
});
