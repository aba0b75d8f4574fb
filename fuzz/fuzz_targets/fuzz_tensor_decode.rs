#![no_main]

use libfuzzer_sys::fuzz_target;

use tensor_fuzz_kit::{ByteCursor, Profile, TensorData};

fuzz_target!(|data: &[u8]| {
    // Fuzz the tensor decoder: decode tensors until the input runs out under
    // both shipped profiles. Decoding is total, so any panic is a bug, and
    // every tensor must stay within the profile's bounds.
    for profile in [Profile::tensorflow(), Profile::torch()] {
        let mut cursor = ByteCursor::new(data, &profile);
        while !cursor.is_exhausted() {
            let before = cursor.offset();
            let tensor = cursor.read_tensor();
            assert!(cursor.offset() > before);

            let shape = tensor.shape();
            assert!(shape.rank() <= profile.max_rank());
            assert!(shape
                .dims()
                .iter()
                .all(|&d| (profile.min_dim()..=profile.max_dim()).contains(&d)));

            match tensor.data() {
                TensorData::Raw(bytes) => {
                    let size = tensor.dtype().element_size().unwrap_or(0);
                    assert_eq!(bytes.len(), shape.num_elements() * size);
                }
                TensorData::Strings(strings) => {
                    assert_eq!(strings.len(), shape.num_elements());
                }
            }
        }
    }
});
