#![no_main]

use libfuzzer_sys::fuzz_target;

use tensor_fuzz_kit::{ByteCursor, FillMode, Profile};

fuzz_target!(|data: &[u8]| {
    // The input drives both the op sequence and the values: every op byte is
    // read from the same cursor that the op then decodes from.
    let profile = match data.first().copied().unwrap_or(0) % 3 {
        0 => Profile::tensorflow(),
        1 => Profile::torch(),
        _ => Profile::builder()
            .fill_mode(FillMode::Random { seed: data.len() as u64 })
            .build()
            .unwrap(),
    };

    let mut cursor = ByteCursor::new(data, &profile);
    let mut last = cursor.offset();
    while !cursor.is_exhausted() {
        match cursor.next_byte() % 10 {
            0 => {
                let rank = cursor.next_rank();
                let _ = cursor.read_shape(rank);
            }
            1 => {
                let _ = cursor.read_tensor();
            }
            2 => {
                let _ = cursor.read_i64();
            }
            3 => {
                let _ = cursor.read_f64();
            }
            4 => {
                let v = cursor.read_in_range(-16..=16);
                assert!((-16..=16).contains(&v));
            }
            5 => {
                let v = cursor.read_unit_interval();
                assert!((0.0..1.0).contains(&v));
            }
            6 => {
                if let Some(axis) = cursor.read_dim_index(3) {
                    assert!(axis < 3);
                }
            }
            7 => {
                let _ = cursor.read_choice(&["linear", "lower", "higher"]);
            }
            8 => {
                let _ = cursor.read_bool();
            }
            _ => {
                let _ = cursor.next_dtype();
            }
        }
        assert!(cursor.offset() >= last);
        assert!(cursor.offset() <= data.len());
        last = cursor.offset();
    }
});
