use can_comgen::access::{build_read, build_write};
use can_comgen::bits::{base_container_width, bit_mask, low_mask};
use can_comgen::fragment::split;
use can_comgen::{CompilerProfile, Message, Network, Signal};
use proptest::prelude::*;

/// A signal length and a start position that fit an 8-byte message.
fn placement() -> impl Strategy<Value = (u32, u32, u32)> {
    (1u32..=64).prop_flat_map(|len| {
        let last_start = 64 - len;
        (Just(len), 0..=last_start).prop_map(|(len, start)| (len, start / 8, start % 8))
    })
}

proptest! {
    #[test]
    fn write_then_read_returns_the_value(
        (len, byte, bit) in placement(),
        value in any::<u64>(),
        fill in any::<u8>(),
        max_width in prop::sample::select(vec![8u32, 16, 32, 64]),
    ) {
        prop_assume!(base_container_width(len).unwrap() <= max_width);
        let profile = CompilerProfile::new(max_width).unwrap();
        let signal = Signal::new("S", len);
        let write = build_write(&signal, byte, bit, &profile).unwrap();
        let read = build_read(&signal, byte, bit, &profile).unwrap();

        let before = [fill; 8];
        let mut buffer = before;
        write.insert(&mut buffer, value).unwrap();
        prop_assert_eq!(read.extract(&buffer).unwrap(), value & low_mask(len));

        // Bits outside the signal keep their previous value.
        let start = byte * 8 + bit;
        let outside = !(low_mask(len) << start);
        let old = u64::from_le_bytes(before);
        let new = u64::from_le_bytes(buffer);
        prop_assert_eq!(old & outside, new & outside);
    }

    #[test]
    fn pieces_cover_the_signal_once(
        (len, byte, bit) in placement(),
        max_width in prop::sample::select(vec![8u32, 16, 32, 64]),
    ) {
        let profile = CompilerProfile::new(max_width).unwrap();
        let signal = Signal::new("S", len);
        match build_read(&signal, byte, bit, &profile) {
            Ok(read) => {
                prop_assert_eq!(read.pieces.iter().map(|p| p.bits).sum::<u32>(), len);
                prop_assert!(read.pieces.iter().all(|p| p.container_width <= max_width));
                prop_assert_eq!(read.pieces[0].byte_offset, byte);
            }
            Err(_) => prop_assert!(base_container_width(len).unwrap() > max_width),
        }
    }

    #[test]
    fn mask_and_inverse_complement(n in 1u32..=64, start in 0u32..64) {
        prop_assume!(n + start <= 64);
        let width = base_container_width(n + start).unwrap();
        let mask = bit_mask(n, start, false, None).unwrap();
        let inverse = bit_mask(n, start, true, None).unwrap();
        prop_assert_eq!(mask | inverse, low_mask(width));
        prop_assert_eq!(mask & inverse, 0);
    }

    #[test]
    fn fragments_sum_to_the_range(
        start in 0u32..512,
        len in 1u32..512,
        nominal in 1u32..=64,
        leading in 1u32..=64,
        trailing in 1u32..=64,
    ) {
        let end = start + len - 1;
        let f = split(start, end, nominal, leading, trailing).unwrap();
        prop_assert_eq!(f.total_bits(), len);
        prop_assert!(f.sizes().all(|s| s > 0));
    }

    #[test]
    fn accepted_placements_never_overlap(
        placements in prop::collection::vec((1u32..=16, 0u32..8, 0u32..8), 1..12),
    ) {
        let mut n = Network::new("N");
        n.add_message(Message::new("M", 1, 8)).unwrap();
        for (i, (len, byte, bit)) in placements.into_iter().enumerate() {
            let name = format!("S{i}");
            n.add_signal(Signal::new(name.as_str(), len)).unwrap();
            let _ = n.add_signal_to_message("M", &name, byte, bit);
        }

        let placed = n.signals_of_message("M");
        for (i, a) in placed.iter().enumerate() {
            for b in &placed[i + 1..] {
                let (ra, rb) = (a.bit_range().unwrap(), b.bit_range().unwrap());
                prop_assert!(ra.end <= rb.start || rb.end <= ra.start);
            }
        }
        prop_assert!(n.layout_errors().is_empty());

        let ctx = can_comgen::Context::default();
        if let Some(s) = n.message_structure("M", &ctx) {
            prop_assert_eq!(s.total_bits(), 64);
        }
    }
}
