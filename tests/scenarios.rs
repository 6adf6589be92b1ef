use can_comgen::fragment::{split, split_uniform};
use can_comgen::{Context, Error, Message, Network, Result, Signal};

fn nibble_network() -> Result<Network> {
    let mut n = Network::new("Nibbles");
    n.add_message(Message::new("M", 0x10, 1))?;
    n.add_signal(Signal::new("A", 4))?;
    n.add_signal(Signal::new("B", 4))?;
    n.add_signal_to_message("M", "A", 0, 0)?;
    n.add_signal_to_message("M", "B", 0, 4)?;
    Ok(n)
}

#[test]
fn unaligned_signal_fragments() -> Result<()> {
    // 26 bits from absolute bit 3 end at bit 28.
    let f = split_uniform(3, 28, 8)?;
    assert_eq!(f.leading, Some(vec![5]));
    assert_eq!(f.nominal, Some(vec![8, 8]));
    assert_eq!(f.trailing, Some(vec![5]));

    // Ending at bit 30 leaves a 7-bit trailing fragment.
    let f = split_uniform(3, 30, 8)?;
    assert_eq!(f.trailing, Some(vec![7]));
    Ok(())
}

#[test]
fn wide_nominal_fragments() -> Result<()> {
    let f = split(3, 30, 16, 8, 8)?;
    assert_eq!(f.leading, Some(vec![5]));
    assert_eq!(f.nominal, Some(vec![16]));
    assert_eq!(f.trailing, Some(vec![7]));
    Ok(())
}

#[test]
fn aligned_byte_is_a_single_nominal_fragment() -> Result<()> {
    let f = split_uniform(8, 15, 8)?;
    assert_eq!(f.leading, None);
    assert_eq!(f.nominal, Some(vec![8]));
    assert_eq!(f.trailing, None);
    assert!(f.is_single_nominal());
    Ok(())
}

#[test]
fn reversed_range_is_rejected() {
    assert!(matches!(split_uniform(10, 3, 8), Err(Error::Range { .. })));
}

#[test]
fn three_byte_message_with_one_signal() -> Result<()> {
    let mut n = Network::new("N");
    n.add_message(Message::new("M", 0x20, 3))?;
    n.add_signal(Signal::new("Wide", 24))?;
    n.add_signal_to_message("M", "Wide", 0, 0)?;

    assert_eq!(n.message_layout_is_cannonical("M"), Some(true));
    let ctx = Context::default();
    let s = n.message_structure("M", &ctx).unwrap();
    assert!(s.is_canonical);
    assert_eq!(s.signals.len(), 1);
    assert!(s.signals.iter().all(|m| !m.is_reserved));
    assert_eq!(s.total_bits(), 24);

    // The bitfield path would use an 8-bit base and three whole fragments.
    assert_eq!(can_comgen::structure::bitfield_base_width(3, 64), 8);
    let f = split_uniform(0, 23, 8)?;
    assert_eq!(f.leading, None);
    assert_eq!(f.nominal, Some(vec![8, 8, 8]));
    assert_eq!(f.trailing, None);
    Ok(())
}

#[test]
fn two_nibbles_in_one_byte() -> Result<()> {
    let n = nibble_network()?;
    let ctx = Context::default();

    assert_eq!(n.message_layout_is_cannonical("M"), Some(false));
    let s = n.message_structure("M", &ctx).unwrap();
    assert_eq!(s.base_width, Some(8));
    let names: Vec<&str> = s.signals.iter().map(|m| m.fragment_name.as_str()).collect();
    assert_eq!(names, ["A", "B"]);

    let a = n.get_signal_abstract_read("A", &ctx).unwrap();
    assert_eq!(a.pieces.len(), 1);
    assert_eq!(a.pieces[0].outer_mask, Some(0x0F));
    assert_eq!(a.pieces[0].inner_shift, None);

    let b = n.get_signal_abstract_read("B", &ctx).unwrap();
    assert_eq!(b.pieces.len(), 1);
    assert_eq!(b.pieces[0].inner_shift, Some(4));
    assert_eq!(b.pieces[0].outer_mask, Some(0x0F));

    let bw = n.get_signal_abstract_write("B", &ctx).unwrap();
    assert_eq!(bw.pieces[0].inner_shift, Some(4));
    assert_eq!(bw.pieces[0].inner_mask, Some(0x0F));
    assert_eq!(bw.pieces[0].outer_mask, Some(0xF0));
    Ok(())
}

#[test]
fn nibble_values_do_not_interfere() -> Result<()> {
    let n = nibble_network()?;
    let ctx = Context::default();
    let mut buffer = [0u8; 1];

    n.get_signal_abstract_write("A", &ctx).unwrap().insert(&mut buffer, 0x9)?;
    n.get_signal_abstract_write("B", &ctx).unwrap().insert(&mut buffer, 0x6)?;
    assert_eq!(buffer[0], 0x69);

    n.get_signal_abstract_write("A", &ctx).unwrap().insert(&mut buffer, 0x3)?;
    assert_eq!(buffer[0], 0x63);
    assert_eq!(n.get_signal_abstract_read("B", &ctx).unwrap().extract(&buffer)?, 0x6);
    Ok(())
}

#[test]
fn overlap_and_containment_are_rejected() -> Result<()> {
    let mut n = nibble_network()?;
    n.add_signal(Signal::new("Inner", 2))?;
    n.add_signal(Signal::new("Whole", 8))?;
    assert!(matches!(
        n.add_signal_to_message("M", "Inner", 0, 1),
        Err(Error::LayoutOverlap { .. })
    ));
    assert!(matches!(
        n.add_signal_to_message("M", "Whole", 0, 0),
        Err(Error::LayoutOverlap { .. })
    ));
    assert!(n.signal("Whole").unwrap().layout().is_none());
    Ok(())
}

#[test]
fn messages_beyond_profile_are_reported_not_fatal() -> Result<()> {
    let mut n = Network::new("N");
    n.add_message(Message::new("M", 1, 8))?;
    n.add_signal(Signal::new("Long", 48))?;
    n.add_signal(Signal::new("Short", 8))?;
    n.add_signal_to_message("M", "Long", 0, 0)?;
    n.add_signal_to_message("M", "Short", 6, 0)?;

    let ctx = Context::new(can_comgen::CompilerProfile::new(32)?, Default::default())?;
    assert!(n.get_signal_abstract_read("Long", &ctx).is_none());
    assert!(n.get_signal_abstract_read("Short", &ctx).is_some());
    assert_eq!(n.get_messages_structures(&ctx).len(), 1);

    let counts = ctx.diagnostics.counts();
    assert_eq!(counts.error, 1);
    assert!(
        ctx.diagnostics
            .records()
            .iter()
            .any(|d| d.message.contains("maximum integer width of 32 bits"))
    );
    Ok(())
}
