use can_comgen::codegen::{render_header, render_read, render_write};
use can_comgen::rows::{EnumTypeRow, MessageRow, NodeRow, SignalRow};
use can_comgen::{Context, LayoutReport, Network, NetworkRows, Result, Severity};

const BRAKE_ROWS: &str = r#"{
    "version": "3",
    "nodes": [{"name": "ABS"}, {"name": "ECM"}],
    "enum_types": [{"name": "BrakeState", "definition": "RELEASED, APPLIED, FAULT (3)"}],
    "messages": [
        {"name": "BRAKE_2", "id": 546, "len": 8, "tx_type": "cyclic", "period_ms": 20,
         "publisher": "ABS", "subscribers": "ECM (100)"}
    ],
    "signals": [
        {"name": "VehSpeed", "len": 10, "message": "BRAKE_2", "start_byte": 2, "start_bit": 0,
         "resolution": 0.5, "unit": "km/h"},
        {"name": "State", "len": 2, "data_type": "BrakeState", "message": "BRAKE_2",
         "start_byte": 1, "start_bit": 2},
        {"name": "Pressure", "len": 32, "message": "BRAKE_2", "start_byte": 4, "start_bit": 0}
    ]
}"#;

fn brake_network(ctx: &Context) -> Result<Network> {
    let rows = NetworkRows::from_json(BRAKE_ROWS)?;
    Ok(Network::from_rows("Chassis", &rows, ctx))
}

#[test]
fn rows_build_a_consistent_network() -> Result<()> {
    let ctx = Context::default();
    let n = brake_network(&ctx)?;
    assert_eq!(ctx.diagnostics.at_least(Severity::Warning).len(), 0);
    assert!(n.validate(&ctx));

    assert_eq!(n.version.as_deref(), Some("3"));
    assert_eq!(n.message("BRAKE_2").unwrap().publisher(), Some("ABS"));
    assert_eq!(
        n.message_direction("ECM", "BRAKE_2"),
        Some(can_comgen::Direction::Rx)
    );
    assert_eq!(n.signal("State").unwrap().enum_type(), Some("BrakeState"));
    assert_eq!(n.signal("VehSpeed").unwrap().raw_to_physical(100), 50.0);
    Ok(())
}

#[test]
fn structure_matches_the_generated_header() -> Result<()> {
    let ctx = Context::default();
    let n = brake_network(&ctx)?;
    let s = n.message_structure("BRAKE_2", &ctx).unwrap();

    assert!(!s.is_canonical);
    assert_eq!(s.base_width, Some(32));
    let members: Vec<(&str, u32)> = s
        .signals
        .iter()
        .map(|m| (m.fragment_name.as_str(), m.size_bits))
        .collect();
    assert_eq!(
        members,
        [
            ("reserved_0", 10),
            ("State", 2),
            ("reserved_1", 4),
            ("VehSpeed", 10),
            ("reserved_2", 6),
            ("Pressure", 32),
        ]
    );
    assert_eq!(s.total_bits(), 64);
    Ok(())
}

#[test]
fn rendered_access_code() -> Result<()> {
    let ctx = Context::default();
    let n = brake_network(&ctx)?;

    let speed = n.get_signal_abstract_read("VehSpeed", &ctx).unwrap();
    assert_eq!(
        render_read(&speed, "msg_buffer")?,
        "((uint16_t)((*(uint16_t*)&msg_buffer[2]) & 0x3ffu))"
    );
    let state = n.get_signal_abstract_write("State", &ctx).unwrap();
    assert_eq!(
        render_write(&state, "msg_buffer", "data")?,
        "msg_buffer[1] = (msg_buffer[1] & 0xf3u) | ((data << 2u) & 0x0cu);"
    );

    let header = render_header(&n, &ctx, "CH");
    assert!(header.contains("#define kCAN_CH_msgLen_BRAKE_2 8u"));
    assert!(header.contains("\tkCAN_CH_FAULT = 3"));
    assert!(header.contains("\t\tuint32_t VehSpeed : 10;"));
    assert!(header.contains(
        "#define CAN_CH_extract_Pressure(msg_buffer) ((uint32_t)(*(uint32_t*)&msg_buffer[4]))"
    ));
    assert!(header.contains(
        "#define CAN_CH_get_State(msg_buffer) (CAN_CH_extract_State(msg_buffer.all))"
    ));
    Ok(())
}

#[test]
fn layout_report_round_trips_through_json() -> Result<()> {
    let ctx = Context::default();
    let n = brake_network(&ctx)?;
    let report = LayoutReport::build(&n, &ctx);
    assert_eq!(report.reads.len(), 3);

    let json = report.to_json()?;
    let back: LayoutReport =
        serde_json::from_str(&json).map_err(|e| can_comgen::Error::Json(e.to_string()))?;
    assert_eq!(back, report);

    let restored = Network::from_json(&n.to_json()?)?;
    assert_eq!(restored, n);
    Ok(())
}

#[test]
fn typed_rows_without_json() {
    let rows = NetworkRows {
        nodes: vec![NodeRow {
            name: "GW".into(),
            description: Some("gateway".into()),
        }],
        enum_types: vec![EnumTypeRow {
            name: "Bad".into(),
            definition: "A, A".into(),
            description: None,
        }],
        messages: vec![MessageRow {
            name: "STATUS".into(),
            id: 0x7FF,
            len: 4,
            publisher: Some("GW".into()),
            ..Default::default()
        }],
        signals: vec![SignalRow {
            name: "Blob".into(),
            len: 12,
            data_type: Some("array".into()),
            ..Default::default()
        }],
        ..Default::default()
    };
    let ctx = Context::default();
    let n = Network::from_rows("Gw", &rows, &ctx);
    assert!(n.enum_type("Bad").is_none());
    // The signal itself is kept, only its array type is rejected.
    assert_eq!(n.signal("Blob").unwrap().data_kind(), can_comgen::DataKind::Scalar);
    assert_eq!(ctx.diagnostics.counts().warning, 2);
}

#[cfg(feature = "dbc")]
#[test]
fn dbc_import_feeds_the_generator() -> Result<()> {
    let dbc = r#"VERSION "1.0"

BU_: ECM TCU

BO_ 256 Engine : 8 ECM
 SG_ RPM : 0|16@1+ (0.25,0) [0|8000] "rpm" TCU
 SG_ Temp : 16|8@1+ (1,-40) [-40|215] "C" TCU
 SG_ Gear : 24|4@1+ (1,0) [0|6] "" TCU
"#;
    let ctx = Context::default();
    let n = can_comgen::dbc::import_dbc_str(dbc, "Powertrain", &ctx)?;
    let gear = n.get_signal_abstract_read("Gear", &ctx).unwrap();
    assert_eq!(render_read(&gear, "msg_buffer")?, "((msg_buffer[3]) & 0x0fu)");

    let mut frame = [0x40, 0x1F, 0x5A, 0x03, 0, 0, 0, 0];
    let rpm = n.get_signal_abstract_read("RPM", &ctx).unwrap();
    assert_eq!(rpm.extract(&frame)?, 0x1F40);
    assert_eq!(n.signal("RPM").unwrap().raw_to_physical(0x1F40), 2000.0);
    assert_eq!(gear.extract(&frame)?, 3);

    n.get_signal_abstract_write("Gear", &ctx)
        .unwrap()
        .insert(&mut frame, 5)?;
    assert_eq!(frame[3], 0x05);
    assert_eq!(frame[2], 0x5A);
    Ok(())
}
