use common::{core_params, out_path, PDK};
use interdigit::interdigitized::{
    two_transistor_interdigitized, DeviceRole, RailClass, RowBuilder,
};
use interdigit::io::{read_json, write_json};
use interdigit::layout::validation::validate_cell;
use interdigit::pdk::layers::GLayer;
use interdigit::pdk::MappedPdk;

mod common;

#[test]
fn test_single_column_with_dummies() {
    let params = core_params(1, true);
    let row = RowBuilder::new(&*PDK, &params).build().unwrap();
    assert_eq!(row.len(), 2);

    let (first, last) = row.ends().unwrap();
    assert_eq!(first.role(), DeviceRole::DummyLeft);
    assert_eq!(last.role(), DeviceRole::DummyRight);
    assert!(first.terminal("dummy_L_W").is_ok());
    assert!(last.terminal("dummy_R_E").is_ok());

    let cell = two_transistor_interdigitized(&*PDK, &params).unwrap();
    for class in RailClass::ALL {
        assert!(
            cell.port(&format!("{}_E", class.prefix())).is_ok(),
            "missing {class} rail"
        );
    }
    assert!(cell.port("A_0_gate_S").is_ok());
    assert!(cell.port("B_0_drain_N").is_ok());
    assert!(cell.port("A_1_gate_S").is_err());

    write_json(
        &*PDK,
        &cell,
        out_path("test_single_column_with_dummies", "layout.json"),
    )
    .expect("failed to write layout");
}

#[test]
fn test_three_columns_left_dummy() {
    let params = core_params(3, (true, false));
    let row = RowBuilder::new(&*PDK, &params).build().unwrap();
    assert_eq!(row.len(), 6);

    let roles: Vec<_> = row.placements().iter().map(|p| p.role()).collect();
    assert_eq!(
        roles,
        [
            DeviceRole::DummyLeft,
            DeviceRole::InteriorB,
            DeviceRole::InteriorA,
            DeviceRole::InteriorB,
            DeviceRole::InteriorA,
            DeviceRole::DummyRight,
        ]
    );

    let placements = row.placements();
    assert!(placements[0].dummy());
    assert!(!placements[5].dummy());
    assert!(placements[0].terminal("dummy_L_N").is_ok());
    assert!(placements[5].terminal("dummy_R_N").is_err());

    let ext = row.extension();
    assert!(ext.sd > 0 && ext.gate > 0);
    let a_source = placements[2].terminal("source_S").unwrap().center().y;
    let a_gate = placements[2].terminal("gate_N").unwrap().center().y;
    for i in [1, 3] {
        let b = &placements[i];
        assert_eq!(b.terminal("source_S").unwrap().center().y - a_source, ext.sd);
        assert_eq!(a_gate - b.terminal("gate_N").unwrap().center().y, ext.gate);
    }
}

#[test]
fn test_placement_pitch() {
    let params = core_params(4, false);
    let row = RowBuilder::new(&*PDK, &params).build().unwrap();
    let pitch = row.pitch();
    assert!(pitch > 0);
    assert_eq!(pitch % (2 * PDK.layout_grid()), 0);

    for (i, placement) in row.placements().iter().enumerate() {
        assert_eq!(placement.inst().loc().x, i as i64 * pitch);
        assert_eq!(placement.inst().loc().y, 0);
        let expected = format!("{}_{}_", if i % 2 == 0 { "A" } else { "B" }, i / 2);
        assert_eq!(placement.prefix(), expected);
    }

    // Adjacent diffusions keep the minimum diffusion spacing.
    let space = PDK
        .rule(GLayer::ActiveDiff)
        .unwrap()
        .min_separation()
        .unwrap();
    let placements = row.placements();
    for pair in placements.windows(2) {
        let gap = pair[1].terminal("diff_W").unwrap().center().x
            - pair[0].terminal("diff_E").unwrap().center().x;
        assert!(gap >= space);
    }
}

#[test]
fn test_rails_on_distinct_tracks() {
    let cell = two_transistor_interdigitized(&*PDK, &core_params(2, true)).unwrap();
    for (a, b) in [
        (RailClass::ASource, RailClass::BSource),
        (RailClass::ADrain, RailClass::BDrain),
        (RailClass::AGate, RailClass::BGate),
    ] {
        let a = cell.port(&format!("{}_E", a.prefix())).unwrap().span();
        let b = cell.port(&format!("{}_E", b.prefix())).unwrap().span();
        assert!(!a.intersects(&b), "{a:?} and {b:?} overlap");
    }

    // Every rail runs the length of the row.
    let a = cell.port("A_source_N").unwrap().width();
    let b = cell.port("B_gate_S").unwrap().width();
    assert_eq!(a, b);
}

#[test]
fn test_output_is_on_grid() {
    for dummy in [(true, true), (true, false), (false, true), (false, false)] {
        let cell = two_transistor_interdigitized(&*PDK, &core_params(2, dummy)).unwrap();
        let output = validate_cell(&cell, PDK.layout_grid());
        assert!(!output.has_errors(), "{:?}", output.first_error());
    }
}

#[test]
fn test_generation_is_idempotent() {
    let params = core_params(3, (false, true));
    let first = two_transistor_interdigitized(&*PDK, &params).unwrap();
    let second = two_transistor_interdigitized(&*PDK, &params).unwrap();
    assert_eq!(first.bbox(), second.bbox());
    assert_eq!(first.port_map(), second.port_map());
    assert_eq!(first.name(), second.name());

    let path = out_path("test_generation_is_idempotent", "layout.json");
    write_json(&*PDK, &first, &path).expect("failed to write layout");
    let layout = read_json(&path).expect("failed to read layout");
    assert_eq!(layout.bbox, first.bbox());
    assert_eq!(layout.ports.len(), first.port_map().len());
    assert_eq!(layout.process, "sky130");
}

#[test]
fn test_multi_finger_devices() {
    let mut params = core_params(2, true);
    params.shape.fingers = 3;
    params.shape.width = 1000;
    let cell = two_transistor_interdigitized(&*PDK, &params).unwrap();
    assert!(cell.port("A_1_row0_col2_gate_S").is_ok());
    assert!(cell.port("B_1_row0_col3_gate_S").is_err());
    assert!(!validate_cell(&cell, PDK.layout_grid()).has_errors());
}
