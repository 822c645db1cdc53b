use simparam::busbw::{load_profile, UNSET_BANDWIDTH};
use simparam::{BusBandwidth, Collective, Group, ProfileError};

const GROUPS: [Group; 3] = [Group::Tp, Group::Dp, Group::Ep];
const COLLECTIVES: [Collective; 4] = [
    Collective::AllReduce,
    Collective::AllGather,
    Collective::ReduceScatter,
    Collective::AllToAll,
];

fn data(name: &str) -> String {
    format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn load(name: &str) -> Result<BusBandwidth, ProfileError> {
    logging::init_test_log();
    let mut bus_bw = BusBandwidth::default();
    load_profile(&mut bus_bw, data(name))?;
    Ok(bus_bw)
}

#[test]
fn full_profile() {
    let bus_bw = load("full.yaml").unwrap();
    let expected = [
        (Group::Tp, [Some(12.5), None, Some(8.0), Some(4.2)]),
        (Group::Dp, [Some(20.0), Some(18.5), Some(17.25), None]),
        (Group::Ep, [None, None, None, Some(6.0)]),
    ];
    for (group, values) in expected.iter() {
        for (op, value) in COLLECTIVES.iter().zip(values.iter()) {
            assert_eq!(bus_bw.get(*group, *op), *value, "{:?} {:?}", group, op);
        }
    }
}

#[test]
fn single_entry_touches_one_field() {
    let bus_bw = load("tp_allreduce.yaml").unwrap();
    for &group in &GROUPS {
        for &op in &COLLECTIVES {
            let expected = if (group, op) == (Group::Tp, Collective::AllReduce) {
                12.5
            } else {
                UNSET_BANDWIDTH
            };
            assert_eq!(bus_bw.get_or_unset(group, op), expected);
        }
    }
}

#[test]
fn annotations_and_unknown_keys() {
    let bus_bw = load("annotated.yaml").unwrap();
    assert_eq!(bus_bw.tp.allreduce, Some(50.0));
    assert_eq!(bus_bw.tp.alltoall, None);
    assert_eq!(bus_bw.dp.alltoall, Some(2.0));
    let mut expected = BusBandwidth::default();
    expected.tp.allreduce = Some(50.0);
    expected.dp.alltoall = Some(2.0);
    assert_eq!(bus_bw, expected);
}

#[test]
fn missing_file_is_not_fatal() {
    let mut bus_bw = BusBandwidth::default();
    bus_bw.ep.allgather = Some(1.5);
    let before = bus_bw;
    load_profile(&mut bus_bw, data("does_not_exist.yaml")).unwrap();
    assert_eq!(bus_bw, before);
}

#[test]
fn bad_value_is_fatal() {
    match load("bad_value.yaml") {
        Err(ProfileError::InvalidValue { line, key, value }) => {
            assert_eq!(line, 4);
            assert_eq!(key, "allgather");
            assert_eq!(value, "fast");
        }
        other => panic!("expected InvalidValue, got {:?}", other),
    }
}
