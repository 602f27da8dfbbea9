use std::cell::RefCell;

use assert_matches::assert_matches;
use lvops::{CommandSpec, Error, Executor, LvmSubCmd, ModuleParams, Outcome};
use serde_json::json;
use snafu::ResultExt;

/// Records every command and answers from a canned responder.
struct FakeLvm<F> {
    calls: RefCell<Vec<CommandSpec>>,
    respond: F,
}

impl<F> FakeLvm<F>
where
    F: Fn(&CommandSpec) -> Result<String, Error>,
{
    fn new(respond: F) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            respond,
        }
    }

    fn commands(&self) -> Vec<String> {
        self.calls.borrow().iter().map(ToString::to_string).collect()
    }
}

impl<F> Executor for FakeLvm<F>
where
    F: Fn(&CommandSpec) -> Result<String, Error>,
{
    fn run(&self, spec: &CommandSpec) -> Result<String, Error> {
        self.calls.borrow_mut().push(spec.clone());
        (self.respond)(spec)
    }
}

fn failed(spec: &CommandSpec, stderr: &str) -> Result<String, Error> {
    Err(Error::LvmBinErr {
        command: spec.binary().to_string(),
        error: stderr.to_string(),
    })
}

/// A host with one 500000m physical volume behind RHS_vg1.
fn healthy_host(spec: &CommandSpec) -> Result<String, Error> {
    match spec.subcmd() {
        LvmSubCmd::VGList => Ok("  /dev/sdb\n".to_string()),
        LvmSubCmd::PVList => Ok("  500000.00m\n".to_string()),
        _ => Ok("  Logical volume done.\n".to_string()),
    }
}

fn params(value: serde_json::Value) -> ModuleParams {
    serde_json::from_value(value).unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

#[test]
fn create_thick_sizes_from_volume_group() -> Result<(), snafu::Whatever> {
    init_tracing();
    let lvm = FakeLvm::new(healthy_host);
    let p = params(json!({
        "action": "create", "lvname": "metadata", "lvtype": "thick",
        "compute": "raid6", "vgname": "RHS_vg1"
    }));

    let output = lvops::execute(&p, &lvm).whatever_context("create thick volume")?;
    assert_eq!(output, "  Logical volume done.\n");
    assert_eq!(
        lvm.commands(),
        vec![
            "vgs --noheadings -o pv_name RHS_vg1",
            "pvs --noheadings --units m -o pv_size /dev/sdb",
            "lvcreate -L 509436928K -n metadata RHS_vg1",
        ]
    );
    Ok(())
}

#[test]
fn create_sizes_for_any_compute_label() {
    let lvm = FakeLvm::new(healthy_host);
    let p = params(json!({
        "action": "create", "lvname": "metadata", "compute": "rhs",
        "lvtype": "thick", "vgname": "RHS_vg1"
    }));

    assert!(lvops::execute(&p, &lvm).is_ok());
    assert_eq!(
        lvm.commands().last().map(String::as_str),
        Some("lvcreate -L 509436928K -n metadata RHS_vg1")
    );
    assert_eq!(lvm.commands().len(), 3);
}

#[test]
fn create_thin_and_virtual() {
    let lvm = FakeLvm::new(healthy_host);
    let thin = params(json!({
        "action": "create", "lvname": "RHS_pool1", "lvtype": "thin",
        "compute": "jbod", "vgname": "RHS_vg1"
    }));
    lvops::execute(&thin, &lvm).unwrap();

    let virt = params(json!({
        "action": "create", "poolname": "RHS_pool1", "lvtype": "virtual",
        "compute": "jbod", "vgname": "RHS_vg1", "lvname": "RHS_lv1"
    }));
    lvops::execute(&virt, &lvm).unwrap();

    let commands = lvm.commands();
    assert_eq!(commands.len(), 6);
    assert_eq!(commands[2], "lvcreate -L 2558976K -n RHS_pool1 RHS_vg1");
    assert_eq!(
        commands[5],
        "lvcreate -V 509436928K -T /dev/RHS_vg1/RHS_pool1 -n RHS_lv1"
    );
}

#[test]
fn missing_volume_group_creates_nothing() {
    let lvm = FakeLvm::new(|spec: &CommandSpec| match spec.subcmd() {
        LvmSubCmd::VGList => failed(spec, "  Volume group \"nope\" not found\n"),
        _ => panic!("unexpected command {spec}"),
    });
    let p = params(json!({
        "action": "create", "lvname": "lv", "lvtype": "thick",
        "compute": "raid6", "vgname": "nope"
    }));

    let result = lvops::execute(&p, &lvm);
    assert_matches!(&result, Err(Error::VolumeGroupNotFound { vg }) if vg == "nope");
    assert_eq!(lvm.commands().len(), 1);

    let outcome = Outcome::from(result);
    assert!(outcome.failed);
    assert!(!outcome.changed);
    assert_eq!(outcome.msg, "nope Volume Group Does Not Exist!");
}

#[test]
fn missing_physical_volume_is_named() {
    let lvm = FakeLvm::new(|spec: &CommandSpec| match spec.subcmd() {
        LvmSubCmd::VGList => Ok("  /dev/sdb\n".to_string()),
        LvmSubCmd::PVList => failed(spec, "  Failed to find device \"/dev/sdb\".\n"),
        _ => panic!("unexpected command {spec}"),
    });
    let p = params(json!({
        "action": "create", "lvname": "lv", "lvtype": "thin",
        "compute": "raid6", "vgname": "vg"
    }));

    let outcome = Outcome::from(lvops::execute(&p, &lvm));
    assert_eq!(outcome.msg, "PV /dev/sdb does not exist");
    assert_eq!(lvm.commands().len(), 2);
}

#[test]
fn tiny_volume_group_is_rejected() {
    let lvm = FakeLvm::new(|spec: &CommandSpec| match spec.subcmd() {
        LvmSubCmd::VGList => Ok("  /dev/loop0\n".to_string()),
        LvmSubCmd::PVList => Ok("  <4.00m\n".to_string()),
        _ => panic!("unexpected command {spec}"),
    });
    let p = params(json!({
        "action": "create", "lvname": "lv", "lvtype": "thick",
        "compute": "jbod", "vgname": "vg"
    }));

    assert_matches!(
        lvops::execute(&p, &lvm),
        Err(Error::InsufficientCapacity { pv, .. }) if pv == "/dev/loop0"
    );
}

#[test]
fn spanning_volume_group_is_sized_from_first_pv() {
    let lvm = FakeLvm::new(|spec: &CommandSpec| match spec.subcmd() {
        LvmSubCmd::VGList => Ok("  /dev/sdb\n  /dev/sdc\n".to_string()),
        LvmSubCmd::PVList => Ok("  1000.00m\n".to_string()),
        _ => Ok(String::new()),
    });
    let p = params(json!({
        "action": "create", "lvname": "lv", "lvtype": "thick",
        "compute": "jbod", "vgname": "vg"
    }));

    lvops::execute(&p, &lvm).unwrap();
    let commands = lvm.commands();
    assert_eq!(commands[1], "pvs --noheadings --units m -o pv_size /dev/sdb");
    // 996 usable megabytes, 4 of them for metadata
    assert_eq!(commands[2], "lvcreate -L 1015808K -n lv vg");
}

#[test]
fn create_without_profile_skips_sizing() {
    let lvm = FakeLvm::new(healthy_host);
    let p = params(json!({
        "action": "create", "lvname": "lv", "lvtype": "thick", "vgname": "vg"
    }));

    let outcome = Outcome::from(lvops::execute(&p, &lvm));
    assert!(outcome.changed);
    assert_eq!(lvm.commands(), vec!["lvcreate -n lv vg"]);
}

#[test]
fn missing_vgname_runs_nothing() {
    let lvm = FakeLvm::new(healthy_host);
    for action in ["create", "convert", "change", "remove"] {
        let p = params(json!({
            "action": action, "lvname": "lv", "lvtype": "thick", "poolname": "pool",
            "thinpool": "vg/pool", "compute": "raid6", "stripesize": 64
        }));
        assert_matches!(
            lvops::execute(&p, &lvm),
            Err(Error::MissingParameter { name }) if name == "vgname"
        );
    }
    assert!(lvm.commands().is_empty());
}

#[test]
fn convert_raid10_chunk_spans_stripe() {
    let lvm = FakeLvm::new(healthy_host);
    let p = params(json!({
        "action": "convert", "thinpool": "RHS_vg1/RHS_pool1",
        "poolmetadata": "RHS_vg1/metadata", "poolmetadataspare": "n",
        "vgname": "RHS_vg1", "compute": "raid10", "diskcount": 4, "stripesize": 64
    }));

    lvops::execute(&p, &lvm).unwrap();
    assert_eq!(
        lvm.commands(),
        vec![
            "lvconvert --yes -ff -c 256 --thinpool RHS_vg1/RHS_pool1 \
             --poolmetadata RHS_vg1/metadata --poolmetadataspare n"
        ]
    );
}

#[test]
fn convert_with_unknown_profile() {
    let lvm = FakeLvm::new(healthy_host);
    let p = params(json!({
        "action": "convert", "thinpool": "vg/pool", "vgname": "vg",
        "compute": "raid5", "stripesize": 64
    }));

    assert_matches!(
        lvops::execute(&p, &lvm),
        Err(Error::UnsupportedProfile { profile }) if profile == "raid5"
    );
    assert!(lvm.commands().is_empty());
}

#[test]
fn change_zeroing() {
    let lvm = FakeLvm::new(healthy_host);
    let p = params(json!({
        "action": "change", "zero": "n", "vgname": "RHS_vg1", "poolname": "RHS_pool1"
    }));

    lvops::execute(&p, &lvm).unwrap();
    assert_eq!(lvm.commands(), vec!["lvchange -Z n RHS_vg1/RHS_pool1"]);
}

#[test]
fn remove_failure_surfaces_stderr() {
    let stderr = "  Failed to find logical volume \"RHS_vg1/RHS_lv1\"\n";
    let lvm = FakeLvm::new(|spec: &CommandSpec| failed(spec, stderr));
    let p = params(json!({
        "action": "remove", "vgname": "RHS_vg1", "lvname": "RHS_lv1"
    }));

    let outcome = Outcome::from(lvops::execute(&p, &lvm));
    assert_eq!(lvm.commands(), vec!["lvremove -ff --yes RHS_vg1/RHS_lv1"]);
    assert_eq!(
        outcome,
        Outcome {
            changed: false,
            failed: true,
            msg: stderr.to_string(),
        }
    );
}
