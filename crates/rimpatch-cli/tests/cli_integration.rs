use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::{fs, path::Path, process::Command};

fn bin_cmd() -> Command {
    Command::cargo_bin("rimpatch").expect("rimpatch built")
}

fn write(root: &Path, rel: &str, content: &str) {
    let p = root.join(rel);
    fs::create_dir_all(p.parent().unwrap()).unwrap();
    fs::write(p, content).unwrap();
}

#[test]
fn help_lists_subcommands() {
    bin_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("scan-mods"))
        .stdout(predicate::str::contains("patch"))
        .stdout(predicate::str::contains("extract-defs"));
}

#[test]
fn migrate_help_describes_output_files() {
    bin_cmd()
        .args(["migrate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("issues report"))
        .stdout(predicate::str::contains("LoadFolders records"));
}

#[test]
fn extract_defs_moves_def_only_patches() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let root = tmp.path();
    write(
        root,
        "mods/Guns/Patches/Weapons.xml",
        "<Patch>\n\t<Operation Class=\"PatchOperationAdd\">\n\t\t<xpath>Defs</xpath>\n\t\t<value>\n\t\t\t<ThingDef>\n\t\t\t\t<defName>Gun</defName>\n\t\t\t</ThingDef>\n\t\t</value>\n\t</Operation>\n</Patch>",
    );
    write(
        root,
        "mods/Guns/Patches/Mixed.xml",
        "<Patch><Operation Class=\"PatchOperationAdd\"><xpath>Defs</xpath><value><ThingDef/></value></Operation><Operation Class=\"PatchOperationRemove\"/></Patch>",
    );

    let assert = bin_cmd()
        .current_dir(root)
        .args(["--quiet", "extract-defs", "mods", "--format", "json"])
        .assert()
        .success();
    let out = String::from_utf8_lossy(assert.get_output().stdout.as_ref()).to_string();
    let report: serde_json::Value = serde_json::from_str(&out).expect("valid json");
    assert_eq!(report["moved"][0], "Guns/Patches/Weapons.xml");
    assert_eq!(report["mixed"][0], "Guns/Patches/Mixed.xml");

    let defs = fs::read_to_string(root.join("mods/Guns/Defs/Weapons.xml")).unwrap();
    assert_eq!(
        defs.replace("\r\n", "\n"),
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Defs>\n\t<ThingDef>\n\t\t<defName>Gun</defName>\n\t</ThingDef>\n</Defs>"
    );
    assert!(!root.join("mods/Guns/Patches/Weapons.xml").exists());
    let mixed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("mixed-defs.json")).unwrap()).unwrap();
    assert_eq!(mixed[0], "Guns/Patches/Mixed.xml");
}

#[test]
fn patch_rewrites_into_destination() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let root = tmp.path();
    write(
        root,
        "in/Sub/a.xml",
        "<Patch>\n\t<Operation Class=\"PatchOperationSequence\">\n\t\t<operations>\n\t\t\t<li Class=\"PatchOperationAdd\">\n\t\t\t\t<xpath>Defs</xpath>\n\t\t\t</li>\n\t\t</operations>\n\t</Operation>\n</Patch>",
    );

    let assert = bin_cmd()
        .current_dir(root)
        .args(["--quiet", "patch", "in", "--dest", "out", "--format", "json"])
        .assert()
        .success();
    let out = String::from_utf8_lossy(assert.get_output().stdout.as_ref()).to_string();
    let report: serde_json::Value = serde_json::from_str(&out).expect("valid json");
    assert_eq!(report["files_written"], 1);
    assert_eq!(report["operations_flattened"], 1);

    let text = fs::read_to_string(root.join("out/Sub/a.xml")).unwrap();
    assert_eq!(
        text.replace("\r\n", "\n"),
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Patch>\n\t<Operation Class=\"PatchOperationAdd\">\n\t\t<xpath>Defs</xpath>\n\t</Operation>\n</Patch>"
    );
    assert!(fs::read_to_string(root.join("in/Sub/a.xml"))
        .unwrap()
        .contains("PatchOperationSequence"));
}

#[test]
fn patch_reports_broken_files() {
    let tmp = tempfile::tempdir().expect("tempdir");
    write(tmp.path(), "in/bad.xml", "<Patch><a></b></Patch>");
    bin_cmd()
        .current_dir(tmp.path())
        .args(["--no-color", "patch", "in"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad.xml"));
}

#[test]
fn scan_mods_builds_dictionary_with_dlcs() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let root = tmp.path();
    write(
        root,
        "mods/2009463077/About/About.xml",
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<ModMetaData>\n\t<name>Harmony</name>\n\t<packageId>brrainz.harmony</packageId>\n</ModMetaData>",
    );
    write(root, "known-mods.json", r#"{ "Old Mod": ["old.mod"] }"#);

    bin_cmd()
        .current_dir(root)
        .args(["--quiet", "scan-mods", "mods", "--out", "known-mods.json"])
        .assert()
        .success();

    let km: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("known-mods.json")).unwrap()).unwrap();
    assert_eq!(km["Old Mod"][0], "old.mod");
    assert_eq!(km["Harmony"][0], "brrainz.harmony");
    assert_eq!(km["Royalty"][0], "Ludeon.RimWorld.Royalty");
}

#[test]
fn schema_dumps_report_schemas() {
    let tmp = tempfile::tempdir().expect("tempdir");
    bin_cmd()
        .current_dir(tmp.path())
        .args(["--quiet", "schema", "--out-dir", "schemas"])
        .assert()
        .success();
    for name in [
        "migration_issues.schema.json",
        "migration_summary.schema.json",
        "known_mods.schema.json",
    ] {
        let text = fs::read_to_string(tmp.path().join("schemas").join(name)).unwrap();
        let _: serde_json::Value = serde_json::from_str(&text).expect("valid json");
    }
}
