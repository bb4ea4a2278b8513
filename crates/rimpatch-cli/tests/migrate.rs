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

fn find_mod(mods: &[&str]) -> String {
    let lis: String = mods.iter().map(|m| format!("\t\t\t<li>{m}</li>\n")).collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>
<Patch>
\t<Operation Class=\"PatchOperationFindMod\">
\t\t<mods>
{lis}\t\t</mods>
\t\t<match Class=\"PatchOperationSequence\">
\t\t\t<operations>
\t\t\t\t<li Class=\"PatchOperationAdd\">
\t\t\t\t\t<xpath>Defs/ThingDef[defName=\"Gun\"]</xpath>
\t\t\t\t\t<value>
\t\t\t\t\t\t<tag/>
\t\t\t\t\t</value>
\t\t\t\t</li>
\t\t\t</operations>
\t\t</match>
\t</Operation>
</Patch>
"
    )
}

fn setup() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().expect("tempdir");
    let root = tmp.path();
    write(
        root,
        "known-mods.json",
        r#"{ "Harmony": ["656325405"], "Tom & Jerry": ["tj.mod"] }"#,
    );
    write(root, "src/Harmony/Defs/Guns.xml", &find_mod(&["Harmony"]));
    write(root, "src/Tom & Jerry/a.xml", &find_mod(&["Tom &amp; Jerry"]));
    write(root, "src/Unknown/a.xml", &find_mod(&["Unknown Mod"]));
    write(
        root,
        "src/Plain/a.xml",
        "<Patch><Operation Class=\"PatchOperationAdd\"/></Patch>",
    );
    tmp
}

#[test]
fn migrate_writes_records_issues_and_files() {
    let tmp = setup();
    let root = tmp.path();

    let mut cmd = bin_cmd();
    cmd.current_dir(root)
        .args(["--quiet", "migrate", "src", "--dest", "out"])
        .args(["--format", "json"]);
    let assert = cmd.assert().success();
    let out = String::from_utf8_lossy(assert.get_output().stdout.as_ref()).to_string();
    let summary: serde_json::Value = serde_json::from_str(&out).expect("valid json");
    assert_eq!(summary["migrated"], 2);
    assert_eq!(summary["skipped"], 1);
    assert_eq!(summary["flagged"], 1);
    assert_eq!(summary["failed"], 0);

    let records = fs::read_to_string(root.join("load-folders-records.xml")).unwrap();
    let lines: Vec<&str> = records.lines().collect();
    assert_eq!(
        lines,
        [
            "<li IfModActive=\"656325405\">ModPatches/Harmony</li>",
            "<li IfModActive=\"tj.mod\">ModPatches/Tom &amp; Jerry</li>",
        ]
    );

    let issues: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("issues.json")).unwrap()).unwrap();
    assert_eq!(issues["Plain"]["NO_PATCHES"], true);
    assert_eq!(issues["Unknown"]["UNIDENT_MODS_FOUND"][0], "Unknown Mod");
    assert!(issues.get("Harmony").is_none());

    let patched =
        fs::read_to_string(root.join("out/Harmony/Patches/Harmony/Defs/Guns.xml")).unwrap();
    let expected = "<?xml version=\"1.0\" encoding=\"utf-8\"?>
<Patch>
\t<Operation Class=\"PatchOperationAdd\">
\t\t<xpath>Defs/ThingDef[defName=\"Gun\"]</xpath>
\t\t<value>
\t\t\t<tag/>
\t\t</value>
\t</Operation>
</Patch>
";
    assert_eq!(patched.replace("\r\n", "\n"), expected);
}

#[test]
fn migrate_without_known_mods_file_fails() {
    let tmp = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(tmp.path().join("src")).unwrap();
    bin_cmd()
        .current_dir(tmp.path())
        .args(["migrate", "src"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("known mods"));
}

#[test]
fn migrate_fails_on_unparsable_directory() {
    let tmp = setup();
    write(tmp.path(), "src/Broken/a.xml", "<Patch><Operation>");
    let assert = bin_cmd()
        .current_dir(tmp.path())
        .args(["--quiet", "migrate", "src", "--format", "json"])
        .assert()
        .failure();
    let out = String::from_utf8_lossy(assert.get_output().stdout.as_ref()).to_string();
    let summary: serde_json::Value = serde_json::from_str(&out).expect("valid json");
    assert_eq!(summary["failed"], 1);
    let broken = summary["dirs"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["name"] == "Broken")
        .unwrap();
    assert_eq!(broken["status"], "parse-failed");
}

#[test]
fn config_file_supplies_defaults() {
    let tmp = setup();
    write(
        tmp.path(),
        "rimpatch.toml",
        "load_folders_file = \"records.xml\"\n[migrate]\nload_folder_prefix = \"Compat\"\nskip_dirs = [\"Unknown\", \"Plain\"]\n",
    );
    bin_cmd()
        .current_dir(tmp.path())
        .args(["--quiet", "migrate", "src"])
        .assert()
        .success();
    let records = fs::read_to_string(tmp.path().join("records.xml")).unwrap();
    assert!(records.contains(">Compat/Harmony</li>"));
    assert!(!tmp.path().join("issues.json").exists());
}
