//! Tests for artifact selection (the declarative rule table)

use crate::locate::{rule_for, Arch, SourceMode};

const FILES: &[&str] = &[
    "GDAL-2.0.0-cp27-none-win32.whl",
    "GDAL-2.1.3.win32-py2.7.msi",
    "gdal-200-1500-core.msi",
    "gdal-200-1500-ecw-33.msi",
    "gdal-200-1500-mrsid-91.msi",
    "gdal-200-1500-x64-core.msi",
    "gdal-200-1500-x64-ecw-33.msi",
    "gdal-repack.json",
    "readme.txt",
];

#[test]
fn wheel_win32_selects_primary_and_plugins() {
    let rule = rule_for(SourceMode::Wheel, Arch::Win32);
    let inputs = rule.select(FILES.iter().copied()).unwrap().unwrap();

    assert_eq!(inputs.primary, "GDAL-2.0.0-cp27-none-win32.whl");
    // x64 installers and the core installer are both filtered out
    assert_eq!(
        inputs.auxiliary,
        vec!["gdal-200-1500-ecw-33.msi", "gdal-200-1500-mrsid-91.msi"]
    );
}

#[test]
fn wheel_amd64_skipped_without_primary() {
    // there's no win_amd64 wheel in the list, so that arch has nothing to
    // do, even though x64 plugin installers are present
    let rule = rule_for(SourceMode::Wheel, Arch::WinAmd64);
    assert!(rule.select(FILES.iter().copied()).unwrap().is_none());
}

#[test]
fn wheel_amd64_selects_x64_plugins() {
    let mut files = FILES.to_vec();
    files.push("GDAL-2.0.0-cp27-none-win_amd64.whl");

    let rule = rule_for(SourceMode::Wheel, Arch::WinAmd64);
    let inputs = rule.select(files).unwrap().unwrap();

    assert_eq!(inputs.primary, "GDAL-2.0.0-cp27-none-win_amd64.whl");
    assert_eq!(inputs.auxiliary, vec!["gdal-200-1500-x64-ecw-33.msi"]);
}

#[test]
fn msi_win32_includes_core() {
    let rule = rule_for(SourceMode::Msi, Arch::Win32);
    let inputs = rule.select(FILES.iter().copied()).unwrap().unwrap();

    assert_eq!(inputs.primary, "GDAL-2.1.3.win32-py2.7.msi");
    // in msi mode the core installer is what supplies the native DLLs
    assert_eq!(
        inputs.auxiliary,
        vec![
            "gdal-200-1500-core.msi",
            "gdal-200-1500-ecw-33.msi",
            "gdal-200-1500-mrsid-91.msi"
        ]
    );
}

#[test]
fn msi_amd64_selects_bindings_installer() {
    let files = vec![
        "GDAL-2.1.3.win-amd64-py2.7.msi",
        "gdal-200-1500-x64-core.msi",
        "gdal-200-1500-x64-ecw-33.msi",
    ];

    let rule = rule_for(SourceMode::Msi, Arch::WinAmd64);
    let inputs = rule.select(files).unwrap().unwrap();

    assert_eq!(inputs.primary, "GDAL-2.1.3.win-amd64-py2.7.msi");
    assert_eq!(
        inputs.auxiliary,
        vec!["gdal-200-1500-x64-core.msi", "gdal-200-1500-x64-ecw-33.msi"]
    );
}

#[test]
fn matching_is_case_insensitive() {
    // windows filesystems don't care about case, so neither do we
    let files = vec!["gdal-2.0.0-CP27-none-WIN32.whl"];
    let rule = rule_for(SourceMode::Wheel, Arch::Win32);
    let inputs = rule.select(files).unwrap().unwrap();
    assert_eq!(inputs.primary, "gdal-2.0.0-CP27-none-WIN32.whl");
}

#[test]
fn excludes_are_case_insensitive() {
    // an upper-cased X64 plugin must not slip into the 32-bit run
    let files = vec![
        "GDAL-2.0.0-cp27-none-win32.whl",
        "gdal-200-1500-X64-ecw-33.msi",
        "gdal-200-1500-mrsid-91.msi",
    ];
    let rule = rule_for(SourceMode::Wheel, Arch::Win32);
    let inputs = rule.select(files).unwrap().unwrap();
    assert_eq!(inputs.auxiliary, vec!["gdal-200-1500-mrsid-91.msi"]);
}

#[test]
fn empty_dir_is_a_skip_everywhere() {
    for rule in &crate::locate::ARTIFACT_RULES {
        assert!(rule.select(std::iter::empty()).unwrap().is_none());
    }
}

#[test]
fn mode_output_dirs() {
    assert_eq!(SourceMode::Wheel.dist_dir(), "dist-np19");
    assert_eq!(SourceMode::Msi.dist_dir(), "dist-np17");
}
