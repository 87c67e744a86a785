//! Tests for metadata handling and installer-filename version parsing

use crate::errors::RepackError;
use crate::metadata::{version_from_installer, MetadataRecord};

fn record_with_classifiers(classifiers: &[&str]) -> MetadataRecord {
    MetadataRecord {
        name: "GDAL".to_owned(),
        version: "2.0.0".to_owned(),
        summary: "GDAL: Geospatial Data Abstraction Library".to_owned(),
        license: "MIT".to_owned(),
        classifiers: classifiers.iter().map(|c| (*c).to_owned()).collect(),
    }
}

#[test]
fn version_from_win32_installer() {
    let version = version_from_installer("GDAL-2.1.3.win32-py2.7.msi").unwrap();
    assert_eq!(version, "2.1.3");
}

#[test]
fn version_from_amd64_installer() {
    let version = version_from_installer("GDAL-2.1.3.win-amd64-py2.7.msi").unwrap();
    assert_eq!(version, "2.1.3");
}

#[test]
fn version_parse_failures() {
    for name in ["GDAL.msi", "GDAL-2.1.3.msi", "-2.1.3.win32.msi", ""] {
        let err = version_from_installer(name).unwrap_err();
        assert!(matches!(err, RepackError::VersionParse { .. }), "{name}");
    }
}

#[test]
fn retarget_swaps_language_and_os_classifiers() {
    let mut record = record_with_classifiers(&[
        "Development Status :: 5 - Production/Stable",
        "Programming Language :: Python :: 2",
        "Operating System :: OS Independent",
        "Programming Language :: Python :: 3",
        "Topic :: Scientific/Engineering :: GIS",
    ]);
    record.retarget_classifiers();

    assert_eq!(
        record.classifiers,
        vec![
            "Development Status :: 5 - Production/Stable",
            "Topic :: Scientific/Engineering :: GIS",
            "Programming Language :: Python :: 2.7",
            "Operating System :: Microsoft :: Windows",
            "License :: Other/Proprietary License",
        ]
    );
}

#[test]
fn retarget_tolerates_missing_classifiers() {
    // upstream record without any of the entries we'd remove
    let mut record = record_with_classifiers(&[]);
    record.retarget_classifiers();

    assert_eq!(
        record.classifiers,
        vec![
            "Programming Language :: Python :: 2.7",
            "Operating System :: Microsoft :: Windows",
            "License :: Other/Proprietary License",
        ]
    );
}
