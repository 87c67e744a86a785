#![deny(missing_docs)]
#![allow(clippy::result_large_err)]

//! # gdal-repack
//!
//! This is the library behind the `gdal-repack` CLI. It takes prebuilt GDAL
//! binary distributions sitting in a working directory (Gohlke cp27 wheels,
//! gisinternals plugin MSIs, the python-bindings MSI) and re-bundles them
//! into one self-contained platform wheel per architecture.
//!
//! The whole thing is sequential filesystem choreography: unpack, merge
//! trees, patch a bootstrap file, build a generic wheel, then rewrite its
//! manifest so it declares the platform it's actually full of binaries for.

use axoasset::LocalAsset;
use camino::Utf8PathBuf;
use tracing::{error, info};

use errors::*;
use locate::{rule_for, Arch, Inputs, SourceMode};
use metadata::MetadataRecord;
use stage::{Staging, INIT_FILE, PACKAGE_DIR};

pub mod bdist;
pub mod config;
pub mod errors;
pub mod extract;
pub mod locate;
pub mod metadata;
pub mod retag;
pub mod stage;
#[cfg(test)]
mod tests;

/// Top-level settings for a repackaging run
#[derive(Debug)]
pub struct RepackConfig {
    /// where the primary artifacts come from
    pub mode: SourceMode,
    /// the directory holding the input artifacts (absolute)
    pub work_dir: Utf8PathBuf,
}

/// Run the full pipeline: every architecture of the selected mode.
///
/// Architectures with no primary artifact are skipped silently. A failure in
/// one architecture's pipeline doesn't stop the others; the first failure is
/// returned at the end so the process still exits non-zero.
pub fn do_repack(cfg: &RepackConfig) -> Result<Vec<Utf8PathBuf>> {
    let package_config = config::PackageConfig::load(&cfg.work_dir)?;
    let dist_dir = cfg.work_dir.join(cfg.mode.dist_dir());
    LocalAsset::create_dir_all(&dist_dir)?;

    let mut produced = vec![];
    let mut first_failure: Option<miette::Report> = None;
    for arch in Arch::ALL {
        let rule = rule_for(cfg.mode, arch);
        let Some(inputs) = rule.locate(&cfg.work_dir)? else {
            info!("no {} primary artifact for {arch}, skipping", cfg.mode);
            continue;
        };
        eprintln!("repackaging {} for {arch}:", inputs.primary);

        let staging = Staging::create(&cfg.work_dir)?;
        let result = run_pipeline(cfg.mode, arch, &package_config, &inputs, &staging, &dist_dir);
        staging.cleanup();

        match result {
            Ok(out_path) => {
                eprintln!("  {out_path}");
                produced.push(out_path);
            }
            Err(details) => {
                let report = miette::Report::from(details);
                if first_failure.is_some() {
                    error!("{arch} failed: {:?}", report);
                } else {
                    first_failure = Some(report.wrap_err(format!("failed to repackage {arch}")));
                }
            }
        }
    }

    match first_failure {
        Some(failure) => Err(failure),
        None => Ok(produced),
    }
}

fn run_pipeline(
    mode: SourceMode,
    arch: Arch,
    package_config: &config::PackageConfig,
    inputs: &Inputs,
    staging: &Staging,
    dist_dir: &Utf8PathBuf,
) -> RepackResult<Utf8PathBuf> {
    match mode {
        SourceMode::Wheel => wheel_pipeline(arch, package_config, inputs, staging, dist_dir),
        SourceMode::Msi => msi_pipeline(arch, package_config, inputs, staging, dist_dir),
    }
}

/// The wheel-sourced shape: the primary wheel supplies both the payload and
/// the metadata record.
fn wheel_pipeline(
    arch: Arch,
    package_config: &config::PackageConfig,
    inputs: &Inputs,
    staging: &Staging,
    dist_dir: &Utf8PathBuf,
) -> RepackResult<Utf8PathBuf> {
    let unpacked = extract::unpack_wheel(&inputs.primary, staging.root())?;
    let platlib = staging.platlib();
    let libdir = staging.libdir();

    // Gohlke's wheels park the actual package under the data category,
    // nested the way a windows install tree would be
    let data_payload = staging
        .root()
        .join("data")
        .join(extract::BINDINGS_PAYLOAD)
        .join(PACKAGE_DIR);
    if data_payload.exists() {
        extract::merge_tree(&data_payload, &libdir)?;
    }

    stage::quarantine_plugins(&libdir)?;
    stage::patch_init(&libdir.join(INIT_FILE))?;

    let dist_info = platlib.join(&unpacked.dist_info);
    let mut metadata = MetadataRecord::load(&dist_info)?;
    let description = MetadataRecord::load_description(&dist_info);
    metadata.name = package_config.name.clone();
    metadata.retarget_classifiers();
    // the old dist-info must not leak into the wheel we're about to build
    LocalAsset::remove_dir_all(&dist_info)?;

    merge_auxiliary(inputs, staging, &libdir)?;

    finish(arch, package_config, &metadata, description.as_deref(), staging, dist_dir)
}

/// The installer-sourced shape: payload from the python-bindings MSI,
/// version from its filename, metadata from the side-channel config.
fn msi_pipeline(
    arch: Arch,
    package_config: &config::PackageConfig,
    inputs: &Inputs,
    staging: &Staging,
    dist_dir: &Utf8PathBuf,
) -> RepackResult<Utf8PathBuf> {
    let file_name = inputs.primary.file_name().unwrap_or_default();
    let version = metadata::version_from_installer(file_name)?;

    let extracted = staging.root().join("primary");
    extract::admin_extract_msi(&inputs.primary, &extracted)?;
    let platlib = staging.platlib();
    extract::merge_tree(&extracted.join(extract::BINDINGS_PAYLOAD), &platlib)?;

    let libdir = staging.libdir();
    stage::quarantine_plugins(&libdir)?;
    stage::patch_init(&libdir.join(INIT_FILE))?;

    merge_auxiliary(inputs, staging, &libdir)?;

    let removed = stage::prune_scripts(&libdir)?;
    if !removed.is_empty() {
        info!("pruned scripts: {}", removed.join(", "));
    }

    let metadata = MetadataRecord::from_config(package_config, &version);
    finish(arch, package_config, &metadata, None, staging, dist_dir)
}

/// Extract each auxiliary plugin installer and merge its payload into the
/// library dir.
fn merge_auxiliary(
    inputs: &Inputs,
    staging: &Staging,
    libdir: &camino::Utf8Path,
) -> RepackResult<()> {
    for msi in &inputs.auxiliary {
        let stem = msi.file_stem().unwrap_or("plugin");
        let out = staging.root().join(stem);
        extract::admin_extract_msi(msi, &out)?;
        extract::merge_tree(&out.join(extract::PLUGIN_PAYLOAD), libdir)?;
    }
    Ok(())
}

/// Shared tail of both shapes: build the generic wheel, then retag it into
/// the output dir.
fn finish(
    arch: Arch,
    package_config: &config::PackageConfig,
    metadata: &MetadataRecord,
    description: Option<&str>,
    staging: &Staging,
    dist_dir: &Utf8PathBuf,
) -> RepackResult<Utf8PathBuf> {
    let platlib = staging.platlib();
    let build = bdist::WheelBuild {
        platlib: &platlib,
        metadata,
        config: package_config,
        description,
    };
    let generic = {
        // the packaging step historically resolves everything against the
        // cwd; the guard restores it even if the build bails
        let _pushd = stage::Pushd::change(&platlib)?;
        build.build()?
    };

    let out_name = bdist::wheel_file_name(
        &metadata.name,
        &metadata.version,
        &format!("cp27-none-{}", arch.platform_tag()),
    );
    let out_path = dist_dir.join(out_name);
    retag::retag_wheel(
        &generic,
        &out_path,
        &metadata.name,
        &metadata.version,
        arch.platform_tag(),
    )?;
    Ok(out_path)
}
