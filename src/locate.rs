//! Finding input artifacts (wheels and MSIs) for a given mode/architecture
//!
//! The original tooling globbed the working directory with patterns scattered
//! around the script. Here the (mode, arch) => patterns mapping is one static
//! table, and matching works on bare filenames so it can be tested without
//! touching a filesystem.

use camino::{Utf8Path, Utf8PathBuf};
use glob::{MatchOptions, Pattern};

use crate::errors::*;

/// Where the primary artifact comes from
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SourceMode {
    /// Repackage a prebuilt cp27 wheel (the default)
    Wheel,
    /// Repackage the python-bindings MSI
    Msi,
}

impl SourceMode {
    /// The output directory this mode writes finished wheels into
    pub fn dist_dir(&self) -> &'static str {
        match self {
            // numpy-1.9 and numpy-1.7 ABI builds, respectively
            SourceMode::Wheel => "dist-np19",
            SourceMode::Msi => "dist-np17",
        }
    }
}

impl std::fmt::Display for SourceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceMode::Wheel => "wheel".fmt(f),
            SourceMode::Msi => "msi".fmt(f),
        }
    }
}

/// A target architecture we can produce a wheel for
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Arch {
    /// 32-bit windows
    Win32,
    /// 64-bit windows
    WinAmd64,
}

impl Arch {
    /// Every architecture we know how to target
    pub const ALL: [Arch; 2] = [Arch::Win32, Arch::WinAmd64];

    /// The python platform tag this architecture uses in wheel names/manifests
    pub fn platform_tag(&self) -> &'static str {
        match self {
            Arch::Win32 => "win32",
            Arch::WinAmd64 => "win_amd64",
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.platform_tag().fmt(f)
    }
}

/// How to find the inputs for one (mode, arch) pipeline run
#[derive(Debug)]
pub struct ArtifactRule {
    /// the mode this rule belongs to
    pub mode: SourceMode,
    /// the architecture this rule belongs to
    pub arch: Arch,
    /// glob matching the single primary artifact
    pub primary: &'static str,
    /// glob matching auxiliary plugin installers
    pub auxiliary: &'static str,
    /// substrings that disqualify an auxiliary match
    pub excludes: &'static [&'static str],
}

/// The full (mode, arch) => patterns table.
///
/// Notes on the exclusions: the 32-bit auxiliary glob also matches x64
/// installers, so those are filtered by substring; and in wheel mode the
/// `core` installer is skipped because the wheel already carries the core
/// DLLs (in msi mode it's the thing that supplies them).
pub const ARTIFACT_RULES: [ArtifactRule; 4] = [
    ArtifactRule {
        mode: SourceMode::Wheel,
        arch: Arch::Win32,
        primary: "GDAL-*-cp27-*-win32.whl",
        auxiliary: "gdal-*-1500-*.msi",
        excludes: &["x64", "core"],
    },
    ArtifactRule {
        mode: SourceMode::Wheel,
        arch: Arch::WinAmd64,
        primary: "GDAL-*-cp27-*-win_amd64.whl",
        auxiliary: "gdal-*-1500-x64-*.msi",
        excludes: &["core"],
    },
    ArtifactRule {
        mode: SourceMode::Msi,
        arch: Arch::Win32,
        primary: "GDAL-*.win32-py*.msi",
        auxiliary: "gdal-*-1500-*.msi",
        excludes: &["x64"],
    },
    ArtifactRule {
        mode: SourceMode::Msi,
        arch: Arch::WinAmd64,
        primary: "GDAL-*.win-amd64-py*.msi",
        auxiliary: "gdal-*-1500-x64-*.msi",
        excludes: &[],
    },
];

/// Look up the rule for a (mode, arch) pair
pub fn rule_for(mode: SourceMode, arch: Arch) -> &'static ArtifactRule {
    ARTIFACT_RULES
        .iter()
        .find(|rule| rule.mode == mode && rule.arch == arch)
        .expect("artifact rule table covers every mode/arch")
}

/// The inputs selected for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inputs {
    /// the primary wheel or MSI
    pub primary: Utf8PathBuf,
    /// plugin installers to merge in, in sorted order
    pub auxiliary: Vec<Utf8PathBuf>,
}

// Windows filenames are case-insensitive, so matching is too.
fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: false,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    }
}

impl ArtifactRule {
    /// Pick the primary + auxiliary artifacts out of a list of filenames.
    ///
    /// Returns `None` if no filename matches the primary pattern: that
    /// architecture simply has nothing to repackage, which is a skip and
    /// not an error. Candidates are considered in sorted order so selection
    /// is deterministic regardless of directory iteration order.
    pub fn select<'n>(
        &self,
        names: impl IntoIterator<Item = &'n str>,
    ) -> RepackResult<Option<Inputs>> {
        let opts = match_options();
        let primary_pat = Pattern::new(self.primary)?;
        let auxiliary_pat = Pattern::new(self.auxiliary)?;

        let mut names: Vec<&str> = names.into_iter().collect();
        names.sort_unstable();

        let Some(primary) = names
            .iter()
            .find(|name| primary_pat.matches_with(name, opts))
        else {
            return Ok(None);
        };

        let auxiliary = names
            .iter()
            .filter(|name| auxiliary_pat.matches_with(name, opts))
            .filter(|name| {
                // exclusions follow the same case rules as the patterns
                let name = name.to_lowercase();
                !self.excludes.iter().any(|sub| name.contains(sub))
            })
            .map(|name| Utf8PathBuf::from(*name))
            .collect();

        Ok(Some(Inputs {
            primary: Utf8PathBuf::from(*primary),
            auxiliary,
        }))
    }

    /// Run [`select`][Self::select] against the files in `dir`, producing
    /// full paths.
    pub fn locate(&self, dir: &Utf8Path) -> RepackResult<Option<Inputs>> {
        let mut names = vec![];
        for entry in dir.read_dir_utf8()? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_owned());
            }
        }

        let selected = self.select(names.iter().map(|s| s.as_str()))?;
        Ok(selected.map(|inputs| Inputs {
            primary: dir.join(inputs.primary),
            auxiliary: inputs
                .auxiliary
                .iter()
                .map(|name| dir.join(name))
                .collect(),
        }))
    }
}
