//! Installed-package entries parsed from canonical package filenames.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SboToolkitError};

/// One entry of the installed-package set.
///
/// Parsed from the canonical filename form `name-version-arch-build{tag}`,
/// where `build` is a numeric prefix and `tag` is the trailing non-digit
/// suffix (often empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    /// Package name (may itself contain dashes).
    pub name: String,
    /// Installed version.
    pub version: String,
    /// Architecture field (e.g. `x86_64`, `noarch`).
    pub arch: String,
    /// Numeric build number.
    pub build: String,
    /// Provider tag, the non-digit suffix of the build field.
    pub tag: String,
}

impl InstalledPackage {
    /// What: Parse a canonical installed-package filename.
    ///
    /// Inputs:
    /// - `entry`: Filename such as `apachetop-0.18.4-x86_64-1_SBo`.
    ///
    /// Output:
    /// - Returns the parsed `InstalledPackage`.
    ///
    /// Details:
    /// - The last three dash-separated fields are build{tag}, arch, and
    ///   version; everything before them is the name.
    /// - The tag starts at the first non-digit character of the build field.
    ///
    /// # Errors
    ///
    /// Returns `Parse` when fewer than three dashes are present or the name
    /// component is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use sbo_toolkit::types::InstalledPackage;
    ///
    /// let pkg = InstalledPackage::parse("apachetop-0.18.4-x86_64-1_SBo").unwrap();
    /// assert_eq!(pkg.name, "apachetop");
    /// assert_eq!(pkg.version, "0.18.4");
    /// assert_eq!(pkg.arch, "x86_64");
    /// assert_eq!(pkg.build, "1");
    /// assert_eq!(pkg.tag, "_SBo");
    /// ```
    pub fn parse(entry: &str) -> Result<Self> {
        let malformed = || SboToolkitError::Parse(format!("malformed package entry: {entry}"));

        let (rest, build_tag) = entry.rsplit_once('-').ok_or_else(malformed)?;
        let (rest, arch) = rest.rsplit_once('-').ok_or_else(malformed)?;
        let (name, version) = rest.rsplit_once('-').ok_or_else(malformed)?;

        if name.is_empty() {
            return Err(malformed());
        }

        let tag_start = build_tag
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(build_tag.len());

        Ok(Self {
            name: name.to_string(),
            version: version.to_string(),
            arch: arch.to_string(),
            build: build_tag[..tag_start].to_string(),
            tag: build_tag[tag_start..].to_string(),
        })
    }

    /// What: Check whether this entry matches an optional tag filter.
    ///
    /// Inputs:
    /// - `tag`: `Some(tag)` to require an exact tag match, `None` to accept
    ///   any entry.
    ///
    /// Output:
    /// - Returns `true` when the filter accepts this entry.
    #[must_use]
    pub fn matches_tag(&self, tag: Option<&str>) -> bool {
        tag.is_none_or(|t| self.tag == t)
    }
}
