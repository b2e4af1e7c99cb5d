//! Cloud profile schema: the provider-specific image catalogue,
//! capability definitions, and floating IP pools.
//!
//! Two image schema generations coexist. A version entry is either
//! `legacy` (one architecture per region id) or `capability` (region ids
//! nested under capability flavors). The `format` field selects the
//! variant explicitly; mixing both shapes in one entry is rejected.

use serde::{Deserialize, Serialize};

use crate::types::Capabilities;

/// Provider-specific section of the cloud profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CloudProfileConfig {
    #[serde(default)]
    pub machine_images: Vec<MachineImages>,
    /// Declared capability dimensions. The declared values are the default
    /// for any image or request that omits a dimension.
    #[serde(default)]
    pub capabilities: Vec<CapabilityDefinition>,
    #[serde(default)]
    pub floating_pools: Vec<FloatingPool>,
}

impl CloudProfileConfig {
    /// Find the version entry for `name`/`version`.
    pub fn find_version(&self, name: &str, version: &str) -> Option<&ImageCandidate> {
        self.machine_images
            .iter()
            .filter(|m| m.name == name)
            .flat_map(|m| m.versions.iter())
            .find(|v| v.version() == version)
    }
}

/// All versions of one machine image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MachineImages {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<ImageCandidate>,
}

/// One image version in either schema generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum ImageCandidate {
    Legacy(LegacyImageVersion),
    Capability(CapabilityImageVersion),
}

impl ImageCandidate {
    pub fn version(&self) -> &str {
        match self {
            ImageCandidate::Legacy(v) => &v.version,
            ImageCandidate::Capability(v) => &v.version,
        }
    }
}

/// Legacy entry: per-region ids tagged with an architecture, plus an
/// optional global image name from before multi-arch support.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LegacyImageVersion {
    pub version: String,
    /// Global image name, valid in every region.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub regions: Vec<RegionIdMapping>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionIdMapping {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub architecture: Option<String>,
}

/// Capability entry: flavors each carrying a capability set and the
/// region ids built for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CapabilityImageVersion {
    pub version: String,
    #[serde(default)]
    pub flavors: Vec<ImageFlavor>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageFlavor {
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub regions: Vec<FlavorRegion>,
}

impl ImageFlavor {
    /// The image id for `region`, if this flavor is built there.
    pub fn id_for_region(&self, region: &str) -> Option<&str> {
        self.regions
            .iter()
            .find(|r| r.name == region)
            .map(|r| r.id.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlavorRegion {
    pub name: String,
    pub id: String,
}

/// A declared capability dimension with its accepted values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilityDefinition {
    pub name: String,
    pub values: Vec<String>,
}

/// A floating IP pool offered by the profile. `name` may be a glob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FloatingPool {
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    /// Non-constraining pools are only considered when no constraining
    /// pool matches.
    #[serde(default)]
    pub non_constraining: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_generations() {
        let toml_str = r#"
[[machine_images]]
name = "flatcar"

[[machine_images.versions]]
format = "legacy"
version = "1.0"
image = "flatcar-1.0"
regions = [{ name = "eu01", id = "img-legacy", architecture = "amd64" }]

[[machine_images.versions]]
format = "capability"
version = "2.0"

[[machine_images.versions.flavors]]
capabilities = { architecture = ["arm64"] }
regions = [{ name = "eu01", id = "img-arm" }]
"#;
        let profile: CloudProfileConfig = toml::from_str(toml_str).unwrap();
        assert!(matches!(
            profile.find_version("flatcar", "1.0"),
            Some(ImageCandidate::Legacy(_))
        ));
        let Some(ImageCandidate::Capability(v)) = profile.find_version("flatcar", "2.0") else {
            panic!("expected capability entry");
        };
        assert_eq!(v.flavors[0].id_for_region("eu01"), Some("img-arm"));
        assert_eq!(v.flavors[0].id_for_region("eu02"), None);
        assert!(profile.find_version("flatcar", "3.0").is_none());
        assert!(profile.find_version("ubuntu", "1.0").is_none());
    }

    #[test]
    fn mixed_entry_is_rejected() {
        let toml_str = r#"
[[machine_images]]
name = "flatcar"

[[machine_images.versions]]
format = "legacy"
version = "1.0"
flavors = []
"#;
        assert!(toml::from_str::<CloudProfileConfig>(toml_str).is_err());
    }
}
