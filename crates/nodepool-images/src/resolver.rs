//! Image resolver: profile first, persisted status second.
//!
//! The status fallback keeps pools running when an image version is
//! dropped from the profile while nodes still use it. Losing the image
//! there would force an ungraceful replacement of those nodes.

use tracing::debug;

use nodepool_core::{
    CapabilityImageVersion, CloudProfileConfig, DEFAULT_ARCHITECTURE, ImageCandidate,
    ImageRequest, LegacyImageVersion,
};
use nodepool_state::{ImageRef, MachineImage};

use crate::capabilities::{describe_request, is_compatible, request_capabilities};
use crate::error::{ImageError, ImageResult};

/// Resolve `request` for `region`.
///
/// Looks in `profile` first and falls back to `prior` (the machine
/// images recorded in the last persisted status). Pure: the same inputs
/// always give the same answer.
pub fn resolve_image(
    request: &ImageRequest,
    region: &str,
    profile: &CloudProfileConfig,
    prior: &[MachineImage],
) -> ImageResult<MachineImage> {
    if let Some(image) = find_in_profile(request, region, profile) {
        return Ok(image);
    }

    if let Some(image) = find_in_status(request, profile, prior) {
        debug!(
            image = %request.name,
            version = %request.version,
            region,
            "machine image taken from worker status"
        );
        return Ok(image);
    }

    Err(ImageError::NotFound {
        name: request.name.clone(),
        version: request.version.clone(),
        region: region.to_string(),
        requested: describe_request(request),
    })
}

/// Look the request up in the profile's image catalogue.
pub fn find_in_profile(
    request: &ImageRequest,
    region: &str,
    profile: &CloudProfileConfig,
) -> Option<MachineImage> {
    match profile.find_version(&request.name, &request.version)? {
        ImageCandidate::Legacy(entry) => from_legacy(request, region, entry),
        ImageCandidate::Capability(entry) => from_capability(request, region, entry, profile),
    }
}

/// Look the request up in previously resolved images.
pub fn find_in_status(
    request: &ImageRequest,
    profile: &CloudProfileConfig,
    prior: &[MachineImage],
) -> Option<MachineImage> {
    let arch = request.architecture_or_default();
    let requested = request_capabilities(request, &profile.capabilities);

    prior
        .iter()
        .filter(|m| m.name == request.name && m.version == request.version)
        .find(|m| match &m.capabilities {
            Some(offered) => is_compatible(&requested, offered, &profile.capabilities),
            None => m.architecture_or_default() == arch,
        })
        .cloned()
}

fn from_legacy(
    request: &ImageRequest,
    region: &str,
    entry: &LegacyImageVersion,
) -> Option<MachineImage> {
    let arch = request.architecture_or_default();

    let by_region = entry.regions.iter().find(|r| {
        r.name == region && r.architecture.as_deref().unwrap_or(DEFAULT_ARCHITECTURE) == arch
    });
    if let Some(mapping) = by_region {
        return Some(MachineImage {
            name: request.name.clone(),
            version: request.version.clone(),
            reference: ImageRef::Id(mapping.id.clone()),
            architecture: Some(arch.to_string()),
            capabilities: None,
        });
    }

    // The global name predates multi-arch images, so it only serves the
    // baseline architecture.
    let global = entry.image.as_deref().filter(|_| arch == DEFAULT_ARCHITECTURE)?;
    Some(MachineImage {
        name: request.name.clone(),
        version: request.version.clone(),
        reference: ImageRef::Image(global.to_string()),
        architecture: Some(arch.to_string()),
        capabilities: None,
    })
}

fn from_capability(
    request: &ImageRequest,
    region: &str,
    entry: &CapabilityImageVersion,
    profile: &CloudProfileConfig,
) -> Option<MachineImage> {
    let requested = request_capabilities(request, &profile.capabilities);

    entry.flavors.iter().find_map(|flavor| {
        let id = flavor.id_for_region(region)?;
        if !is_compatible(&requested, &flavor.capabilities, &profile.capabilities) {
            return None;
        }
        Some(MachineImage {
            name: request.name.clone(),
            version: request.version.clone(),
            reference: ImageRef::Id(id.to_string()),
            architecture: None,
            capabilities: Some(flavor.capabilities.clone()),
        })
    })
}
