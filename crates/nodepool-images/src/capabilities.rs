//! Capability sets: defaults and compatibility.
//!
//! A dimension omitted from a capability set takes the values declared
//! for it in the profile. The `architecture` dimension is special: when a
//! request omits it, it defaults to the platform baseline so that pools
//! created before capabilities existed keep resolving to the same image.

use nodepool_core::{
    ARCHITECTURE_CAPABILITY, Capabilities, CapabilityDefinition, DEFAULT_ARCHITECTURE,
    ImageRequest,
};

/// `capabilities` with every declared-but-missing dimension filled in.
pub fn with_defaults(
    capabilities: &Capabilities,
    definitions: &[CapabilityDefinition],
) -> Capabilities {
    let mut out = capabilities.clone();
    for def in definitions {
        out.entry(def.name.clone())
            .or_insert_with(|| def.values.clone());
    }
    out
}

/// The capability set a request asks for, defaults applied.
///
/// An explicit `architecture` field wins over an `architecture`
/// capability; a request with neither asks for the baseline architecture.
pub fn request_capabilities(
    request: &ImageRequest,
    definitions: &[CapabilityDefinition],
) -> Capabilities {
    let mut caps = request.capabilities.clone().unwrap_or_default();
    if let Some(arch) = request.architecture.as_deref() {
        caps.insert(ARCHITECTURE_CAPABILITY.to_string(), vec![arch.to_string()]);
    }
    caps.entry(ARCHITECTURE_CAPABILITY.to_string())
        .or_insert_with(|| vec![DEFAULT_ARCHITECTURE.to_string()]);
    with_defaults(&caps, definitions)
}

/// Whether an image offering `offered` can serve a request for `requested`.
///
/// Every requested dimension must share at least one value with the
/// offered values. A dimension the image does not mention (and the
/// profile does not declare) does not constrain it, except for
/// `architecture`, which falls back to the baseline.
pub fn is_compatible(
    requested: &Capabilities,
    offered: &Capabilities,
    definitions: &[CapabilityDefinition],
) -> bool {
    let mut offered = with_defaults(offered, definitions);
    offered
        .entry(ARCHITECTURE_CAPABILITY.to_string())
        .or_insert_with(|| vec![DEFAULT_ARCHITECTURE.to_string()]);

    requested.iter().all(|(dimension, wanted)| match offered.get(dimension) {
        Some(values) => wanted.iter().any(|w| values.contains(w)),
        None => true,
    })
}

/// Human-readable form of a request, used in error messages.
pub fn describe_request(request: &ImageRequest) -> String {
    match &request.capabilities {
        Some(caps) if !caps.is_empty() => {
            let dims: Vec<String> = caps
                .iter()
                .map(|(k, v)| format!("{k}={}", v.join("|")))
                .collect();
            format!("capabilities [{}]", dims.join(", "))
        }
        _ => format!("architecture {}", request.architecture_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(pairs: &[(&str, &[&str])]) -> Capabilities {
        pairs
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    fn definitions() -> Vec<CapabilityDefinition> {
        vec![
            CapabilityDefinition {
                name: "architecture".to_string(),
                values: vec!["amd64".to_string(), "arm64".to_string()],
            },
            CapabilityDefinition {
                name: "hypervisor".to_string(),
                values: vec!["kvm".to_string(), "esxi".to_string()],
            },
        ]
    }

    fn request(arch: Option<&str>, capabilities: Option<Capabilities>) -> ImageRequest {
        ImageRequest {
            name: "flatcar".to_string(),
            version: "2.0".to_string(),
            architecture: arch.map(String::from),
            capabilities,
        }
    }

    #[test]
    fn defaults_fill_missing_dimensions() {
        let filled = with_defaults(&caps(&[("architecture", &["arm64"])]), &definitions());
        assert_eq!(filled["architecture"], vec!["arm64"]);
        assert_eq!(filled["hypervisor"], vec!["kvm", "esxi"]);
    }

    #[test]
    fn request_without_architecture_asks_for_baseline() {
        let requested = request_capabilities(&request(None, None), &definitions());
        assert_eq!(requested["architecture"], vec!["amd64"]);
        assert_eq!(requested["hypervisor"], vec!["kvm", "esxi"]);
    }

    #[test]
    fn explicit_architecture_wins() {
        let requested = request_capabilities(
            &request(Some("arm64"), Some(caps(&[("architecture", &["amd64"])]))),
            &[],
        );
        assert_eq!(requested["architecture"], vec!["arm64"]);
    }

    #[test]
    fn compatibility_needs_intersection_in_every_dimension() {
        let defs = definitions();
        let requested = caps(&[("architecture", &["arm64"]), ("hypervisor", &["kvm"])]);

        assert!(is_compatible(
            &requested,
            &caps(&[("architecture", &["arm64"]), ("hypervisor", &["kvm", "esxi"])]),
            &defs
        ));
        assert!(!is_compatible(
            &requested,
            &caps(&[("architecture", &["amd64"])]),
            &defs
        ));
        assert!(!is_compatible(
            &requested,
            &caps(&[("architecture", &["arm64"]), ("hypervisor", &["esxi"])]),
            &defs
        ));
    }

    #[test]
    fn omitted_offer_dimension_uses_declared_values() {
        let requested = caps(&[("architecture", &["arm64"]), ("hypervisor", &["esxi"])]);
        assert!(is_compatible(
            &requested,
            &caps(&[("architecture", &["arm64"])]),
            &definitions()
        ));
    }

    #[test]
    fn offer_without_architecture_is_baseline() {
        let requested = caps(&[("architecture", &["arm64"])]);
        assert!(!is_compatible(&requested, &Capabilities::new(), &[]));
        assert!(is_compatible(
            &caps(&[("architecture", &["amd64"])]),
            &Capabilities::new(),
            &[]
        ));
    }

    #[test]
    fn describes_requests() {
        assert_eq!(describe_request(&request(None, None)), "architecture amd64");
        let described = describe_request(&request(None, Some(caps(&[("architecture", &["arm64"])]))));
        assert_eq!(described, "capabilities [architecture=arm64]");
    }
}
