//! Content hashes behind deployment class names.
//!
//! A class name changes exactly when a running machine would have to be
//! replaced: new image, new affinity group, a rolling label change, or a
//! change to the pool's structural fields. Counts, cosmetic labels,
//! annotations and taints are applied in place and stay out of the hash.

use sha2::{Digest, Sha256};

use nodepool_core::WorkerPool;
use nodepool_core::hash::short_hash;
use nodepool_state::{ImageRef, MachineImage};

/// Hash over the structural fields of a pool.
pub trait PoolHasher {
    fn pool_hash(&self, pool: &WorkerPool) -> String;
}

/// Machine type, image coordinates, root volume and user-data secret.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalPoolHash;

impl PoolHasher for CanonicalPoolHash {
    fn pool_hash(&self, pool: &WorkerPool) -> String {
        let mut hasher = Sha256::new();
        let mut field = |name: &str, value: &str| {
            hasher.update(name.as_bytes());
            hasher.update([0]);
            hasher.update((value.len() as u64).to_be_bytes());
            hasher.update(value.as_bytes());
        };

        field("machine_type", &pool.machine_type);
        field("image_name", &pool.machine_image.name);
        field("image_version", &pool.machine_image.version);
        if let Some(volume) = &pool.volume {
            field("volume_size", &volume.size.to_string());
            if let Some(kind) = &volume.kind {
                field("volume_type", kind);
            }
        }
        if let Some(secret) = &pool.user_data_secret {
            field("user_data_secret", secret);
        }

        hex::encode(hasher.finalize())
    }
}

/// Short hash appended to a descriptor's logical name.
pub fn class_hash(
    hasher: &dyn PoolHasher,
    pool: &WorkerPool,
    image: &MachineImage,
    affinity_group_id: Option<&str>,
) -> String {
    let reference = match &image.reference {
        ImageRef::Id(id) => format!("id:{id}"),
        ImageRef::Image(name) => format!("image:{name}"),
    };
    let mut parts = vec![
        hasher.pool_hash(pool),
        reference,
        affinity_group_id.unwrap_or_default().to_string(),
    ];
    for label in pool.rolling_labels() {
        parts.push(format!("{}={}", label.key, label.value));
    }
    short_hash(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodepool_core::{ImageRequest, IntOrPercent, NodeLabel, Volume};

    fn pool() -> WorkerPool {
        WorkerPool {
            name: "workers".to_string(),
            machine_type: "c1.2".to_string(),
            machine_image: ImageRequest {
                name: "flatcar".to_string(),
                version: "2.0".to_string(),
                architecture: None,
                capabilities: None,
            },
            zones: vec!["eu01-1".to_string(), "eu01-2".to_string()],
            minimum: 1,
            maximum: 3,
            max_surge: IntOrPercent::one(),
            max_unavailable: IntOrPercent::zero(),
            affinity_policy: None,
            labels: vec![
                NodeLabel {
                    key: "team".to_string(),
                    value: "infra".to_string(),
                    rolling: false,
                },
                NodeLabel {
                    key: "kernel".to_string(),
                    value: "6.1".to_string(),
                    rolling: true,
                },
            ],
            annotations: Default::default(),
            taints: Vec::new(),
            volume: Some(Volume {
                size: 50,
                kind: Some("storage_premium_perf1".to_string()),
            }),
            user_data_secret: Some("workers-userdata".to_string()),
        }
    }

    fn image(id: &str) -> MachineImage {
        MachineImage {
            name: "flatcar".to_string(),
            version: "2.0".to_string(),
            reference: ImageRef::Id(id.to_string()),
            architecture: Some("amd64".to_string()),
            capabilities: None,
        }
    }

    fn hash(pool: &WorkerPool, image_id: &str, group: Option<&str>) -> String {
        class_hash(&CanonicalPoolHash, pool, &image(image_id), group)
    }

    #[test]
    fn stable_under_cosmetic_changes() {
        let base = pool();
        let h = hash(&base, "img-1", None);
        assert_eq!(h.len(), 5);

        let mut changed = base.clone();
        changed.labels[0].value = "platform".to_string();
        changed.annotations.insert("note".to_string(), "x".to_string());
        changed.minimum = 5;
        changed.maximum = 9;
        changed.zones.push("eu01-3".to_string());
        assert_eq!(hash(&changed, "img-1", None), h);
    }

    #[test]
    fn rolling_label_order_does_not_matter() {
        let mut a = pool();
        a.labels.push(NodeLabel {
            key: "abi".to_string(),
            value: "2".to_string(),
            rolling: true,
        });
        let mut b = a.clone();
        b.labels.reverse();
        assert_eq!(hash(&a, "img-1", None), hash(&b, "img-1", None));
    }

    #[test]
    fn relevant_inputs_change_the_hash() {
        let base = pool();
        let h = hash(&base, "img-1", None);

        assert_ne!(hash(&base, "img-2", None), h);
        assert_ne!(hash(&base, "img-1", Some("sg-1")), h);

        let mut rolling = base.clone();
        rolling.labels[1].value = "6.6".to_string();
        assert_ne!(hash(&rolling, "img-1", None), h);

        let mut machine = base.clone();
        machine.machine_type = "c1.4".to_string();
        assert_ne!(hash(&machine, "img-1", None), h);

        let mut volume = base.clone();
        volume.volume = None;
        assert_ne!(hash(&volume, "img-1", None), h);
    }

    #[test]
    fn image_id_and_global_name_do_not_collide() {
        let base = pool();
        let by_id = image("flatcar-2.0");
        let by_name = MachineImage {
            reference: ImageRef::Image("flatcar-2.0".to_string()),
            ..by_id.clone()
        };
        assert_ne!(
            class_hash(&CanonicalPoolHash, &base, &by_id, None),
            class_hash(&CanonicalPoolHash, &base, &by_name, None)
        );
    }

    #[test]
    fn canonical_hash_ignores_pool_name() {
        let a = pool();
        let mut b = pool();
        b.name = "other".to_string();
        assert_eq!(CanonicalPoolHash.pool_hash(&a), CanonicalPoolHash.pool_hash(&b));
    }
}
