//! Provider parameter map for one deployment class.

use serde_json::{Map, Value, json};

use nodepool_core::WorkerPool;
use nodepool_state::{ImageRef, MachineImage};

/// Build the machine-class parameters for `pool` in `zone`.
///
/// Tags carry the cluster and role markers the provider uses to find the
/// owner's machines, the pool name, then every node label.
pub fn machine_class_params(
    owner_id: &str,
    region: &str,
    zone: &str,
    pool: &WorkerPool,
    image: &MachineImage,
    affinity_group_id: Option<&str>,
) -> Value {
    let mut tags = Map::new();
    tags.insert(format!("kubernetes.io-cluster-{owner_id}"), json!("1"));
    tags.insert("kubernetes.io-role-node".to_string(), json!("1"));
    tags.insert("nodepool.io/pool".to_string(), json!(pool.name));
    for (key, value) in pool.label_map() {
        tags.insert(key, json!(value));
    }

    let mut params = json!({
        "region": region,
        "availabilityZone": zone,
        "machineType": pool.machine_type,
        "tags": tags,
    });

    match &image.reference {
        ImageRef::Id(id) => params["imageId"] = json!(id),
        ImageRef::Image(name) => params["imageName"] = json!(name),
    }
    if let Some(id) = affinity_group_id {
        params["serverGroupId"] = json!(id);
    }
    if let Some(volume) = &pool.volume {
        params["rootDiskSize"] = json!(volume.size);
        if let Some(kind) = &volume.kind {
            params["rootDiskType"] = json!(kind);
        }
    }
    if let Some(secret) = &pool.user_data_secret {
        params["secretRef"] = json!({ "name": secret });
    }

    params
}
