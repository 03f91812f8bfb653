//! Label keys attached to engine-side containers and volumes.
//!
//! These labels are the only durable link between the store and physical
//! resources: Delete and the volume diff rediscover resources by label,
//! never by name.

/// Gateway core instance that owns the resource.
pub const CORE_ID: &str = "io.berth.core-id";

/// Manager component that created the resource.
pub const MANAGER_ID: &str = "io.berth.manager-id";

/// Parent module deployment the resource belongs to.
pub const DEPLOYMENT_ID: &str = "io.berth.deployment-id";

/// Auxiliary deployment the resource belongs to.
pub const AUX_ID: &str = "io.berth.aux-id";

/// Volume ref a volume was created for.
pub const VOLUME_REF: &str = "io.berth.volume-ref";

/// Service ref a container was created for.
pub const SERVICE_REF: &str = "io.berth.service-ref";
