// Entity Models
// Following Rich Hickey's philosophy: "Identity persists, values change"
//
// - institution: the canonical record, keyed by ISPB
// - metadata: freshness of the persisted snapshot
// - registry: read-only lookups over one snapshot

pub mod institution;
pub mod metadata;
pub mod registry;

pub use institution::{CanonicalRecord, DataSource, Field, GENERIC_INSTITUTION_TYPE};
pub use metadata::{FreshnessMetadata, LastUpdate, FORMAT_VERSION};
pub use registry::{InstitutionRegistry, RegistryStats, Snapshot};
