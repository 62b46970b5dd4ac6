pub mod error;
pub mod location_registry;
pub mod observation_recorder;
pub mod taxonomy_catalog;

pub use error::ServiceError;
pub use location_registry::LocationRegistry;
pub use observation_recorder::ObservationRecorder;
pub use taxonomy_catalog::TaxonomyCatalog;
