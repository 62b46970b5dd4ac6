// HTTP handlers, one module per resource. Each handler is a thin adapter:
// extract, call the owning service, wrap the result in the success envelope.
pub mod locations;
pub mod observations;
pub mod system;
pub mod taxonomy;
