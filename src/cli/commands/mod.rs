pub mod location;
pub mod observation;
pub mod taxonomy;
