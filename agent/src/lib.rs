pub mod alerts;
pub mod device;
pub mod errors;
pub mod input;
pub mod model;
pub mod reconcile;
pub mod scheduler;
pub mod sensors;
pub mod store;
pub mod sync;
pub mod telemetry;
pub mod transport;
