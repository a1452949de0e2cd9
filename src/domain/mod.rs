pub mod access;
pub mod directory;
pub mod errors;
pub mod order;
pub mod ports;
pub mod pricing;
pub mod status;
pub mod timeline;
