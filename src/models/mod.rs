pub mod actor;
pub mod category;
pub mod provider;
pub mod request;
pub mod tracking;
