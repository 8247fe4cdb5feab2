pub mod convert;
pub mod fetch;
pub mod info;
pub mod transform;
