pub mod applications;
pub mod registration;
