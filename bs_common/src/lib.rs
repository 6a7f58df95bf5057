mod cents;

pub mod helpers;
mod secret;

pub use cents::Cents;
pub use secret::Secret;
