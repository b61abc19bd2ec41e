pub mod index;
pub mod walk;
