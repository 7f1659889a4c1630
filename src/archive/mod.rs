pub mod index;
pub mod media;
pub mod paths;
pub mod store;
pub mod sync;
pub mod tree;
