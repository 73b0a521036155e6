pub mod container;
pub mod entities;
pub mod errors;
pub mod fields;
pub mod merkle;
pub mod ssz;

pub use container::*;
pub use entities::*;
pub use errors::*;
pub use fields::*;
pub use merkle::*;
