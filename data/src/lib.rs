//! Game data and builds: the entity catalog, the build model, build tokens
//! and the compare list.

mod build;
pub use build::*;
mod catalog;
pub use catalog::*;
pub mod codec;
pub use codec::{CodecError, Decoded, StaleReference};
mod compare;
pub use compare::*;
mod structs;
pub use structs::*;

mod schema;
