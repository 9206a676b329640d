//! Safe SQL building: quoted identifiers in text, values as parameters.

mod builder;
pub mod dialect;
pub mod ident;
pub mod params;
pub use builder::*;
pub use dialect::*;
pub use ident::*;
pub use params::*;
