pub mod error;
pub mod field;
pub mod header;
pub mod sample_format;
pub mod value;

pub use error::*;
pub use field::*;
pub use header::*;
pub use sample_format::*;
pub use value::*;
