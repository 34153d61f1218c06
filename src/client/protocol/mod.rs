pub mod codec;
pub mod errors;
pub mod frame;

pub use codec::*;
pub use errors::*;
pub use frame::*;
