pub mod codec;

pub use codec::Codec;
