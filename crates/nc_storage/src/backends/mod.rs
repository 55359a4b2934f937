pub mod memory;

#[cfg(feature = "chroma")]
pub mod chroma;

pub use memory::MemoryStorage;

#[cfg(feature = "chroma")]
pub use chroma::ChromaStorage;
