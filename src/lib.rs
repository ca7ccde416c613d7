//! Decoding of Litematica schematic regions.
//!
//! A region is stored as a palette of block states plus a bit-packed array
//! of palette indices. [`RegionDecoder`] turns one region into a
//! [`DecodedRegion`] that answers point queries; [`formats::litematic`]
//! reads whole `.litematic` files on top of it.

pub mod bit_array;
pub mod block_state;
pub mod decoder;
pub mod error;
pub mod formats;
pub mod geometry;
pub mod options;
pub mod palette;
pub mod region;
pub mod registry;

pub use bit_array::PackedBitArray;
pub use block_state::{BlockState, BlockStateDescriptor, PropertyValue};
pub use decoder::RegionDecoder;
pub use error::{DecodeError, ErrorKind, LitematicError};
pub use formats::litematic::{
    from_litematic, from_litematic_with_settings, is_litematic, LitematicMetadata,
    LitematicSchematic,
};
pub use geometry::{NormalizedGeometry, RegionGeometry};
pub use options::{DecodeOptions, RegionErrorPolicy};
pub use palette::{bits_per_entry, Palette, PaletteResolver, ResolveCache};
pub use region::{DecodedRegion, RawRegion};
pub use registry::{
    BlockDefinition, BlockLookup, BlockRegistry, PropertyDefinition, PropertyKind, RegistryError,
};
