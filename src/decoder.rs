use log::debug;

use crate::bit_array::PackedBitArray;
use crate::block_state::BlockStateDescriptor;
use crate::error::{DecodeError, Result};
use crate::geometry::RegionGeometry;
use crate::options::DecodeOptions;
use crate::palette::{bits_per_entry, PaletteResolver, ResolveCache};
use crate::region::{DecodedRegion, RawRegion};
use crate::registry::BlockLookup;

/// Decodes raw region tags into [`DecodedRegion`]s.
///
/// Holds no state between calls apart from the optional shared
/// [`ResolveCache`], so one decoder can be used from several threads.
pub struct RegionDecoder<'a, L: BlockLookup + ?Sized> {
    resolver: PaletteResolver<'a, L>,
    options: DecodeOptions,
}

impl<'a, L: BlockLookup + ?Sized> RegionDecoder<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        RegionDecoder {
            resolver: PaletteResolver::new(lookup),
            options: DecodeOptions::default(),
        }
    }

    pub fn with_cache(mut self, cache: &'a ResolveCache) -> Self {
        self.resolver = self.resolver.with_cache(cache);
        self
    }

    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn decode(&self, raw: &RawRegion) -> Result<DecodedRegion> {
        self.decode_parts(
            &raw.name,
            raw.geometry,
            &raw.palette,
            &raw.block_states,
        )
    }

    pub fn decode_parts(
        &self,
        name: &str,
        raw_geometry: RegionGeometry,
        descriptors: &[BlockStateDescriptor],
        packed: &[i64],
    ) -> Result<DecodedRegion> {
        let geometry = raw_geometry.normalize()?;
        let volume = geometry.volume();
        if let Some(limit) = self.options.max_region_volume {
            if volume > limit {
                return Err(DecodeError::RegionTooLarge { volume, limit });
            }
        }

        let palette = self.resolver.resolve(descriptors)?;
        let bits = bits_per_entry(palette.len())?;
        let array = PackedBitArray::from_longs(
            bits,
            volume,
            packed,
            !self.options.strict_packed_length,
        )?;

        debug!(
            "Decoding region '{}': size {:?} at {:?}, {} palette entries, {} bits per entry",
            name,
            geometry.size,
            geometry.position,
            palette.len(),
            bits
        );

        let (sx, sy, sz) = geometry.size;
        let (sx, sy, sz) = (sx as usize, sy as usize, sz as usize);
        let palette_len = palette.len();
        let mut blocks = vec![0u32; volume as usize];

        // Packed order is y, z, x (x fastest); storage order is x, z, y.
        let mut cell: u64 = 0;
        for y in 0..sy {
            for z in 0..sz {
                for x in 0..sx {
                    let index = array.get(cell)?;
                    if index as usize >= palette_len {
                        return Err(DecodeError::PaletteIndexOutOfRange {
                            cell,
                            index,
                            palette_len,
                        });
                    }
                    blocks[(x * sz + z) * sy + y] = index;
                    cell += 1;
                }
            }
        }

        debug!("Decoded region '{}' ({} cells)", name, volume);
        Ok(DecodedRegion::new(
            name.to_string(),
            geometry,
            palette,
            blocks,
        ))
    }
}
