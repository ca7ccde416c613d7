use quartz_nbt::{NbtCompound, NbtList, NbtTag};
use std::collections::HashMap;

use crate::block_state::{BlockState, BlockStateDescriptor};
use crate::error::{DecodeError, Result};
use crate::geometry::{NormalizedGeometry, RegionGeometry};
use crate::palette::Palette;

/// One region tag as stored in a litematic file, before any decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRegion {
    pub name: String,
    pub geometry: RegionGeometry,
    pub palette: Vec<BlockStateDescriptor>,
    pub block_states: Vec<i64>,
}

impl RawRegion {
    pub fn new(
        name: impl Into<String>,
        size: (i32, i32, i32),
        position: (i32, i32, i32),
        palette: Vec<BlockStateDescriptor>,
        block_states: Vec<i64>,
    ) -> Self {
        RawRegion {
            name: name.into(),
            geometry: RegionGeometry::new(size, position),
            palette,
            block_states,
        }
    }

    /// Reads `Position`, `Size`, `BlockStatePalette` and `BlockStates` from a
    /// region compound.
    pub fn from_nbt(name: &str, region_nbt: &NbtCompound) -> Result<Self> {
        let position = read_vec3(region_nbt, "Position")?;
        let size = read_vec3(region_nbt, "Size")?;

        let palette = region_nbt
            .get::<_, &NbtList>("BlockStatePalette")?
            .iter()
            .enumerate()
            .map(|(i, tag)| match tag {
                NbtTag::Compound(compound) => BlockStateDescriptor::from_nbt(compound),
                other => Err(DecodeError::Malformed(format!(
                    "palette entry {} is not a compound: {:?}",
                    i, other
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        let block_states = region_nbt.get::<_, &[i64]>("BlockStates")?.to_vec();

        Ok(RawRegion::new(name, size, position, palette, block_states))
    }

    pub fn to_nbt(&self) -> NbtCompound {
        let mut region_nbt = NbtCompound::new();
        region_nbt.insert(
            "Position",
            NbtTag::Compound(vec3_nbt(self.geometry.position)),
        );
        region_nbt.insert("Size", NbtTag::Compound(vec3_nbt(self.geometry.size)));
        region_nbt.insert(
            "BlockStatePalette",
            NbtTag::List(NbtList::from(
                self.palette
                    .iter()
                    .map(|d| d.to_nbt())
                    .collect::<Vec<NbtTag>>(),
            )),
        );
        region_nbt.insert("BlockStates", NbtTag::LongArray(self.block_states.clone()));
        region_nbt
    }
}

fn read_vec3(compound: &NbtCompound, key: &str) -> Result<(i32, i32, i32)> {
    let vec = compound.get::<_, &NbtCompound>(key)?;
    Ok((
        vec.get::<_, i32>("x")?,
        vec.get::<_, i32>("y")?,
        vec.get::<_, i32>("z")?,
    ))
}

fn vec3_nbt(v: (i32, i32, i32)) -> NbtCompound {
    let mut compound = NbtCompound::new();
    compound.insert("x", NbtTag::Int(v.0));
    compound.insert("y", NbtTag::Int(v.1));
    compound.insert("z", NbtTag::Int(v.2));
    compound
}

/// A fully decoded region: a dense grid of palette indices over the
/// normalized extent. Cells are stored x-major, then z, then y.
///
/// Local coordinates run from `0` to `size - 1` on each axis; world
/// coordinates are local coordinates plus [`DecodedRegion::position`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRegion {
    name: String,
    geometry: NormalizedGeometry,
    palette: Palette,
    blocks: Vec<u32>,
}

impl DecodedRegion {
    /// `blocks` must hold one in-range palette index per cell in storage order.
    pub(crate) fn new(
        name: String,
        geometry: NormalizedGeometry,
        palette: Palette,
        blocks: Vec<u32>,
    ) -> Self {
        debug_assert_eq!(blocks.len() as u64, geometry.volume());
        DecodedRegion {
            name,
            geometry,
            palette,
            blocks,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> (i32, i32, i32) {
        self.geometry.size
    }

    pub fn position(&self) -> (i32, i32, i32) {
        self.geometry.position
    }

    pub fn geometry(&self) -> NormalizedGeometry {
        self.geometry
    }

    pub fn volume(&self) -> u64 {
        self.geometry.volume()
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Inclusive world-space corners.
    pub fn bounding_box(&self) -> ((i32, i32, i32), (i32, i32, i32)) {
        (self.geometry.position, self.geometry.max_corner())
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        let (sx, sy, sz) = self.geometry.size;
        (0..sx).contains(&x) && (0..sy).contains(&y) && (0..sz).contains(&z)
    }

    #[inline]
    fn cell_index(&self, x: i32, y: i32, z: i32) -> usize {
        let (_, sy, sz) = self.geometry.size;
        (x as usize * sz as usize + z as usize) * sy as usize + y as usize
    }

    /// Palette index at local coordinates, `None` outside the region.
    pub fn palette_index(&self, x: i32, y: i32, z: i32) -> Option<u32> {
        if !self.contains(x, y, z) {
            return None;
        }
        Some(self.blocks[self.cell_index(x, y, z)])
    }

    /// Block at local coordinates, `None` outside the region.
    pub fn get(&self, x: i32, y: i32, z: i32) -> Option<&BlockState> {
        self.palette_index(x, y, z)
            .and_then(|i| self.palette.get(i as usize))
    }

    /// Block at world coordinates, `None` outside the region.
    pub fn get_world(&self, x: i32, y: i32, z: i32) -> Option<&BlockState> {
        let (px, py, pz) = self.geometry.position;
        self.get(
            x.checked_sub(px)?,
            y.checked_sub(py)?,
            z.checked_sub(pz)?,
        )
    }

    /// All cells with their local coordinates, in storage order.
    pub fn iter(&self) -> impl Iterator<Item = ((i32, i32, i32), &BlockState)> + '_ {
        let (sx, sy, sz) = self.geometry.size;
        (0..sx).flat_map(move |x| {
            (0..sz).flat_map(move |z| {
                (0..sy).filter_map(move |y| self.get(x, y, z).map(|b| ((x, y, z), b)))
            })
        })
    }

    pub fn count_non_air(&self) -> usize {
        let air: Vec<bool> = self.palette.iter().map(|b| b.is_air()).collect();
        self.blocks.iter().filter(|&&i| !air[i as usize]).count()
    }

    pub fn block_counts(&self) -> HashMap<&BlockState, usize> {
        let mut per_index = vec![0usize; self.palette.len()];
        for &i in &self.blocks {
            per_index[i as usize] += 1;
        }
        self.palette
            .iter()
            .zip(per_index)
            .filter(|(_, count)| *count > 0)
            .fold(HashMap::new(), |mut counts, (state, count)| {
                *counts.entry(state).or_insert(0) += count;
                counts
            })
    }
}
