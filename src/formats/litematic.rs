use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use log::{debug, warn};
use quartz_nbt::io::Flavor;
use quartz_nbt::{NbtCompound, NbtTag};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::decoder::RegionDecoder;
use crate::error::{DecodeError, LitematicError};
use crate::options::{DecodeOptions, RegionErrorPolicy};
use crate::palette::ResolveCache;
use crate::region::{DecodedRegion, RawRegion};
use crate::registry::BlockLookup;

pub fn is_litematic(data: &[u8]) -> bool {
    let root = match read_root(data) {
        Ok(root) => root,
        Err(_) => return false,
    };

    root.get::<_, i32>("Version").is_ok()
        && root.get::<_, &NbtCompound>("Metadata").is_ok()
        && root.get::<_, &NbtCompound>("Regions").is_ok()
}

/// Stream-decompresses a gzip'd NBT document.
fn read_root(data: &[u8]) -> Result<NbtCompound, LitematicError> {
    let reader = std::io::BufReader::with_capacity(1 << 20, data);
    let mut gz = GzDecoder::new(reader);
    let (root, _) = quartz_nbt::io::read_nbt(&mut gz, Flavor::Uncompressed)?;
    Ok(root)
}

/// Descriptive header of a litematic file. Every field is optional in
/// practice, missing ones read as empty or zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LitematicMetadata {
    pub name: String,
    pub author: String,
    pub description: String,
    /// Milliseconds since the Unix epoch.
    pub time_created: i64,
    pub time_modified: i64,
    pub enclosing_size: (i32, i32, i32),
    pub region_count: i32,
    pub total_volume: i64,
    pub total_blocks: i64,
}

impl LitematicMetadata {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.time_created)
    }

    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.time_modified)
    }
}

/// A decoded litematic file. Regions are sorted by name.
#[derive(Debug, Clone)]
pub struct LitematicSchematic {
    pub version: i32,
    pub sub_version: Option<i32>,
    pub data_version: Option<i32>,
    pub metadata: LitematicMetadata,
    pub regions: Vec<DecodedRegion>,
}

impl LitematicSchematic {
    pub fn region(&self, name: &str) -> Option<&DecodedRegion> {
        self.regions.iter().find(|r| r.name() == name)
    }

    pub fn region_names(&self) -> Vec<&str> {
        self.regions.iter().map(|r| r.name()).collect()
    }

    pub fn total_volume(&self) -> u64 {
        self.regions.iter().map(|r| r.volume()).sum()
    }
}

pub fn from_litematic<L: BlockLookup + ?Sized>(
    data: &[u8],
    lookup: &L,
    options: &DecodeOptions,
) -> Result<LitematicSchematic, LitematicError> {
    let root = read_root(data)?;
    from_nbt(&root, lookup, options)
}

/// Like [`from_litematic`], with options given as an optional JSON string.
pub fn from_litematic_with_settings<L: BlockLookup + ?Sized>(
    data: &[u8],
    lookup: &L,
    settings: Option<&str>,
) -> Result<LitematicSchematic, LitematicError> {
    let options = DecodeOptions::from_settings(settings)?;
    from_litematic(data, lookup, &options)
}

pub fn from_nbt<L: BlockLookup + ?Sized>(
    root: &NbtCompound,
    lookup: &L,
    options: &DecodeOptions,
) -> Result<LitematicSchematic, LitematicError> {
    let version = root
        .get::<_, i32>("Version")
        .map_err(|_| LitematicError::NotLitematic("missing Version".to_string()))?;
    let regions_nbt = root
        .get::<_, &NbtCompound>("Regions")
        .map_err(|_| LitematicError::NotLitematic("missing Regions".to_string()))?;

    let metadata = match root.get::<_, &NbtCompound>("Metadata") {
        Ok(metadata) => parse_metadata(metadata),
        Err(_) => LitematicMetadata::default(),
    };

    let raw_regions = parse_regions(regions_nbt);
    debug!(
        "Read litematic version {} with {} regions",
        version,
        raw_regions.len()
    );

    let cache = ResolveCache::new();
    let mut decoder = RegionDecoder::new(lookup).with_options(options.clone());
    if options.cache_palette {
        decoder = decoder.with_cache(&cache);
    }

    let decode = |raw: Result<RawRegion, LitematicError>| {
        let raw = raw?;
        decoder
            .decode(&raw)
            .map_err(|source| LitematicError::Region {
                name: raw.name.clone(),
                source,
            })
    };
    let results: Vec<Result<DecodedRegion, LitematicError>> = if options.parallel {
        raw_regions.into_par_iter().map(decode).collect()
    } else {
        raw_regions.into_iter().map(decode).collect()
    };

    let mut regions = Vec::with_capacity(results.len());
    for result in results {
        match (result, options.region_errors) {
            (Ok(region), _) => regions.push(region),
            (Err(err), RegionErrorPolicy::Skip) => warn!("Skipping {}", err),
            (Err(err), RegionErrorPolicy::Fail) => return Err(err),
        }
    }

    Ok(LitematicSchematic {
        version,
        sub_version: root.get::<_, i32>("SubVersion").ok(),
        data_version: root.get::<_, i32>("MinecraftDataVersion").ok(),
        metadata,
        regions,
    })
}

fn parse_metadata(metadata: &NbtCompound) -> LitematicMetadata {
    let string = |key: &str| {
        metadata
            .get::<_, &str>(key)
            .map(String::from)
            .unwrap_or_default()
    };
    let enclosing_size = metadata
        .get::<_, &NbtCompound>("EnclosingSize")
        .map(|size| {
            (
                size.get::<_, i32>("x").unwrap_or(0),
                size.get::<_, i32>("y").unwrap_or(0),
                size.get::<_, i32>("z").unwrap_or(0),
            )
        })
        .unwrap_or((0, 0, 0));

    LitematicMetadata {
        name: string("Name"),
        author: string("Author"),
        description: string("Description"),
        time_created: metadata.get::<_, i64>("TimeCreated").unwrap_or(0),
        time_modified: metadata.get::<_, i64>("TimeModified").unwrap_or(0),
        enclosing_size,
        region_count: metadata.get::<_, i32>("RegionCount").unwrap_or(0),
        total_volume: int_or_long(metadata, "TotalVolume"),
        total_blocks: int_or_long(metadata, "TotalBlocks"),
    }
}

fn int_or_long(compound: &NbtCompound, key: &str) -> i64 {
    compound
        .get::<_, i64>(key)
        .or_else(|_| compound.get::<_, i32>(key).map(i64::from))
        .unwrap_or(0)
}

/// Reads every region compound, in name order. Regions whose tags cannot be
/// read stay in the list as errors so the region error policy applies to them.
fn parse_regions(regions_nbt: &NbtCompound) -> Vec<Result<RawRegion, LitematicError>> {
    let mut entries: Vec<(&String, &NbtTag)> = regions_nbt.inner().iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut regions = Vec::with_capacity(entries.len());
    for (name, tag) in entries {
        let raw = match tag {
            NbtTag::Compound(region_nbt) => RawRegion::from_nbt(name, region_nbt),
            other => Err(DecodeError::Malformed(format!(
                "region entry is not a compound: {:?}",
                other
            ))),
        };
        regions.push(raw.map_err(|source| LitematicError::Region {
            name: name.clone(),
            source,
        }));
    }
    regions
}
