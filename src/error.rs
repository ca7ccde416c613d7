use smol_str::SmolStr;

/// Broad category of a [`DecodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The packed data, palette size or geometry cannot describe a valid region.
    FormatViolation,
    /// A palette entry names a block the lookup does not know.
    UnresolvedIdentifier,
    /// A known property carries a value that does not parse.
    InvalidPropertyValue,
    /// The NBT document does not have the expected shape.
    MalformedInput,
}

/// Error raised while decoding a single region. Any of these aborts that
/// region only; nothing partially decoded is returned.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("bits per entry must be within 1..=32, got {0}")]
    InvalidBitWidth(u32),
    #[error("palette has {palette_len} entries which needs {bits} bits per entry, at most 32 are supported")]
    PaletteTooLarge { palette_len: usize, bits: u32 },
    #[error("palette is empty")]
    EmptyPalette,
    #[error("region with size {size:?} has no volume")]
    EmptyRegion { size: (i32, i32, i32) },
    #[error("region of {volume} cells exceeds the limit of {limit}")]
    RegionTooLarge { volume: u64, limit: u64 },
    #[error("region at {position:?} with size {size:?} leaves the 32-bit coordinate range")]
    CoordinateOverflow {
        position: (i32, i32, i32),
        size: (i32, i32, i32),
    },
    #[error("packed array holds {actual} words, expected {expected} for {len} entries of {bits} bits")]
    PackedLengthMismatch {
        expected: usize,
        actual: usize,
        len: u64,
        bits: u32,
    },
    #[error("entry {index} is outside the packed array of {len} entries")]
    IndexOutOfRange { index: u64, len: u64 },
    #[error("value {value} does not fit in {bits} bits")]
    ValueOutOfRange { value: u32, bits: u32 },
    #[error("cell {cell} references palette index {index}, but the palette has {palette_len} entries")]
    PaletteIndexOutOfRange {
        cell: u64,
        index: u32,
        palette_len: usize,
    },
    #[error("palette entry {palette_index} references unknown block '{name}'")]
    UnresolvedIdentifier { palette_index: usize, name: SmolStr },
    #[error("palette entry {palette_index}: '{value}' is not a valid value for property '{property}' of '{block}'")]
    InvalidPropertyValue {
        palette_index: usize,
        block: SmolStr,
        property: SmolStr,
        value: SmolStr,
    },
    #[error("NBT error: {0}")]
    Nbt(#[from] quartz_nbt::NbtReprError),
    #[error("malformed region data: {0}")]
    Malformed(String),
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::UnresolvedIdentifier { .. } => ErrorKind::UnresolvedIdentifier,
            DecodeError::InvalidPropertyValue { .. } => ErrorKind::InvalidPropertyValue,
            DecodeError::Nbt(_) | DecodeError::Malformed(_) => ErrorKind::MalformedInput,
            _ => ErrorKind::FormatViolation,
        }
    }

    pub fn is_format_violation(&self) -> bool {
        self.kind() == ErrorKind::FormatViolation
    }
}

/// Error type for reading whole litematic files.
#[derive(Debug, thiserror::Error)]
pub enum LitematicError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("NBT IO error: {0}")]
    NbtIo(#[from] quartz_nbt::io::NbtIoError),
    #[error("NBT error: {0}")]
    Nbt(#[from] quartz_nbt::NbtReprError),
    #[error("invalid decode settings: {0}")]
    Settings(#[from] serde_json::Error),
    #[error("not a litematic file: {0}")]
    NotLitematic(String),
    #[error("region '{name}': {source}")]
    Region {
        name: String,
        #[source]
        source: DecodeError,
    },
}

pub type Result<T> = std::result::Result<T, DecodeError>;
