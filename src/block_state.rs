use quartz_nbt::{NbtCompound, NbtTag};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

use crate::error::DecodeError;

pub const AIR: &str = "minecraft:air";

/// A palette entry as written on disk: a block identifier plus untyped
/// property strings. Properties are kept sorted by name so equal
/// descriptors hash equally regardless of the order they were read in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockStateDescriptor {
    name: SmolStr,
    properties: Vec<(SmolStr, SmolStr)>,
}

impl BlockStateDescriptor {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        BlockStateDescriptor {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<SmolStr>, value: impl Into<SmolStr>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.properties.binary_search_by(|(k, _)| k.cmp(&key)) {
            Ok(i) => self.properties[i].1 = value,
            Err(i) => self.properties.insert(i, (key, value)),
        }
        self
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn properties(&self) -> &[(SmolStr, SmolStr)] {
        &self.properties
    }

    pub fn get_property(&self, key: &str) -> Option<&SmolStr> {
        self.properties
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
    }

    /// Reads a `BlockStatePalette` entry: a `Name` string and an optional
    /// `Properties` compound of strings.
    pub fn from_nbt(compound: &NbtCompound) -> Result<Self, DecodeError> {
        let name = compound.get::<_, &str>("Name")?;
        let mut descriptor = BlockStateDescriptor::new(name);

        let props = match compound.inner().get("Properties") {
            None => return Ok(descriptor),
            Some(NbtTag::Compound(props)) => props,
            Some(other) => {
                return Err(DecodeError::Malformed(format!(
                    "Properties of '{}' is not a compound: {:?}",
                    name, other
                )))
            }
        };
        for (key, value) in props.inner() {
            match value {
                NbtTag::String(value) => {
                    descriptor = descriptor.with_property(key.as_str(), value.as_str())
                }
                other => {
                    return Err(DecodeError::Malformed(format!(
                        "property '{}' of '{}' is not a string: {:?}",
                        key, name, other
                    )))
                }
            }
        }

        Ok(descriptor)
    }

    pub fn to_nbt(&self) -> NbtTag {
        let mut compound = NbtCompound::new();
        compound.insert("Name", self.name.to_string());

        if !self.properties.is_empty() {
            let mut properties = NbtCompound::new();
            for (key, value) in &self.properties {
                properties.insert(key.to_string(), value.to_string());
            }
            compound.insert("Properties", properties);
        }

        NbtTag::Compound(compound)
    }
}

impl fmt::Display for BlockStateDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_state(f, &self.name, self.properties.iter())
    }
}

/// Typed value of a block property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i32),
    Enum(SmolStr),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Int(i) => write!(f, "{}", i),
            PropertyValue::Enum(s) => write!(f, "{}", s),
        }
    }
}

/// A fully resolved block state: the identifier together with a value for
/// every property its block defines, in definition order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockState {
    name: SmolStr,
    properties: Vec<(SmolStr, PropertyValue)>,
}

impl BlockState {
    pub fn new(name: impl Into<SmolStr>, properties: Vec<(SmolStr, PropertyValue)>) -> Self {
        BlockState {
            name: name.into(),
            properties,
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn properties(&self) -> &[(SmolStr, PropertyValue)] {
        &self.properties
    }

    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
    }

    pub fn is_air(&self) -> bool {
        self.name == AIR
    }

    /// Replaces the value of an existing property. Returns `false` and leaves
    /// the state untouched if the state has no such property.
    pub(crate) fn override_property(&mut self, key: &str, value: PropertyValue) -> bool {
        for (k, v) in &mut self.properties {
            if k.as_str() == key {
                *v = value;
                return true;
            }
        }
        false
    }

    pub fn to_descriptor(&self) -> BlockStateDescriptor {
        self.properties
            .iter()
            .fold(BlockStateDescriptor::new(self.name.clone()), |d, (k, v)| {
                d.with_property(k.clone(), v.to_string())
            })
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_state(f, &self.name, self.properties.iter())
    }
}

fn write_state<'a, V: fmt::Display + 'a>(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    properties: impl ExactSizeIterator<Item = &'a (SmolStr, V)>,
) -> fmt::Result {
    write!(f, "{}", name)?;
    if properties.len() > 0 {
        write!(f, "[")?;
        for (i, (key, value)) in properties.enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        write!(f, "]")?;
    }
    Ok(())
}
