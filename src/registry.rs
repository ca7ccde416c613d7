//! Block definitions the palette resolver looks identifiers up in.
//!
//! The decoder does not know any game data itself. Callers inject a
//! [`BlockLookup`]; [`BlockRegistry`] is a plain in-memory implementation
//! that can be filled by hand or loaded from JSON.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::block_state::{BlockState, PropertyValue};

/// Resolves a block identifier to its definition.
pub trait BlockLookup: Send + Sync {
    fn block(&self, name: &str) -> Option<&BlockDefinition>;
}

/// The value domain of a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyKind {
    Bool,
    Int { min: i32, max: i32 },
    Enum { values: Vec<SmolStr> },
}

impl PropertyKind {
    /// Parses a raw property string into a value of this kind.
    pub fn parse(&self, raw: &str) -> Option<PropertyValue> {
        match self {
            PropertyKind::Bool => match raw {
                "true" => Some(PropertyValue::Bool(true)),
                "false" => Some(PropertyValue::Bool(false)),
                _ => None,
            },
            PropertyKind::Int { min, max } => raw
                .parse::<i32>()
                .ok()
                .filter(|v| (*min..=*max).contains(v))
                .map(PropertyValue::Int),
            PropertyKind::Enum { values } => values
                .iter()
                .find(|v| v.as_str() == raw)
                .map(|v| PropertyValue::Enum(v.clone())),
        }
    }

    fn first_value(&self) -> Option<PropertyValue> {
        match self {
            PropertyKind::Bool => Some(PropertyValue::Bool(false)),
            PropertyKind::Int { min, max } if min <= max => Some(PropertyValue::Int(*min)),
            PropertyKind::Int { .. } => None,
            PropertyKind::Enum { values } => values.first().cloned().map(PropertyValue::Enum),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: SmolStr,
    #[serde(flatten)]
    pub kind: PropertyKind,
    pub default: PropertyValue,
}

impl PropertyDefinition {
    pub fn boolean(name: impl Into<SmolStr>) -> Self {
        PropertyDefinition {
            name: name.into(),
            kind: PropertyKind::Bool,
            default: PropertyValue::Bool(false),
        }
    }

    pub fn int(name: impl Into<SmolStr>, min: i32, max: i32) -> Self {
        PropertyDefinition {
            name: name.into(),
            kind: PropertyKind::Int { min, max },
            default: PropertyValue::Int(min),
        }
    }

    /// An enumerated property; the first value is the default.
    pub fn enumeration<I, S>(name: impl Into<SmolStr>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        let values: Vec<SmolStr> = values.into_iter().map(Into::into).collect();
        let default = PropertyValue::Enum(values.first().cloned().unwrap_or_default());
        PropertyDefinition {
            name: name.into(),
            kind: PropertyKind::Enum { values },
            default,
        }
    }

    pub fn with_default(mut self, raw: &str) -> Result<Self, RegistryError> {
        self.default = self.kind.parse(raw).ok_or_else(|| RegistryError::InvalidDefault {
            property: self.name.clone(),
            value: raw.into(),
        })?;
        Ok(self)
    }

    pub fn parse(&self, raw: &str) -> Option<PropertyValue> {
        self.kind.parse(raw)
    }

    fn validate(&self) -> Result<(), RegistryError> {
        if self.kind.first_value().is_none() {
            return Err(RegistryError::EmptyDomain(self.name.clone()));
        }
        if self.kind.parse(&self.default.to_string()).as_ref() != Some(&self.default) {
            return Err(RegistryError::InvalidDefault {
                property: self.name.clone(),
                value: self.default.to_string().into(),
            });
        }
        Ok(())
    }
}

/// A block and the typed properties it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDefinition {
    name: SmolStr,
    properties: Vec<PropertyDefinition>,
    default_state: BlockState,
}

impl BlockDefinition {
    pub fn new(
        name: impl Into<SmolStr>,
        properties: Vec<PropertyDefinition>,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        for (i, property) in properties.iter().enumerate() {
            property.validate()?;
            if properties[..i].iter().any(|p| p.name == property.name) {
                return Err(RegistryError::DuplicateProperty {
                    block: name,
                    property: property.name.clone(),
                });
            }
        }
        let default_state = BlockState::new(
            name.clone(),
            properties
                .iter()
                .map(|p| (p.name.clone(), p.default.clone()))
                .collect(),
        );
        Ok(BlockDefinition {
            name,
            properties,
            default_state,
        })
    }

    /// A block without properties.
    pub fn simple(name: impl Into<SmolStr>) -> Self {
        let name = name.into();
        BlockDefinition {
            default_state: BlockState::new(name.clone(), Vec::new()),
            name,
            properties: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn default_state(&self) -> &BlockState {
        &self.default_state
    }

    pub fn properties(&self) -> &[PropertyDefinition] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name.as_str() == name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("'{value}' is not a valid default for property '{property}'")]
    InvalidDefault { property: SmolStr, value: SmolStr },
    #[error("property '{0}' has no possible values")]
    EmptyDomain(SmolStr),
    #[error("block '{block}' declares property '{property}' twice")]
    DuplicateProperty { block: SmolStr, property: SmolStr },
    #[error("block '{0}' is registered twice")]
    DuplicateBlock(SmolStr),
}

#[derive(Deserialize)]
struct RegistryFile {
    blocks: Vec<BlockEntry>,
}

#[derive(Deserialize)]
struct BlockEntry {
    name: SmolStr,
    #[serde(default)]
    properties: Vec<PropertyEntry>,
}

#[derive(Deserialize)]
struct PropertyEntry {
    name: SmolStr,
    #[serde(flatten)]
    kind: PropertyKind,
    #[serde(default)]
    default: Option<String>,
}

/// In-memory [`BlockLookup`].
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    blocks: FxHashMap<SmolStr, BlockDefinition>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: BlockDefinition) -> Result<(), RegistryError> {
        if self.blocks.contains_key(&definition.name) {
            return Err(RegistryError::DuplicateBlock(definition.name));
        }
        self.blocks.insert(definition.name.clone(), definition);
        Ok(())
    }

    pub fn with_block(mut self, definition: BlockDefinition) -> Result<Self, RegistryError> {
        self.register(definition)?;
        Ok(self)
    }

    /// Loads definitions from JSON of the form
    /// `{"blocks": [{"name": "minecraft:lever", "properties": [{"name": "powered", "type": "bool"}]}]}`.
    /// Property `type` is one of `bool`, `int` (with `min`/`max`) or `enum`
    /// (with `values`); `default` is optional.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = serde_json::from_str(json)?;
        let mut registry = BlockRegistry::new();
        for entry in file.blocks {
            let mut properties = Vec::with_capacity(entry.properties.len());
            for prop in entry.properties {
                let default = prop
                    .kind
                    .first_value()
                    .ok_or_else(|| RegistryError::EmptyDomain(prop.name.clone()))?;
                let definition = PropertyDefinition {
                    name: prop.name,
                    kind: prop.kind,
                    default,
                };
                properties.push(match prop.default {
                    Some(raw) => definition.with_default(&raw)?,
                    None => definition,
                });
            }
            registry.register(BlockDefinition::new(entry.name, properties)?)?;
        }
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl BlockLookup for BlockRegistry {
    fn block(&self, name: &str) -> Option<&BlockDefinition> {
        self.blocks.get(name)
    }
}
