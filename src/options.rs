use serde::{Deserialize, Serialize};

/// What to do when one region of a multi-region file fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionErrorPolicy {
    /// Abort the whole file on the first failing region.
    #[default]
    Fail,
    /// Log the failure and leave the region out.
    Skip,
}

/// Decode settings. Every field has a default, so a settings JSON only needs
/// to name the fields it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeOptions {
    /// Reject packed arrays with more words than the region needs.
    #[serde(default = "default_true")]
    pub strict_packed_length: bool,
    /// Largest region volume (in cells) that will be decoded.
    #[serde(default = "default_max_region_volume")]
    pub max_region_volume: Option<u64>,
    #[serde(default)]
    pub region_errors: RegionErrorPolicy,
    /// Decode the regions of a file on the rayon thread pool.
    #[serde(default)]
    pub parallel: bool,
    /// Share resolved palette entries between the regions of a file.
    #[serde(default = "default_true")]
    pub cache_palette: bool,
}

fn default_true() -> bool {
    true
}
fn default_max_region_volume() -> Option<u64> {
    Some(1 << 31)
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            strict_packed_length: true,
            max_region_volume: default_max_region_volume(),
            region_errors: RegionErrorPolicy::default(),
            parallel: false,
            cache_palette: true,
        }
    }
}

impl DecodeOptions {
    /// Parses optional JSON settings; `None` gives the defaults.
    pub fn from_settings(settings: Option<&str>) -> Result<Self, serde_json::Error> {
        match settings {
            Some(json) => serde_json::from_str(json),
            None => Ok(Self::default()),
        }
    }

    pub fn settings_schema() -> String {
        r#"{
  "strict_packed_length": {"type": "bool", "default": true, "description": "Reject packed arrays with more words than the region needs"},
  "max_region_volume": {"type": "int|null", "default": 2147483648, "description": "Largest region volume to decode, null for no limit"},
  "region_errors": {"type": "enum", "values": ["fail", "skip"], "default": "fail", "description": "Abort the file or skip a region that fails to decode"},
  "parallel": {"type": "bool", "default": false, "description": "Decode regions in parallel"},
  "cache_palette": {"type": "bool", "default": true, "description": "Share resolved palette entries between regions"}
}"#
        .to_string()
    }
}
