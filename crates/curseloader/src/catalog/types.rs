//! Catalog data transfer objects
//!
//! Field names and enum discriminants follow the CurseForge v1 REST API.
//! Every response arrives wrapped in a `{ "data": ... }` envelope.

use serde::Deserialize;

/// Response envelope used by every catalog endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

/// One selectable unit of install: a specific file of a specific mod
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModRef {
    pub mod_id: i64,
    pub file_id: i64,
}

impl ModRef {
    pub fn new(mod_id: i64, file_id: i64) -> Self {
        Self { mod_id, file_id }
    }
}

/// A downloadable artifact of a mod, with declared hashes and dependency edges
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: i64,
    pub mod_id: i64,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub file_name: String,
    /// Absent when the mod's author disallows third-party distribution
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub hashes: Vec<FileHash>,
    #[serde(default)]
    pub dependencies: Vec<FileDependency>,
}

/// A catalog-declared content hash
#[derive(Debug, Clone, Deserialize)]
pub struct FileHash {
    pub value: String,
    pub algo: HashAlgo,
}

/// Hash algorithms the catalog declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u8")]
pub enum HashAlgo {
    Sha1,
    Md5,
    Other(u8),
}

impl From<u8> for HashAlgo {
    fn from(value: u8) -> Self {
        match value {
            1 => HashAlgo::Sha1,
            2 => HashAlgo::Md5,
            other => HashAlgo::Other(other),
        }
    }
}

impl std::fmt::Display for HashAlgo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgo::Sha1 => write!(f, "sha1"),
            HashAlgo::Md5 => write!(f, "md5"),
            HashAlgo::Other(n) => write!(f, "algo-{n}"),
        }
    }
}

/// A dependency edge from one mod's file to another mod
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDependency {
    pub mod_id: i64,
    pub relation_type: RelationType,
}

/// Dependency relation kinds; only `Required` drives resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u8")]
pub enum RelationType {
    EmbeddedLibrary,
    Optional,
    Required,
    Tool,
    Incompatible,
    Include,
    Other(u8),
}

impl From<u8> for RelationType {
    fn from(value: u8) -> Self {
        match value {
            1 => RelationType::EmbeddedLibrary,
            2 => RelationType::Optional,
            3 => RelationType::Required,
            4 => RelationType::Tool,
            5 => RelationType::Incompatible,
            6 => RelationType::Include,
            other => RelationType::Other(other),
        }
    }
}

/// The slice of a mod record the pipeline needs for progress identity
#[derive(Debug, Clone, Deserialize)]
pub struct ModSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

/// Mod loader families understood by the catalog's file filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModLoaderType {
    Any,
    Forge,
    Cauldron,
    LiteLoader,
    Fabric,
    Quilt,
    NeoForge,
}

impl ModLoaderType {
    /// Name form used in the files query string
    pub fn as_query_name(&self) -> &'static str {
        match self {
            ModLoaderType::Any => "Any",
            ModLoaderType::Forge => "Forge",
            ModLoaderType::Cauldron => "Cauldron",
            ModLoaderType::LiteLoader => "LiteLoader",
            ModLoaderType::Fabric => "Fabric",
            ModLoaderType::Quilt => "Quilt",
            ModLoaderType::NeoForge => "NeoForge",
        }
    }
}

impl std::str::FromStr for ModLoaderType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" => Ok(ModLoaderType::Any),
            "forge" => Ok(ModLoaderType::Forge),
            "cauldron" => Ok(ModLoaderType::Cauldron),
            "liteloader" => Ok(ModLoaderType::LiteLoader),
            "fabric" => Ok(ModLoaderType::Fabric),
            "quilt" => Ok(ModLoaderType::Quilt),
            "neoforge" => Ok(ModLoaderType::NeoForge),
            other => Err(format!("unknown mod loader '{other}'")),
        }
    }
}
