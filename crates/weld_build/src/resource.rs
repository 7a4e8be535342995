//! Input and output resource shapes for the compile and link stages.

use crate::error::BuildError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use weld_common::ContentHash;

/// Per-file flags attached to a source resource by its package definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileOptions {
    /// Emit this file's code unwrapped, outside the package closure.
    #[serde(default)]
    pub bare: bool,

    /// Legacy spelling of `bare` still accepted from older package metadata.
    #[serde(default)]
    pub raw: bool,

    /// Any additional flags a plugin may want to inspect.
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl FileOptions {
    /// Returns `true` if the file asked to be emitted bare (either spelling).
    pub fn is_bare(&self) -> bool {
        self.bare || self.raw
    }
}

/// The kind of a raw input resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    /// A source file that needs plugin transformation.
    Source,
    /// A pre-built code artifact, passed through to the link stage.
    Code,
    /// A pre-built stylesheet, passed through untouched.
    Stylesheet,
    /// A static asset, passed through untouched.
    Asset,
    /// A pre-rendered `head` document fragment.
    HeadFragment,
    /// A pre-rendered `body` document fragment.
    BodyFragment,
}

/// One immutable input resource of a compilation unit.
///
/// Source resources are matched against the processor registry; every other
/// kind is already a concrete output and is classified straight into the
/// slot's output lists with no plugin involvement.
#[derive(Debug, Clone)]
pub struct RawResource {
    /// What the resource is.
    pub kind: RawKind,
    /// Path within the owning package.
    pub path: String,
    /// Extension to match processors by; `None` means "match by exact
    /// filename". Only meaningful for [`RawKind::Source`].
    pub extension: Option<String>,
    /// Raw content bytes, shared so slots can be built without copying.
    pub data: Arc<Vec<u8>>,
    /// Content hash of `data`.
    pub hash: ContentHash,
    /// Per-file flags.
    pub file_options: FileOptions,
    /// Pre-computed serve path for pass-through resources.
    pub serve_path: Option<String>,
}

impl RawResource {
    /// Creates a source resource, inferring the extension from the path's
    /// basename (the part after the last dot, if any).
    pub fn source(
        path: impl Into<String>,
        data: impl Into<Vec<u8>>,
        file_options: FileOptions,
    ) -> Self {
        let path = path.into();
        let extension = basename(&path)
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_string());
        Self::source_with_extension(path, extension, data, file_options)
    }

    /// Creates a source resource that is matched by exact filename instead
    /// of by extension.
    pub fn source_exact(
        path: impl Into<String>,
        data: impl Into<Vec<u8>>,
        file_options: FileOptions,
    ) -> Self {
        Self::source_with_extension(path.into(), None, data, file_options)
    }

    fn source_with_extension(
        path: String,
        extension: Option<String>,
        data: impl Into<Vec<u8>>,
        file_options: FileOptions,
    ) -> Self {
        let data = data.into();
        let hash = ContentHash::from_bytes(&data);
        Self {
            kind: RawKind::Source,
            path,
            extension,
            data: Arc::new(data),
            hash,
            file_options,
            serve_path: None,
        }
    }

    /// Creates a pass-through resource that is already a concrete output.
    pub fn prebuilt(
        kind: RawKind,
        path: impl Into<String>,
        serve_path: Option<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        let data = data.into();
        let hash = ContentHash::from_bytes(&data);
        Self {
            kind,
            path: path.into(),
            extension: None,
            data: Arc::new(data),
            hash,
            file_options: FileOptions::default(),
            serve_path,
        }
    }

    /// Returns the resource's basename (final path component).
    pub fn basename(&self) -> &str {
        basename(&self.path)
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// A source map supplied by a plugin, either still serialized or already
/// structured.
#[derive(Debug, Clone)]
pub enum SourceMapInput {
    /// A stringified JSON source map.
    Text(String),
    /// An already-parsed source map.
    Structured(serde_json::Value),
}

/// A structured source map attached to a code or stylesheet resource.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMap(pub serde_json::Value);

impl SourceMap {
    /// Parses a plugin-supplied source map, decoding text maps from JSON.
    ///
    /// `path` is only used in the error message.
    pub fn parse(input: SourceMapInput, path: &str) -> Result<Self, BuildError> {
        match input {
            SourceMapInput::Structured(value) => Ok(Self(value)),
            SourceMapInput::Text(text) => {
                let value = serde_json::from_str(&text).map_err(|e| BuildError::SourceMap {
                    path: path.to_string(),
                    message: e.to_string(),
                })?;
                Ok(Self(value))
            }
        }
    }

    /// Serialized byte length, used for cache byte accounting.
    pub fn byte_len(&self) -> usize {
        serde_json::to_string(&self.0).map(|s| s.len()).unwrap_or(0)
    }
}

/// A code output resource, the unit of input to the link stage.
#[derive(Debug, Clone)]
pub struct CodeResource {
    /// The path the code is served at.
    pub serve_path: String,
    /// Line-ending-normalized code bytes.
    pub data: Vec<u8>,
    /// Content hash of `data`.
    pub hash: ContentHash,
    /// Optional structured source map.
    pub source_map: Option<SourceMap>,
    /// Emit outside the package closure.
    pub bare: bool,
}

/// A stylesheet output resource.
#[derive(Debug, Clone)]
pub struct StylesheetResource {
    /// The path the stylesheet is served at.
    pub serve_path: String,
    /// Line-ending-normalized stylesheet bytes.
    pub data: Vec<u8>,
    /// Content hash of `data`.
    pub hash: ContentHash,
    /// Optional structured source map.
    pub source_map: Option<SourceMap>,
    /// Stylesheets produced by plugins may be hot-swapped without a full
    /// page reload.
    pub refreshable: bool,
}

/// A static asset output resource.
#[derive(Debug, Clone)]
pub struct AssetResource {
    /// Path within the owning namespace.
    pub path: String,
    /// The path the asset is served at.
    pub serve_path: String,
    /// Raw asset bytes.
    pub data: Vec<u8>,
    /// Optional caller-supplied hash.
    pub hash: Option<ContentHash>,
}

/// A document fragment appended to the `head` or `body` section.
#[derive(Debug, Clone)]
pub struct FragmentResource {
    /// Line-ending-normalized markup bytes.
    pub data: Vec<u8>,
}

/// The kind of a final output resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// Linked or pass-through code.
    Code,
    /// A stylesheet.
    Stylesheet,
    /// A static asset.
    Asset,
    /// A `head` document fragment.
    HeadFragment,
    /// A `body` document fragment.
    BodyFragment,
}

/// A final output resource returned from a compilation batch.
#[derive(Debug, Clone)]
pub enum Resource {
    /// Linked or pass-through code.
    Code(CodeResource),
    /// A stylesheet.
    Stylesheet(StylesheetResource),
    /// A static asset.
    Asset(AssetResource),
    /// A `head` document fragment.
    HeadFragment(FragmentResource),
    /// A `body` document fragment.
    BodyFragment(FragmentResource),
}

impl Resource {
    /// Returns this resource's kind tag.
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Code(_) => ResourceKind::Code,
            Resource::Stylesheet(_) => ResourceKind::Stylesheet,
            Resource::Asset(_) => ResourceKind::Asset,
            Resource::HeadFragment(_) => ResourceKind::HeadFragment,
            Resource::BodyFragment(_) => ResourceKind::BodyFragment,
        }
    }

    /// Returns the resource's content bytes.
    pub fn data(&self) -> &[u8] {
        match self {
            Resource::Code(r) => &r.data,
            Resource::Stylesheet(r) => &r.data,
            Resource::Asset(r) => &r.data,
            Resource::HeadFragment(r) | Resource::BodyFragment(r) => &r.data,
        }
    }

    /// Returns the resource's serve path, if it has one (document fragments
    /// do not).
    pub fn serve_path(&self) -> Option<&str> {
        match self {
            Resource::Code(r) => Some(&r.serve_path),
            Resource::Stylesheet(r) => Some(&r.serve_path),
            Resource::Asset(r) => Some(&r.serve_path),
            Resource::HeadFragment(_) | Resource::BodyFragment(_) => None,
        }
    }
}

/// Asset content supplied to `add_asset`: text or raw bytes.
#[derive(Debug, Clone)]
pub enum AssetData {
    /// UTF-8 text content.
    Text(String),
    /// Raw binary content.
    Binary(Vec<u8>),
}

impl AssetData {
    /// Consumes the data, yielding raw bytes either way.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            AssetData::Text(s) => s.into_bytes(),
            AssetData::Binary(b) => b,
        }
    }
}

/// Arguments to [`PluginFile::add_code`](crate::PluginFile::add_code).
#[derive(Debug, Clone)]
pub struct CodeOptions {
    /// Requested path for the code; the serve path is derived from it.
    pub path: String,
    /// The code text to add.
    pub data: String,
    /// Optional source map, text or structured.
    pub source_map: Option<SourceMapInput>,
    /// Emit outside the package closure.
    pub bare: bool,
}

/// Arguments to [`PluginFile::add_stylesheet`](crate::PluginFile::add_stylesheet).
#[derive(Debug, Clone)]
pub struct StylesheetOptions {
    /// Requested path for the stylesheet.
    pub path: String,
    /// The stylesheet text to add.
    pub data: String,
    /// Optional source map, text or structured.
    pub source_map: Option<SourceMapInput>,
}

/// Arguments to [`PluginFile::add_asset`](crate::PluginFile::add_asset).
#[derive(Debug, Clone)]
pub struct AssetOptions {
    /// Requested path for the asset within its namespace.
    pub path: String,
    /// Text or binary asset content.
    pub data: AssetData,
    /// Optional caller-supplied hash for the output file.
    pub hash: Option<ContentHash>,
}
