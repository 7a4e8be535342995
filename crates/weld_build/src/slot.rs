//! Per-resource processing state and the plugin-facing view over it.

use crate::error::BuildError;
use crate::processor::{SourceProcessor, PASSTHROUGH_EXTENSION};
use crate::resource::{
    AssetOptions, CodeOptions, CodeResource, FileOptions, FragmentResource, RawKind, RawResource,
    Resource, SourceMap, StylesheetOptions, StylesheetResource,
};
use crate::unit::{CompilationUnit, Export};
use std::sync::Arc;
use weld_common::{normalize_line_endings, Arch, ContentHash, InternalError};

/// Processing state for one input resource: the resource itself, the
/// processor resolved for it, and the outputs produced so far.
///
/// Slots are created by [`SourceBatch::build`](crate::SourceBatch::build)
/// and mutated only through [`PluginFile`] (by plugins) or the built-in
/// pass-through rules (at construction). A slot with no assigned processor
/// never receives plugin calls.
pub struct ResourceSlot {
    input: RawResource,
    processor: Option<Arc<SourceProcessor>>,
    unit: Arc<CompilationUnit>,
    code_outputs: Vec<CodeResource>,
    other_outputs: Vec<Resource>,
}

impl ResourceSlot {
    /// Builds a slot from a raw resource.
    ///
    /// Source resources with a processor wait for the plugin to act. A
    /// source file with no processor and the built-in pass-through
    /// extension immediately synthesizes a code output from its own bytes.
    /// Every non-source resource is classified straight into the
    /// appropriate output list; assigning a processor to one is a bug in
    /// batch construction.
    pub(crate) fn new(
        input: RawResource,
        processor: Option<Arc<SourceProcessor>>,
        unit: Arc<CompilationUnit>,
    ) -> Result<Self, InternalError> {
        let mut slot = Self {
            input,
            processor,
            unit,
            code_outputs: Vec::new(),
            other_outputs: Vec::new(),
        };

        match slot.input.kind {
            RawKind::Source => {
                if slot.processor.is_none()
                    && slot.input.extension.as_deref() == Some(PASSTHROUGH_EXTENSION)
                {
                    let options = CodeOptions {
                        path: slot.input.path.clone(),
                        data: String::from_utf8_lossy(&slot.input.data).into_owned(),
                        source_map: None,
                        bare: slot.input.file_options.is_bare(),
                    };
                    slot.add_code(options).map_err(|e| {
                        InternalError::new(format!("pass-through code synthesis failed: {e}"))
                    })?;
                }
                // With a processor the slot waits; with neither processor
                // nor pass-through extension the batch has already dropped
                // the resource.
            }
            _ => {
                if slot.processor.is_some() {
                    return Err(InternalError::new(format!(
                        "processor assigned to non-source resource {:?}",
                        slot.input.path
                    )));
                }
                slot.classify_passthrough();
            }
        }

        Ok(slot)
    }

    /// Moves a pre-built resource into the matching output list.
    fn classify_passthrough(&mut self) {
        let serve_path = self
            .input
            .serve_path
            .clone()
            .unwrap_or_else(|| self.unit.serve_path(&self.input.path));
        let data = (*self.input.data).clone();
        match self.input.kind {
            RawKind::Source => unreachable!("sources are not pass-through"),
            RawKind::Code => self.code_outputs.push(CodeResource {
                serve_path,
                data,
                hash: self.input.hash,
                source_map: None,
                bare: self.input.file_options.is_bare(),
            }),
            RawKind::Stylesheet => self.other_outputs.push(Resource::Stylesheet(
                StylesheetResource {
                    serve_path,
                    data,
                    hash: self.input.hash,
                    source_map: None,
                    refreshable: false,
                },
            )),
            RawKind::Asset => self.other_outputs.push(Resource::Asset(
                crate::resource::AssetResource {
                    path: self.input.path.clone(),
                    serve_path,
                    data,
                    hash: Some(self.input.hash),
                },
            )),
            RawKind::HeadFragment => self
                .other_outputs
                .push(Resource::HeadFragment(FragmentResource { data })),
            RawKind::BodyFragment => self
                .other_outputs
                .push(Resource::BodyFragment(FragmentResource { data })),
        }
    }

    /// The slot's input resource.
    pub fn input(&self) -> &RawResource {
        &self.input
    }

    /// The id of the processor assigned to this slot, if any.
    pub fn processor_id(&self) -> Option<&crate::ProcessorId> {
        self.processor.as_ref().map(|p| &p.id)
    }

    /// The processor assigned to this slot, if any.
    pub fn processor(&self) -> Option<&Arc<SourceProcessor>> {
        self.processor.as_ref()
    }

    /// Code outputs produced so far, in call order.
    pub fn code_outputs(&self) -> &[CodeResource] {
        &self.code_outputs
    }

    /// Non-code outputs produced so far, in call order.
    pub fn other_outputs(&self) -> &[Resource] {
        &self.other_outputs
    }

    fn require_processor(&self, mutator: &'static str) -> Result<(), BuildError> {
        if self.processor.is_none() {
            return Err(BuildError::NoProcessor {
                mutator,
                path: self.input.path.clone(),
            });
        }
        Ok(())
    }

    /// Appends a code output. Requires an assigned processor, except for
    /// the built-in pass-through of plain code files.
    pub(crate) fn add_code(&mut self, options: CodeOptions) -> Result<(), BuildError> {
        let passthrough = self.input.kind == RawKind::Source
            && self.input.extension.as_deref() == Some(PASSTHROUGH_EXTENSION);
        if self.processor.is_none() && !passthrough {
            return Err(BuildError::NoProcessor {
                mutator: "add_code",
                path: self.input.path.clone(),
            });
        }

        let data = normalize_line_endings(&options.data).into_bytes();
        let source_map = options
            .source_map
            .map(|sm| SourceMap::parse(sm, &options.path))
            .transpose()?;
        self.code_outputs.push(CodeResource {
            serve_path: self.unit.serve_path(&options.path),
            hash: ContentHash::from_bytes(&data),
            data,
            source_map,
            bare: options.bare,
        });
        Ok(())
    }

    /// Appends a refreshable stylesheet output. Requires an assigned
    /// processor.
    pub(crate) fn add_stylesheet(&mut self, options: StylesheetOptions) -> Result<(), BuildError> {
        self.require_processor("add_stylesheet")?;

        let data = normalize_line_endings(&options.data).into_bytes();
        let source_map = options
            .source_map
            .map(|sm| SourceMap::parse(sm, &options.path))
            .transpose()?;
        self.other_outputs.push(Resource::Stylesheet(StylesheetResource {
            serve_path: self.unit.serve_path(&options.path),
            hash: ContentHash::from_bytes(&data),
            data,
            source_map,
            refreshable: true,
        }));
        Ok(())
    }

    /// Appends a static asset output, rooting its serve path under the
    /// owning package's namespace. Requires an assigned processor.
    ///
    /// For the top-level application one leading `public/` or `private/`
    /// segment is stripped; those are the reserved folders for app-level
    /// static assets.
    pub(crate) fn add_asset(&mut self, options: AssetOptions) -> Result<(), BuildError> {
        self.require_processor("add_asset")?;

        let mut path = options.path.trim_start_matches('/').to_string();
        if self.unit.is_app() {
            for prefix in ["public/", "private/"] {
                if let Some(stripped) = path.strip_prefix(prefix) {
                    path = stripped.to_string();
                    break;
                }
            }
        }
        self.other_outputs.push(Resource::Asset(crate::resource::AssetResource {
            serve_path: self.unit.serve_path(&path),
            path,
            data: options.data.into_bytes(),
            hash: options.hash,
        }));
        Ok(())
    }

    /// Appends a document fragment for the `head` or `body` section.
    ///
    /// Only valid for web architectures, and only for those two exact
    /// section names; anything else fails before any resource is added.
    pub(crate) fn add_document_fragment(
        &mut self,
        section: &str,
        data: &str,
    ) -> Result<(), BuildError> {
        if !self.unit.arch.matches("web") {
            return Err(BuildError::NotWebArch(self.unit.arch.as_str().to_string()));
        }
        let fragment = FragmentResource {
            data: normalize_line_endings(data).into_bytes(),
        };
        match section {
            "head" => self.other_outputs.push(Resource::HeadFragment(fragment)),
            "body" => self.other_outputs.push(Resource::BodyFragment(fragment)),
            other => return Err(BuildError::InvalidSection(other.to_string())),
        }
        Ok(())
    }
}

/// The read-only-metadata, append-only-output view of a [`ResourceSlot`]
/// handed to plugin code.
///
/// This is the only object a plugin ever touches; it exposes the documented
/// accessors and mutators and nothing else, keeping the plugin-facing
/// contract independent of the slot's internal representation.
pub struct PluginFile<'a> {
    slot: &'a mut ResourceSlot,
}

impl<'a> PluginFile<'a> {
    pub(crate) fn new(slot: &'a mut ResourceSlot) -> Self {
        Self { slot }
    }

    /// Raw bytes of the input resource.
    pub fn contents(&self) -> &[u8] {
        &self.slot.input.data
    }

    /// Path of the input resource within its package.
    pub fn path(&self) -> &str {
        &self.slot.input.path
    }

    /// Name of the owning package, or `None` for the application.
    pub fn package_name(&self) -> Option<&str> {
        self.slot.unit.package.as_deref()
    }

    /// Per-file flags from the package definition.
    pub fn file_options(&self) -> &FileOptions {
        &self.slot.input.file_options
    }

    /// The build's target architecture.
    pub fn arch(&self) -> &Arch {
        &self.slot.unit.arch
    }

    /// Content hash of the input resource.
    pub fn content_hash(&self) -> ContentHash {
        self.slot.input.hash
    }

    /// The extension the file was matched by, or `None` when it was
    /// matched by exact filename.
    pub fn extension(&self) -> Option<&str> {
        self.slot.input.extension.as_deref()
    }

    /// Symbols the owning unit declares as exports.
    pub fn declared_exports(&self) -> &[Export] {
        &self.slot.unit.declared_exports
    }

    /// A serve-rooted path suitable for error messages and source maps.
    pub fn display_path(&self) -> String {
        self.slot.unit.serve_path(&self.slot.input.path)
    }

    /// Adds code produced from this file. See
    /// [`CodeOptions`](crate::CodeOptions).
    pub fn add_code(&mut self, options: CodeOptions) -> Result<(), BuildError> {
        self.slot.add_code(options)
    }

    /// Adds a stylesheet produced from this file.
    pub fn add_stylesheet(&mut self, options: StylesheetOptions) -> Result<(), BuildError> {
        self.slot.add_stylesheet(options)
    }

    /// Adds a static asset produced from this file.
    pub fn add_asset(&mut self, options: AssetOptions) -> Result<(), BuildError> {
        self.slot.add_asset(options)
    }

    /// Adds markup to the `head` or `body` section of the document. Web
    /// architectures only.
    pub fn add_document_fragment(&mut self, section: &str, data: &str) -> Result<(), BuildError> {
        self.slot.add_document_fragment(section, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{Plugin, ProcessorId};
    use crate::resource::AssetData;
    use crate::unit::UnitKind;

    struct NoopPlugin;

    impl Plugin for NoopPlugin {
        fn process_files(&self, _files: &mut [PluginFile<'_>]) -> Result<(), BuildError> {
            Ok(())
        }
    }

    fn unit(package: Option<&str>, arch: &str) -> Arc<CompilationUnit> {
        Arc::new(CompilationUnit {
            package: package.map(str::to_string),
            arch: Arch::new(arch),
            kind: UnitKind::Main,
            is_test: false,
            declared_exports: vec![],
            dependencies: vec![],
            resources: vec![],
        })
    }

    fn widget_processor() -> Arc<SourceProcessor> {
        Arc::new(SourceProcessor::new(
            ProcessorId::new("widget/1"),
            "widget",
            Arc::new(NoopPlugin),
        ))
    }

    fn source_slot(processor: Option<Arc<SourceProcessor>>, arch: &str) -> ResourceSlot {
        let input = RawResource::source(
            "client/a.widget",
            b"widget".to_vec(),
            FileOptions::default(),
        );
        ResourceSlot::new(input, processor, unit(Some("pkg"), arch)).unwrap()
    }

    #[test]
    fn passthrough_js_synthesizes_code() {
        let input = RawResource::source(
            "client/plain.js",
            b"a = 1\r\nb = 2\r\n".to_vec(),
            FileOptions {
                bare: true,
                ..FileOptions::default()
            },
        );
        let slot = ResourceSlot::new(input, None, unit(Some("pkg"), "web.browser")).unwrap();
        assert_eq!(slot.code_outputs().len(), 1);
        let code = &slot.code_outputs()[0];
        assert_eq!(code.data, b"a = 1\nb = 2\n");
        assert!(code.bare);
        assert_eq!(code.serve_path, "/packages/pkg/client/plain.js");
    }

    #[test]
    fn source_with_processor_waits() {
        let slot = source_slot(Some(widget_processor()), "web.browser");
        assert!(slot.code_outputs().is_empty());
        assert!(slot.other_outputs().is_empty());
    }

    #[test]
    fn add_asset_requires_processor() {
        let mut slot = source_slot(None, "web.browser");
        let err = slot.add_asset(AssetOptions {
            path: "logo.png".to_string(),
            data: AssetData::Binary(vec![1, 2, 3]),
            hash: None,
        });
        assert!(matches!(err, Err(BuildError::NoProcessor { .. })));
        assert!(slot.other_outputs().is_empty());
    }

    #[test]
    fn add_stylesheet_requires_processor() {
        let mut slot = source_slot(None, "web.browser");
        let err = slot.add_stylesheet(StylesheetOptions {
            path: "a.css".to_string(),
            data: "body {}".to_string(),
            source_map: None,
        });
        assert!(matches!(err, Err(BuildError::NoProcessor { .. })));
    }

    #[test]
    fn stylesheet_is_refreshable() {
        let mut slot = source_slot(Some(widget_processor()), "web.browser");
        slot.add_stylesheet(StylesheetOptions {
            path: "a.css".to_string(),
            data: "body {}\r\n".to_string(),
            source_map: None,
        })
        .unwrap();
        match &slot.other_outputs()[0] {
            Resource::Stylesheet(css) => {
                assert!(css.refreshable);
                assert_eq!(css.data, b"body {}\n");
            }
            other => panic!("expected stylesheet, got {:?}", other.kind()),
        }
    }

    #[test]
    fn fragment_requires_web_arch() {
        let mut slot = source_slot(Some(widget_processor()), "os.linux.x86_64");
        let err = slot.add_document_fragment("head", "<title>t</title>");
        assert!(matches!(err, Err(BuildError::NotWebArch(_))));
    }

    #[test]
    fn fragment_rejects_unknown_section() {
        let mut slot = source_slot(Some(widget_processor()), "web.browser");
        let err = slot.add_document_fragment("foot", "<p>hi</p>");
        assert!(matches!(err, Err(BuildError::InvalidSection(_))));
        assert!(slot.other_outputs().is_empty(), "no resource added on failure");
    }

    #[test]
    fn fragment_sections_routed() {
        let mut slot = source_slot(Some(widget_processor()), "web.browser");
        slot.add_document_fragment("head", "<title>t</title>").unwrap();
        slot.add_document_fragment("body", "<p>hi</p>").unwrap();
        assert!(matches!(slot.other_outputs()[0], Resource::HeadFragment(_)));
        assert!(matches!(slot.other_outputs()[1], Resource::BodyFragment(_)));
    }

    #[test]
    fn app_asset_strips_public_prefix() {
        let input = RawResource::source("public/img/logo.png", b"png".to_vec(), FileOptions::default());
        let mut slot = ResourceSlot::new(
            input,
            Some(widget_processor()),
            unit(None, "web.browser"),
        )
        .unwrap();
        slot.add_asset(AssetOptions {
            path: "public/img/logo.png".to_string(),
            data: AssetData::Binary(b"png".to_vec()),
            hash: None,
        })
        .unwrap();
        match &slot.other_outputs()[0] {
            Resource::Asset(asset) => {
                assert_eq!(asset.path, "img/logo.png");
                assert_eq!(asset.serve_path, "/img/logo.png");
            }
            other => panic!("expected asset, got {:?}", other.kind()),
        }
    }

    #[test]
    fn package_asset_rooted_under_namespace() {
        let mut slot = source_slot(Some(widget_processor()), "web.browser");
        slot.add_asset(AssetOptions {
            path: "public/data.json".to_string(),
            data: AssetData::Text("{}".to_string()),
            hash: None,
        })
        .unwrap();
        match &slot.other_outputs()[0] {
            Resource::Asset(asset) => {
                // Packages keep their folder layout; only the app strips
                // the reserved public/private roots.
                assert_eq!(asset.serve_path, "/packages/pkg/public/data.json");
            }
            other => panic!("expected asset, got {:?}", other.kind()),
        }
    }

    #[test]
    fn code_outputs_preserve_call_order() {
        let mut slot = source_slot(Some(widget_processor()), "web.browser");
        for name in ["one.js", "two.js", "three.js"] {
            slot.add_code(CodeOptions {
                path: name.to_string(),
                data: format!("// {name}"),
                source_map: None,
                bare: false,
            })
            .unwrap();
        }
        let paths: Vec<_> = slot.code_outputs().iter().map(|c| c.serve_path.as_str()).collect();
        assert_eq!(
            paths,
            [
                "/packages/pkg/one.js",
                "/packages/pkg/two.js",
                "/packages/pkg/three.js"
            ]
        );
    }

    #[test]
    fn prebuilt_code_passes_through() {
        let input = RawResource::prebuilt(
            RawKind::Code,
            "vendor/lib.js",
            Some("/packages/pkg/vendor/lib.js".to_string()),
            b"lib()".to_vec(),
        );
        let slot = ResourceSlot::new(input, None, unit(Some("pkg"), "web.browser")).unwrap();
        assert_eq!(slot.code_outputs().len(), 1);
        assert_eq!(slot.code_outputs()[0].data, b"lib()");
    }

    #[test]
    fn processor_on_prebuilt_is_internal_error() {
        let input = RawResource::prebuilt(RawKind::Asset, "logo.png", None, b"png".to_vec());
        let result = ResourceSlot::new(
            input,
            Some(widget_processor()),
            unit(Some("pkg"), "web.browser"),
        );
        assert!(result.is_err());
    }
}
