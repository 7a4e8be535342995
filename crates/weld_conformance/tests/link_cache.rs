//! Link cache conformance: rebuild idempotence, invalidation, and linker
//! failure recovery.

use weld_build::{CodeResource, FileOptions, RawResource, Resource};
use weld_conformance::{app_unit, package_unit, run_pipeline, CountingLinker, MemoryStore};
use weld_link::{LinkCache, LinkError, LinkOptions, LinkedFile, Linker};

fn js(path: &str, data: &[u8]) -> RawResource {
    RawResource::source(path, data.to_vec(), FileOptions::default())
}

fn code_data(resources: &[Resource]) -> Vec<Vec<u8>> {
    resources
        .iter()
        .filter_map(|r| match r {
            Resource::Code(code) => Some(code.data.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn identical_rebuild_skips_the_linker() {
    let store = MemoryStore::new();
    let linker = CountingLinker::new();
    let cache = LinkCache::new(1024 * 1024);

    let build = |cache: &LinkCache| {
        run_pipeline(
            "web.browser",
            vec![package_unit("cards", "web.browser", vec![js("a.js", b"a();")])],
            &store,
            &linker,
            cache,
        )
    };

    let first = build(&cache);
    assert_eq!(linker.calls(), 1);
    let second = build(&cache);
    assert_eq!(linker.calls(), 1);
    assert_eq!(code_data(&first.resources[0]), code_data(&second.resources[0]));
}

#[test]
fn changed_source_relinks() {
    let store = MemoryStore::new();
    let linker = CountingLinker::new();
    let cache = LinkCache::new(1024 * 1024);

    run_pipeline(
        "web.browser",
        vec![package_unit("cards", "web.browser", vec![js("a.js", b"a();")])],
        &store,
        &linker,
        &cache,
    );
    run_pipeline(
        "web.browser",
        vec![package_unit("cards", "web.browser", vec![js("a.js", b"b();")])],
        &store,
        &linker,
        &cache,
    );
    assert_eq!(linker.calls(), 2);
}

#[test]
fn same_source_in_different_package_relinks() {
    // The key covers the link options, so another package's identical file
    // set is not a hit.
    let store = MemoryStore::new();
    let linker = CountingLinker::new();
    let cache = LinkCache::new(1024 * 1024);

    run_pipeline(
        "web.browser",
        vec![package_unit("cards", "web.browser", vec![js("a.js", b"a();")])],
        &store,
        &linker,
        &cache,
    );
    run_pipeline(
        "web.browser",
        vec![package_unit("decks", "web.browser", vec![js("a.js", b"a();")])],
        &store,
        &linker,
        &cache,
    );
    assert_eq!(linker.calls(), 2);
}

#[test]
fn app_and_package_share_one_cache() {
    let store = MemoryStore::new();
    let linker = CountingLinker::new();
    let cache = LinkCache::new(1024 * 1024);

    let units = vec![
        app_unit("web.browser", vec![js("main.js", b"m();")]),
        package_unit("cards", "web.browser", vec![js("a.js", b"a();")]),
    ];
    run_pipeline("web.browser", units, &store, &linker, &cache);
    assert_eq!(linker.calls(), 2);
    assert_eq!(cache.len(), 2);
}

#[test]
fn cache_sized_from_configuration() {
    let config = weld_config::load_config_from_str(
        r#"
[cache]
link_bytes = 16
track_stats = true
"#,
    )
    .unwrap();
    let cache = LinkCache::from_config(&config);

    let store = MemoryStore::new();
    let linker = CountingLinker::new();
    run_pipeline(
        "web.browser",
        vec![package_unit("cards", "web.browser", vec![js("a.js", b"this line is longer than the budget();")])],
        &store,
        &linker,
        &cache,
    );
    // The linked output exceeds the 16-byte budget, so nothing sticks.
    assert!(cache.is_empty());
    assert_eq!(cache.stats().misses, 1);
}

struct FailingLinker;

impl Linker for FailingLinker {
    fn link(
        &self,
        _files: &[CodeResource],
        _options: &LinkOptions,
    ) -> Result<Vec<LinkedFile>, LinkError> {
        Err(LinkError::new("module graph has a cycle"))
    }
}

#[test]
fn linker_failure_keeps_non_code_resources() {
    let store = MemoryStore::new();
    let cache = LinkCache::new(1024 * 1024);

    let units = vec![package_unit(
        "cards",
        "web.browser",
        vec![
            js("a.js", b"a();"),
            RawResource::prebuilt(
                weld_build::RawKind::Asset,
                "img/back.png",
                Some("/packages/cards/img/back.png".to_string()),
                vec![1, 2, 3],
            ),
        ],
    )];
    let result = run_pipeline("web.browser", units, &store, &FailingLinker, &cache);

    assert_eq!(result.error_count, 1);
    assert_eq!(result.diagnostics[0].package.as_deref(), Some("cards"));
    assert!(result.diagnostics[0].message.contains("module graph has a cycle"));
    // No code output, but the asset survives; nothing was cached.
    assert!(code_data(&result.resources[0]).is_empty());
    assert_eq!(result.resources[0].len(), 1);
    assert!(cache.is_empty());
}
