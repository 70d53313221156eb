//! Addon graph 통합 테스트 - discovery → 정렬 → 인스턴스 생성 → bundle 캐시
//!
//! `cargo test -p addon-core --test addon_graph`

use addon_core::{
    Addon, AddonDefinition, AddonSettings, EntryState, Error, ErrorKind, Project, ProjectOptions,
    RegistryLoader,
};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Fixture
// ============================================================================

struct Fixture {
    _temp: TempDir,
    root: PathBuf,
}

impl Fixture {
    fn new(manifest: Value) -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("app");
        write_manifest(&root, &manifest);
        Self { _temp: temp, root }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Addon exporting `{}` from `index.js`
    fn addon(&self, rel: &str, name: &str, deps: &[&str]) -> PathBuf {
        let dir = self.path(rel);
        write_manifest(&dir, &addon_manifest(name, deps, None));
        fs::write(dir.join("index.js"), "module.exports = {};").unwrap();
        dir
    }

    /// Addon whose main is a declarative `addon.json`
    fn declarative(&self, rel: &str, name: &str, deps: &[&str], declared: Value) -> PathBuf {
        let dir = self.path(rel);
        write_manifest(&dir, &addon_manifest(name, deps, Some("addon.json")));
        fs::write(dir.join("addon.json"), declared.to_string()).unwrap();
        dir
    }

    fn load(&self, options: ProjectOptions) -> Arc<Project> {
        Project::load(&self.root, options).unwrap()
    }

    fn initialize(&self, settings: AddonSettings) -> Arc<Project> {
        let project = self.load(ProjectOptions::new().with_settings(settings));
        project.initialize_addons().unwrap();
        project
    }
}

fn write_manifest(dir: &Path, manifest: &Value) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("package.json"), manifest.to_string()).unwrap();
}

fn addon_manifest(name: &str, deps: &[&str], main: Option<&str>) -> Value {
    let dependencies: serde_json::Map<String, Value> =
        deps.iter().map(|d| (d.to_string(), json!("*"))).collect();
    let mut manifest = json!({
        "name": name,
        "keywords": ["ember-addon"],
        "dependencies": dependencies,
    });
    if let Some(main) = main {
        manifest["main"] = json!(main);
    }
    manifest
}

fn walk(addons: &[Arc<dyn Addon>], out: &mut Vec<Arc<dyn Addon>>) {
    for addon in addons {
        out.push(addon.clone());
        walk(&addon.addons(), out);
    }
}

fn all_addons(project: &Project) -> Vec<Arc<dyn Addon>> {
    let mut out = Vec::new();
    walk(&project.addons(), &mut out);
    out
}

fn named(addons: &[Arc<dyn Addon>], name: &str) -> Vec<Arc<dyn Addon>> {
    addons.iter().filter(|a| a.name() == name).cloned().collect()
}

fn names(addons: &[Arc<dyn Addon>]) -> Vec<String> {
    addons.iter().map(|a| a.name().to_string()).collect()
}

// ============================================================================
// Discovery
// ============================================================================

#[test]
fn test_single_dependency_addon() {
    let fx = Fixture::new(json!({"name": "app", "dependencies": {"a": "*"}}));
    fx.addon("node_modules/a", "a", &[]);

    let project = fx.initialize(AddonSettings::default());
    assert_eq!(names(&project.addons()), vec!["a"]);
    assert!(!project.addons()[0].is_proxy());
}

#[test]
fn test_missing_manifest_does_not_stop_siblings() {
    let fx = Fixture::new(json!({"name": "app", "dependencies": {"a": "*", "empty": "*"}}));
    fs::create_dir_all(fx.path("node_modules/empty")).unwrap();
    fx.addon("node_modules/a", "a", &[]);

    let project = fx.initialize(AddonSettings::default());
    assert_eq!(names(&project.addons()), vec!["a"]);

    let report = project.error_report();
    assert_eq!(report.count(ErrorKind::ManifestMissing), 1);
    assert!(report.to_string().contains("node_modules/empty"));
}

#[test]
fn test_main_extension_handling() {
    let fx = Fixture::new(json!({"name": "app", "dependencies": {"coffee": "*", "plain": "*"}}));
    let coffee = fx.path("node_modules/coffee");
    write_manifest(
        &coffee,
        &json!({"name": "coffee", "keywords": ["ember-addon"], "main": "index.coffee"}),
    );
    fs::write(coffee.join("index.coffee"), "").unwrap();
    let plain = fx.path("node_modules/plain");
    write_manifest(
        &plain,
        &json!({"name": "plain", "keywords": ["ember-addon"], "main": "index"}),
    );
    fs::write(plain.join("index.js"), "").unwrap();

    let project = fx.load(ProjectOptions::default());
    let packages = project.packages();
    let coffee = packages.find(&coffee).unwrap();
    let plain = packages.find(&plain).unwrap();
    assert!(coffee.addon_main_path().unwrap().ends_with("index.coffee"));
    assert!(plain.addon_main_path().unwrap().ends_with("index.js"));
}

#[cfg(unix)]
#[test]
fn test_symlinked_packages_share_one_node() {
    let fx = Fixture::new(json!({"name": "app", "dependencies": {"a": "*", "b": "*"}}));
    let a = fx.addon("packages/a", "a", &[]);
    fx.addon("node_modules/b", "b", &["a"]);
    fs::create_dir_all(fx.path("node_modules")).unwrap();
    fs::create_dir_all(fx.path("node_modules/b/node_modules")).unwrap();
    std::os::unix::fs::symlink(&a, fx.path("node_modules/a")).unwrap();
    std::os::unix::fs::symlink(&a, fx.path("node_modules/b/node_modules/a")).unwrap();

    let project = fx.load(ProjectOptions::default());
    let packages = project.packages();
    let root = project.package_info();
    let from_root = root.dependency_packages()["a"];
    let b = root.dependency_packages()["b"];
    let from_b = packages[b].dependency_packages()["a"];

    assert_eq!(from_root, from_b);
    assert_eq!(packages.find(&a).unwrap().id(), from_root);
    assert_eq!(
        packages.find(&fx.path("node_modules/b/node_modules/a")).unwrap().id(),
        from_root
    );
}

#[test]
fn test_project_load_fails_for_missing_root() {
    let temp = TempDir::new().unwrap();
    let err = Project::load(&temp.path().join("nope"), ProjectOptions::default())
        .err()
        .unwrap();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_internal_addons_come_first() {
    let fx = Fixture::new(json!({"name": "app", "dependencies": {"a": "*"}}));
    fx.addon("node_modules/a", "a", &[]);
    fx.addon("tooling/internal", "internal", &[]);

    let project = fx.load(ProjectOptions::new().with_internal_addon("tooling/internal"));
    project.initialize_addons().unwrap();
    assert_eq!(names(&project.addons()), vec!["internal", "a"]);
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_before_after_ordering() {
    let fx = Fixture::new(json!({"name": "app", "dependencies": {"x": "*", "y": "*", "z": "*"}}));
    fx.addon("node_modules/x", "x", &[]);
    write_manifest(
        &fx.path("node_modules/y"),
        &json!({"name": "y", "keywords": ["ember-addon"], "ember-addon": {"before": "x"}}),
    );
    fs::write(fx.path("node_modules/y/index.js"), "").unwrap();
    write_manifest(
        &fx.path("node_modules/z"),
        &json!({"name": "z", "keywords": ["ember-addon"], "ember-addon": {"after": "x"}}),
    );
    fs::write(fx.path("node_modules/z/index.js"), "").unwrap();

    let project = fx.initialize(AddonSettings::default());
    let order = names(&project.addons());
    let pos = |n: &str| order.iter().position(|x| x == n).unwrap();
    assert!(pos("y") < pos("x"));
    assert!(pos("x") < pos("z"));
}

#[test]
fn test_constraint_cycle_is_fatal() {
    let fx = Fixture::new(json!({"name": "app", "dependencies": {"x": "*", "y": "*"}}));
    write_manifest(
        &fx.path("node_modules/x"),
        &json!({"name": "x", "keywords": ["ember-addon"], "ember-addon": {"before": "y"}}),
    );
    fs::write(fx.path("node_modules/x/index.js"), "").unwrap();
    write_manifest(
        &fx.path("node_modules/y"),
        &json!({"name": "y", "keywords": ["ember-addon"], "ember-addon": {"before": ["x"]}}),
    );
    fs::write(fx.path("node_modules/y/index.js"), "").unwrap();

    let project = fx.load(ProjectOptions::default());
    let err = project.initialize_addons().err().unwrap();
    assert!(matches!(err, Error::CycleDetected { .. }));
    assert!(project.addons().is_empty());
}

#[test]
fn test_failed_initialization_fails_again_on_retry() {
    let fx = Fixture::new(json!({"name": "app", "dependencies": {"x": "*", "y": "*"}}));
    write_manifest(
        &fx.path("node_modules/x"),
        &json!({"name": "x", "keywords": ["ember-addon"], "ember-addon": {"after": "y"}}),
    );
    fs::write(fx.path("node_modules/x/index.js"), "").unwrap();
    write_manifest(
        &fx.path("node_modules/y"),
        &json!({"name": "y", "keywords": ["ember-addon"], "ember-addon": {"after": "x"}}),
    );
    fs::write(fx.path("node_modules/y/index.js"), "").unwrap();

    let project = fx.load(ProjectOptions::default());
    for _ in 0..2 {
        let err = project.initialize_addons().err().unwrap();
        assert!(matches!(err, Error::CycleDetected { .. }));
    }
    assert!(project.addons().is_empty());
}

// ============================================================================
// Per-Bundle Cache
// ============================================================================

fn shared_fixture() -> Fixture {
    let fx = Fixture::new(json!({"name": "app", "dependencies": {"p1": "*", "p2": "*", "shared": "*"}}));
    fx.addon("node_modules/p1", "p1", &["shared"]);
    fx.addon("node_modules/p2", "p2", &["shared"]);
    fx.declarative(
        "node_modules/shared",
        "shared",
        &[],
        json!({"allowCachingPerBundle": true}),
    );
    fx
}

#[test]
fn test_shared_addon_one_real_instance_per_project() {
    let fx = Fixture::new(json!({"name": "app", "dependencies": {"p1": "*", "p2": "*"}}));
    fx.addon("node_modules/p1", "p1", &["shared"]);
    fx.addon("node_modules/p2", "p2", &["shared"]);
    fx.declarative(
        "node_modules/shared",
        "shared",
        &[],
        json!({"allowCachingPerBundle": true}),
    );

    let project = fx.initialize(AddonSettings::default());
    let shared = named(&all_addons(&project), "shared");

    assert_eq!(shared.len(), 2);
    let real: Vec<_> = shared.iter().filter(|a| !a.is_proxy()).collect();
    let proxies: Vec<_> = shared.iter().filter(|a| a.is_proxy()).collect();
    assert_eq!(real.len(), 1);
    assert_eq!(proxies.len(), 1);

    let target = proxies[0].real_instance().unwrap();
    assert!(Arc::ptr_eq(&target, &real[0].real_instance().unwrap()));
    assert_eq!(proxies[0].parent().name(), "p2");
    assert_eq!(target.parent().name(), "p1");
    assert_eq!(project.cache_stats().proxies, 1);
}

#[test]
fn test_declared_name_is_shared_by_instance_and_proxies() {
    let fx = Fixture::new(json!({"name": "app", "dependencies": {"p1": "*", "p2": "*"}}));
    fx.addon("node_modules/p1", "p1", &["shared"]);
    fx.addon("node_modules/p2", "p2", &["shared"]);
    fx.declarative(
        "node_modules/shared",
        "shared",
        &[],
        json!({"name": "shared-display", "allowCachingPerBundle": true}),
    );

    let project = fx.initialize(AddonSettings::default());
    let all = all_addons(&project);
    assert!(named(&all, "shared").is_empty());

    let shared = named(&all, "shared-display");
    assert_eq!(shared.len(), 2);
    assert_eq!(shared.iter().filter(|a| a.is_proxy()).count(), 1);
}

#[test]
fn test_caching_disabled_constructs_fresh() {
    let fx = shared_fixture();
    let project = fx.initialize(AddonSettings::default().instance_caching(false));

    let shared = named(&all_addons(&project), "shared");
    assert_eq!(shared.len(), 3);
    assert!(shared.iter().all(|a| !a.is_proxy()));
    assert_eq!(project.cache_stats().proxies, 0);
}

#[test]
fn test_opted_out_addon_is_never_proxied() {
    let fx = Fixture::new(json!({"name": "app", "dependencies": {"p1": "*", "p2": "*"}}));
    fx.addon("node_modules/p1", "p1", &["plain"]);
    fx.addon("node_modules/p2", "p2", &["plain"]);
    fx.addon("node_modules/plain", "plain", &[]);

    let project = fx.initialize(AddonSettings::default());
    let plain = named(&all_addons(&project), "plain");
    assert_eq!(plain.len(), 2);
    assert!(plain.iter().all(|a| !a.is_proxy()));
}

#[test]
fn test_proxy_contract() {
    let fx = shared_fixture();
    let project = fx.initialize(AddonSettings::default());
    let all = all_addons(&project);

    let proxy = all
        .iter()
        .find(|a| a.name() == "shared" && a.is_proxy())
        .unwrap()
        .clone();
    let real = proxy.real_instance().unwrap();

    // children and included are not forwarded
    assert!(proxy.addons().is_empty());
    proxy.included(&project.as_parent()).unwrap();

    // app stays local to the proxy
    proxy.set_app(Arc::new("proxy-app"));
    assert!(proxy.app().is_some());
    assert!(real.app().is_none());

    // patched preprocessing stays local too
    proxy.set_preprocess_tree(Arc::new(|_: &str, tree: String| format!("{}!", tree)));
    assert_eq!(proxy.preprocess_tree("js", "t".into()).unwrap(), "t!");
    assert_eq!(real.preprocess_tree("js", "t".into()).unwrap(), "t");

    // cache keys forward and stay stable
    let first = proxy.cache_key_for_tree("js").unwrap();
    assert_eq!(first, proxy.cache_key_for_tree("js").unwrap());
    assert_eq!(first, real.cache_key_for_tree("js").unwrap());
    assert_eq!(proxy.root(), real.root());
}

#[test]
fn test_unstable_cache_key_is_fatal() {
    let fx = shared_fixture();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let loader = RegistryLoader::new().with(
        "shared",
        AddonDefinition::new()
            .with_caching_per_bundle(true)
            .with_cache_key(move |_, tree_type| {
                format!("{}-{}", tree_type, counter.fetch_add(1, Ordering::SeqCst))
            }),
    );

    let project = fx.load(ProjectOptions::new().with_loader(Arc::new(loader)));
    project.initialize_addons().unwrap();
    let proxy = all_addons(&project)
        .into_iter()
        .find(|a| a.name() == "shared" && a.is_proxy())
        .unwrap();

    proxy.cache_key_for_tree("js").unwrap();
    match proxy.cache_key_for_tree("js") {
        Err(Error::UnstableCacheKey {
            name,
            tree_type,
            old_key,
            new_key,
            ..
        }) => {
            assert_eq!(name, "shared");
            assert_eq!(tree_type, "js");
            assert_ne!(old_key, new_key);
        }
        other => panic!("expected UnstableCacheKey, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_included_runs_once_on_real_instance() {
    let fx = shared_fixture();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let loader = RegistryLoader::new().with(
        "shared",
        AddonDefinition::new()
            .with_caching_per_bundle(true)
            .on_included(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
    );

    let project = fx.load(ProjectOptions::new().with_loader(Arc::new(loader)));
    project.initialize_addons().unwrap();
    project.include_addons().unwrap();

    // one real instance, two proxies
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(project.cache_stats().proxies, 2);
}

#[test]
fn test_constructor_failure_identifies_addon() {
    let fx = Fixture::new(json!({"name": "app", "dependencies": {"bad": "*"}}));
    fx.addon("node_modules/bad", "bad", &[]);
    let loader = RegistryLoader::new().with(
        "bad",
        AddonDefinition::new().on_init(|_| Err("constructor threw".into())),
    );

    let project = fx.load(ProjectOptions::new().with_loader(Arc::new(loader)));
    match project.initialize_addons() {
        Err(Error::ConstructorFailure { name, path, message }) => {
            assert_eq!(name, "bad");
            assert!(path.ends_with("node_modules/bad"));
            assert_eq!(message, "constructor threw");
        }
        other => panic!("expected ConstructorFailure, got {:?}", other),
    }
}

#[test]
fn test_dependency_cycle_with_caching() {
    let fx = Fixture::new(json!({"name": "app", "dependencies": {"a": "*"}}));
    fx.declarative("node_modules/a", "a", &["b"], json!({"allowCachingPerBundle": true}));
    fx.declarative("node_modules/b", "b", &["a"], json!({"allowCachingPerBundle": true}));

    let project = fx.initialize(AddonSettings::default());
    let a = project.addons()[0].clone();
    let b = a.addons()[0].clone();
    let a_again = b.addons()[0].clone();

    assert!(!a.is_proxy());
    assert!(a_again.is_proxy());
    assert!(Arc::ptr_eq(
        &a_again.real_instance().unwrap(),
        &a.real_instance().unwrap()
    ));
}

// ============================================================================
// Lazy Engines
// ============================================================================

#[test]
fn test_lazy_engine_unique_per_project() {
    let fx = Fixture::new(json!({"name": "app", "dependencies": {"engine": "*", "p1": "*", "p2": "*"}}));
    fx.declarative(
        "node_modules/engine",
        "engine",
        &[],
        json!({"lazyLoading": {"enabled": true}}),
    );
    fx.addon("node_modules/p1", "p1", &["engine"]);
    fx.addon("node_modules/p2", "p2", &["engine"]);

    let project = fx.initialize(AddonSettings::default());
    let engines = named(&all_addons(&project), "engine");

    assert_eq!(engines.len(), 3);
    assert_eq!(engines.iter().filter(|e| !e.is_proxy()).count(), 1);
    assert_eq!(engines.iter().filter(|e| e.is_proxy()).count(), 2);
    assert!(engines.iter().all(|e| e.is_lazy_engine()));

    let entry = project
        .instantiator()
        .bundle_cache()
        .engine_entry("engine")
        .unwrap();
    assert_eq!(entry.state(), EntryState::Filled);
}

fn engine_fixture() -> Fixture {
    let fx = Fixture::new(json!({"name": "app", "dependencies": {"engine": "*", "shared": "*"}}));
    fx.declarative(
        "node_modules/engine",
        "engine",
        &["shared"],
        json!({"lazyLoading": {"enabled": true}}),
    );
    fx.declarative(
        "node_modules/shared",
        "shared",
        &[],
        json!({"allowCachingPerBundle": true}),
    );
    fx
}

#[test]
fn test_engine_owns_its_own_instances() {
    let fx = engine_fixture();
    let project = fx.initialize(AddonSettings::default());

    let engine = project.find_addon("engine").unwrap();
    let in_engine = engine.addons()[0].clone();
    let in_project = project.find_addon("shared").unwrap();

    assert!(!in_engine.is_proxy());
    assert!(!in_project.is_proxy());
    assert!(!Arc::ptr_eq(
        &in_engine.real_instance().unwrap(),
        &in_project.real_instance().unwrap()
    ));
}

#[test]
fn test_engine_dedupe_shares_project_instance() {
    let fx = engine_fixture();
    let project = fx.initialize(AddonSettings::default().engines_addon_dedupe(true));

    let engine = project.find_addon("engine").unwrap();
    let in_engine = engine.addons()[0].clone();
    let in_project = project.find_addon("shared").unwrap();

    // the engine was instantiated first and received a proxy to a pending
    // entry; the project filled that same entry afterwards
    assert_eq!(names(&project.addons()), vec!["engine", "shared"]);
    assert!(in_engine.is_proxy());
    assert!(!in_project.is_proxy());
    assert!(Arc::ptr_eq(
        &in_engine.real_instance().unwrap(),
        &in_project.real_instance().unwrap()
    ));
    assert_eq!(project.cache_stats().instances, 2);
}
