//! Header search paths for pods built as frameworks

/// Default base directory variable for framework products
pub const DEFAULT_BASE_DIR: &str = "PODS_CONFIGURATION_BUILD_DIR";

/// Frameworks cannot contain `-` in their name
pub fn framework_name_for(pod_name: &str) -> String {
    pod_name.replace('-', "_")
}

/// Header search paths pointing into a pod's framework bundle.
///
/// With zero or one platform a single `${BASE}/POD/NAME.framework/Headers`
/// root is used; with several, one root per platform (`${BASE}-PLATFORM`).
/// `additional_paths` are appended under each root; the root itself is
/// included only when `include_base` is set.
pub fn header_search_paths_for_framework(
    base_dir: &str,
    pod_name: &str,
    framework_name: Option<&str>,
    additional_paths: &[&str],
    include_base: bool,
    platforms: &[String],
) -> Vec<String> {
    let framework = framework_name
        .map(String::from)
        .unwrap_or_else(|| framework_name_for(pod_name));

    let roots: Vec<String> = if platforms.len() <= 1 {
        vec![format!("${{{}}}", base_dir)]
    } else {
        platforms
            .iter()
            .map(|platform| format!("${{{}}}-{}", base_dir, platform))
            .collect()
    };

    let mut paths = Vec::new();
    for root in roots {
        let base = format!("{}/{}/{}.framework/Headers", root, pod_name, framework);
        if include_base {
            paths.push(base.clone());
        }
        for extra in additional_paths {
            paths.push(format!("{}/{}", base, extra));
        }
    }
    paths
}

/// Core pods whose framework headers consumers need: (pod, framework, sub-paths)
const REACT_FRAMEWORK_HEADERS: &[(&str, Option<&str>, &[&str])] = &[
    ("ReactCommon", None, &["react/nativemodule/core"]),
    ("React-RCTFabric", Some("RCTFabric"), &[]),
    ("React-Fabric", None, &["react/renderer/components/view/platform/cxx"]),
    ("React-FabricImage", None, &[]),
    ("React-graphics", None, &["react/renderer/graphics/platform/ios"]),
    ("React-NativeModulesApple", None, &[]),
    ("React-featureflags", None, &[]),
    ("React-utils", None, &[]),
    ("React-debug", None, &[]),
    ("React-rendererdebug", None, &[]),
];

/// Search paths every framework consumer of the core pods needs
pub fn react_framework_search_paths(platforms: &[String]) -> Vec<String> {
    REACT_FRAMEWORK_HEADERS
        .iter()
        .flat_map(|(pod, framework, extra)| {
            header_search_paths_for_framework(DEFAULT_BASE_DIR, pod, *framework, extra, true, platforms)
        })
        .collect()
}
