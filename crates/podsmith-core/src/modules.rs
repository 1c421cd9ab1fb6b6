//! Build requirements for third-party native modules
//!
//! Library podspecs call into this to pick up the folly flags, search paths and
//! dependencies that match the app's resolved configuration, instead of
//! hard-coding values that drift with every framework release.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{CPP_LANGUAGE_STANDARD, FOLLY_COMPILER_FLAGS, FOLLY_VERSION, NEW_ARCH_FLAG};
use crate::flags::{BuildConfiguration, JsEngine};
use crate::project::INHERITED;
use crate::search_paths::{header_search_paths_for_framework, DEFAULT_BASE_DIR};

/// The parts of a module podspec that get merged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSpec {
    #[serde(default)]
    pub compiler_flags: String,
    #[serde(default)]
    pub pod_target_xcconfig: BTreeMap<String, String>,
}

/// A pod dependency, optionally version-pinned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDependency {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub version: Option<String>,
}

impl ModuleDependency {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: None,
        }
    }

    fn pinned(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: Some(version.to_string()),
        }
    }
}

/// Merged module spec plus the dependencies it must declare
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDependencies {
    pub spec: ModuleSpec,
    pub dependencies: Vec<ModuleDependency>,
}

const FABRIC_DEPENDENCIES: &[&str] = &[
    "React-RCTFabric",
    "ReactCodegen",
    "RCTRequired",
    "RCTTypeSafety",
    "ReactCommon/turbomodule/bridging",
    "ReactCommon/turbomodule/core",
    "React-NativeModulesApple",
    "Yoga",
    "React-Fabric",
    "React-graphics",
    "React-utils",
    "React-featureflags",
    "React-debug",
    "React-ImageManager",
    "React-rendererdebug",
];

/// Merge framework requirements into a module spec. Merging twice is a no-op.
pub fn module_dependencies(
    existing: &ModuleSpec,
    config: &BuildConfiguration,
    platforms: &[String],
) -> ModuleDependencies {
    let mut spec = existing.clone();
    spec.compiler_flags = append_words(&spec.compiler_flags, FOLLY_COMPILER_FLAGS);

    let mut header_paths = vec![
        "\"$(PODS_ROOT)/boost\"".to_string(),
        "\"$(PODS_ROOT)/Headers/Private/Yoga\"".to_string(),
    ];
    if config.use_frameworks().is_used() {
        header_paths.push("\"$(PODS_ROOT)/DoubleConversion\"".to_string());
        header_paths.push("\"$(PODS_ROOT)/fmt/include\"".to_string());
        for (pod, extra) in [
            ("React-graphics", "react/renderer/graphics/platform/ios"),
            ("React-Fabric", "react/renderer/components/view/platform/cxx"),
            ("React-FabricImage", ""),
            ("React-utils", ""),
            ("React-debug", ""),
            ("React-rendererdebug", ""),
            ("React-featureflags", ""),
        ] {
            let extra: Vec<&str> = if extra.is_empty() { vec![] } else { vec![extra] };
            header_paths.extend(
                header_search_paths_for_framework(DEFAULT_BASE_DIR, pod, None, &extra, true, platforms)
                    .into_iter()
                    .map(|p| format!("\"{}\"", p)),
            );
        }
    }

    let xcconfig = &mut spec.pod_target_xcconfig;
    let headers = xcconfig.get("HEADER_SEARCH_PATHS").cloned().unwrap_or_default();
    xcconfig.insert(
        "HEADER_SEARCH_PATHS".to_string(),
        append_words(&headers, &header_paths.join(" ")),
    );
    xcconfig.insert(
        "CLANG_CXX_LANGUAGE_STANDARD".to_string(),
        CPP_LANGUAGE_STANDARD.to_string(),
    );
    if config.new_arch_enabled() {
        let cpp = xcconfig
            .get("OTHER_CPLUSPLUSFLAGS")
            .cloned()
            .unwrap_or_else(|| INHERITED.to_string());
        let wanted = format!("{} {}", NEW_ARCH_FLAG, FOLLY_COMPILER_FLAGS);
        xcconfig.insert("OTHER_CPLUSPLUSFLAGS".to_string(), append_words(&cpp, &wanted));
    }

    let mut dependencies = vec![
        ModuleDependency::new("React-Core"),
        ModuleDependency::pinned("RCT-Folly", FOLLY_VERSION),
        ModuleDependency::new("glog"),
    ];
    dependencies.extend(FABRIC_DEPENDENCIES.iter().map(|name| ModuleDependency::new(name)));
    dependencies.push(match config.js_engine() {
        JsEngine::Hermes => ModuleDependency::new("hermes-engine"),
        JsEngine::Jsc => ModuleDependency::new("React-jsi"),
    });

    ModuleDependencies { spec, dependencies }
}

/// Append the words of `extra` that `current` does not contain yet
fn append_words(current: &str, extra: &str) -> String {
    let mut words: Vec<&str> = current.split_whitespace().collect();
    for word in extra.split_whitespace() {
        if !words.contains(&word) {
            words.push(word);
        }
    }
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvironmentOverrides;
    use crate::flags::{resolve, FlagInputs, UseFrameworks};
    use crate::version::ReactNativeVersion;

    fn config(inputs: FlagInputs) -> BuildConfiguration {
        resolve(&inputs, ReactNativeVersion::Unknown, &EnvironmentOverrides::default()).unwrap()
    }

    #[test]
    fn test_old_arch_module() {
        let deps = module_dependencies(&ModuleSpec::default(), &config(FlagInputs::default()), &[]);
        assert_eq!(deps.spec.compiler_flags, FOLLY_COMPILER_FLAGS);
        assert!(!deps.spec.pod_target_xcconfig.contains_key("OTHER_CPLUSPLUSFLAGS"));
        assert_eq!(deps.spec.pod_target_xcconfig["CLANG_CXX_LANGUAGE_STANDARD"], "c++20");
        assert_eq!(deps.dependencies[1], ModuleDependency::pinned("RCT-Folly", FOLLY_VERSION));
        assert_eq!(deps.dependencies.last().unwrap().name, "hermes-engine");
    }

    #[test]
    fn test_new_arch_module_with_frameworks() {
        let cfg = config(FlagInputs {
            new_arch_enabled: Some(true),
            hermes_enabled: Some(false),
            use_frameworks: Some(UseFrameworks::Static),
            ..FlagInputs::default()
        });
        let existing = ModuleSpec {
            compiler_flags: "-Wall".to_string(),
            pod_target_xcconfig: BTreeMap::from([(
                "HEADER_SEARCH_PATHS".to_string(),
                "\"$(PODS_ROOT)/Mine\"".to_string(),
            )]),
        };
        let deps = module_dependencies(&existing, &cfg, &[]);

        assert!(deps.spec.compiler_flags.starts_with("-Wall -DFOLLY_NO_CONFIG"));
        let headers = &deps.spec.pod_target_xcconfig["HEADER_SEARCH_PATHS"];
        assert!(headers.starts_with("\"$(PODS_ROOT)/Mine\""));
        assert!(headers.contains("React_graphics.framework/Headers/react/renderer/graphics/platform/ios"));
        assert!(deps.spec.pod_target_xcconfig["OTHER_CPLUSPLUSFLAGS"].contains(NEW_ARCH_FLAG));
        assert_eq!(deps.dependencies.last().unwrap().name, "React-jsi");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let cfg = config(FlagInputs {
            new_arch_enabled: Some(true),
            ..FlagInputs::default()
        });
        let once = module_dependencies(&ModuleSpec::default(), &cfg, &[]);
        let twice = module_dependencies(&once.spec, &cfg, &[]);
        assert_eq!(once, twice);
    }
}
