//! Post-install patcher
//!
//! Applies a fixed, ordered sequence of mutations to the pods project once the
//! package manager has generated it. Every mutation is idempotent, and every
//! flag-dependent one reads the resolved [`BuildConfiguration`] passed in
//! rather than recomputing it.

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::constants::{FOLLY_COMPILER_FLAGS, MIN_IOS_VERSION_SUPPORTED, NEW_ARCH_FLAG};
use crate::flags::BuildConfiguration;
use crate::project::{BuildProject, TargetKind};
use crate::search_paths::react_framework_search_paths;

const SWIFT_5_LIBRARY_PATH: &str = "$(TOOLCHAIN_DIR)/usr/lib/swift-5.0/$(PLATFORM_NAME)";
const SDK_SWIFT_LIBRARY_PATH: &str = "$(SDKROOT)/usr/lib/swift";
const XCODE_15_DEFINE: &str = "_LIBCPP_ENABLE_CXX17_REMOVED_UNARY_BINARY_FUNCTION";
const LD_CLASSIC_FLAG: &str = "-Wl,-ld_classic";
const HERMES_TARGETS: &[&str] = &["React-hermes", "hermes-engine"];

/// One step of the post-install sequence, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mutation {
    ResourceBundles,
    MacCatalyst,
    HermesPreprocessor,
    LibrarySearchPaths,
    FrameworkSearchPaths,
    UseHermesSetting,
    ReactNativePathSetting,
    Ccache,
    Xcode15,
    DeploymentTarget,
    DynamicFrameworks,
    ReleaseNdebug,
    CxxLanguageStandard,
    NewArchitectureFlags,
}

impl Mutation {
    /// Fixed application order
    pub const ORDER: [Mutation; 14] = [
        Mutation::ResourceBundles,
        Mutation::MacCatalyst,
        Mutation::HermesPreprocessor,
        Mutation::LibrarySearchPaths,
        Mutation::FrameworkSearchPaths,
        Mutation::UseHermesSetting,
        Mutation::ReactNativePathSetting,
        Mutation::Ccache,
        Mutation::Xcode15,
        Mutation::DeploymentTarget,
        Mutation::DynamicFrameworks,
        Mutation::ReleaseNdebug,
        Mutation::CxxLanguageStandard,
        Mutation::NewArchitectureFlags,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceBundles => "resource-bundles",
            Self::MacCatalyst => "mac-catalyst",
            Self::HermesPreprocessor => "hermes-preprocessor",
            Self::LibrarySearchPaths => "library-search-paths",
            Self::FrameworkSearchPaths => "framework-search-paths",
            Self::UseHermesSetting => "use-hermes-setting",
            Self::ReactNativePathSetting => "react-native-path-setting",
            Self::Ccache => "ccache",
            Self::Xcode15 => "xcode-15",
            Self::DeploymentTarget => "deployment-target",
            Self::DynamicFrameworks => "dynamic-frameworks",
            Self::ReleaseNdebug => "release-ndebug",
            Self::CxxLanguageStandard => "cxx-language-standard",
            Self::NewArchitectureFlags => "new-architecture-flags",
        }
    }
}

/// Host and project facts the patcher needs besides the resolved flags
#[derive(Debug, Clone, Default)]
pub struct PatchOptions {
    pub mac_catalyst_enabled: bool,
    /// Whether a `ccache` binary is on PATH
    pub ccache_available: bool,
    /// Installed Xcode version, if known
    pub xcode_version: Option<semver::Version>,
    /// Platforms framework header search paths are generated for
    pub platforms: Vec<String>,
}

/// What a patch run did
#[derive(Debug, Clone, Default, Serialize)]
pub struct PatchReport {
    pub applied: Vec<Mutation>,
    pub warnings: Vec<String>,
}

/// Applies the post-install sequence
pub struct PostInstallPatcher<'a> {
    config: &'a BuildConfiguration,
    options: PatchOptions,
}

impl<'a> PostInstallPatcher<'a> {
    pub fn new(config: &'a BuildConfiguration, options: PatchOptions) -> Self {
        Self { config, options }
    }

    /// Apply every mutation in order
    #[instrument(skip_all, fields(targets = project.targets.len()))]
    pub fn apply(&self, project: &mut BuildProject) -> PatchReport {
        let mut report = PatchReport::default();
        for mutation in Mutation::ORDER {
            if self.apply_one(mutation, project, &mut report.warnings) {
                debug!(mutation = mutation.as_str(), "applied");
                report.applied.push(mutation);
            }
        }
        info!(applied = report.applied.len(), "post-install patches applied");
        report
    }

    /// Returns `false` when the mutation does not apply to this configuration
    fn apply_one(&self, mutation: Mutation, project: &mut BuildProject, warnings: &mut Vec<String>) -> bool {
        match mutation {
            Mutation::ResourceBundles => clear_react_core_bundles(project),
            Mutation::MacCatalyst => {
                if !self.options.mac_catalyst_enabled {
                    return false;
                }
                apply_mac_catalyst(project)
            }
            Mutation::HermesPreprocessor => {
                if !self.config.hermes_enabled() {
                    return false;
                }
                set_hermes_preprocessor(project)
            }
            Mutation::LibrarySearchPaths => fix_library_search_paths(project),
            Mutation::FrameworkSearchPaths => {
                if !self.config.use_frameworks().is_used() {
                    return false;
                }
                add_framework_search_paths(project, &self.options.platforms)
            }
            Mutation::UseHermesSetting => {
                let value = if self.config.hermes_enabled() { "true" } else { "false" };
                for cfg in &mut project.configurations {
                    cfg.settings.set_scalar("USE_HERMES", value);
                }
                true
            }
            Mutation::ReactNativePathSetting => {
                let value = format!(
                    "${{PODS_ROOT}}/../{}",
                    self.config.react_native_path().to_string_lossy()
                );
                for cfg in &mut project.configurations {
                    cfg.settings.set_scalar("REACT_NATIVE_PATH", value.clone());
                }
                true
            }
            Mutation::Ccache => self.apply_ccache(project, warnings),
            Mutation::Xcode15 => self.apply_xcode_15(project),
            Mutation::DeploymentTarget => raise_deployment_target(project),
            Mutation::DynamicFrameworks => {
                if self.config.use_frameworks() != crate::flags::UseFrameworks::Dynamic {
                    return false;
                }
                for cfg in project.target_configurations_mut() {
                    cfg.settings.append_unique("OTHER_CFLAGS", &["-DRCT_DYNAMIC_FRAMEWORKS=1"]);
                }
                true
            }
            Mutation::ReleaseNdebug => {
                for cfg in project.target_configurations_mut().filter(|c| c.is_release()) {
                    cfg.settings.append_unique("OTHER_CFLAGS", &["-DNDEBUG"]);
                    cfg.settings.append_unique("OTHER_CPLUSPLUSFLAGS", &["-DNDEBUG"]);
                }
                true
            }
            Mutation::CxxLanguageStandard => copy_cxx_standard(project),
            Mutation::NewArchitectureFlags => {
                if !self.config.new_arch_enabled() {
                    return false;
                }
                let mut flags = vec![NEW_ARCH_FLAG];
                flags.extend(FOLLY_COMPILER_FLAGS.split_whitespace());
                for cfg in project.target_configurations_mut() {
                    cfg.settings.append_unique("OTHER_CPLUSPLUSFLAGS", flags.as_slice());
                }
                true
            }
        }
    }

    fn apply_ccache(&self, project: &mut BuildProject, warnings: &mut Vec<String>) -> bool {
        if !self.config.ccache_enabled() {
            return false;
        }
        if !self.options.ccache_available {
            let message =
                "ccache is enabled but was not found on PATH; install it with `brew install ccache`".to_string();
            warn!("{}", message);
            warnings.push(message);
            return false;
        }

        let c = "$(REACT_NATIVE_PATH)/scripts/xcode/ccache-clang.sh";
        let cxx = "$(REACT_NATIVE_PATH)/scripts/xcode/ccache-clang++.sh";
        for cfg in &mut project.configurations {
            cfg.settings.set_scalar("CC", c);
            cfg.settings.set_scalar("LD", c);
            cfg.settings.set_scalar("CXX", cxx);
            cfg.settings.set_scalar("LDPLUSPLUS", cxx);
        }
        true
    }

    fn apply_xcode_15(&self, project: &mut BuildProject) -> bool {
        let ld_classic = self
            .options
            .xcode_version
            .as_ref()
            .is_some_and(|v| v.major == 15 && v.minor == 0);

        for cfg in project.target_configurations_mut() {
            cfg.settings
                .append_unique("GCC_PREPROCESSOR_DEFINITIONS", &[XCODE_15_DEFINE]);
            if ld_classic {
                cfg.settings.append_unique("OTHER_LDFLAGS", &[LD_CLASSIC_FLAG]);
            } else if cfg.settings.contains_token("OTHER_LDFLAGS", LD_CLASSIC_FLAG) {
                cfg.settings.remove_token("OTHER_LDFLAGS", LD_CLASSIC_FLAG);
            }
        }
        true
    }
}

fn clear_react_core_bundles(project: &mut BuildProject) -> bool {
    match project.target_mut("React-Core") {
        Some(target) => {
            target.resource_bundles.clear();
            true
        }
        None => false,
    }
}

fn apply_mac_catalyst(project: &mut BuildProject) -> bool {
    for target in &mut project.targets {
        let is_bundle = target.kind == TargetKind::ResourceBundle;
        for cfg in &mut target.configurations {
            cfg.settings.set_scalar("DEAD_CODE_STRIPPING", "YES");
            if is_bundle {
                cfg.settings.set_scalar("CODE_SIGN_IDENTITY[sdk=macosx*]", "-");
            }
        }
    }
    true
}

fn set_hermes_preprocessor(project: &mut BuildProject) -> bool {
    let mut touched = false;
    for target in project
        .targets
        .iter_mut()
        .filter(|t| HERMES_TARGETS.contains(&t.name.as_str()))
    {
        for cfg in target.configurations.iter_mut().filter(|c| c.is_debug()) {
            cfg.settings
                .append_unique("GCC_PREPROCESSOR_DEFINITIONS", &["HERMES_ENABLED=1"]);
            touched = true;
        }
    }
    touched
}

fn fix_library_search_paths(project: &mut BuildProject) -> bool {
    for cfg in project
        .configurations
        .iter_mut()
        .chain(project.targets.iter_mut().flat_map(|t| t.configurations.iter_mut()))
    {
        if cfg.settings.get("LIBRARY_SEARCH_PATHS").is_none() {
            continue;
        }
        cfg.settings.remove_token("LIBRARY_SEARCH_PATHS", SWIFT_5_LIBRARY_PATH);
        cfg.settings
            .append_unique("LIBRARY_SEARCH_PATHS", &[SDK_SWIFT_LIBRARY_PATH]);
    }
    true
}

fn add_framework_search_paths(project: &mut BuildProject, platforms: &[String]) -> bool {
    let paths = react_framework_search_paths(platforms);
    for target in project
        .targets
        .iter_mut()
        .filter(|t| t.kind == TargetKind::Aggregate)
    {
        for cfg in &mut target.configurations {
            cfg.settings.append_unique("HEADER_SEARCH_PATHS", paths.as_slice());
        }
    }
    true
}

fn raise_deployment_target(project: &mut BuildProject) -> bool {
    let Some(minimum) = parse_os_version(MIN_IOS_VERSION_SUPPORTED) else {
        return false;
    };
    for cfg in project.target_configurations_mut() {
        let current = cfg
            .settings
            .scalar("IPHONEOS_DEPLOYMENT_TARGET")
            .and_then(parse_os_version);
        if let Some(current) = current {
            if current < minimum {
                cfg.settings
                    .set_scalar("IPHONEOS_DEPLOYMENT_TARGET", MIN_IOS_VERSION_SUPPORTED);
            }
        }
    }
    true
}

fn copy_cxx_standard(project: &mut BuildProject) -> bool {
    let standard = project.target("React-Core").and_then(|t| {
        t.configurations
            .iter()
            .find_map(|c| c.settings.scalar("CLANG_CXX_LANGUAGE_STANDARD"))
            .map(String::from)
    });
    let Some(standard) = standard else {
        return false;
    };

    for cfg in &mut project.configurations {
        cfg.settings
            .set_scalar("CLANG_CXX_LANGUAGE_STANDARD", standard.clone());
    }
    true
}

/// `13.4` style versions as comparable tuples
fn parse_os_version(s: &str) -> Option<(u64, u64, u64)> {
    let mut parts = s.trim().split('.').map(|p| p.parse::<u64>());
    let major = parts.next()?.ok()?;
    let minor = parts.next().unwrap_or(Ok(0)).ok()?;
    let patch = parts.next().unwrap_or(Ok(0)).ok()?;
    Some((major, minor, patch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvironmentOverrides;
    use crate::flags::{resolve, FlagInputs, UseFrameworks};
    use crate::project::{Target, XcodeConfiguration};
    use crate::version::ReactNativeVersion;

    fn config(inputs: FlagInputs) -> BuildConfiguration {
        resolve(
            &inputs,
            ReactNativeVersion::Known("0.74.0".to_string()),
            &EnvironmentOverrides::default(),
        )
        .unwrap()
    }

    fn sample_project() -> BuildProject {
        let mut core = Target::new("React-Core", TargetKind::Pod);
        core.resource_bundles = vec!["AccessibilityResources".to_string()];
        for cfg in &mut core.configurations {
            cfg.settings.set_scalar("CLANG_CXX_LANGUAGE_STANDARD", "c++20");
            cfg.settings.set_scalar("IPHONEOS_DEPLOYMENT_TARGET", "12.0");
            cfg.settings.set_scalar(
                "LIBRARY_SEARCH_PATHS",
                format!("$(inherited) {}", SWIFT_5_LIBRARY_PATH),
            );
        }

        let mut hermes = Target::new("hermes-engine", TargetKind::Pod);
        for cfg in &mut hermes.configurations {
            cfg.settings.set_scalar("IPHONEOS_DEPLOYMENT_TARGET", "15.1");
        }

        BuildProject {
            configurations: vec![XcodeConfiguration::new("Debug"), XcodeConfiguration::new("Release")],
            targets: vec![
                core,
                hermes,
                Target::new("Pods-App", TargetKind::Aggregate),
                Target::new("React-Core-Resources", TargetKind::ResourceBundle),
            ],
        }
    }

    fn full_options() -> PatchOptions {
        PatchOptions {
            mac_catalyst_enabled: true,
            ccache_available: true,
            xcode_version: Some(semver::Version::new(15, 0, 1)),
            platforms: Vec::new(),
        }
    }

    #[test]
    fn test_idempotent() {
        let cfg = config(FlagInputs {
            new_arch_enabled: Some(true),
            use_frameworks: Some(UseFrameworks::Dynamic),
            ccache_enabled: Some(true),
            ..FlagInputs::default()
        });
        let patcher = PostInstallPatcher::new(&cfg, full_options());

        let mut once = sample_project();
        patcher.apply(&mut once);

        let mut twice = sample_project();
        patcher.apply(&mut twice);
        patcher.apply(&mut twice);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_all_mutations_apply_with_everything_on() {
        let cfg = config(FlagInputs {
            new_arch_enabled: Some(true),
            use_frameworks: Some(UseFrameworks::Dynamic),
            ccache_enabled: Some(true),
            ..FlagInputs::default()
        });
        let report = PostInstallPatcher::new(&cfg, full_options()).apply(&mut sample_project());
        assert_eq!(report.applied, Mutation::ORDER.to_vec());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_hermes_preprocessor_follows_config() {
        let cfg = config(FlagInputs::default());
        let mut project = sample_project();
        PostInstallPatcher::new(&cfg, PatchOptions::default()).apply(&mut project);

        let hermes = project.target("hermes-engine").unwrap();
        let debug = hermes.configurations.iter().find(|c| c.is_debug()).unwrap();
        let release = hermes.configurations.iter().find(|c| c.is_release()).unwrap();
        assert!(debug.settings.contains_token("GCC_PREPROCESSOR_DEFINITIONS", "HERMES_ENABLED=1"));
        assert!(!release.settings.contains_token("GCC_PREPROCESSOR_DEFINITIONS", "HERMES_ENABLED=1"));
        assert_eq!(project.configurations[0].settings.scalar("USE_HERMES"), Some("true"));

        let cfg = config(FlagInputs {
            hermes_enabled: Some(false),
            ..FlagInputs::default()
        });
        let mut project = sample_project();
        let report = PostInstallPatcher::new(&cfg, PatchOptions::default()).apply(&mut project);
        assert!(!report.applied.contains(&Mutation::HermesPreprocessor));
        assert_eq!(project.configurations[0].settings.scalar("USE_HERMES"), Some("false"));
    }

    #[test]
    fn test_library_search_paths() {
        let cfg = config(FlagInputs::default());
        let mut project = sample_project();
        PostInstallPatcher::new(&cfg, PatchOptions::default()).apply(&mut project);

        let core = project.target("React-Core").unwrap();
        let settings = &core.configurations[0].settings;
        assert!(!settings.contains_token("LIBRARY_SEARCH_PATHS", SWIFT_5_LIBRARY_PATH));
        assert!(settings.contains_token("LIBRARY_SEARCH_PATHS", SDK_SWIFT_LIBRARY_PATH));
    }

    #[test]
    fn test_deployment_target_only_raised() {
        let cfg = config(FlagInputs::default());
        let mut project = sample_project();
        PostInstallPatcher::new(&cfg, PatchOptions::default()).apply(&mut project);

        let core = project.target("React-Core").unwrap();
        assert_eq!(
            core.configurations[0].settings.scalar("IPHONEOS_DEPLOYMENT_TARGET"),
            Some(MIN_IOS_VERSION_SUPPORTED)
        );
        let hermes = project.target("hermes-engine").unwrap();
        assert_eq!(
            hermes.configurations[0].settings.scalar("IPHONEOS_DEPLOYMENT_TARGET"),
            Some("15.1")
        );
    }

    #[test]
    fn test_ccache_unavailable_warns() {
        let cfg = config(FlagInputs {
            ccache_enabled: Some(true),
            ..FlagInputs::default()
        });
        let mut project = sample_project();
        let report = PostInstallPatcher::new(&cfg, PatchOptions::default()).apply(&mut project);
        assert_eq!(report.warnings.len(), 1);
        assert!(project.configurations[0].settings.get("CC").is_none());
    }

    #[test]
    fn test_new_arch_flags_and_cxx_standard() {
        let cfg = config(FlagInputs {
            new_arch_enabled: Some(true),
            ..FlagInputs::default()
        });
        let mut project = sample_project();
        PostInstallPatcher::new(&cfg, PatchOptions::default()).apply(&mut project);

        let app = project.target("Pods-App").unwrap();
        let settings = &app.configurations[0].settings;
        assert!(settings.contains_token("OTHER_CPLUSPLUSFLAGS", NEW_ARCH_FLAG));
        assert!(settings.contains_token("OTHER_CPLUSPLUSFLAGS", "-DFOLLY_NO_CONFIG"));
        assert_eq!(
            project.configurations[1].settings.scalar("CLANG_CXX_LANGUAGE_STANDARD"),
            Some("c++20")
        );
        // no frameworks requested
        assert!(settings.get("HEADER_SEARCH_PATHS").is_none());
    }

    #[test]
    fn test_ld_classic_only_for_xcode_15_0() {
        let cfg = config(FlagInputs::default());
        let mut project = sample_project();
        let options = PatchOptions {
            xcode_version: Some(semver::Version::new(15, 3, 0)),
            ..PatchOptions::default()
        };
        PostInstallPatcher::new(&cfg, options).apply(&mut project);
        let settings = &project.targets[0].configurations[0].settings;
        assert!(settings.contains_token("GCC_PREPROCESSOR_DEFINITIONS", XCODE_15_DEFINE));
        assert!(settings.get("OTHER_LDFLAGS").is_none());
    }

    #[test]
    fn test_ld_classic_dropped_after_xcode_upgrade() {
        let cfg = config(FlagInputs::default());
        let mut project = sample_project();
        let on_15_0 = PatchOptions {
            xcode_version: Some(semver::Version::new(15, 0, 0)),
            ..PatchOptions::default()
        };
        PostInstallPatcher::new(&cfg, on_15_0).apply(&mut project);
        assert!(project.targets[0].configurations[0]
            .settings
            .contains_token("OTHER_LDFLAGS", LD_CLASSIC_FLAG));

        let on_16 = PatchOptions {
            xcode_version: Some(semver::Version::new(16, 1, 0)),
            ..PatchOptions::default()
        };
        PostInstallPatcher::new(&cfg, on_16).apply(&mut project);
        for target in &project.targets {
            for cfg in &target.configurations {
                assert!(!cfg.settings.contains_token("OTHER_LDFLAGS", LD_CLASSIC_FLAG));
                assert!(cfg.settings.contains_token("OTHER_LDFLAGS", crate::project::INHERITED));
            }
        }
    }

    #[test]
    fn test_parse_os_version() {
        assert_eq!(parse_os_version("13.4"), Some((13, 4, 0)));
        assert_eq!(parse_os_version("9"), Some((9, 0, 0)));
        assert_eq!(parse_os_version("x"), None);
        assert!(parse_os_version("12.0") < parse_os_version("13.4"));
    }
}
