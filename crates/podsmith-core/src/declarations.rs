//! Pod declarations
//!
//! Produces the ordered list of pods the package manager registers for a
//! resolved [`BuildConfiguration`]. Order is part of the contract: CocoaPods
//! processes declarations sequentially and later pods assume earlier ones are
//! already on disk. The output contains no clock- or randomness-dependent
//! content, so the same configuration always yields the same plan.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use crate::constants::CODEGEN_POD_NAME;
use crate::error::Result;
use crate::flags::{BuildConfiguration, JsEngine};

/// Where the package manager finds a pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PodSource {
    /// Directory containing the pod's podspec
    Path(String),
    /// Explicit podspec file
    Podspec(String),
}

impl PodSource {
    pub fn location(&self) -> &str {
        match self {
            Self::Path(p) | Self::Podspec(p) => p,
        }
    }
}

/// Package-manager switches attached to a declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodOptions {
    /// Generate module maps for the pod
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub modular_headers: bool,

    /// Source tag pinned for the pod
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tag: Option<String>,
}

/// Phase of the install a declaration belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeclarationGroup {
    Core,
    JsEngine,
    Runtime,
    ThirdParty,
    Codegen,
    Fabric,
    Bridgeless,
}

/// One pod to register
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDeclaration {
    pub name: String,
    pub source: PodSource,
    #[serde(default)]
    pub options: PodOptions,
    pub group: DeclarationGroup,
}

impl DependencyDeclaration {
    fn path(group: DeclarationGroup, name: &str, location: String) -> Self {
        Self {
            name: name.to_string(),
            source: PodSource::Path(location),
            options: PodOptions::default(),
            group,
        }
    }

    fn podspec(group: DeclarationGroup, name: &str, location: String) -> Self {
        Self {
            name: name.to_string(),
            source: PodSource::Podspec(location),
            options: PodOptions::default(),
            group,
        }
    }

    fn modular(mut self) -> Self {
        self.options.modular_headers = true;
        self
    }

    fn tag(mut self, tag: &str) -> Self {
        self.options.tag = Some(tag.to_string());
        self
    }

    /// Render as a Podfile `pod` line
    pub fn to_podfile_line(&self) -> String {
        let key = match self.source {
            PodSource::Path(_) => "path",
            PodSource::Podspec(_) => "podspec",
        };
        let mut line = format!(
            "pod '{}', :{} => '{}'",
            self.name,
            key,
            self.source.location()
        );
        if self.options.modular_headers {
            line.push_str(", :modular_headers => true");
        }
        if let Some(tag) = &self.options.tag {
            line.push_str(&format!(", :tag => '{}'", tag));
        }
        line
    }
}

impl fmt::Display for DependencyDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_podfile_line())
    }
}

/// Declaration list without running the generator
pub fn declare(config: &BuildConfiguration) -> Vec<DependencyDeclaration> {
    let mut no_codegen = |_: &[DependencyDeclaration]| Ok(());
    declare_with(config, &mut no_codegen).unwrap_or_default()
}

/// Build the declaration list, invoking `codegen` after the core, engine,
/// runtime and third-party pods are declared and before the generated-code pod.
#[instrument(skip_all, fields(hermes = config.hermes_enabled(), fabric = config.fabric_enabled()))]
pub fn declare_with<F>(config: &BuildConfiguration, codegen: &mut F) -> Result<Vec<DependencyDeclaration>>
where
    F: FnMut(&[DependencyDeclaration]) -> Result<()>,
{
    let prefix = prefix(config);
    let mut decls = Vec::new();

    decls.extend(core_pods(&prefix));
    decls.extend(js_engine_pods(&prefix, config.js_engine(), config.fabric_enabled()));
    decls.extend(runtime_pods(&prefix));
    decls.extend(third_party_pods(&prefix));

    codegen(&decls)?;

    decls.push(
        DependencyDeclaration::path(
            DeclarationGroup::Codegen,
            CODEGEN_POD_NAME,
            config.codegen_output_dir().to_string_lossy().to_string(),
        )
        .modular(),
    );

    // Fabric is always wired: its bridge adapter is needed even on the old architecture.
    decls.extend(fabric_pods(&prefix));
    decls.extend(bridgeless_pods(&prefix, config.hermes_enabled()));

    debug!(count = decls.len(), "declared pods");
    Ok(decls)
}

/// Render declarations as Podfile lines, one per declaration
pub fn render_podfile(decls: &[DependencyDeclaration]) -> String {
    let mut out = String::new();
    for decl in decls {
        out.push_str(&decl.to_podfile_line());
        out.push('\n');
    }
    out
}

/// SHA-256 of the rendered plan
pub fn fingerprint(decls: &[DependencyDeclaration]) -> String {
    let digest = Sha256::digest(render_podfile(decls).as_bytes());
    format!("{:x}", digest)
}

fn prefix(config: &BuildConfiguration) -> String {
    let raw = config.react_native_path().to_string_lossy();
    let trimmed = raw.trim_end_matches('/');
    if trimmed.is_empty() {
        raw.to_string()
    } else {
        trimmed.to_string()
    }
}

fn core_pods(prefix: &str) -> Vec<DependencyDeclaration> {
    use DeclarationGroup::Core;
    let p = |sub: &str| format!("{}/{}", prefix, sub);

    vec![
        DependencyDeclaration::path(Core, "FBLazyVector", p("Libraries/FBLazyVector")),
        DependencyDeclaration::path(Core, "RCTRequired", p("Libraries/Required")),
        DependencyDeclaration::path(Core, "RCTTypeSafety", p("Libraries/TypeSafety")).modular(),
        DependencyDeclaration::path(Core, "React", p("")),
        DependencyDeclaration::path(Core, "React-Core", p("")),
        DependencyDeclaration::path(Core, "React-CoreModules", p("React/CoreModules")),
        DependencyDeclaration::path(Core, "React-RCTAppDelegate", p("Libraries/AppDelegate")),
        DependencyDeclaration::path(Core, "React-RCTActionSheet", p("Libraries/ActionSheetIOS")),
        DependencyDeclaration::path(Core, "React-RCTAnimation", p("Libraries/NativeAnimation")),
        DependencyDeclaration::path(Core, "React-RCTBlob", p("Libraries/Blob")),
        DependencyDeclaration::path(Core, "React-RCTImage", p("Libraries/Image")),
        DependencyDeclaration::path(Core, "React-RCTLinking", p("Libraries/LinkingIOS")),
        DependencyDeclaration::path(Core, "React-RCTNetwork", p("Libraries/Network")),
        DependencyDeclaration::path(Core, "React-RCTSettings", p("Libraries/Settings")),
        DependencyDeclaration::path(Core, "React-RCTText", p("Libraries/Text")),
        DependencyDeclaration::path(Core, "React-RCTVibration", p("Libraries/Vibration")),
        DependencyDeclaration::path(Core, "React-Core/RCTWebSocket", p("")),
        DependencyDeclaration::path(Core, "React-rncore", p("ReactCommon")),
        DependencyDeclaration::path(Core, "React-cxxreact", p("ReactCommon/cxxreact")),
        DependencyDeclaration::path(Core, "React-debug", p("ReactCommon/react/debug")),
        DependencyDeclaration::path(Core, "React-utils", p("ReactCommon/react/utils")),
        DependencyDeclaration::path(Core, "React-featureflags", p("ReactCommon/react/featureflags")),
        DependencyDeclaration::path(
            Core,
            "React-featureflagsnativemodule",
            p("ReactCommon/react/nativemodule/featureflags"),
        ),
        DependencyDeclaration::path(Core, "React-Mapbuffer", p("ReactCommon")),
        DependencyDeclaration::path(Core, "React-jserrorhandler", p("ReactCommon/jserrorhandler")),
        DependencyDeclaration::path(Core, "React-nativeconfig", p("ReactCommon")),
        DependencyDeclaration::path(
            Core,
            "RCTDeprecation",
            p("ReactApple/Libraries/RCTFoundation/RCTDeprecation"),
        ),
    ]
}

fn js_engine_pods(prefix: &str, engine: JsEngine, fabric_enabled: bool) -> Vec<DependencyDeclaration> {
    use DeclarationGroup::JsEngine as G;
    let p = |sub: &str| format!("{}/{}", prefix, sub);

    let mut pods = vec![DependencyDeclaration::path(G, "React-jsi", p("ReactCommon/jsi"))];
    match engine {
        JsEngine::Hermes => {
            pods.push(DependencyDeclaration::path(G, "React-hermes", p("ReactCommon/hermes")));
            pods.push(
                DependencyDeclaration::podspec(
                    G,
                    "hermes-engine",
                    p("sdks/hermes-engine/hermes-engine.podspec"),
                )
                .tag(""),
            );
        }
        JsEngine::Jsc => {
            pods.push(DependencyDeclaration::path(G, "React-jsc", p("ReactCommon/jsc")));
            if fabric_enabled {
                pods.push(DependencyDeclaration::path(G, "React-jsc/Fabric", p("ReactCommon/jsc")));
            }
        }
    }
    pods
}

fn runtime_pods(prefix: &str) -> Vec<DependencyDeclaration> {
    use DeclarationGroup::Runtime;
    let p = |sub: &str| format!("{}/{}", prefix, sub);

    vec![
        DependencyDeclaration::path(Runtime, "React-jsiexecutor", p("ReactCommon/jsiexecutor")),
        DependencyDeclaration::path(Runtime, "React-jsinspector", p("ReactCommon/jsinspector-modern")),
        DependencyDeclaration::path(Runtime, "React-callinvoker", p("ReactCommon/callinvoker")),
        DependencyDeclaration::path(Runtime, "React-runtimeexecutor", p("ReactCommon/runtimeexecutor")),
        DependencyDeclaration::path(
            Runtime,
            "React-runtimescheduler",
            p("ReactCommon/react/renderer/runtimescheduler"),
        ),
        DependencyDeclaration::path(Runtime, "React-rendererdebug", p("ReactCommon/react/renderer/debug")),
        DependencyDeclaration::path(Runtime, "React-perflogger", p("ReactCommon/reactperflogger")),
        DependencyDeclaration::path(Runtime, "React-logger", p("ReactCommon/logger")),
        DependencyDeclaration::path(Runtime, "ReactCommon/turbomodule/core", p("ReactCommon")).modular(),
        DependencyDeclaration::path(
            Runtime,
            "React-NativeModulesApple",
            p("ReactCommon/react/nativemodule/core/platform/ios"),
        )
        .modular(),
        DependencyDeclaration::path(Runtime, "Yoga", p("ReactCommon/yoga")).modular(),
    ]
}

fn third_party_pods(prefix: &str) -> Vec<DependencyDeclaration> {
    use DeclarationGroup::ThirdParty;
    let spec = |name: &str| format!("{}/third-party-podspecs/{}.podspec", prefix, name);

    vec![
        DependencyDeclaration::podspec(ThirdParty, "DoubleConversion", spec("DoubleConversion")),
        DependencyDeclaration::podspec(ThirdParty, "glog", spec("glog")),
        DependencyDeclaration::podspec(ThirdParty, "boost", spec("boost")),
        DependencyDeclaration::podspec(ThirdParty, "fmt", spec("fmt")),
        DependencyDeclaration::podspec(ThirdParty, "RCT-Folly", spec("RCT-Folly")).modular(),
    ]
}

fn fabric_pods(prefix: &str) -> Vec<DependencyDeclaration> {
    use DeclarationGroup::Fabric;
    let p = |sub: &str| format!("{}/{}", prefix, sub);

    vec![
        DependencyDeclaration::path(Fabric, "React-Fabric", p("ReactCommon")),
        DependencyDeclaration::path(Fabric, "React-FabricComponents", p("ReactCommon")),
        DependencyDeclaration::path(Fabric, "React-graphics", p("ReactCommon/react/renderer/graphics")),
        DependencyDeclaration::path(Fabric, "React-RCTFabric", p("React")).modular(),
        DependencyDeclaration::path(
            Fabric,
            "React-ImageManager",
            p("ReactCommon/react/renderer/imagemanager/platform/ios"),
        ),
        DependencyDeclaration::path(Fabric, "React-FabricImage", p("ReactCommon")),
        DependencyDeclaration::podspec(
            Fabric,
            "RCT-Folly/Fabric",
            p("third-party-podspecs/RCT-Folly.podspec"),
        ),
    ]
}

fn bridgeless_pods(prefix: &str, hermes_enabled: bool) -> Vec<DependencyDeclaration> {
    use DeclarationGroup::Bridgeless;
    let p = |sub: &str| format!("{}/{}", prefix, sub);

    let mut pods = vec![
        DependencyDeclaration::path(Bridgeless, "React-jsitracing", p("ReactCommon/hermes/executor")),
        DependencyDeclaration::path(Bridgeless, "React-RuntimeCore", p("ReactCommon/react/runtime")),
        DependencyDeclaration::path(
            Bridgeless,
            "React-RuntimeApple",
            p("ReactCommon/react/runtime/platform/ios"),
        ),
    ];
    if hermes_enabled {
        pods.push(DependencyDeclaration::path(
            Bridgeless,
            "React-RuntimeHermes",
            p("ReactCommon/react/runtime"),
        ));
    }
    pods
}
