//! Fixed values shared by the resolver, declarator and patcher

/// Minimum iOS version supported by the framework
pub const MIN_IOS_VERSION_SUPPORTED: &str = "13.4";

/// Folly release pinned by the third-party podspecs
pub const FOLLY_VERSION: &str = "2024.01.01.00";

/// Compiler flags every consumer of folly must pass
pub const FOLLY_COMPILER_FLAGS: &str = "-DFOLLY_NO_CONFIG -DFOLLY_MOBILE=1 -DFOLLY_USE_LIBCPP=1 -DFOLLY_CFG_NO_COROUTINES=1 -DFOLLY_HAVE_CLOCK_GETTIME=1 -Wno-comma -Wno-shorten-64-to-32";

/// Default location of the framework relative to the `ios/` directory
pub const DEFAULT_REACT_NATIVE_PATH: &str = "../node_modules/react-native";

/// Default app path relative to the `ios/` directory
pub const DEFAULT_APP_PATH: &str = "..";

/// Directory the code generator writes into, relative to the `ios/` directory
pub const CODEGEN_OUTPUT_DIR: &str = "build/generated/ios";

/// Name of the package holding generated sources
pub const CODEGEN_POD_NAME: &str = "ReactCodegen";

/// Flag passed to every target when the new architecture is on
pub const NEW_ARCH_FLAG: &str = "-DRCT_NEW_ARCH_ENABLED=1";

/// C++ language standard the framework is compiled with
pub const CPP_LANGUAGE_STANDARD: &str = "c++20";

/// Folly version and compiler flags, as handed to library authors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollyConfig {
    pub version: &'static str,
    pub compiler_flags: &'static str,
}

/// Get the folly configuration
pub fn folly_config() -> FollyConfig {
    FollyConfig {
        version: FOLLY_VERSION,
        compiler_flags: FOLLY_COMPILER_FLAGS,
    }
}
