//! Build identification captured by build.rs

pub const GIT_HASH: &str = env!("GIT_HASH");
pub const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");
pub const BUILD_PROFILE: &str = env!("BUILD_PROFILE");

/// One-line startup banner, logged immediately after tracing init
pub fn banner(module: &str, version: &str) -> String {
    format!(
        "Starting {} v{} [{}] built {} ({})",
        module, version, GIT_HASH, BUILD_TIMESTAMP, BUILD_PROFILE
    )
}
