//! Default values shared by the agent configuration.

/// Application name reported when none is configured.
pub const DEFAULT_APPLICATION_NAME: &str = "unknown-application";

/// Agent identifier reported when none is configured.
pub const DEFAULT_AGENT_ID: &str = "unknown-agent";

/// Profiling is enabled unless the configuration switches it off.
pub const DEFAULT_PROFILE_ENABLED: bool = true;

/// Default application name used where allocation is required (e.g. serde).
pub fn default_application_name() -> String {
    DEFAULT_APPLICATION_NAME.to_owned()
}

/// Default agent identifier used where allocation is required (e.g. serde).
pub fn default_agent_id() -> String {
    DEFAULT_AGENT_ID.to_owned()
}

/// Default profiling switch used by serde.
pub const fn default_profile_enabled() -> bool {
    DEFAULT_PROFILE_ENABLED
}
