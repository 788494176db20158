// Crate name and version baked in at build time

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const NAME: &str = env!("CARGO_PKG_NAME");

/// `probestyx/<version>`, sent as the User-Agent of URL scrapes.
pub fn user_agent() -> String {
    format!("{}/{}", NAME, VERSION)
}
