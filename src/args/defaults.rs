pub(crate) const DEFAULT_USER_AGENT: &str = concat!("loadmix/", env!("CARGO_PKG_VERSION"));

/// Config file used when neither `--config` nor `CONFIG` is set.
pub(crate) const DEFAULT_CONFIG_PATH: &str = "config.json";

pub(super) const DEFAULT_TIMEOUT_NORMAL: &str = "2.5";
pub(super) const DEFAULT_TIMEOUT_BAD: &str = "30";
