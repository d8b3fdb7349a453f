mod settings;

pub use settings::{
    AppenderConfig, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_IGNORED_TARGETS, DEFAULT_PROFILE_VARIABLE,
    DEFAULT_READ_TIMEOUT_SECS, DEFAULT_WRITE_TIMEOUT_SECS, DispatchConfig,
};
