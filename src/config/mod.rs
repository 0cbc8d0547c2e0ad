pub mod watch;

pub use watch::{
    load_config_default, load_config_from, load_feed_settings_default, load_feed_settings_from,
    FeedSettings, WatchConfig,
};
