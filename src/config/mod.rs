mod settings;

use config::{Config, ConfigError, Environment, File};

pub use settings::{
    BrokerSettings, LogSettings, PartialSettings, PersistenceSettings, ServerSettings, Settings,
};

/// Loads the configuration from the default file and environment variables
/// and merges it with the default values.
///
/// Environment keys use the `CHATRELAY` prefix and `__` as the nesting
/// separator, e.g. `CHATRELAY__SERVER__PORT=9000`.
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix("CHATRELAY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(Settings::from_partial(partial))
}
