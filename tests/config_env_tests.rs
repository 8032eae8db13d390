//! Environment override of the endpoint URL.
//!
//! Kept in its own test binary: the variable is process-global.

use chatlink::infrastructure::config::settings::URL_ENV_VAR;
use chatlink::infrastructure::config::Config;

#[test]
fn env_url_overrides_file_and_is_validated() {
    std::env::set_var(URL_ENV_VAR, "wss://override.example.com/ws");
    let config = Config::parse_toml(
        r#"
        [connection]
        url = "ws://127.0.0.1:8000/ws"
        "#,
    )
    .unwrap();
    assert_eq!(config.connection.url, "wss://override.example.com/ws");

    std::env::set_var(URL_ENV_VAR, "http://not-a-websocket/ws");
    assert!(Config::parse_toml("").is_err());

    std::env::remove_var(URL_ENV_VAR);
    let config = Config::parse_toml("").unwrap();
    assert_eq!(config.connection.url, "ws://127.0.0.1:8000/ws");
}
