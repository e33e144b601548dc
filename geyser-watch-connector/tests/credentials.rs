use geyser_watch_connector::{
    config::EndpointConfig,
    credentials::{CredentialResolver, EnvCredentialResolver, StaticCredentialResolver},
    error::CredentialError,
};

// Every test uses its own variable names, so they can run in parallel.

#[test]
fn environment_wins_over_config() {
    std::env::set_var("GW_TEST_TOKEN_A", "env-token");
    std::env::set_var("GW_TEST_ENDPOINT_A", "https://env.example:443");
    let resolver = EnvCredentialResolver::from_config(&EndpointConfig {
        url: "http://config.example:10000".to_string(),
        x_token: Some("config-token".to_string()),
        token_env: "GW_TEST_TOKEN_A".to_string(),
        endpoint_env: "GW_TEST_ENDPOINT_A".to_string(),
        ..Default::default()
    });

    let credentials = resolver.resolve().unwrap();
    assert_eq!(credentials.token, "env-token");
    assert_eq!(credentials.endpoint, "https://env.example:443");
}

#[test]
fn config_is_the_fallback() {
    let resolver = EnvCredentialResolver::from_config(&EndpointConfig {
        url: "http://config.example:10000".to_string(),
        x_token: Some("config-token".to_string()),
        token_env: "GW_TEST_TOKEN_UNSET_B".to_string(),
        endpoint_env: "GW_TEST_ENDPOINT_UNSET_B".to_string(),
        ..Default::default()
    });

    let credentials = resolver.resolve().unwrap();
    assert_eq!(credentials.token, "config-token");
    assert_eq!(credentials.endpoint, "http://config.example:10000");
}

#[test]
fn empty_token_is_missing() {
    std::env::set_var("GW_TEST_TOKEN_C", "   ");
    let resolver = EnvCredentialResolver::new("GW_TEST_TOKEN_C", "GW_TEST_ENDPOINT_C");

    assert_eq!(
        resolver.resolve(),
        Err(CredentialError::MissingToken {
            var: "GW_TEST_TOKEN_C".to_string()
        })
    );
}

#[test]
fn missing_endpoint_is_reported() {
    std::env::set_var("GW_TEST_TOKEN_D", "token");
    let resolver = EnvCredentialResolver::new("GW_TEST_TOKEN_D", "GW_TEST_ENDPOINT_UNSET_D");

    assert_eq!(
        resolver.resolve(),
        Err(CredentialError::MissingEndpoint {
            var: "GW_TEST_ENDPOINT_UNSET_D".to_string()
        })
    );
}

#[test]
fn token_is_redacted_in_debug_output() {
    let credentials = StaticCredentialResolver::new("http://localhost:10000", "hunter2")
        .resolve()
        .unwrap();
    let printed = format!("{credentials:?}");
    assert!(printed.contains("localhost"));
    assert!(!printed.contains("hunter2"));
}

#[test]
fn static_resolver_rejects_an_empty_token() {
    let result = StaticCredentialResolver::new("http://localhost:10000", "").resolve();
    assert!(matches!(result, Err(CredentialError::MissingToken { .. })));
}
