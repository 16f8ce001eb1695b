//! Unit tests for configuration validation.

use rstest::{fixture, rstest};
use stratus::{ConfigError, StratusConfig};

#[fixture]
fn valid_config() -> StratusConfig {
    StratusConfig {
        account: String::from("acme"),
        user: String::from("alice"),
        password: String::from("hunter2"),
        group: String::from("default"),
        zone: String::from("york"),
        api_url: String::from("https://uk0.stratus.cloud"),
        auth_url: String::from("https://auth.stratus.cloud"),
    }
}

#[rstest]
fn validation_accepts_a_complete_configuration(valid_config: StratusConfig) {
    valid_config
        .validate()
        .unwrap_or_else(|err| panic!("complete configuration should validate: {err}"));
}

#[rstest]
fn validation_rejects_a_missing_account_with_an_actionable_error(valid_config: StratusConfig) {
    let cfg = StratusConfig {
        account: String::new(),
        ..valid_config
    };

    let error = cfg.validate().expect_err("account is required");
    let ConfigError::MissingField(ref message) = error else {
        panic!("expected MissingField error");
    };
    assert!(
        message.contains("STRATUS_ACCOUNT"),
        "error should mention the env var: {message}"
    );
    assert!(
        message.contains("stratus.toml"),
        "error should mention the config file: {message}"
    );
}

/// Verifies that validation produces actionable errors mentioning the
/// environment variable for each required field.
#[rstest]
#[case("account", "STRATUS_ACCOUNT")]
#[case("user", "STRATUS_USER")]
#[case("password", "STRATUS_PASSWORD")]
#[case("group", "STRATUS_GROUP")]
#[case("zone", "STRATUS_ZONE")]
#[case("api_url", "STRATUS_API_URL")]
#[case("auth_url", "STRATUS_AUTH_URL")]
fn validation_names_the_env_var_for_every_required_field(
    valid_config: StratusConfig,
    #[case] field: &str,
    #[case] env_var: &str,
) {
    let cfg = match field {
        "account" => StratusConfig {
            account: String::new(),
            ..valid_config
        },
        "user" => StratusConfig {
            user: String::new(),
            ..valid_config
        },
        "password" => StratusConfig {
            password: String::new(),
            ..valid_config
        },
        "group" => StratusConfig {
            group: String::new(),
            ..valid_config
        },
        "zone" => StratusConfig {
            zone: String::new(),
            ..valid_config
        },
        "api_url" => StratusConfig {
            api_url: String::new(),
            ..valid_config
        },
        _ => StratusConfig {
            auth_url: String::new(),
            ..valid_config
        },
    };

    let error = cfg.validate().expect_err("blank field should be rejected");
    assert!(
        error.to_string().contains(env_var),
        "error for {field} should mention {env_var}: {error}"
    );
}

#[rstest]
fn whitespace_only_values_count_as_missing(valid_config: StratusConfig) {
    let cfg = StratusConfig {
        password: String::from("   "),
        ..valid_config
    };
    assert!(matches!(cfg.validate(), Err(ConfigError::MissingField(_))));
}
