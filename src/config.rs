use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tracing::{info, warn};

use crate::calculator::CalculatorConfig;
use crate::units::UnitSystem;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub calculator: CalculatorSettings,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            calculator: CalculatorSettings::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "PALLET_FIT_API_HOST";
    const PORT_VAR: &'static str = "PALLET_FIT_API_PORT";

    fn from_env() -> Self {
        let host_value = env_string(Self::HOST_VAR).unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, display_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                warn!(
                    "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                    Self::HOST_VAR,
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = env_string(Self::PORT_VAR)
            .map(|raw| {
                parse_port(&raw).unwrap_or_else(|reason| {
                    warn!(
                        "⚠️ {} ('{}') {}. Using {}.",
                        Self::PORT_VAR,
                        raw,
                        reason,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                })
            })
            .unwrap_or(Self::DEFAULT_PORT);

        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Checks whether the hostname matches the default value.
    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

/// Calculation defaults taken from the environment.
#[derive(Clone, Debug)]
pub struct CalculatorSettings {
    calculator: CalculatorConfig,
}

impl CalculatorSettings {
    const UNIT_SYSTEM_VAR: &'static str = "PALLET_FIT_DEFAULT_UNITS";
    const STACK_HEIGHT_LIMIT_VAR: &'static str = "PALLET_FIT_STACK_HEIGHT_LIMIT_CM";

    fn from_env() -> Self {
        let default_unit_system = env_string(Self::UNIT_SYSTEM_VAR)
            .and_then(|raw| match raw.parse::<UnitSystem>() {
                Ok(unit_system) => Some(unit_system),
                Err(err) => {
                    warn!(
                        "⚠️ {}: {}. Using {}.",
                        Self::UNIT_SYSTEM_VAR,
                        err,
                        CalculatorConfig::DEFAULT_UNIT_SYSTEM
                    );
                    None
                }
            })
            .unwrap_or(CalculatorConfig::DEFAULT_UNIT_SYSTEM);

        let stack_height_limit = env_string(Self::STACK_HEIGHT_LIMIT_VAR).and_then(|raw| {
            match parse_height_limit(&raw) {
                Ok(limit) => {
                    info!(
                        "📏 Stack height limit of {} cm overrides container heights ({}).",
                        limit,
                        Self::STACK_HEIGHT_LIMIT_VAR
                    );
                    Some(limit)
                }
                Err(reason) => {
                    warn!(
                        "⚠️ {} ('{}') {}. Using container heights.",
                        Self::STACK_HEIGHT_LIMIT_VAR,
                        raw,
                        reason
                    );
                    CalculatorConfig::DEFAULT_STACK_HEIGHT_LIMIT
                }
            }
        });

        let calculator = CalculatorConfig::builder()
            .default_unit_system(default_unit_system)
            .stack_height_limit(stack_height_limit)
            .build();

        Self { calculator }
    }

    /// Returns the configured CalculatorConfig.
    pub fn calculator_config(&self) -> CalculatorConfig {
        self.calculator
    }
}

impl From<CalculatorConfig> for CalculatorSettings {
    fn from(calculator: CalculatorConfig) -> Self {
        Self { calculator }
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name, err
            );
            None
        }
    }
}

fn parse_port(raw: &str) -> Result<u16, String> {
    match raw.trim().parse::<u16>() {
        Ok(0) => Err("must not be 0".to_string()),
        Ok(port) => Ok(port),
        Err(err) => Err(format!("could not be parsed: {}", err)),
    }
}

fn parse_height_limit(raw: &str) -> Result<f64, String> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value > 0.0 && value.is_finite() => Ok(value),
        Ok(_) => Err("must be a positive number".to_string()),
        Err(err) => Err(format!("could not be parsed as number: {}", err)),
    }
}
