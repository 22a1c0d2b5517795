//! Process-wide configuration
//!
//! Read once at startup from the environment (and `.env` when present) and
//! never mutated afterwards.

use crate::{Error, Result};
use clap::ValueEnum;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

pub const LOCAL_PORT: u16 = 5000;
pub const PRODUCTION_PORT: u16 = 10000;

/// The three shipped variants of the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Profile {
    /// 3-char minimum, raw prompt, 4 steps, at most 5 generations in flight.
    #[default]
    Standard,
    /// 5-char minimum, anatomy suffix, 8 steps.
    Enhanced,
    /// 5-char minimum, anatomy suffix, 4 steps.
    EnhancedFast,
}

impl Profile {
    pub fn settings(self) -> DispatchSettings {
        match self {
            Profile::Standard => DispatchSettings {
                min_prompt_length: 3,
                enhance_prompt: false,
                inference_steps: 4,
                validation_message: "Prompt is too short.".to_string(),
                upstream_label: "API Error".to_string(),
                concurrency_limit: Some(5),
            },
            Profile::Enhanced => DispatchSettings {
                min_prompt_length: 5,
                enhance_prompt: true,
                inference_steps: 8,
                validation_message: "Prompt too short.".to_string(),
                upstream_label: "System Error".to_string(),
                concurrency_limit: None,
            },
            Profile::EnhancedFast => DispatchSettings {
                inference_steps: 4,
                ..Profile::Enhanced.settings()
            },
        }
    }
}

impl FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        <Profile as ValueEnum>::from_str(s.trim(), true)
            .map_err(|_| Error::Config(format!("Unknown profile '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSettings {
    pub min_prompt_length: usize,
    pub enhance_prompt: bool,
    pub inference_steps: u32,
    pub validation_message: String,
    pub upstream_label: String,
    /// `None` leaves concurrency to the web server.
    pub concurrency_limit: Option<usize>,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Profile::default().settings()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindAddress {
    pub host: IpAddr,
    pub port: u16,
    pub production: bool,
}

impl BindAddress {
    /// Production when `RENDER` or `PORT` is set. `PORT` always wins, otherwise
    /// 10000 in production and 5000 locally.
    pub fn resolve(render: Option<&str>, port: Option<&str>) -> Result<Self> {
        let production = render.is_some() || port.is_some();

        let port = match port {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("PORT must be a port number, got '{}'", raw)))?,
            None if production => PRODUCTION_PORT,
            None => LOCAL_PORT,
        };

        let host = if production {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        };

        Ok(Self {
            host,
            port,
            production,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn environment(&self) -> &'static str {
        if self.production {
            "PRODUCTION"
        } else {
            "LOCAL"
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub hf_token: String,
    pub inference_url: Option<String>,
    pub profile: Profile,
    pub dispatch: DispatchSettings,
    pub bind: BindAddress,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("hf_token", &"<redacted>")
            .field("inference_url", &self.inference_url)
            .field("profile", &self.profile)
            .field("dispatch", &self.dispatch)
            .field("bind", &self.bind)
            .finish()
    }
}

impl Config {
    /// Load from the process environment. `profile` overrides `IMAGENERATOR_PROFILE`.
    pub fn from_env(profile: Option<Profile>) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok(), profile)
    }

    /// Load from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F, profile: Option<Profile>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let hf_token = var("HF_TOKEN").ok_or_else(|| {
            Error::Config(
                "Hugging Face token not found. Set environment variable HF_TOKEN.".to_string(),
            )
        })?;

        let profile = match profile {
            Some(profile) => profile,
            None => var("IMAGENERATOR_PROFILE")
                .map(|raw| raw.parse::<Profile>())
                .transpose()?
                .unwrap_or_default(),
        };

        let mut dispatch = profile.settings();
        if let Some(min) = parse_var::<usize>(&var, "MIN_PROMPT_LENGTH")? {
            dispatch.min_prompt_length = min;
        }
        if let Some(raw) = var("ENHANCE_PROMPT") {
            dispatch.enhance_prompt = parse_flag("ENHANCE_PROMPT", &raw)?;
        }
        if let Some(steps) = parse_var::<u32>(&var, "INFERENCE_STEPS")? {
            if steps == 0 {
                return Err(Error::Config("INFERENCE_STEPS must be at least 1".to_string()));
            }
            dispatch.inference_steps = steps;
        }
        if let Some(limit) = parse_var::<usize>(&var, "CONCURRENCY_LIMIT")? {
            dispatch.concurrency_limit = (limit > 0).then_some(limit);
        }

        let bind = BindAddress::resolve(var("RENDER").as_deref(), var("PORT").as_deref())?;

        Ok(Self {
            hf_token,
            inference_url: var("HF_INFERENCE_URL"),
            profile,
            dispatch,
            bind,
        })
    }
}

fn parse_var<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| Error::Config(format!("Invalid value for {}: '{}'", key, raw)))
        })
        .transpose()
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("Invalid value for {}: '{}'", key, raw))),
    }
}
