// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration management for the CPI
//!
//! # Environment Variables
//!
//! - `PHOTON_CPI_CONFIG` - Path to the CPI config file (default: `~/.photon/cpi.json`)
//! - `PHOTON_TARGET` - Override the controller URL
//! - `PHOTON_TOKEN` - Override the bearer token
//! - `PHOTON_PROJECT` - Override the project
//!
//! # Example
//!
//! ```no_run
//! use photon_cpi_rs::config::CpiConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CpiConfig::load_with_env()?;
//! println!("Using controller {}", config.endpoint()?);
//! # Ok(())
//! # }
//! ```

mod cpi_config;

pub use cpi_config::{
    ApiFrontEnd, CpiConfig, LegacySection, PhotonSection, ENV_PHOTON_CPI_CONFIG,
    ENV_PHOTON_PROJECT, ENV_PHOTON_TARGET, ENV_PHOTON_TOKEN,
};
