// Copyright 2025 Muvon Un Limited
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Environment variable that overrides the configured endpoint
pub const ENDPOINT_ENV: &str = "SOURCECHAT_ENDPOINT";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum LogLevel {
	#[serde(rename = "none")]
	None,
	#[serde(rename = "info")]
	Info,
	#[serde(rename = "debug")]
	Debug,
}

impl Default for LogLevel {
	fn default() -> Self {
		Self::Info
	}
}

impl LogLevel {
	/// Check if session logging is enabled
	pub fn is_info_enabled(&self) -> bool {
		matches!(self, LogLevel::Info | LogLevel::Debug)
	}

	/// Check if debug output is enabled
	pub fn is_debug_enabled(&self) -> bool {
		matches!(self, LogLevel::Debug)
	}
}

// Default functions
fn default_endpoint() -> String {
	// The deployed chat service
	"https://flask-production-c8257.up.railway.app".to_string()
}

fn default_conversation_window() -> usize {
	5 // Last 5 messages are sent as conversation context
}

fn default_request_timeout_seconds() -> u64 {
	30
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
	/// URL of the chat service endpoint
	#[serde(default = "default_endpoint")]
	pub endpoint: String,

	/// How many recent messages accompany each query as context
	#[serde(default = "default_conversation_window")]
	pub conversation_window: usize,

	/// Per-request timeout for the chat endpoint
	#[serde(default = "default_request_timeout_seconds")]
	pub request_timeout_seconds: u64,

	#[serde(default)]
	pub log_level: LogLevel,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			endpoint: default_endpoint(),
			conversation_window: default_conversation_window(),
			request_timeout_seconds: default_request_timeout_seconds(),
			log_level: LogLevel::default(),
		}
	}
}

impl Config {
	/// Load the configuration: config file if present, defaults otherwise,
	/// with the endpoint environment variable taking precedence over both.
	pub fn load() -> Result<Self> {
		let config_path = crate::directories::get_config_file_path()?;

		let mut config = if config_path.exists() {
			let content = std::fs::read_to_string(&config_path).context(format!(
				"Failed to read config file: {}",
				config_path.display()
			))?;
			toml::from_str(&content).context(format!(
				"Failed to parse config file: {}",
				config_path.display()
			))?
		} else {
			Self::default()
		};

		if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
			if !endpoint.trim().is_empty() {
				config.endpoint = endpoint.trim().to_string();
			}
		}

		config.validate()?;
		Ok(config)
	}

	/// Save the configuration to the config file
	pub fn save(&self) -> Result<()> {
		self.validate()?;

		let config_path = crate::directories::get_config_file_path()?;
		let content = toml::to_string(self).context("Failed to serialize configuration")?;
		std::fs::write(&config_path, content).context(format!(
			"Failed to write config file: {}",
			config_path.display()
		))?;

		Ok(())
	}

	/// Write the default configuration file if none exists yet and return
	/// its path
	pub fn create_default_config() -> Result<PathBuf> {
		let config_path = crate::directories::get_config_file_path()?;

		if !config_path.exists() {
			let content = toml::to_string(&Self::default())
				.context("Failed to serialize default configuration")?;
			std::fs::write(&config_path, content).context(format!(
				"Failed to write config file: {}",
				config_path.display()
			))?;
		}

		Ok(config_path)
	}

	pub fn validate(&self) -> Result<()> {
		validate_endpoint(&self.endpoint)?;

		if self.conversation_window == 0 {
			return Err(anyhow::anyhow!(
				"conversation_window must be greater than zero"
			));
		}

		if self.request_timeout_seconds == 0 {
			return Err(anyhow::anyhow!(
				"request_timeout_seconds must be greater than zero"
			));
		}

		Ok(())
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.request_timeout_seconds)
	}
}

/// Validate that an endpoint is an absolute http(s) URL
pub fn validate_endpoint(endpoint: &str) -> Result<()> {
	let url = Url::parse(endpoint)
		.map_err(|e| anyhow::anyhow!("Invalid endpoint URL '{}': {}", endpoint, e))?;

	match url.scheme() {
		"http" | "https" => Ok(()),
		other => Err(anyhow::anyhow!(
			"Endpoint '{}' must use http or https, not '{}'",
			endpoint,
			other
		)),
	}
}
