//! Store configuration loaded via OrthoConfig.
//!
//! Every value is optional at load time; the accessors supply the defaults so
//! an empty environment yields a working local setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ortho_config::OrthoConfig;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::ports::{SliceKey, UnknownSliceKey};
use crate::selectors::{DEFAULT_DEADLINE_WINDOW_DAYS, DEFAULT_PROGRESS_STALE_DAYS};
use crate::store::{SliceOptions, StaleResponsePolicy};

const DEFAULT_PAGE_SIZE: u32 = pagination::DEFAULT_LIMIT;
const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Errors raised when a loaded setting cannot be interpreted.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// `api_base_url` is not an absolute URL.
    #[error("invalid api base url `{value}`: {source}")]
    InvalidApiBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    /// `persisted_slices` names an unknown slice.
    #[error("invalid persisted slice list: {0}")]
    UnknownSlice(#[from] UnknownSliceKey),
}

/// Configuration values controlling the store and its gateway.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "FITSYNC")]
pub struct StoreSettings {
    /// Records requested per page until a fetch reports otherwise.
    pub page_size: Option<u32>,
    /// Drop responses superseded by a newer request for the same data.
    #[ortho_config(default = true)]
    pub discard_stale_responses: bool,
    /// Days without a reading before a goal needs an update.
    pub progress_stale_days: Option<i64>,
    /// Days ahead an upcoming deadline is reported.
    pub deadline_window_days: Option<i64>,
    /// Base URL of the REST API.
    pub api_base_url: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Directory holding slice snapshots; persistence is off when unset.
    pub snapshot_dir: Option<PathBuf>,
    /// Slices restored at start-up and saved on teardown. The environment
    /// form is comma separated.
    #[serde(default)]
    pub persisted_slices: Vec<String>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            page_size: None,
            discard_stale_responses: true,
            progress_stale_days: None,
            deadline_window_days: None,
            api_base_url: None,
            request_timeout_secs: None,
            snapshot_dir: None,
            persisted_slices: Vec::new(),
        }
    }
}

impl StoreSettings {
    /// Page size, falling back to the default for unset or zero values.
    pub fn page_size(&self) -> u32 {
        self.page_size
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Whether late responses are dropped; on unless configured off.
    pub fn discard_stale_responses(&self) -> bool {
        self.discard_stale_responses
    }

    /// Options handed to every slice.
    pub fn slice_options(&self) -> SliceOptions {
        SliceOptions::default()
            .with_page_size(self.page_size())
            .with_stale_responses(StaleResponsePolicy::from_discard_flag(
                self.discard_stale_responses(),
            ))
    }

    /// Days without a reading before a goal is flagged, default 7.
    pub fn progress_stale_days(&self) -> i64 {
        self.progress_stale_days
            .unwrap_or(DEFAULT_PROGRESS_STALE_DAYS)
    }

    /// Look-ahead for upcoming deadlines, default 30 days.
    pub fn deadline_window_days(&self) -> i64 {
        self.deadline_window_days
            .unwrap_or(DEFAULT_DEADLINE_WINDOW_DAYS)
    }

    /// Parsed API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidApiBaseUrl`] when the configured value
    /// does not parse.
    pub fn api_base_url(&self) -> Result<Url, SettingsError> {
        let raw = self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL);
        Url::parse(raw).map_err(|source| SettingsError::InvalidApiBaseUrl {
            value: raw.to_owned(),
            source,
        })
    }

    /// Per-request timeout, default 10 seconds.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Snapshot directory; `None` disables persistence.
    pub fn snapshot_dir(&self) -> Option<&Path> {
        self.snapshot_dir.as_deref()
    }

    /// Slices named in `persisted_slices`, deduplicated in key order.
    ///
    /// Entries may themselves hold comma-separated names.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::UnknownSlice`] for a name that is not a slice.
    pub fn persisted_slices(&self) -> Result<Vec<SliceKey>, SettingsError> {
        let mut keys = self
            .persisted_slices
            .iter()
            .flat_map(|entry| entry.split(','))
            .filter(|name| !name.trim().is_empty())
            .map(str::parse::<SliceKey>)
            .collect::<Result<Vec<_>, _>>()?;
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}
