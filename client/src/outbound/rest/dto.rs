//! Wire envelopes exchanged with the fitness REST API.
//!
//! Every response is wrapped in `{data, pagination, message, error}`; the
//! adapter decodes into these DTOs first and unwraps the payload in one pass.

use chrono::NaiveDate;
use pagination::{Page, Pagination};
use serde::{Deserialize, Serialize};

use crate::domain::WeightDraft;

#[derive(Debug, Deserialize)]
pub(super) struct EnvelopeDto<T> {
    pub(super) data: Option<T>,
    pub(super) pagination: Option<Pagination>,
    pub(super) message: Option<String>,
    pub(super) error: Option<String>,
}

impl<T> EnvelopeDto<T> {
    pub(super) fn into_data(self) -> Result<T, String> {
        let reason = self.reason();
        self.data
            .ok_or_else(|| format!("response envelope has no data{}", suffix(reason)))
    }

    /// Payload that the API may legitimately report as `null`.
    pub(super) fn into_optional(self) -> Option<T> {
        self.data
    }

    fn reason(&self) -> Option<String> {
        self.message.clone().or_else(|| self.error.clone())
    }
}

impl<T> EnvelopeDto<Vec<T>> {
    pub(super) fn into_page(self) -> Result<Page<T>, String> {
        let Some(pagination) = self.pagination else {
            return Err("list response has no pagination".to_owned());
        };
        let data = self
            .data
            .ok_or_else(|| "list response has no data".to_owned())?;
        Ok(Page::new(data, pagination))
    }
}

fn suffix(reason: Option<String>) -> String {
    reason.map(|reason| format!(": {reason}")).unwrap_or_default()
}

/// Body of a failed response; either field may carry the reason.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorBodyDto {
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBodyDto {
    pub(super) fn reason(self) -> Option<String> {
        self.message
            .or(self.error)
            .map(|reason| reason.trim().to_owned())
            .filter(|reason| !reason.is_empty())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WaterRequestDto {
    pub(super) date: NaiveDate,
    pub(super) amount_ml: u32,
}

#[derive(Debug, Serialize)]
pub(super) struct BulkImportRequestDto<'a> {
    pub(super) entries: &'a [WeightDraft],
}
