//! Provider guardrails.
//!
//! Each provider family can carry a [`ProviderPolicy`]: default and
//! maximum page sizes, a maximum date span, and the names of its date-range
//! parameters. Policies run after normalization and before validation.
//!
//! Date handling:
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | end date in the future | capped to today, warning attached |
//! | start date in the future | rejected (`FUTURE_START_DATE`) |
//! | start after end | rejected (`INVALID_ARGUMENT`) |
//! | span > `max_span_days` | rejected (`RANGE_TOO_WIDE`), caller must narrow |

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::entities::Params;
use super::value_objects::ToolError;
use crate::util::{format_date, parse_date};

/// Guardrail policy for one provider family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderPolicy {
    /// Injected as `page_size_param` when the caller omits it
    pub default_page_size: Option<u64>,
    /// Larger requested page sizes are capped
    pub max_page_size: Option<u64>,
    pub page_size_param: String,
    /// Maximum inclusive span between start and end dates
    pub max_span_days: Option<i64>,
    pub start_param: String,
    pub end_param: String,
}

impl Default for ProviderPolicy {
    fn default() -> Self {
        Self {
            default_page_size: None,
            max_page_size: None,
            page_size_param: "limit".to_string(),
            max_span_days: None,
            start_param: "start_date".to_string(),
            end_param: "end_date".to_string(),
        }
    }
}

impl ProviderPolicy {
    pub fn with_page_size(mut self, default: u64, max: u64) -> Self {
        self.default_page_size = Some(default);
        self.max_page_size = Some(max);
        self
    }

    pub fn with_max_span_days(mut self, days: i64) -> Self {
        self.max_span_days = Some(days);
        self
    }

    /// Apply the policy to normalized parameters.
    ///
    /// Returns the adjusted parameters and any warnings, or a recoverable
    /// error when the request cannot be made as asked.
    pub fn apply(&self, mut params: Params, today: NaiveDate) -> Result<GuardrailOutcome, ToolError> {
        let mut warnings = Vec::new();

        self.apply_page_size(&mut params, &mut warnings);

        let start = date_param(&params, &self.start_param)?;
        let mut end = date_param(&params, &self.end_param)?;

        if let Some((start_date, _)) = start
            && start_date > today
        {
            return Err(ToolError::future_start_date(&format_date(
                start_date,
                crate::util::DateFormat::Dashed,
            )));
        }

        if let Some((end_date, format)) = end
            && end_date > today
        {
            let capped = format_date(today, format);
            warnings.push(format!(
                "{} {} lies in the future; capped to {}",
                self.end_param,
                format_date(end_date, format),
                capped
            ));
            params.insert(self.end_param.clone(), serde_json::Value::String(capped));
            end = Some((today, format));
        }

        if let (Some((start_date, _)), Some((end_date, _))) = (start, end) {
            if start_date > end_date {
                return Err(ToolError::invalid_argument(format!(
                    "{} must not be after {}",
                    self.start_param, self.end_param
                )));
            }
            if let Some(max_days) = self.max_span_days {
                let span = (end_date - start_date).num_days() + 1;
                if span > max_days {
                    return Err(ToolError::range_too_wide(span, max_days));
                }
            }
        }

        Ok(GuardrailOutcome { params, warnings })
    }

    fn apply_page_size(&self, params: &mut Params, warnings: &mut Vec<String>) {
        let requested = params.get(&self.page_size_param).and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_str().and_then(|s| s.parse::<u64>().ok()))
        });

        match (requested, self.default_page_size, self.max_page_size) {
            (None, Some(default), _) => {
                params.insert(self.page_size_param.clone(), default.into());
            }
            (Some(n), _, Some(max)) if n > max => {
                warnings.push(format!(
                    "{} {} exceeds provider maximum; capped to {}",
                    self.page_size_param, n, max
                ));
                params.insert(self.page_size_param.clone(), max.into());
            }
            _ => {}
        }
    }
}

fn date_param(
    params: &Params,
    name: &str,
) -> Result<Option<(NaiveDate, crate::util::DateFormat)>, ToolError> {
    match params.get(name) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => parse_date(s)
            .map(Some)
            .ok_or_else(|| ToolError::invalid_argument(format!("{} '{}' is not a valid date", name, s))),
        Some(other) => Err(ToolError::invalid_argument(format!(
            "{} must be a date string, got {}",
            name, other
        ))),
    }
}

/// Adjusted parameters plus annotations for the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardrailOutcome {
    pub params: Params,
    pub warnings: Vec<String>,
}

/// Policies keyed by tool family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuardrailPolicies {
    policies: HashMap<String, ProviderPolicy>,
}

impl GuardrailPolicies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, family: impl Into<String>, policy: ProviderPolicy) -> Self {
        self.policies.insert(family.into(), policy);
        self
    }

    pub fn get(&self, family: &str) -> Option<&ProviderPolicy> {
        self.policies.get(family)
    }

    /// Apply the family's policy, or pass the parameters through untouched.
    pub fn apply(
        &self,
        family: &str,
        params: Params,
        today: NaiveDate,
    ) -> Result<GuardrailOutcome, ToolError> {
        match self.policies.get(family) {
            Some(policy) => policy.apply(params, today),
            None => Ok(GuardrailOutcome {
                params,
                warnings: Vec::new(),
            }),
        }
    }
}
