//! Pagination, date range and report query parameters.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};

use crate::application::services::{ClickQuery, DateRange};
use crate::error::{AppError, FieldErrors};

/// Date range filtering parameters.
///
/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates. A plain
/// `endDate` covers the whole day.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFilterParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DateFilterParams {
    fn collect(&self, errors: &mut FieldErrors) -> DateRange {
        DateRange::new(
            parse_bound(errors, "startDate", self.start_date.as_deref(), false),
            parse_bound(errors, "endDate", self.end_date.as_deref(), true),
        )
    }

    pub fn to_range(&self) -> Result<DateRange, AppError> {
        let mut errors = FieldErrors::new();
        let range = self.collect(&mut errors);
        errors.into_result()?;
        Ok(range)
    }
}

fn parse_bound(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    end_of_day: bool,
) -> Option<DateTime<Utc>> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;

    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.with_timezone(&Utc));
    }

    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => {
            let time = if end_of_day {
                NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
            } else {
                Some(NaiveTime::MIN)
            };
            time.map(|t| date.and_time(t).and_utc())
        }
        Err(_) => {
            errors.add(field, "must be an RFC 3339 timestamp or a YYYY-MM-DD date");
            None
        }
    }
}

/// Query of `GET /api/affiliate/clicks/{partnerId}`.
///
/// Uses `serde_with` to parse numbers and flags from query strings.
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct ClicksQueryParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<i64>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub limit: Option<i64>,

    #[serde(flatten)]
    pub date_filter: DateFilterParams,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub converted: Option<bool>,
}

impl ClicksQueryParams {
    pub fn to_query(&self) -> Result<ClickQuery, AppError> {
        Ok(ClickQuery {
            page: self.page,
            limit: self.limit,
            range: self.date_filter.to_range()?,
            converted: self.converted,
        })
    }
}

/// Query of `GET /api/affiliate/performance/products`.
#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPerformanceParams {
    #[serde(flatten)]
    pub date_filter: DateFilterParams,

    pub partner_id: Option<String>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Query of `GET /api/affiliate/export`.
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(flatten)]
    pub date_filter: DateFilterParams,
}
