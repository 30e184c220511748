//! CSV tables: one row per KPI result, one row per alert.
//!
//! Undefined values are empty cells. Timestamps are RFC 3339 in UTC.

use chrono::{DateTime, SecondsFormat, Utc};
use spanwatch_types::{AggregateField, AlertTime, Summary};

use crate::error::Result;

pub const KPI_HEADER: &str =
    "span_id,metric,sample_count,mean,min,max,p50,p95,p99,std_dev,start,end";

pub const ALERT_HEADER: &str = "span_id,metric,severity,comparator,threshold,scope,observed_value,baseline,timestamp,window_start,window_end";

/// One row per KPI result, in summary order.
pub fn render_kpis(summary: &Summary) -> Result<String> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(KPI_HEADER.split(','))?;

    for kpi in &summary.kpi_results {
        let mut row = vec![
            kpi.span_id.clone(),
            kpi.metric_name.clone(),
            kpi.sample_count.to_string(),
        ];
        row.extend(AggregateField::ALL.iter().map(|f| number(kpi.get(*f))));
        row.push(time(kpi.time_range.map(|r| r.start)));
        row.push(time(kpi.time_range.map(|r| r.end)));
        writer.write_record(&row)?;
    }
    finish(writer)
}

/// One row per alert, in evaluation order.
///
/// Sample alerts fill `timestamp`; aggregate alerts fill the window columns.
pub fn render_alerts(summary: &Summary) -> Result<String> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(ALERT_HEADER.split(','))?;

    for alert in &summary.alerts {
        let (instant, window) = match alert.at {
            AlertTime::Instant(t) => (Some(t), None),
            AlertTime::Window(r) => (None, Some(r)),
        };
        let row = [
            alert.span_id.clone(),
            alert.metric_name.clone(),
            alert.severity.as_str().to_string(),
            alert.rule.comparator.symbol().to_string(),
            alert.rule.threshold.to_string(),
            alert.rule.scope.label(),
            alert.observed_value.to_string(),
            number(alert.baseline),
            time(instant),
            time(window.map(|r| r.start)),
            time(window.map(|r| r.end)),
        ];
        writer.write_record(&row)?;
    }
    finish(writer)
}

fn finish(writer: ::csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ::csv::Error::from(e.into_error()))?;
    // Every cell came from a `String`.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn time(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .unwrap_or_default()
}
