//! Prometheus text exposition of a summary.
//!
//! The output is a one-shot snapshot meant for a textfile collector or a
//! push to a gateway by an outside tool. Every KPI aggregate becomes a gauge
//! labelled by span and metric; undefined aggregates are left out.
//!
//! ## Example
//!
//! ```text
//! # HELP spanwatch_kpi_mean Mean of non-null samples
//! # TYPE spanwatch_kpi_mean gauge
//! spanwatch_kpi_mean{span="OCH-1-1",metric="osnr"} 19.5
//! ```

use spanwatch_types::{AggregateField, Severity, Summary};

/// Format a summary as Prometheus exposition text.
pub fn render(summary: &Summary, namespace: Option<&str>) -> String {
    let mut output = String::new();
    let prefix = namespace.map(|n| format!("{}_", n)).unwrap_or_default();

    for field in AggregateField::ALL {
        let name = format!("{}spanwatch_kpi_{}", prefix, field.as_str());
        push_header(&mut output, &name, aggregate_help(field));
        for kpi in &summary.kpi_results {
            if let Some(value) = kpi.get(field) {
                output.push_str(&format!(
                    "{}{{{}}} {}\n",
                    name,
                    kpi_labels(&kpi.span_id, &kpi.metric_name),
                    value
                ));
            }
        }
    }

    let name = format!("{}spanwatch_kpi_sample_count", prefix);
    push_header(&mut output, &name, "Non-null samples used for the KPI");
    for kpi in &summary.kpi_results {
        output.push_str(&format!(
            "{}{{{}}} {}\n",
            name,
            kpi_labels(&kpi.span_id, &kpi.metric_name),
            kpi.sample_count
        ));
    }

    let gaps = format!("{}spanwatch_span_gaps", prefix);
    push_header(&mut output, &gaps, "Gaps detected between observed records");
    let missing = format!("{}spanwatch_span_missing_samples", prefix);
    let alerts = format!("{}spanwatch_span_alerts", prefix);
    let records = format!("{}spanwatch_span_records", prefix);

    for span in &summary.spans {
        let labels = format!("span=\"{}\"", escape_label_value(&span.span_id));
        output.push_str(&format!(
            "{}{{{}}} {}\n",
            gaps,
            labels,
            summary.gaps_for(&span.span_id).count()
        ));
    }

    push_header(&mut output, &missing, "Expected samples missing inside gaps");
    for span in &summary.spans {
        let labels = format!("span=\"{}\"", escape_label_value(&span.span_id));
        output.push_str(&format!("{}{{{}}} {}\n", missing, labels, span.missing_count));
    }

    push_header(&mut output, &records, "Observed records after normalization");
    for span in &summary.spans {
        let labels = format!("span=\"{}\"", escape_label_value(&span.span_id));
        output.push_str(&format!("{}{{{}}} {}\n", records, labels, span.record_count));
    }

    push_header(&mut output, &alerts, "Alerts raised, by severity");
    for span in &summary.spans {
        let span_label = escape_label_value(&span.span_id);
        for severity in [Severity::Warning, Severity::Critical] {
            let count = summary
                .alerts_for(&span.span_id)
                .filter(|a| a.severity == severity)
                .count();
            output.push_str(&format!(
                "{}{{span=\"{}\",severity=\"{}\"}} {}\n",
                alerts,
                span_label,
                severity.as_str(),
                count
            ));
        }
    }

    // Add run end timestamp
    let name = format!("{}spanwatch_run_end_timestamp_seconds", prefix);
    push_header(&mut output, &name, "Unix timestamp of the latest observed record");
    output.push_str(&format!(
        "{} {:.3}\n",
        name,
        summary.run_time_range.end.timestamp_millis() as f64 / 1000.0
    ));

    output
}

fn push_header(output: &mut String, name: &str, help: &str) {
    output.push_str(&format!("# HELP {} {}\n", name, help));
    output.push_str(&format!("# TYPE {} gauge\n", name));
}

fn aggregate_help(field: AggregateField) -> &'static str {
    match field {
        AggregateField::Mean => "Mean of non-null samples",
        AggregateField::Min => "Minimum non-null sample",
        AggregateField::Max => "Maximum non-null sample",
        AggregateField::P50 => "50th percentile, linear interpolation",
        AggregateField::P95 => "95th percentile, linear interpolation",
        AggregateField::P99 => "99th percentile, linear interpolation",
        AggregateField::StdDev => "Sample standard deviation",
    }
}

fn kpi_labels(span: &str, metric: &str) -> String {
    format!(
        "span=\"{}\",metric=\"{}\"",
        escape_label_value(span),
        escape_label_value(metric)
    )
}

/// Escape a label value for Prometheus format.
/// Backslash, double-quote, and newline must be escaped.
fn escape_label_value(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
