use super::{MetricDef, Sample};
use core::fmt::Write;
use std::collections::HashMap;

/// Renders samples in the Prometheus text exposition format (version 0.0.4).
///
/// Samples are grouped per metric; metrics appear in the order their first
/// sample was seen and samples keep their relative order within a metric.
#[must_use]
pub fn render(samples: &[Sample]) -> String {
    let mut groups: Vec<(&'static MetricDef, Vec<&Sample>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for sample in samples {
        let slot = *index.entry(sample.name()).or_insert_with(|| {
            groups.push((sample.def, Vec::new()));
            groups.len() - 1
        });
        if let Some((_, members)) = groups.get_mut(slot) {
            members.push(sample);
        }
    }

    let mut out = String::new();
    for (def, members) in groups {
        let _ = writeln!(out, "# HELP {} {}", def.name, escape_help(def.help));
        let _ = writeln!(out, "# TYPE {} gauge", def.name);
        for sample in members {
            out.push_str(def.name);
            if !def.labels.is_empty() {
                out.push('{');
                for (i, (name, value)) in sample.labels().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    let _ = write!(out, "{name}=\"{}\"", escape_label_value(value));
                }
                out.push('}');
            }
            let _ = writeln!(out, " {}", format_value(sample.value));
        }
    }

    out
}

fn escape_help(text: &str) -> String {
    text.replace('\\', r"\\").replace('\n', r"\n")
}

fn escape_label_value(text: &str) -> String {
    text.replace('\\', r"\\").replace('"', "\\\"").replace('\n', r"\n")
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() && value.is_sign_positive() {
        "+Inf".to_string()
    } else if value.is_infinite() {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    static REMAINING: MetricDef = MetricDef::new("github_ratelimit_limit_remaining", "Remaining requests", &["resource"]);
    static SUCCESS: MetricDef = MetricDef::new("github_scrape_collector_success", "Whether a collector succeeded", &["collector"]);
    static UP: MetricDef = MetricDef::new("up", "Line one\nline two \\ end", &[]);

    fn sample(def: &'static MetricDef, value: f64, labels: &[&str]) -> Sample {
        Sample::new(def, value, labels).unwrap()
    }

    #[test]
    fn samples_are_grouped_in_first_seen_order() {
        let samples = [
            sample(&REMAINING, 4999.0, &["core"]),
            sample(&SUCCESS, 1.0, &["ratelimit"]),
            sample(&REMAINING, 30.0, &["search"]),
        ];

        let expected = "\
# HELP github_ratelimit_limit_remaining Remaining requests
# TYPE github_ratelimit_limit_remaining gauge
github_ratelimit_limit_remaining{resource=\"core\"} 4999
github_ratelimit_limit_remaining{resource=\"search\"} 30
# HELP github_scrape_collector_success Whether a collector succeeded
# TYPE github_scrape_collector_success gauge
github_scrape_collector_success{collector=\"ratelimit\"} 1
";
        assert_eq!(render(&samples), expected);
    }

    #[test]
    fn label_values_and_help_are_escaped() {
        let samples = [sample(&REMAINING, 0.5, &["a\"b\\c\nd"]), sample(&UP, 1.0, &[])];
        let text = render(&samples);

        assert!(text.contains(r#"github_ratelimit_limit_remaining{resource="a\"b\\c\nd"} 0.5"#), "{text}");
        assert!(text.contains(r"# HELP up Line one\nline two \\ end"), "{text}");
        assert!(text.contains("\nup 1\n"), "{text}");
    }

    #[test]
    fn special_values_use_prometheus_spelling() {
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
        assert_eq!(format_value(-2.0), "-2");
    }

    #[test]
    fn nothing_renders_to_nothing() {
        assert!(render(&[]).is_empty());
    }
}
