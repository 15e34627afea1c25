use super::MetricDef;
use crate::Result;
use ohno::bail;

/// One observed value of a metric.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub def: &'static MetricDef,
    pub label_values: Vec<String>,
    pub value: f64,
}

impl Sample {
    /// Pairs `label_values` with the labels declared by `def`, in declaration order.
    pub fn new(def: &'static MetricDef, value: f64, label_values: &[&str]) -> Result<Self> {
        if label_values.len() != def.labels.len() {
            bail!(
                "metric '{}' declares {} labels but {} values were given",
                def.name,
                def.labels.len(),
                label_values.len()
            );
        }

        Ok(Self {
            def,
            label_values: label_values.iter().map(ToString::to_string).collect(),
            value,
        })
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.def.name
    }

    /// Value of the named label, if the metric declares it.
    #[must_use]
    pub fn label(&self, name: &str) -> Option<&str> {
        self.def
            .labels
            .iter()
            .position(|label| *label == name)
            .and_then(|i| self.label_values.get(i))
            .map(String::as_str)
    }

    /// Label names and values, in declaration order.
    pub fn labels(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.def.labels.iter().copied().zip(self.label_values.iter().map(String::as_str))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    static DEF: MetricDef = MetricDef::new("test_metric", "A test metric", &["org", "repo"]);

    #[test]
    fn labels_are_matched_by_position() {
        let sample = Sample::new(&DEF, 3.0, &["acme", "app"]).unwrap();
        assert_eq!(sample.label("org"), Some("acme"));
        assert_eq!(sample.label("repo"), Some("app"));
        assert_eq!(sample.label("missing"), None);
        assert_eq!(sample.labels().collect::<Vec<_>>(), [("org", "acme"), ("repo", "app")]);
    }

    #[test]
    fn label_count_mismatch_is_rejected() {
        let err = Sample::new(&DEF, 1.0, &["acme"]).unwrap_err();
        assert!(err.to_string().contains("test_metric"));
    }
}
