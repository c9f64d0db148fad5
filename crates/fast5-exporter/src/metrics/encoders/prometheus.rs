use std::collections::HashMap;

use ::prometheus::core::Collector;
use ::prometheus::Encoder;
use ::prometheus::Gauge;
use ::prometheus::GaugeVec;
use ::prometheus::Opts;
use ::prometheus::Registry;
use ::prometheus::TextEncoder;
use error_stack::Report;
use error_stack::ResultExt;

use super::EncodeError;
use super::MetricsEncoder;
use crate::metrics::MetricKind;
use crate::metrics::Sample;
use crate::metrics::SeriesSchema;

/// Prometheus text exposition format encoder
pub struct PrometheusEncoder;

impl PrometheusEncoder {
    pub fn new() -> Self {
        Self
    }
}

enum Series {
    Single(Gauge),
    Labeled(GaugeVec, Vec<String>),
}

impl Series {
    fn build(schema: &SeriesSchema) -> Result<Self, Report<EncodeError>> {
        let invalid = || EncodeError::InvalidSeries {
            name: schema.name.clone(),
        };
        let const_labels: HashMap<String, String> = schema
            .const_labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let opts = Opts::new(schema.name.clone(), schema.help.clone()).const_labels(const_labels);

        match schema.kind {
            MetricKind::Gauge if schema.variable_labels.is_empty() => Gauge::with_opts(opts)
                .map(Series::Single)
                .change_context_lazy(invalid),
            MetricKind::Gauge => {
                let names: Vec<&str> = schema.variable_labels.iter().map(String::as_str).collect();
                GaugeVec::new(opts, &names)
                    .map(|vec| Series::Labeled(vec, schema.variable_labels.clone()))
                    .change_context_lazy(invalid)
            }
        }
    }

    fn collector(&self) -> Box<dyn Collector> {
        match self {
            Series::Single(gauge) => Box::new(gauge.clone()),
            Series::Labeled(vec, _) => Box::new(vec.clone()),
        }
    }

    fn set(&self, sample: &Sample) -> Result<(), Report<EncodeError>> {
        match self {
            Series::Single(gauge) => gauge.set(sample.value),
            Series::Labeled(vec, names) => {
                let values: Vec<&str> = names
                    .iter()
                    .map(|name| sample.labels.get(name).map_or("", String::as_str))
                    .collect();
                vec.get_metric_with_label_values(&values)
                    .change_context_lazy(|| EncodeError::InvalidSeries {
                        name: sample.name.clone(),
                    })?
                    .set(sample.value);
            }
        }
        Ok(())
    }
}

impl MetricsEncoder for PrometheusEncoder {
    fn content_type(&self) -> &'static str {
        ::prometheus::TEXT_FORMAT
    }

    fn encode(
        &self,
        schemas: &[SeriesSchema],
        samples: &[Sample],
    ) -> Result<String, Report<EncodeError>> {
        // A fresh registry per render, so channels only appear once collected.
        let registry = Registry::new();
        let mut series = HashMap::with_capacity(schemas.len());
        for schema in schemas {
            let built = Series::build(schema)?;
            registry
                .register(built.collector())
                .change_context_lazy(|| EncodeError::InvalidSeries {
                    name: schema.name.clone(),
                })?;
            series.insert(schema.name.as_str(), built);
        }

        for sample in samples {
            let Some(target) = series.get(sample.name.as_str()) else {
                return Err(Report::new(EncodeError::UndeclaredSeries {
                    name: sample.name.clone(),
                }));
            };
            target.set(sample)?;
        }

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buffer)
            .change_context(EncodeError::Serialization)?;
        String::from_utf8(buffer).change_context(EncodeError::Serialization)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::metrics::AMOUNT_READS;
    use crate::metrics::CHANNEL_LABEL;
    use crate::metrics::TOTAL_SIZE;

    fn schemas() -> Vec<SeriesSchema> {
        let labels = BTreeMap::from([("site".to_string(), "lab".to_string())]);
        vec![
            SeriesSchema::gauge(TOTAL_SIZE, "Total size").with_const_labels(&labels),
            SeriesSchema::gauge(AMOUNT_READS, "Reads")
                .with_variable_label(CHANNEL_LABEL)
                .with_const_labels(&labels),
        ]
    }

    #[test]
    fn test_encode_text_format() {
        let samples = vec![
            Sample::new(TOTAL_SIZE, 300.0),
            Sample::new(AMOUNT_READS, 1.0).with_label(CHANNEL_LABEL, "1"),
            Sample::new(AMOUNT_READS, 4.0).with_label(CHANNEL_LABEL, "2"),
        ];

        let text = PrometheusEncoder::new()
            .encode(&schemas(), &samples)
            .expect("encode");

        assert!(text.contains("# HELP fast5_total_size Total size"));
        assert!(text.contains("# TYPE fast5_total_size gauge"));
        assert!(text.contains("fast5_total_size{site=\"lab\"} 300"));
        assert!(text.contains("# TYPE fast5_amount_reads gauge"));
        assert!(text.contains("fast5_amount_reads{channel=\"1\",site=\"lab\"} 1"));
        assert!(text.contains("fast5_amount_reads{channel=\"2\",site=\"lab\"} 4"));
    }

    #[test]
    fn test_undeclared_series_is_rejected() {
        let samples = vec![Sample::new("fast5_unknown", 1.0)];

        let err = PrometheusEncoder::new()
            .encode(&schemas(), &samples)
            .unwrap_err();

        assert!(matches!(
            err.current_context(),
            EncodeError::UndeclaredSeries { name } if name == "fast5_unknown"
        ));
    }

    #[test]
    fn test_invalid_metric_name_is_rejected() {
        let schemas = vec![SeriesSchema::gauge("fast5-bad", "Bad")];

        let err = PrometheusEncoder::new().encode(&schemas, &[]).unwrap_err();

        assert!(matches!(
            err.current_context(),
            EncodeError::InvalidSeries { .. }
        ));
    }
}
