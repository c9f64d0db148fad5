use std::collections::BTreeMap;

use error_stack::Report;
use error_stack::ResultExt;
use serde::Serialize;

use super::EncodeError;
use super::MetricsEncoder;
use crate::metrics::MetricKind;
use crate::metrics::Sample;
use crate::metrics::SeriesSchema;

/// JSON encoder for metrics
pub struct JsonEncoder;

impl JsonEncoder {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Serialize)]
struct Document<'a> {
    metrics: Vec<Family<'a>>,
}

#[derive(Serialize)]
struct Family<'a> {
    name: &'a str,
    help: &'a str,
    #[serde(rename = "type")]
    kind: MetricKind,
    labels: &'a BTreeMap<String, String>,
    samples: Vec<Point<'a>>,
}

#[derive(Serialize)]
struct Point<'a> {
    labels: &'a BTreeMap<String, String>,
    value: f64,
}

impl MetricsEncoder for JsonEncoder {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode(
        &self,
        schemas: &[SeriesSchema],
        samples: &[Sample],
    ) -> Result<String, Report<EncodeError>> {
        let mut families: Vec<Family<'_>> = schemas
            .iter()
            .map(|schema| Family {
                name: &schema.name,
                help: &schema.help,
                kind: schema.kind,
                labels: &schema.const_labels,
                samples: Vec::new(),
            })
            .collect();

        for sample in samples {
            let Some(family) = families.iter_mut().find(|f| f.name == sample.name) else {
                return Err(Report::new(EncodeError::UndeclaredSeries {
                    name: sample.name.clone(),
                }));
            };
            family.samples.push(Point {
                labels: &sample.labels,
                value: sample.value,
            });
        }

        let body = serde_json::to_string(&Document { metrics: families })
            .change_context(EncodeError::Serialization)?;
        Ok(body + "\n")
    }
}
