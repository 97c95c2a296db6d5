//! Hash-backed gauges.
//!
//! Applications that multiplex many logical subscribers over one Redis
//! connection keep their own counters in a hash; `PUBSUB NUMSUB` cannot see
//! them. Each configured hash is read with `HGETALL` and every numeric field
//! becomes one gauge sample.

use crate::collector::sample::{MetricSink, Sample, SampleKind, NAMESPACE};
use crate::config::HashMetricDef;
use crate::redis::PubSubStore;
use tracing::{debug, warn};

/// Converts the fields of one hash into gauge samples.
///
/// Values that do not parse as `f64` are skipped.
pub fn hash_samples(def: &HashMetricDef, fields: &[(String, String)]) -> Vec<Sample> {
    let name = format!("{NAMESPACE}_{}", def.metric_name);

    fields
        .iter()
        .filter_map(|(field, raw)| match raw.trim().parse::<f64>() {
            Ok(value) => Some(
                Sample {
                    name: name.clone(),
                    help: def.help.clone(),
                    kind: SampleKind::Gauge,
                    labels: Vec::new(),
                    value,
                }
                .with_label(def.field_label.clone(), field.clone()),
            ),
            Err(_) => {
                debug!(
                    target: "exporter.collector",
                    redis_key = %def.redis_key,
                    field = %field,
                    "Skipping non-numeric hash field"
                );
                None
            }
        })
        .collect()
}

/// Reads every definition and writes its samples to `sink`.
///
/// A failed read is logged and skipped; remaining definitions still run.
/// Returns the number of definitions that could not be read.
pub async fn read_hash_metrics(
    store: &dyn PubSubStore,
    defs: &[HashMetricDef],
    sink: &mut dyn MetricSink,
) -> usize {
    let mut failed = 0;

    for def in defs {
        match store.hgetall(&def.redis_key).await {
            Ok(fields) => {
                for sample in hash_samples(def, &fields) {
                    sink.accept(sample);
                }
            }
            Err(e) => {
                warn!(
                    target: "exporter.collector",
                    redis_key = %def.redis_key,
                    metric = %def.metric_name,
                    error = %e,
                    "Failed to read hash metric"
                );
                failed += 1;
            }
        }
    }

    failed
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn def() -> HashMetricDef {
        HashMetricDef {
            redis_key: "app:active_users".to_string(),
            metric_name: "active_user_count".to_string(),
            help: "Active users per shard".to_string(),
            field_label: "user".to_string(),
        }
    }

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_one_sample_per_field() {
        let samples = hash_samples(&def(), &fields(&[("user-1", "5"), ("user-2", "3")]));

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].name, "redis_pubsub_active_user_count");
        assert_eq!(samples[0].help, "Active users per shard");
        assert_eq!(samples[0].kind, SampleKind::Gauge);
        assert_eq!(samples[0].label("user"), Some("user-1"));
        assert!((samples[0].value - 5.0).abs() < f64::EPSILON);
        assert_eq!(samples[1].label("user"), Some("user-2"));
        assert!((samples[1].value - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_numeric_values_are_skipped() {
        let samples = hash_samples(
            &def(),
            &fields(&[("a", "1.5"), ("b", "n/a"), ("c", " 7 "), ("d", "")]),
        );

        let labels: Vec<&str> = samples.iter().filter_map(|s| s.label("user")).collect();
        assert_eq!(labels, vec!["a", "c"]);
    }

    #[test]
    fn test_empty_hash_yields_no_samples() {
        assert!(hash_samples(&def(), &[]).is_empty());
    }
}
