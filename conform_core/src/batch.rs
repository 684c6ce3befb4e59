use crate::connector::ConnectorVariant;
use crate::fields::{Submission, ValidatedConfig, ValidationErrors};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::time::Instant;
use tracing::{debug, info};

static POOL_SIZE: Lazy<usize> = Lazy::new(|| {
    let fallback = 4usize;
    let available = std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(fallback);
    available.clamp(2, 8)
});

static VALIDATE_POOL: Lazy<ThreadPool> = Lazy::new(|| {
    rayon::ThreadPoolBuilder::new()
        .num_threads(*POOL_SIZE)
        .thread_name(|idx| format!("conform-validate-{idx}"))
        .build()
        .expect("failed to build conform validation pool")
});

/// Validates many submissions against one variant on the validation pool.
///
/// Results come back in input order.
pub fn validate_batch(
    variant: &ConnectorVariant,
    submissions: &[Submission],
) -> Vec<Result<ValidatedConfig, ValidationErrors>> {
    let start = Instant::now();
    let results: Vec<_> = VALIDATE_POOL.install(|| {
        submissions
            .par_iter()
            .map(|submission| variant.validate(submission))
            .collect()
    });

    let failed = results.iter().filter(|r| r.is_err()).count();
    let latency_ms = start.elapsed().as_millis();
    if latency_ms > 500 {
        info!(
            target: "conform.batch",
            variant = %variant.id,
            submissions = submissions.len(),
            failed,
            latency_ms,
            "batch validation finished (slow)"
        );
    } else {
        debug!(
            target: "conform.batch",
            variant = %variant.id,
            submissions = submissions.len(),
            failed,
            latency_ms,
            "batch validation finished"
        );
    }
    results
}

pub fn worker_count() -> usize {
    *POOL_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::fields::FieldErrorKind;
    use serde_json::json;

    fn submission(value: serde_json::Value) -> Submission {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_batch_keeps_input_order() {
        let (_, variant) = Catalog::demo().variant("salesforce-api-key").unwrap();
        let mut submissions = Vec::new();
        for i in 0..40 {
            let username = if i % 3 == 0 {
                "not-an-email".to_string()
            } else {
                format!("user{}@company.com", i)
            };
            submissions.push(submission(json!({
                "subdomain": "mycompany",
                "username": username,
                "apiKey": "token",
            })));
        }

        let results = validate_batch(variant, &submissions);
        assert_eq!(results.len(), 40);
        for (i, result) in results.iter().enumerate() {
            match result {
                Ok(config) if i % 3 != 0 => {
                    let expected = format!("user{}@company.com", i);
                    assert_eq!(config.get("username").unwrap().as_str(), Some(expected.as_str()));
                }
                Err(errors) if i % 3 == 0 => {
                    assert!(errors.has("username", FieldErrorKind::FormatInvalid));
                }
                other => panic!("unexpected result at {}: {:?}", i, other),
            }
        }
        assert!(worker_count() >= 2);
    }
}
