//! Remediation catalog
//!
//! Maps metric names to a probable cause, ordered remediation steps and an
//! impact estimate. Names are matched by keyword family; the first family
//! whose keyword appears in the lower-cased metric name wins.

use crate::models::Severity;

/// Remediation guidance for one family of metrics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Remediation {
    /// Short family name shown by `scorer actions`
    pub family: &'static str,
    pub keywords: &'static [&'static str],
    /// Completes the sentence "... suggests {cause}"
    pub cause: &'static str,
    pub actions: &'static [&'static str],
    pub impact: &'static str,
    pub critical_impact: &'static str,
    /// Hourly revenue lost per unit of the observed value; when set, the
    /// critical impact is quoted in dollars instead of `critical_impact`
    pub revenue_per_unit: Option<f64>,
}

impl Remediation {
    pub fn matches(&self, metric: &str) -> bool {
        let name = metric.to_lowercase();
        self.keywords.iter().any(|k| name.contains(k))
    }

    pub fn impact_for(&self, severity: Severity, observed: f64) -> String {
        match (severity, self.revenue_per_unit) {
            (Severity::Critical, Some(rate)) => {
                format!("${}/hour in lost revenue", (observed * rate).trunc() as i64)
            }
            (Severity::Critical, None) => self.critical_impact.to_string(),
            _ => self.impact.to_string(),
        }
    }

    pub fn action_list(&self) -> Vec<String> {
        self.actions.iter().map(|a| a.to_string()).collect()
    }
}

const ERRORS: Remediation = Remediation {
    family: "errors",
    keywords: &["error", "fail", "5xx", "exception"],
    cause: "degraded service reliability, often after a deployment or a dependency failure",
    actions: &[
        "Investigate recent deployments or configuration changes",
        "Check application logs for specific error patterns",
        "Verify external dependencies are functioning properly",
        "Consider rolling back to previous version if issues persist",
    ],
    impact: "Medium business impact",
    critical_impact: "Customer-facing failures, revenue at risk",
    revenue_per_unit: Some(1000.0),
};

const LATENCY: Remediation = Remediation {
    family: "latency",
    keywords: &["latency", "response_time", "duration"],
    cause: "resource saturation or a performance regression",
    actions: &[
        "Scale up application pods to handle increased load",
        "Check database query performance and connection pools",
        "Analyze CPU and memory usage patterns",
        "Review recent code changes for performance regressions",
    ],
    impact: "Minor user experience impact",
    critical_impact: "20% user satisfaction decrease",
    revenue_per_unit: None,
};

const CPU: Remediation = Remediation {
    family: "cpu",
    keywords: &["cpu"],
    cause: "resource exhaustion or unexpected workloads such as crypto-mining",
    actions: &[
        "Immediately check for unusual processes or security breaches",
        "Scale horizontal pod autoscaler limits if legitimate load",
        "Investigate potential memory leaks or infinite loops",
        "Review resource requests and limits configuration",
    ],
    impact: "Performance degradation likely",
    critical_impact: "Service degradation imminent",
    revenue_per_unit: None,
};

const MEMORY: Remediation = Remediation {
    family: "memory",
    keywords: &["memory", "mem_", "heap", "rss"],
    cause: "a memory leak or undersized memory limits",
    actions: &[
        "Inspect heap usage trends for steady growth",
        "Review container memory requests and limits",
        "Check recent changes to caching behavior",
        "Restart affected pods if usage approaches the limit",
    ],
    impact: "Elevated eviction risk",
    critical_impact: "OOM kills likely",
    revenue_per_unit: None,
};

const TRAFFIC: Remediation = Remediation {
    family: "traffic",
    keywords: &["request", "traffic", "rps", "qps"],
    cause: "a traffic surge or abusive clients",
    actions: &[
        "Verify autoscaling is keeping up with demand",
        "Check for bot traffic or abusive clients",
        "Enable or tighten rate limiting",
        "Confirm upstream caches are serving hits",
    ],
    impact: "Increased infrastructure cost",
    critical_impact: "Capacity exhaustion likely",
    revenue_per_unit: None,
};

const FALLBACK: Remediation = Remediation {
    family: "other",
    keywords: &[],
    cause: "an unexpected change in workload behavior",
    actions: &[
        "Correlate the change with recent deployments",
        "Review dashboards for related metrics",
        "Escalate to the owning team if the deviation persists",
    ],
    impact: "Unknown impact, investigate",
    critical_impact: "Unknown impact, investigate urgently",
    revenue_per_unit: None,
};

static CATALOG: [Remediation; 6] = [ERRORS, LATENCY, CPU, MEMORY, TRAFFIC, FALLBACK];

/// Every catalog entry in match order; the last entry is the fallback
pub fn catalog() -> &'static [Remediation] {
    &CATALOG
}

/// Remediation for a metric name, falling back to generic guidance
pub fn lookup(metric: &str) -> &'static Remediation {
    CATALOG[..CATALOG.len() - 1]
        .iter()
        .find(|entry| entry.matches(metric))
        .unwrap_or(&CATALOG[CATALOG.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_keyword() {
        assert_eq!(lookup("error_rate").family, "errors");
        assert_eq!(lookup("http_5xx_total").family, "errors");
        assert_eq!(lookup("response_time").family, "latency");
        assert_eq!(lookup("CPU_Usage").family, "cpu");
        assert_eq!(lookup("container_memory_rss").family, "memory");
        assert_eq!(lookup("request_rate").family, "traffic");
    }

    #[test]
    fn test_first_family_wins() {
        // "request_errors" names both traffic and errors; errors is listed first
        assert_eq!(lookup("request_errors").family, "errors");
    }

    #[test]
    fn test_fallback() {
        let entry = lookup("queue_depth");
        assert_eq!(entry.family, "other");
        assert!(!entry.actions.is_empty());
    }

    #[test]
    fn test_impact_by_severity() {
        let entry = lookup("cpu_usage");
        assert_eq!(entry.impact_for(Severity::Critical, 0.9), "Service degradation imminent");
        assert_eq!(entry.impact_for(Severity::High, 0.9), "Performance degradation likely");
    }

    #[test]
    fn test_critical_error_impact_scales_with_value() {
        let entry = lookup("error_rate");
        assert_eq!(entry.impact_for(Severity::Critical, 0.25), "$250/hour in lost revenue");
        assert_eq!(entry.impact_for(Severity::Critical, 1.5), "$1500/hour in lost revenue");
        assert_eq!(entry.impact_for(Severity::High, 0.25), "Medium business impact");
    }

    #[test]
    fn test_catalog_ends_with_fallback() {
        let entries = catalog();
        assert_eq!(entries.len(), 6);
        assert!(entries.last().unwrap().keywords.is_empty());
    }
}
