use std::sync::Arc;
use std::time::Duration;

use hdrhistogram::Histogram;

use crate::config::Target;
use crate::outcome::{Outcome, Stage};

/// Upper bound for recorded latencies: one hour in microseconds.
const HISTOGRAM_MAX_MICROS: u64 = 3_600_000_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyPercentiles {
    pub p50: Duration,
    pub p90: Duration,
    pub p99: Duration,
}

/// Statistics for one stage partition. Empty partitions report zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSummary {
    pub stage: Stage,
    pub total: u64,
    pub successes: u64,
    pub errors: u64,
    /// Fraction of successful outcomes in `0.0..=1.0`.
    pub success_rate: f64,
    pub mean_elapsed: Duration,
    pub max_elapsed: Duration,
    pub latency: Option<LatencyPercentiles>,
}

impl StageSummary {
    fn from_partition(stage: Stage, outcomes: &[&Outcome]) -> Self {
        let total = outcomes.len() as u64;
        let successes = outcomes.iter().filter(|o| o.is_success()).count() as u64;

        let (success_rate, mean_elapsed) = if total == 0 {
            (0.0, Duration::ZERO)
        } else {
            let sum_nanos: u128 = outcomes.iter().map(|o| o.elapsed().as_nanos()).sum();
            let mean_nanos = u64::try_from(sum_nanos / u128::from(total)).unwrap_or(u64::MAX);
            (
                successes as f64 / total as f64,
                Duration::from_nanos(mean_nanos),
            )
        };

        let max_elapsed = outcomes
            .iter()
            .map(|o| o.elapsed())
            .max()
            .unwrap_or(Duration::ZERO);

        Self {
            stage,
            total,
            successes,
            errors: total - successes,
            success_rate,
            mean_elapsed,
            max_elapsed,
            latency: percentiles(outcomes),
        }
    }
}

fn percentiles(outcomes: &[&Outcome]) -> Option<LatencyPercentiles> {
    if outcomes.is_empty() {
        return None;
    }

    let mut h = Histogram::<u64>::new_with_bounds(1, HISTOGRAM_MAX_MICROS, 3).ok()?;
    for o in outcomes {
        let micros = u64::try_from(o.elapsed().as_micros()).unwrap_or(u64::MAX);
        h.saturating_record(micros.clamp(1, HISTOGRAM_MAX_MICROS));
    }

    let at = |q: f64| Duration::from_micros(h.value_at_quantile(q));
    Some(LatencyPercentiles {
        p50: at(0.50),
        p90: at(0.90),
        p99: at(0.99),
    })
}

/// Running failure count after each outcome, ordered by the outcome's own duration.
///
/// Sorting by duration is a coarse stand-in for a wall-clock timeline: concurrent calls
/// overlap, so "took long" and "happened late" are conflated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorPoint {
    pub elapsed: Duration,
    pub errors_so_far: u64,
}

/// Elapsed times observed for one endpoint identity.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointSeries {
    pub endpoint: Arc<str>,
    pub stage: Stage,
    pub elapsed: Vec<Duration>,
}

/// Read-only summary computed fresh from a full outcome collection.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    pub register: StageSummary,
    pub login: StageSummary,
    pub endpoints: StageSummary,
    pub total_outcomes: u64,
    pub total_errors: u64,
    pub cumulative_errors: Vec<ErrorPoint>,
    pub by_endpoint: Vec<EndpointSeries>,
}

impl AggregateReport {
    pub fn stages(&self) -> [&StageSummary; 3] {
        [&self.register, &self.login, &self.endpoints]
    }
}

pub fn summarize(outcomes: &[Outcome], target: &Target) -> AggregateReport {
    let mut register = Vec::new();
    let mut login = Vec::new();
    let mut endpoints = Vec::new();

    for o in outcomes {
        match target.stage_of(o.endpoint()) {
            Some(Stage::Register) => register.push(o),
            Some(Stage::Login) => login.push(o),
            Some(Stage::EndpointCall) => endpoints.push(o),
            None => {}
        }
    }

    AggregateReport {
        register: StageSummary::from_partition(Stage::Register, &register),
        login: StageSummary::from_partition(Stage::Login, &login),
        endpoints: StageSummary::from_partition(Stage::EndpointCall, &endpoints),
        total_outcomes: outcomes.len() as u64,
        total_errors: outcomes.iter().filter(|o| !o.is_success()).count() as u64,
        cumulative_errors: cumulative_errors(outcomes),
        by_endpoint: by_endpoint(outcomes, target),
    }
}

fn cumulative_errors(outcomes: &[Outcome]) -> Vec<ErrorPoint> {
    let mut sorted: Vec<&Outcome> = outcomes.iter().collect();
    // Stable sort keeps ties deterministic for a given input order.
    sorted.sort_by_key(|o| o.elapsed());

    let mut errors_so_far = 0u64;
    sorted
        .into_iter()
        .map(|o| {
            if !o.is_success() {
                errors_so_far += 1;
            }
            ErrorPoint {
                elapsed: o.elapsed(),
                errors_so_far,
            }
        })
        .collect()
}

fn by_endpoint(outcomes: &[Outcome], target: &Target) -> Vec<EndpointSeries> {
    let routes = [(&target.register, Stage::Register), (&target.login, Stage::Login)]
        .into_iter()
        .chain(target.endpoints.iter().map(|r| (r, Stage::EndpointCall)));

    routes
        .map(|(route, stage)| EndpointSeries {
            endpoint: route.path.clone(),
            stage,
            elapsed: outcomes
                .iter()
                .filter(|o| o.endpoint() == &*route.path)
                .map(|o| o.elapsed())
                .collect(),
        })
        .collect()
}
