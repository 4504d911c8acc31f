//! Pre-run validation of a sequencing run's sample and index layout.
//!
//! [`validate`] is a pure function of the run and the instrument description:
//! it reads the samples, groups them by lane and reports index collisions,
//! dark-cycle starts, per-cycle color balance and configuration problems in a
//! single [`ValidationResult`].
#![deny(future_incompatible, nonstandard_style, rust_2018_idioms)]

pub mod collision;
pub mod color_balance;
pub mod configuration;
pub mod dark_cycle;
pub mod lanes;
pub mod result;
pub mod sample_ids;

pub use collision::{CollisionMode, IndexCollision, IndexDistanceMatrix};
pub use color_balance::{ColorBalancePosition, ColorBalanceStatus, LaneColorBalance};
pub use configuration::{ConfigurationIssue, IssueCategory, Severity};
pub use dark_cycle::DarkCycleFinding;
pub use result::{approve, ApprovalRefused, ExternalIssue, ValidationResult};
pub use sample_ids::DuplicateSampleId;

use log::{debug, info};
use run_types::{InstrumentCatalog, InstrumentChannelConfig, SequencingRun};

/// Validate `run` on a flowcell with `lane_count` lanes. `channel` is the
/// instrument's two-color channel layout; without one the dark-cycle and
/// color-balance checks are skipped.
pub fn validate(
    run: &SequencingRun,
    channel: Option<&InstrumentChannelConfig>,
    lane_count: usize,
) -> ValidationResult {
    let groups = lanes::group_indexed_samples(&run.samples, lane_count);
    debug!(
        "validating {} samples over {} lanes ({} with indexed samples)",
        run.samples.len(),
        lane_count,
        groups.len()
    );

    let (dark_cycle_findings, color_balance) = match channel {
        Some(channel) if !run.samples.is_empty() => (
            dark_cycle::check_dark_cycles(&run.samples, channel),
            color_balance::color_balance(&groups, channel),
        ),
        _ => Default::default(),
    };

    let result = ValidationResult {
        duplicate_sample_ids: sample_ids::duplicate_sample_ids(&run.samples),
        index_collisions: collision::detect_collisions(&groups),
        distance_matrices: collision::distance_matrices(&groups),
        dark_cycle_findings,
        color_balance,
        configuration_issues: configuration::check_configuration(run, lane_count),
        external_issues: Vec::new(),
        channel_config: channel.cloned(),
    };
    info!(
        "validation of run '{}': {} error(s), {} warning(s), {} lane(s) with color balance issues",
        run.run_name,
        result.error_count(),
        result.warning_count(),
        result.color_balance_issue_count()
    );
    result
}

/// [`validate`] with the channel layout and lane count looked up in `catalog`.
pub fn validate_with_catalog(run: &SequencingRun, catalog: &InstrumentCatalog) -> ValidationResult {
    let channel = catalog.channel_config(&run.instrument);
    let lane_count = catalog.lanes_for_flowcell(&run.instrument, &run.flowcell);
    validate(run, channel.as_ref(), lane_count)
}
