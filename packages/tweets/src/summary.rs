//! Descriptive statistics over posts per user.

use geotweets_tweets_models::{PostFrame, SummaryStats};

use crate::TweetsError;

/// Counts posts and distinct users, and computes the median and 99th
/// percentile of posts per user.
///
/// # Errors
///
/// Returns [`TweetsError::MissingColumn`] if the frame has no `u_id` column.
pub fn summary_stats(frame: &PostFrame) -> Result<SummaryStats, TweetsError> {
    let per_user = frame.posts_per_user()?;

    let mut sizes: Vec<usize> = per_user.into_values().collect();
    sizes.sort_unstable();

    let stats = SummaryStats {
        total_posts: frame.len(),
        unique_users: sizes.len(),
        median_posts_per_user: quantile(&sizes, 0.5),
        p99_posts_per_user: quantile(&sizes, 0.99),
    };

    log::info!("{} total posts", stats.total_posts);
    log::info!("{} unique users", stats.unique_users);

    Ok(stats)
}

/// The `q`-quantile of an ascending slice, interpolating linearly between
/// the two nearest ranks. `None` for an empty slice.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn quantile(sorted: &[usize], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let position = q.clamp(0.0, 1.0) * last as f64;

    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - position.floor();

    let lo = sorted[lower] as f64;
    let hi = sorted[upper] as f64;
    Some((hi - lo).mul_add(weight, lo))
}
