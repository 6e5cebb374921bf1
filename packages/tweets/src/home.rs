//! Home-zone inference.
//!
//! The pipeline asks a [`HomeAssigner`] for one home value per enriched
//! post. [`NightHomeAssigner`] is the default rule: a user's home is the
//! zone they post from on the most distinct nights.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use geotweets_tweets_models::config::HomeRuleConfig;

use crate::EnrichedPost;

/// Assigns a home zone code to every post.
pub trait HomeAssigner {
    /// Returns exactly one entry per post, `None` where no home could be
    /// inferred for the post's user.
    fn assign(&self, posts: &[EnrichedPost]) -> Vec<Option<String>>;
}

/// Infers homes from night-time activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NightHomeAssigner {
    rule: HomeRuleConfig,
}

#[derive(Default)]
struct ZoneTally {
    nights: BTreeSet<NaiveDate>,
    posts: usize,
}

impl NightHomeAssigner {
    #[must_use]
    pub const fn new(rule: HomeRuleConfig) -> Self {
        Self { rule }
    }

    /// The date a night began on. Early-morning hours of a window that
    /// wraps past midnight belong to the previous evening.
    fn night_of(&self, date: NaiveDate, hour: u32) -> NaiveDate {
        let wraps = self.rule.night_start_hour > self.rule.night_end_hour;
        if wraps && hour < self.rule.night_end_hour {
            date.pred_opt().unwrap_or(date)
        } else {
            date
        }
    }

    /// Picks each user's home: the zone with the most distinct night dates,
    /// then the most night posts, then the smallest code.
    fn homes_by_user<'a>(&self, posts: &'a [EnrichedPost]) -> BTreeMap<&'a str, &'a str> {
        let mut tallies: BTreeMap<&str, BTreeMap<&str, ZoneTally>> = BTreeMap::new();

        for post in posts {
            let (Some(u_id), Some(zone)) = (post.post.u_id.as_deref(), post.zone_code.as_deref())
            else {
                continue;
            };
            if !self.rule.is_night(post.hour) {
                continue;
            }

            let tally = tallies.entry(u_id).or_default().entry(zone).or_default();
            tally.nights.insert(self.night_of(post.date, post.hour));
            tally.posts += 1;
        }

        tallies
            .into_iter()
            .filter_map(|(u_id, zones)| {
                let (zone, tally) = zones.into_iter().max_by(|(za, a), (zb, b)| {
                    a.nights
                        .len()
                        .cmp(&b.nights.len())
                        .then(a.posts.cmp(&b.posts))
                        .then_with(|| zb.cmp(za))
                })?;

                if tally.nights.len() < self.rule.min_nights {
                    log::trace!(
                        "User {u_id}: best zone {zone} has {} nights, below {}",
                        tally.nights.len(),
                        self.rule.min_nights
                    );
                    return None;
                }
                Some((u_id, zone))
            })
            .collect()
    }
}

impl HomeAssigner for NightHomeAssigner {
    fn assign(&self, posts: &[EnrichedPost]) -> Vec<Option<String>> {
        let homes = self.homes_by_user(posts);

        log::debug!("Inferred a home zone for {} users", homes.len());

        posts
            .iter()
            .map(|post| {
                post.post
                    .u_id
                    .as_deref()
                    .and_then(|u_id| homes.get(u_id))
                    .map(|zone| (*zone).to_string())
            })
            .collect()
    }
}

/// Whether a post was made in its assigned home zone. Always `false` when
/// either the home or the post's zone is absent.
#[must_use]
pub fn is_home(zone_code: Option<&str>, home: Option<&str>) -> bool {
    matches!((zone_code, home), (Some(zone), Some(home)) if zone == home)
}
