#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for geotagged post analysis.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use geotweets_spatial::{Crs, SpatialDataset, Zone, load_zones};
use geotweets_tweets::{
    EnrichedPost, FrequencyOptions, NightHomeAssigner, filter_and_home_assign,
    frequency::find_text_frequencies, ingest::read_posts_path, summary_stats,
};
use geotweets_tweets_models::config::AnalysisConfig;

#[derive(Parser)]
#[command(name = "geotweets", about = "Geotagged post analysis tool")]
struct Cli {
    /// TOML analysis config; built-in defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print post and user counts with the median and 99th percentile of
    /// posts per user
    Summary {
        /// Posts CSV
        posts: PathBuf,
    },
    /// Count the posts whose text matches a regular expression
    Frequency {
        /// Posts CSV
        posts: PathBuf,
        /// Regular expression to search for
        pattern: String,
        /// Match case exactly
        #[arg(long)]
        case_sensitive: bool,
        /// Print the matching fraction instead of counts
        #[arg(long)]
        ratio: bool,
    },
    /// Load a zone layer, convert it to WGS84 and list its zones
    Zones {
        /// Zone `GeoJSON` file
        zones: PathBuf,
        /// CRS to assume when the file declares none (e.g. "EPSG:28356")
        #[arg(long)]
        crs: Option<String>,
    },
    /// Filter users by activity, join posts to zones and infer homes.
    /// Writes one CSV row per joined post to stdout.
    Homes {
        /// Posts CSV
        posts: PathBuf,
        /// Zone `GeoJSON` file
        zones: PathBuf,
        /// CRS to assume when the zone file declares none
        #[arg(long)]
        crs: Option<String>,
        /// Minimum posts per user (inclusive)
        #[arg(long)]
        lower: Option<usize>,
        /// Maximum posts per user (exclusive)
        #[arg(long)]
        upper: Option<usize>,
        /// Hours east of UTC used for dates and hours
        #[arg(long, allow_hyphen_values = true)]
        utc_offset: Option<i32>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Summary { posts } => {
            let frame = read_posts_path(&posts, &config.columns)?;
            print!("{}", summary_stats(&frame)?);
        }
        Commands::Frequency {
            posts,
            pattern,
            case_sensitive,
            ratio,
        } => {
            let frame = read_posts_path(&posts, &config.columns)?;
            let options = FrequencyOptions {
                case_sensitive,
                ratio,
            };
            println!("{}", find_text_frequencies(&frame, &pattern, options)?);
        }
        Commands::Zones { zones, crs } => {
            if crs.is_some() {
                config.zones.crs = crs;
            }
            let layer = load_zone_layer(&zones, &config)?;
            println!("{:<20} PROPERTIES", "CODE");
            println!("{}", "-".repeat(50));
            for zone in layer.records() {
                println!("{:<20} {}", zone.code, zone.properties.len());
            }
            println!("{} zones", layer.len());
        }
        Commands::Homes {
            posts,
            zones,
            crs,
            lower,
            upper,
            utc_offset,
        } => {
            if crs.is_some() {
                config.zones.crs = crs;
            }
            if let Some(lower) = lower {
                config.bounds.lower = lower;
            }
            if let Some(upper) = upper {
                config.bounds.upper = upper;
            }
            if let Some(hours) = utc_offset {
                config.time.utc_offset_hours = hours;
            }

            let frame = read_posts_path(&posts, &config.columns)?;
            let layer = load_zone_layer(&zones, &config)?;
            let enriched = filter_and_home_assign(
                frame,
                &layer,
                config.bounds,
                config.time,
                &NightHomeAssigner::new(config.home),
            )?;

            write_enriched(std::io::stdout().lock(), &enriched)?;
        }
    }

    Ok(())
}

/// Reads the TOML config at `path`, or the defaults when there is none.
fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(AnalysisConfig::default());
    };

    log::info!("Loading config from {}", path.display());
    let contents = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}

/// Loads the zone layer and converts it to WGS84.
fn load_zone_layer(
    path: &Path,
    config: &AnalysisConfig,
) -> Result<SpatialDataset<Zone>, Box<dyn std::error::Error>> {
    let fallback = config
        .zones
        .crs
        .as_deref()
        .map(str::parse::<Crs>)
        .transpose()?;

    log::info!("Loading zones from {}", path.display());
    let document = std::fs::read_to_string(path)?;
    let layer = load_zones(&document, &config.zones.code_property, fallback)?;

    log::info!(
        "Loaded {} zones in {}",
        layer.len(),
        layer.crs().map_or_else(|| "an undeclared CRS".to_string(), |crs| crs.to_string())
    );

    Ok(layer.to_wgs84()?)
}

const ENRICHED_HEADER: [&str; 9] = [
    "u_id",
    "created_at",
    "lon",
    "lat",
    "zone_code",
    "timestamp",
    "hour",
    "home",
    "is_home",
];

fn write_enriched(
    writer: impl std::io::Write,
    posts: &[EnrichedPost],
) -> Result<(), Box<dyn std::error::Error>> {
    fn cell<T: ToString>(value: Option<T>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }

    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(ENRICHED_HEADER)?;

    for post in posts {
        writer.write_record([
            cell(post.post.u_id.as_deref()),
            cell(post.post.created_at),
            post.geometry.x().to_string(),
            post.geometry.y().to_string(),
            cell(post.zone_code.as_deref()),
            post.timestamp.to_string(),
            post.hour.to_string(),
            cell(post.home.as_deref()),
            post.is_home.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_homes_overrides() {
        let cli = Cli::try_parse_from([
            "geotweets",
            "homes",
            "posts.csv",
            "sa2.geojson",
            "--lower",
            "3",
            "--utc-offset",
            "-5",
            "--config",
            "run.toml",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("run.toml")));
        let Commands::Homes {
            lower,
            upper,
            utc_offset,
            ..
        } = cli.command
        else {
            panic!("expected the homes subcommand");
        };
        assert_eq!(lower, Some(3));
        assert_eq!(upper, None);
        assert_eq!(utc_offset, Some(-5));
    }

    #[test]
    fn missing_config_path_uses_defaults() {
        assert_eq!(load_config(None).unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn writes_one_row_per_post() {
        use chrono::NaiveDate;
        use geo::Point;
        use geotweets_tweets_models::Post;

        let date = NaiveDate::from_ymd_opt(2017, 7, 14).unwrap();
        let post = EnrichedPost {
            post: Post::new("u1", 151.2, -33.9, 1_500_000_000_000),
            geometry: Point::new(151.2, -33.9),
            zone: Some(0),
            zone_code: Some("117031337".to_string()),
            timestamp: date.and_hms_opt(2, 40, 0).unwrap(),
            date,
            hour: 2,
            home: None,
            is_home: false,
        };

        let mut out = Vec::new();
        write_enriched(&mut out, &[post]).unwrap();
        let text = String::from_utf8(out).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("u_id,created_at,lon,lat,zone_code,timestamp,hour,home,is_home")
        );
        assert_eq!(
            lines.next(),
            Some("u1,1500000000000,151.2,-33.9,117031337,2017-07-14 02:40:00,2,,false")
        );
        assert_eq!(lines.next(), None);
    }
}
