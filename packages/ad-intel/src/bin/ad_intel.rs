//! Ad-intel command line.
//!
//! Each subcommand is one stage of the pipeline: scrape into the database,
//! filter stored records for relevance, then prefilter, rank and tag Ads
//! Library exports on disk.

use ad_intel::output::{load_json_records, write_json_array, write_tagged_outputs};
use ad_intel::types::{AdRow, ReelRow};
use ad_intel::{
    ads_library_targets, prefilter, rank_ads, scrape_competitors, search_ads_library,
    AdFilterConfig, Competitor, Config, ContentTagger, EntryKind, FieldPath, FlattenedAd,
    GraphPageDirectory, OpenAiLlm, PageDirectory, PostgresStore, RankConfig, RecordStore,
    RelevanceClassifier, RetryPolicy, RowFilter, ScrapeConfig, TableName, TableSpec,
    TaggerConfig, TextSource,
};
use anyhow::{bail, Context, Result};
use apify_client::ApifyClient;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ad-intel")]
#[command(about = "Competitor ad scraping, relevance filtering, ranking and tagging")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the scrape tables if missing
    InitDb,

    /// Scrape competitors' Facebook ads and Instagram reels into the database
    Scrape {
        /// JSON array of {brand, facebook_url, instagram_username}
        #[arg(long)]
        competitors: PathBuf,
        #[arg(long, default_value_t = 8)]
        concurrency: usize,
        #[arg(long, default_value_t = 50)]
        ads_limit: u32,
        #[arg(long, default_value_t = 100)]
        reels_limit: u32,
        #[arg(long)]
        start_date: Option<NaiveDate>,
        #[arg(long)]
        end_date: Option<NaiveDate>,
    },

    /// Mark pending stored records relevant or not
    Filter {
        /// Comma-separated keywords. At least one is required; records are
        /// never sent to the model without a keyword to ask about
        #[arg(long)]
        keywords: String,
        /// Filter one table by JSON paths instead of the ads and reels tables
        #[arg(long, requires = "text_path")]
        table: Option<String>,
        /// Dotted JSON path to read text from (repeatable, needs --table)
        #[arg(long = "text-path", requires = "table")]
        text_path: Vec<String>,
    },

    /// Search the Ads Library for active video ads and save the raw items
    ///
    /// Every query and page id becomes one search URL in a single actor run.
    /// Brand names are resolved to page ids when FB_GRAPH_TOKEN is set.
    AdsLibrary {
        /// Brand name or keyword query (repeatable)
        #[arg(long, required_unless_present = "page_id")]
        query: Vec<String>,
        /// Numeric Facebook page id (repeatable)
        #[arg(long = "page-id")]
        page_id: Vec<String>,
        #[arg(long, default_value_t = 100)]
        count: u32,
        #[arg(long, default_value = "meta_ads.json")]
        output: PathBuf,
    },

    /// Flatten raw Ads Library items and keep long-running ads on popular pages
    Prefilter {
        #[arg(long, default_value = "meta_ads.json")]
        input: PathBuf,
        #[arg(long, default_value = "filtered_meta_ads.json")]
        output: PathBuf,
        #[arg(long, default_value_t = 14)]
        min_days: i64,
        #[arg(long, default_value_t = 18_000)]
        min_likes: i64,
    },

    /// Group prefiltered ads by video and keep the top groups
    Rank {
        #[arg(long, default_value = "filtered_meta_ads.json")]
        input: PathBuf,
        #[arg(long, default_value = "sorted_meta_ads.json")]
        output: PathBuf,
        #[arg(long, default_value_t = 40)]
        top_n: usize,
    },

    /// Assign content tags and split the results by persona
    Tag {
        #[arg(long, default_value = "sorted_meta_ads.json")]
        input: PathBuf,
        #[arg(long, default_value = "tagged_meta_ads")]
        output_dir: PathBuf,
        #[arg(long, value_enum, default_value_t = InputKind::Ads)]
        kind: InputKind,
    },

    /// Scrape short videos by hashtag and save the raw items
    Hashtags {
        #[arg(long, value_enum)]
        platform: Platform,
        /// Comma-separated hashtags
        #[arg(long)]
        hashtags: String,
        #[arg(long, default_value_t = 50)]
        max: u32,
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InputKind {
    /// Ranked Ads Library entries
    Ads,
    /// Short-video entries with url and title
    Shorts,
}

#[derive(Clone, Copy, ValueEnum)]
enum Platform {
    Tiktok,
    Youtube,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ad_intel=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::InitDb => {
            let store = connect_store(&config).await?;
            store.ensure_schema().await.context("Failed to create schema")?;
        }

        Commands::Scrape {
            competitors,
            concurrency,
            ads_limit,
            reels_limit,
            start_date,
            end_date,
        } => {
            let competitors: Vec<Competitor> = serde_json::from_str(
                &std::fs::read_to_string(&competitors)
                    .with_context(|| format!("Failed to read {}", competitors.display()))?,
            )
            .context("Competitor file must be a JSON array of competitors")?;

            let scrape_config = ScrapeConfig::default()
                .with_concurrency(concurrency)
                .with_limits(ads_limit, reels_limit)
                .with_date_range(start_date, end_date);

            let apify = ApifyClient::new(config.require_apify_token()?.to_string());
            let batch = scrape_competitors(&apify, &competitors, &scrape_config).await;

            let store = connect_store(&config).await?;
            let ads: Vec<AdRow> = batch.ads.iter().map(AdRow::from_item).collect();
            let reels: Vec<ReelRow> = batch.reels.iter().map(ReelRow::from_item).collect();
            if !ads.is_empty() {
                store.insert_ads(&ads).await.context("Failed to save ads")?;
            }
            if !reels.is_empty() {
                store.insert_reels(&reels).await.context("Failed to save reels")?;
            }
            info!(ads = ads.len(), reels = reels.len(), failed = batch.failed_tasks, "Scrape saved");
        }

        Commands::Filter {
            keywords,
            table,
            text_path,
        } => {
            let keywords = ad_intel::keyword::parse_keywords(&keywords);
            if keywords.is_empty() {
                bail!("--keywords must name at least one keyword");
            }

            let specs = match table {
                Some(table) => vec![TableSpec::new(
                    TableName::new(table)?,
                    TextSource::Paths(text_path.iter().map(|p| FieldPath::parse(p)).collect()),
                )],
                None => vec![TableSpec::competitor_ads()?, TableSpec::competitor_reels()?],
            };

            let llm = OpenAiLlm::new(config.require_openai_key()?);
            let classifier = RelevanceClassifier::new(llm, &config.llm_model)
                .with_window(config.call_window())
                .with_retry(RetryPolicy::linear(5, Duration::from_secs(5)));
            let filter = RowFilter::new(connect_store(&config).await?, classifier);

            for spec in &specs {
                let report = filter
                    .run(spec, &keywords)
                    .await
                    .with_context(|| format!("Filtering {} failed", spec.table))?;
                info!(
                    table = %spec.table,
                    relevant = report.relevant(),
                    rejected = report.rejected,
                    "Table filtered"
                );
            }
        }

        Commands::AdsLibrary {
            query,
            page_id,
            count,
            output,
        } => {
            let directory = config.facebook_graph_token.clone().map(GraphPageDirectory::new);
            if directory.is_none() {
                info!("FB_GRAPH_TOKEN not set, brand names are searched as keywords");
            }
            let targets = ads_library_targets(
                directory.as_ref().map(|d| d as &dyn PageDirectory),
                &query,
                &page_id,
            )
            .await;

            let apify = ApifyClient::new(config.require_apify_token()?.to_string());
            let items = search_ads_library(&apify, &targets, count)
                .await
                .context("Ads Library search failed")?;
            write_json_array(&output, &items)?;
        }

        Commands::Prefilter {
            input,
            output,
            min_days,
            min_likes,
        } => {
            let now = Utc::now();
            let ads: Vec<FlattenedAd> = load_json_records(&input)?
                .iter()
                .map(|item| FlattenedAd::from_raw(item, now))
                .collect();
            let filter_config = AdFilterConfig::default()
                .with_min_days_running(min_days)
                .with_min_page_likes(min_likes);

            let total = ads.len();
            let kept = prefilter(ads, &filter_config);
            info!(total, kept = kept.len(), "Prefiltered ads");
            write_json_array(&output, &kept)?;
        }

        Commands::Rank {
            input,
            output,
            top_n,
        } => {
            let mut ads = Vec::new();
            for record in load_json_records(&input)? {
                match serde_json::from_value::<FlattenedAd>(record) {
                    Ok(ad) => ads.push(ad),
                    Err(e) => tracing::warn!(error = %e, "Skipping malformed ad"),
                }
            }
            let ranked = rank_ads(&ads, &RankConfig::default().with_top_n(top_n));
            info!(ads = ads.len(), ranked = ranked.len(), "Ranked ads");
            write_json_array(&output, &ranked)?;
        }

        Commands::Tag {
            input,
            output_dir,
            kind,
        } => {
            let entries = load_json_records(&input)?;
            let llm = OpenAiLlm::new(config.require_openai_key()?);
            let tagger = ContentTagger::new(llm, TaggerConfig::default().with_model(&config.llm_model));

            let (kind, all_name) = match kind {
                InputKind::Ads => (EntryKind::RankedAds, "all_tagged.json"),
                InputKind::Shorts => (EntryKind::Shorts, "all_tagged_shorts.json"),
            };
            let tagged = tagger.tag_entries(&entries, kind).await;
            let outputs = write_tagged_outputs(&output_dir, all_name, &tagged)?;
            for (persona, path, count) in &outputs.personas {
                info!(persona = %persona, count, path = %path.display(), "Wrote persona file");
            }
        }

        Commands::Hashtags {
            platform,
            hashtags,
            max,
            output,
        } => {
            let hashtags = ad_intel::keyword::parse_keywords(&hashtags);
            if hashtags.is_empty() {
                bail!("--hashtags must name at least one hashtag");
            }
            let apify = ApifyClient::new(config.require_apify_token()?.to_string());
            let items = match platform {
                Platform::Tiktok => apify.scrape_tiktok_hashtags(&hashtags, max).await,
                Platform::Youtube => apify.scrape_youtube_shorts(&hashtags, max).await,
            }
            .context("Hashtag scrape failed")?;
            write_json_array(&output, &items)?;
        }
    }

    Ok(())
}

async fn connect_store(config: &Config) -> Result<PostgresStore> {
    PostgresStore::connect(config.require_database_url()?)
        .await
        .context("Failed to connect to database")
}
