// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use topicrawl::application::use_cases::crawl_use_case::BatchCrawler;
use topicrawl::application::use_cases::discovery_use_case::DiscoveryUseCase;
use topicrawl::config::settings::Settings;
use topicrawl::engines::fetcher::Fetcher;
use topicrawl::engines::reqwest_engine::ReqwestEngine;
use topicrawl::infrastructure::cache::content_cache::ContentCache;
use topicrawl::infrastructure::metrics;
use topicrawl::utils::telemetry;

#[derive(Parser)]
#[command(name = "topicrawl")]
#[command(about = "Topic-driven URL discovery and batch crawler")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover candidate URLs for every configured topic
    Discover,

    /// Crawl previously discovered URLs
    Crawl {
        /// Override the per-topic URL cap
        #[arg(long)]
        max_urls: Option<usize>,
    },

    /// Discover, then crawl
    Run,
}

/// 主函数
///
/// 加载配置、初始化日志，并执行子命令
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("failed to load configuration")?;
    telemetry::init_telemetry(&settings.log_level);
    metrics::init_metrics(settings.metrics_addr);
    info!(
        "Starting topicrawl: {} topics, output {}",
        settings.topics().len(),
        settings.output_dir.display()
    );

    match cli.command {
        Commands::Discover => discover(&settings).await,
        Commands::Crawl { max_urls } => crawl(&settings, max_urls).await,
        Commands::Run => {
            discover(&settings).await?;
            crawl(&settings, None).await
        }
    }
}

async fn discover(settings: &Settings) -> anyhow::Result<()> {
    let use_case = DiscoveryUseCase::from_settings(settings);
    let outcome = use_case.discover_all_topics(settings.topics()).await?;
    if !outcome.failed.is_empty() {
        info!("Topics without results: {:?}", outcome.failed);
    }
    Ok(())
}

async fn crawl(settings: &Settings, max_urls: Option<usize>) -> anyhow::Result<()> {
    let storage = settings.storage();
    let cache = ContentCache::open(storage.cache_dir(), settings.cache.persist_index)
        .await
        .context("failed to open content cache")?;
    let engine = ReqwestEngine::new(&settings.user_agent, settings.per_host_connections)?;
    let fetcher = Fetcher::new(
        Arc::new(engine),
        Arc::new(cache),
        settings.fetcher_config(),
    );

    let crawler = BatchCrawler::new(Arc::new(fetcher), storage);
    let summary = crawler
        .crawl_all_topics(
            settings.topics(),
            max_urls.unwrap_or(settings.max_urls_per_topic),
        )
        .await?;

    let stats = crawler.fetcher().cache().stats();
    info!(
        "Cache: {} hits, {} misses ({:.1}% hit rate); {} topics crawled, {} skipped, {} failed",
        stats.hits,
        stats.misses,
        stats.hit_rate * 100.0,
        summary.topics.len(),
        summary.skipped.len(),
        summary.failed.len()
    );
    Ok(())
}
