//! Run orchestration
//!
//! Groups the input requests per site, hands each group to the matching
//! extractor and collects one record per request. Groups run one after the
//! other; within a group URLs are scraped sequentially in input order.

use crate::config::Config;
use crate::extract::{AuctionExtractor, MarketplaceExtractor};
use crate::output::RunStatistics;
use crate::record::{NormalizedRecord, ScrapeRequest};
use crate::routing::{group_by_site, SiteGroup, SiteKind};
use crate::HarvestError;

/// Orchestrates a harvest run over a list of requests
pub struct Harvester {
    config: Config,
}

/// Records of a run together with its statistics
#[derive(Debug, Clone)]
pub struct HarvestReport {
    /// One record per input request, in site-group order
    pub records: Vec<NormalizedRecord>,
    pub statistics: RunStatistics,
}

impl Harvester {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Site groups the requests would be dispatched as
    pub fn plan(&self, requests: &[ScrapeRequest]) -> Vec<SiteGroup> {
        group_by_site(requests, &self.config.sites)
    }

    /// Scrapes every request and returns one record per request
    ///
    /// Records come back grouped by site; sorting by input position is the
    /// caller's job (see [`crate::output::sort_by_original_index`]).
    pub async fn run(&self, requests: &[ScrapeRequest]) -> Vec<NormalizedRecord> {
        self.run_with_statistics(requests).await.records
    }

    pub async fn run_with_statistics(&self, requests: &[ScrapeRequest]) -> HarvestReport {
        let mut records = Vec::with_capacity(requests.len());
        let mut statistics = RunStatistics::new();

        for group in self.plan(requests) {
            tracing::info!(
                site = %group.site_name,
                "Processing {} URL(s)",
                group.requests.len()
            );

            let site_records = self.harvest_group(&group).await;
            statistics.record(&group.site_name, &site_records);
            records.extend(site_records);
        }

        statistics.log();
        HarvestReport {
            records,
            statistics,
        }
    }

    async fn harvest_group(&self, group: &SiteGroup) -> Vec<NormalizedRecord> {
        match site_kind(&group.site_name) {
            Ok(SiteKind::Auction) => match AuctionExtractor::new(&self.config) {
                Ok(extractor) => extractor.run(&group.requests).await,
                Err(e) => {
                    tracing::error!("Could not build auction extractor: {}", e);
                    partial_records(&group.requests)
                }
            },
            Ok(SiteKind::Marketplace) => {
                MarketplaceExtractor::new(&self.config)
                    .run(&group.requests)
                    .await
            }
            Err(e) => {
                tracing::warn!(
                    "{}; keeping {} URL(s) as partial records",
                    e,
                    group.requests.len()
                );
                partial_records(&group.requests)
            }
        }
    }
}

fn site_kind(site_name: &str) -> Result<SiteKind, HarvestError> {
    SiteKind::from_site_name(site_name)
        .ok_or_else(|| HarvestError::UnsupportedSite(site_name.to_string()))
}

fn partial_records(requests: &[ScrapeRequest]) -> Vec<NormalizedRecord> {
    requests.iter().map(NormalizedRecord::partial).collect()
}
