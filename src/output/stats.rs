//! Per-site run statistics
//!
//! Counts complete and partial records for each site group processed in a
//! run, in processing order.

use crate::record::NormalizedRecord;

/// Record counts for one site group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SiteStatistics {
    /// Records carrying an extracted listing
    pub complete: u64,

    /// Records holding only URL and index
    pub partial: u64,
}

impl SiteStatistics {
    pub fn total(&self) -> u64 {
        self.complete + self.partial
    }
}

/// Statistics of a whole run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStatistics {
    sites: Vec<(String, SiteStatistics)>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the records produced for `site` to its counters
    pub fn record(&mut self, site: &str, records: &[NormalizedRecord]) {
        let index = match self.sites.iter().position(|(name, _)| name == site) {
            Some(index) => index,
            None => {
                self.sites.push((site.to_string(), SiteStatistics::default()));
                self.sites.len() - 1
            }
        };

        let counts = &mut self.sites[index].1;
        for record in records {
            if record.is_partial() {
                counts.partial += 1;
            } else {
                counts.complete += 1;
            }
        }
    }

    pub fn site(&self, name: &str) -> Option<&SiteStatistics> {
        self.sites
            .iter()
            .find(|(site, _)| site == name)
            .map(|(_, counts)| counts)
    }

    /// Sites in the order they were processed
    pub fn sites(&self) -> impl Iterator<Item = (&str, &SiteStatistics)> {
        self.sites.iter().map(|(name, counts)| (name.as_str(), counts))
    }

    pub fn total_complete(&self) -> u64 {
        self.sites.iter().map(|(_, c)| c.complete).sum()
    }

    pub fn total_partial(&self) -> u64 {
        self.sites.iter().map(|(_, c)| c.partial).sum()
    }

    pub fn total_records(&self) -> u64 {
        self.total_complete() + self.total_partial()
    }

    /// Share of complete records, in percent
    pub fn success_rate(&self) -> f64 {
        let total = self.total_records();
        if total == 0 {
            0.0
        } else {
            self.total_complete() as f64 / total as f64 * 100.0
        }
    }

    pub fn log(&self) {
        for (site, counts) in self.sites() {
            tracing::info!(
                site,
                complete = counts.complete,
                partial = counts.partial,
                "Site finished"
            );
        }
        tracing::info!(
            "Run finished: {} record(s), {} complete, {} partial ({:.1}% success rate)",
            self.total_records(),
            self.total_complete(),
            self.total_partial(),
            self.success_rate()
        );
    }
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("By Site:");
    for (site, counts) in stats.sites() {
        println!(
            "  {}: {} record(s), {} complete, {} partial",
            site,
            counts.total(),
            counts.complete,
            counts.partial
        );
    }
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} records complete)",
        stats.success_rate(),
        stats.total_complete(),
        stats.total_records()
    );
}
