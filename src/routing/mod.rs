//! Site routing for Listing-Harvest
//!
//! Maps input URLs to site identifiers through the configured routing table and
//! groups requests per site while keeping their input order.

mod matcher;

use crate::record::ScrapeRequest;
use serde::Deserialize;

pub use matcher::{matches_domain, route};

/// Site name given to URLs that match no routing entry
pub const UNKNOWN_SITE: &str = "unknown";

/// A routing-table entry: URLs containing `domain` belong to `site_name`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteBinding {
    pub domain: String,
    pub site_name: String,
}

impl SiteBinding {
    pub fn new(domain: impl Into<String>, site_name: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            site_name: site_name.into(),
        }
    }
}

/// Sites with a dedicated extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteKind {
    /// Auction listings served as static markup (`yahauc`)
    Auction,
    /// Marketplace listings that need a rendering browser (`mercari`)
    Marketplace,
}

impl SiteKind {
    /// Resolves a routing-table site name to its extractor
    pub fn from_site_name(name: &str) -> Option<Self> {
        match name {
            "yahauc" => Some(Self::Auction),
            "mercari" => Some(Self::Marketplace),
            _ => None,
        }
    }

    pub fn site_name(&self) -> &'static str {
        match self {
            Self::Auction => "yahauc",
            Self::Marketplace => "mercari",
        }
    }
}

/// All requests routed to one site, in input order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteGroup {
    pub site_name: String,
    pub requests: Vec<ScrapeRequest>,
}

/// Groups requests by destination site
///
/// Groups follow routing-table order (one group per distinct site name, empty
/// groups omitted); requests matching no entry are collected in a trailing
/// [`UNKNOWN_SITE`] group. Every request lands in exactly one group.
pub fn group_by_site(requests: &[ScrapeRequest], bindings: &[SiteBinding]) -> Vec<SiteGroup> {
    let mut groups: Vec<SiteGroup> = Vec::new();
    for binding in bindings {
        if !groups.iter().any(|g| g.site_name == binding.site_name) {
            groups.push(SiteGroup {
                site_name: binding.site_name.clone(),
                requests: Vec::new(),
            });
        }
    }

    let mut unknown = Vec::new();
    for request in requests {
        match route(&request.url, bindings) {
            Some(binding) => {
                if let Some(group) = groups.iter_mut().find(|g| g.site_name == binding.site_name) {
                    group.requests.push(request.clone());
                }
            }
            None => {
                tracing::debug!("No site binding for {}", request.url);
                unknown.push(request.clone());
            }
        }
    }

    if !unknown.is_empty() {
        groups.push(SiteGroup {
            site_name: UNKNOWN_SITE.to_string(),
            requests: unknown,
        });
    }

    groups.retain(|g| !g.requests.is_empty());
    groups
}
