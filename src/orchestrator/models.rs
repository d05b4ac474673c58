//! Orchestrator result types

use crate::catalog::CatalogItem;
use crate::resolve::{Resolved, Source};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;

/// A result set as handed to callers and stored in the listing cache
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub items: Vec<CatalogItem>,
    pub source: Source,
    /// Served from the listing cache
    pub cached: bool,
    pub fetched_at: DateTime<Utc>,
}

impl Listing {
    pub fn new(items: Vec<CatalogItem>, source: Source) -> Self {
        Self {
            items,
            source,
            cached: false,
            fetched_at: Utc::now(),
        }
    }

    /// Result computed without any network call
    pub fn local(items: Vec<CatalogItem>) -> Self {
        Self::new(items, Source::Local)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl From<Resolved> for Listing {
    fn from(resolved: Resolved) -> Self {
        Self::new(resolved.items, resolved.source)
    }
}

/// A single item as handed to detail views
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemDetail {
    /// `None` when neither provider knows the identifier
    pub item: Option<CatalogItem>,
    pub source: Source,
    pub cached: bool,
    pub fetched_at: DateTime<Utc>,
}

impl From<Listing> for ItemDetail {
    fn from(listing: Listing) -> Self {
        Self {
            item: listing.items.into_iter().next(),
            source: listing.source,
            cached: listing.cached,
            fetched_at: listing.fetched_at,
        }
    }
}

/// Caller-visible outcome of an orchestrator operation
///
/// `Superseded` means a newer call of the same kind took over; the caller
/// must leave its current state untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery<T> {
    Ready(T),
    Superseded,
}

impl<T> Delivery<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Superseded => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded)
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Delivery<U> {
        match self {
            Self::Ready(value) => Delivery::Ready(f(value)),
            Self::Superseded => Delivery::Superseded,
        }
    }
}

/// Search results plus the recommendations fetched for the first hit
#[derive(Debug)]
pub struct SearchResults {
    pub listing: Listing,
    /// Runs under its own slot; `None` when the search found nothing
    pub related: Option<JoinHandle<Delivery<Listing>>>,
}

/// Handle of a debounced call
#[derive(Debug)]
pub enum Debounced<T> {
    /// Answered on the spot, no debounce and no network
    Immediate(T),
    /// Fires after the quiet period; yields `None` when a later call replaced it
    Scheduled(JoinHandle<Option<Delivery<T>>>),
}
