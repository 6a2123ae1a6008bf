//! Work unit generation and admission control
//!
//! This module handles:
//! - Expanding locations x category tabs x subcategories into work units
//! - Grouping units by location and tab the way the orchestrator walks them
//! - The admission gate bounding how many unit pipelines run at once

use crate::config::CategoriesConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::{Semaphore, SemaphorePermit};

/// Top-level tab a subcategory is listed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoryTab {
    Activities,
    Events,
}

impl CategoryTab {
    /// Tabs in crawl order
    pub const ALL: [CategoryTab; 2] = [CategoryTab::Activities, CategoryTab::Events];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activities => "Activities",
            Self::Events => "Events",
        }
    }

    /// Subcategories configured for this tab
    pub fn sub_categories<'a>(&self, categories: &'a CategoriesConfig) -> &'a [String] {
        match self {
            Self::Activities => &categories.activities,
            Self::Events => &categories.events,
        }
    }
}

impl fmt::Display for CategoryTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One location / tab / subcategory combination to scrape
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkUnit {
    pub location: String,
    pub category_tab: CategoryTab,
    pub sub_category: String,
}

impl fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} @ {}",
            self.category_tab, self.sub_category, self.location
        )
    }
}

/// Expands the configuration into the ordered list of work units
///
/// Locations are the outer loop, tabs (Activities, then Events) the middle
/// and subcategories the inner loop, each in configuration order. The
/// result depends only on its inputs, so two crawls over the same
/// configuration visit units in the same order.
///
/// # Example
///
/// ```
/// use event_sweep::config::CategoriesConfig;
/// use event_sweep::crawler::{generate_work_units, CategoryTab};
///
/// let categories = CategoriesConfig {
///     activities: vec!["museums".to_string()],
///     events: vec!["music".to_string()],
/// };
/// let units = generate_work_units(&["pune".to_string()], &categories);
/// assert_eq!(units.len(), 2);
/// assert_eq!(units[0].category_tab, CategoryTab::Activities);
/// assert_eq!(units[1].sub_category, "music");
/// ```
pub fn generate_work_units(locations: &[String], categories: &CategoriesConfig) -> Vec<WorkUnit> {
    let mut units = Vec::new();
    for location in locations {
        for tab in CategoryTab::ALL {
            for sub in tab.sub_categories(categories) {
                units.push(WorkUnit {
                    location: location.clone(),
                    category_tab: tab,
                    sub_category: sub.clone(),
                });
            }
        }
    }
    units
}

/// Units of one location, split into runs that share a tab
#[derive(Debug)]
pub struct LocationPlan<'a> {
    pub location: &'a str,
    pub tabs: Vec<&'a [WorkUnit]>,
}

/// Groups consecutive units by location, then by tab, keeping their order
pub fn plan_by_location(units: &[WorkUnit]) -> Vec<LocationPlan<'_>> {
    let mut plans: Vec<LocationPlan<'_>> = Vec::new();
    let mut start = 0;

    while start < units.len() {
        let first = &units[start];
        let len = units[start..]
            .iter()
            .take_while(|u| u.location == first.location && u.category_tab == first.category_tab)
            .count();
        let run = &units[start..start + len];

        match plans.last_mut() {
            Some(plan) if plan.location == first.location => plan.tabs.push(run),
            _ => plans.push(LocationPlan {
                location: &first.location,
                tabs: vec![run],
            }),
        }

        start += len;
    }

    plans
}

/// Bounds how many unit pipelines run at once
///
/// Permits are handed out first come, first served, so pipelines created in
/// generator order also start in generator order.
#[derive(Debug)]
pub struct AdmissionGate {
    permits: Semaphore,
    limit: usize,
}

impl AdmissionGate {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            permits: Semaphore::new(limit),
            limit,
        }
    }

    /// Waits for a free slot; the slot is released when the permit drops
    ///
    /// Returns `None` only if the gate was closed.
    pub async fn enter(&self) -> Option<SemaphorePermit<'_>> {
        self.permits.acquire().await.ok()
    }

    /// Maximum number of pipelines admitted at once
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
