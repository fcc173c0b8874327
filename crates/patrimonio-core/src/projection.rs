//! Pure views derived from the reconciled state.

use serde::Serialize;

use crate::model::{Asset, Collaborator};
use crate::reconcile::ReconciledState;

/// Owner label of assets in the unassigned pool.
pub const UNASSIGNED_LABEL: &str = "Unassigned";

/// Number of bars on the dashboard chart.
pub const TOP_USAGE_LIMIT: usize = 10;

/// An asset in the global list, annotated with its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetListing<'a> {
    #[serde(flatten)]
    pub asset: &'a Asset,
    pub owner_id: Option<&'a str>,
    /// Owner's full name, or [`UNASSIGNED_LABEL`].
    pub owner_label: &'a str,
    pub owner_username: Option<&'a str>,
}

impl AssetListing<'_> {
    fn matches(&self, needle: &str) -> bool {
        contains(&self.asset.name, needle)
            || contains(&self.asset.asset_tag, needle)
            || contains(&self.asset.category, needle)
            || contains(self.owner_label, needle)
            || self.owner_username.is_some_and(|u| contains(u, needle))
    }
}

/// One bar of the dashboard chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageBar {
    pub collaborator_id: String,
    pub username: String,
    pub assets: usize,
}

/// Dashboard figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub collaborators: usize,
    pub assigned_assets: usize,
    pub unassigned_assets: usize,
    pub total_assets: usize,
    pub top: Vec<UsageBar>,
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Assets shown in a collaborator's expanded detail.
#[must_use]
pub fn collaborator_assets(collaborator: &Collaborator) -> &[Asset] {
    &collaborator.assets
}

/// Every asset, owned ones first, then the unassigned pool, filtered by a
/// case-insensitive substring match against name, tag, category and owner.
///
/// An empty `term` keeps everything. Whitespace in `term` is matched as-is.
#[must_use]
pub fn global_assets<'a>(state: &'a ReconciledState, term: &str) -> Vec<AssetListing<'a>> {
    let needle = term.to_lowercase();

    let owned = state.collaborators.iter().flat_map(|collaborator| {
        collaborator.assets.iter().map(move |asset| AssetListing {
            asset,
            owner_id: Some(collaborator.id.as_str()),
            owner_label: collaborator.full_name.as_str(),
            owner_username: Some(collaborator.username.as_str()),
        })
    });
    let pool = state.unassigned.iter().map(|asset| AssetListing {
        asset,
        owner_id: None,
        owner_label: UNASSIGNED_LABEL,
        owner_username: None,
    });

    owned
        .chain(pool)
        .filter(|listing| needle.is_empty() || listing.matches(&needle))
        .collect()
}

/// Collaborators with the most assets, largest first, at most `limit`.
///
/// Collaborators without assets are left out; ties keep backend order.
#[must_use]
pub fn top_usage(collaborators: &[Collaborator], limit: usize) -> Vec<UsageBar> {
    let mut bars: Vec<UsageBar> = collaborators
        .iter()
        .filter(|c| !c.assets.is_empty())
        .map(|c| UsageBar {
            collaborator_id: c.id.clone(),
            username: c.username.clone(),
            assets: c.asset_count(),
        })
        .collect();
    bars.sort_by(|a, b| b.assets.cmp(&a.assets));
    bars.truncate(limit);
    bars
}

#[must_use]
pub fn dashboard(state: &ReconciledState) -> DashboardSummary {
    let assigned_assets = state.assigned_count();
    let unassigned_assets = state.unassigned.len();
    DashboardSummary {
        collaborators: state.collaborators.len(),
        assigned_assets,
        unassigned_assets,
        total_assets: assigned_assets + unassigned_assets,
        top: top_usage(&state.collaborators, TOP_USAGE_LIMIT),
    }
}

/// Collaborators whose full name, username or any owned asset tag contains
/// `term`, case-insensitively.
#[must_use]
pub fn search_collaborators<'a>(
    collaborators: &'a [Collaborator],
    term: &str,
) -> Vec<&'a Collaborator> {
    let needle = term.to_lowercase();
    collaborators
        .iter()
        .filter(|c| {
            needle.is_empty()
                || contains(&c.full_name, &needle)
                || contains(&c.username, &needle)
                || c.assets.iter().any(|a| contains(&a.asset_tag, &needle))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AssetStatus;

    fn asset(id: &str, tag: &str, name: &str, category: &str, owner: Option<&str>) -> Asset {
        Asset {
            id: id.into(),
            asset_tag: tag.into(),
            name: name.into(),
            category: category.into(),
            description: String::new(),
            acquisition_date: None,
            status: AssetStatus::Active,
            collaborator_id: owner.map(Into::into),
        }
    }

    fn collaborator(id: &str, full_name: &str, username: &str, assets: Vec<Asset>) -> Collaborator {
        Collaborator {
            id: id.into(),
            full_name: full_name.into(),
            username: username.into(),
            assets,
        }
    }

    fn state() -> ReconciledState {
        ReconciledState {
            collaborators: vec![
                collaborator(
                    "1",
                    "Ana Silva",
                    "asilva",
                    vec![
                        asset("10", "PAT-001", "Laptop", "Notebook", Some("1")),
                        asset("11", "PAT-002", "Dock", "Peripheral", Some("1")),
                    ],
                ),
                collaborator(
                    "2",
                    "Bruno Lima",
                    "blima",
                    vec![asset("12", "PAT-003", "Monitor", "Display", Some("2"))],
                ),
                collaborator("3", "Carla Dias", "cdias", vec![]),
            ],
            unassigned: vec![asset("13", "PAT-004", "Keyboard", "Peripheral", None)],
        }
    }

    fn ids(listings: &[AssetListing<'_>]) -> Vec<String> {
        listings.iter().map(|l| l.asset.id.clone()).collect()
    }

    #[test]
    fn global_list_puts_owned_before_unassigned() {
        let state = state();
        let all = global_assets(&state, "");
        assert_eq!(ids(&all), vec!["10", "11", "12", "13"]);
        assert_eq!(all[3].owner_label, UNASSIGNED_LABEL);
        assert_eq!(all[3].owner_id, None);
        assert_eq!(all[0].owner_label, "Ana Silva");
    }

    #[test]
    fn global_search_is_case_insensitive_across_fields() {
        let state = state();
        assert_eq!(ids(&global_assets(&state, "MONITOR")), vec!["12"]);
        assert_eq!(ids(&global_assets(&state, "pat-00")).len(), 4);
        assert_eq!(ids(&global_assets(&state, "peripheral")), vec!["11", "13"]);
        assert_eq!(ids(&global_assets(&state, "bruno")), vec!["12"]);
        assert_eq!(ids(&global_assets(&state, "unassigned")), vec!["13"]);
    }

    #[test]
    fn search_term_is_not_trimmed() {
        let state = state();
        assert_eq!(ids(&global_assets(&state, " silva")), vec!["10", "11"]);
        assert!(global_assets(&state, "laptop ").is_empty());
        assert!(search_collaborators(&state.collaborators, "asilva ").is_empty());
    }

    #[test]
    fn username_search_returns_only_that_owners_assets() {
        let state = state();
        assert_eq!(ids(&global_assets(&state, "asilva")), vec!["10", "11"]);
    }

    #[test]
    fn top_usage_drops_empty_and_sorts_descending() {
        let state = state();
        let bars = top_usage(&state.collaborators, TOP_USAGE_LIMIT);
        let names: Vec<_> = bars.iter().map(|b| b.username.as_str()).collect();
        assert_eq!(names, vec!["asilva", "blima"]);
        assert_eq!(bars[0].assets, 2);
    }

    #[test]
    fn top_usage_is_capped() {
        let many: Vec<Collaborator> = (0..15)
            .map(|i| {
                let id = i.to_string();
                let assets = (0..=i)
                    .map(|n| asset(&format!("{i}-{n}"), "T", "N", "C", Some(id.as_str())))
                    .collect();
                collaborator(&id, "x", &format!("user{i}"), assets)
            })
            .collect();
        let bars = top_usage(&many, TOP_USAGE_LIMIT);
        assert_eq!(bars.len(), 10);
        assert_eq!(bars[0].username, "user14");
        assert_eq!(bars[9].username, "user5");
    }

    #[test]
    fn top_usage_ties_keep_backend_order() {
        let tied = vec![
            collaborator("a", "A", "first", vec![asset("1", "", "", "", Some("a"))]),
            collaborator("b", "B", "second", vec![asset("2", "", "", "", Some("b"))]),
        ];
        let bars = top_usage(&tied, TOP_USAGE_LIMIT);
        assert_eq!(bars[0].username, "first");
        assert_eq!(bars[1].username, "second");
    }

    #[test]
    fn dashboard_counts_both_pools() {
        let summary = dashboard(&state());
        assert_eq!(summary.collaborators, 3);
        assert_eq!(summary.assigned_assets, 3);
        assert_eq!(summary.unassigned_assets, 1);
        assert_eq!(summary.total_assets, 4);
        assert_eq!(summary.top.len(), 2);
    }

    #[test]
    fn collaborator_search_matches_name_username_and_tags() {
        let state = state();
        let by = |term: &str| -> Vec<String> {
            search_collaborators(&state.collaborators, term)
                .iter()
                .map(|c| c.id.clone())
                .collect()
        };
        assert_eq!(by("silva"), vec!["1"]);
        assert_eq!(by("BLIMA"), vec!["2"]);
        assert_eq!(by("pat-003"), vec!["2"]);
        assert_eq!(by(""), vec!["1", "2", "3"]);
        assert!(by("PAT-004").is_empty());
    }

    #[test]
    fn collaborator_assets_is_passthrough() {
        let state = state();
        assert_eq!(collaborator_assets(&state.collaborators[0]).len(), 2);
    }
}
