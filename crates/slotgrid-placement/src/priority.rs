//! Top-N priority selection (the legacy simple mode).
//!
//! Main-list registrations are ranked by weight descending, then by
//! registration time, then by requester id. The first `n` are selected and
//! the rest are waitlisted with 1-based positions. Secondary-list
//! registrations are always selected. No slots are assigned.

use std::cmp::Ordering;

use slotgrid_core::{PartitionTag, RequesterId};
use slotgrid_state::{Registration, SelectionStatus};
use tracing::debug;

/// One requester's outcome of a top-N selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityEntry {
    pub requester: RequesterId,
    pub status: SelectionStatus,
}

fn priority_order(a: &Registration, b: &Registration) -> Ordering {
    b.weight
        .cmp(&a.weight)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.requester.cmp(&b.requester))
}

/// Rank an occurrence's registrations, selecting the first `n` of the main list.
pub fn rank_top_n(registrations: &[Registration], n: u32) -> Vec<PriorityEntry> {
    let (mut main, secondary): (Vec<&Registration>, Vec<&Registration>) = registrations
        .iter()
        .partition(|reg| reg.requested_partition == PartitionTag::Main);
    main.sort_by(|a, b| priority_order(a, b));

    let cutoff = n as usize;
    let mut entries: Vec<PriorityEntry> = main
        .iter()
        .enumerate()
        .map(|(idx, reg)| PriorityEntry {
            requester: reg.requester.clone(),
            status: if idx < cutoff {
                SelectionStatus::Selected
            } else {
                SelectionStatus::Waitlist {
                    position: (idx - cutoff + 1) as u32,
                }
            },
        })
        .collect();
    entries.extend(secondary.iter().map(|reg| PriorityEntry {
        requester: reg.requester.clone(),
        status: SelectionStatus::Selected,
    }));

    debug!(
        main = main.len(),
        secondary = secondary.len(),
        selected = main.len().min(cutoff) + secondary.len(),
        "top-n ranking computed"
    );
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 1, h, m, 0).unwrap()
    }

    fn make_registration(
        requester: &str,
        weight: u32,
        created: DateTime<Utc>,
        list: PartitionTag,
    ) -> Registration {
        Registration::new("mon", requester, weight, json!([]), list, created)
    }

    fn status_of<'a>(entries: &'a [PriorityEntry], requester: &str) -> &'a SelectionStatus {
        &entries
            .iter()
            .find(|e| e.requester == requester)
            .unwrap()
            .status
    }

    #[test]
    fn selects_top_n_and_waitlists_rest() {
        let regs = vec![
            make_registration("low", 5, at(8, 0), PartitionTag::Main),
            make_registration("high", 90, at(9, 0), PartitionTag::Main),
            make_registration("mid-late", 50, at(10, 0), PartitionTag::Main),
            make_registration("mid-early", 50, at(7, 0), PartitionTag::Main),
        ];

        let entries = rank_top_n(&regs, 2);

        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].requester, "high");
        assert_eq!(entries[1].requester, "mid-early");
        assert_eq!(*status_of(&entries, "high"), SelectionStatus::Selected);
        assert_eq!(*status_of(&entries, "mid-early"), SelectionStatus::Selected);
        assert_eq!(
            *status_of(&entries, "mid-late"),
            SelectionStatus::Waitlist { position: 1 }
        );
        assert_eq!(
            *status_of(&entries, "low"),
            SelectionStatus::Waitlist { position: 2 }
        );
    }

    #[test]
    fn requester_id_breaks_full_ties() {
        let regs = vec![
            make_registration("bob", 10, at(8, 0), PartitionTag::Main),
            make_registration("alice", 10, at(8, 0), PartitionTag::Main),
        ];
        let entries = rank_top_n(&regs, 1);
        assert_eq!(*status_of(&entries, "alice"), SelectionStatus::Selected);
        assert_eq!(
            *status_of(&entries, "bob"),
            SelectionStatus::Waitlist { position: 1 }
        );
    }

    #[test]
    fn secondary_list_always_selected() {
        let regs = vec![
            make_registration("main-a", 10, at(8, 0), PartitionTag::Main),
            make_registration("main-b", 20, at(8, 0), PartitionTag::Main),
            make_registration("second", 1, at(8, 0), PartitionTag::Secondary),
        ];
        let entries = rank_top_n(&regs, 1);
        assert_eq!(*status_of(&entries, "second"), SelectionStatus::Selected);
        assert_eq!(
            *status_of(&entries, "main-a"),
            SelectionStatus::Waitlist { position: 1 }
        );
    }

    #[test]
    fn fewer_than_n_all_selected() {
        let regs = vec![make_registration("solo", 1, at(8, 0), PartitionTag::Main)];
        let entries = rank_top_n(&regs, 20);
        assert_eq!(entries, vec![PriorityEntry {
            requester: "solo".into(),
            status: SelectionStatus::Selected,
        }]);
    }
}
