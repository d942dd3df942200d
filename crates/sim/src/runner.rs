//! Drives a [`ParticipantWeightStore`] through a scenario and reports each
//! visible state.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use cashus_primitives::{Participant, Roster, WeightMap};
use cashus_split::{Notice, ParticipantWeightStore, SplitConfig, WeightSnapshot};
use tokio::sync::mpsc;
use tracing::debug;

use crate::gateway::MemoryGateway;
use crate::scenario::{Scenario, Step};

/// Final state after a scenario has settled.
#[derive(Debug)]
pub struct Report {
	pub snapshot: WeightSnapshot,
	pub stored: Option<WeightMap>,
	pub requests: u64,
	pub notices: Vec<Notice>,
}

fn print_snapshot(out: &mut impl Write, label: &str, snapshot: &WeightSnapshot) -> Result<()> {
	writeln!(
		out,
		"{label:<28} phase={:<8} local={} server={}{}",
		format!("{:?}", snapshot.phase),
		snapshot.local,
		snapshot.server_truth,
		if snapshot.has_deferred_update { " (deferred update)" } else { "" },
	)?;
	Ok(())
}

fn drain_notices(rx: &mut mpsc::UnboundedReceiver<Notice>, out: &mut impl Write, seen: &mut Vec<Notice>) -> Result<()> {
	while let Ok(notice) = rx.try_recv() {
		writeln!(out, "  ! {:?}: {}", notice.level, notice.message)?;
		seen.push(notice);
	}
	Ok(())
}

/// Time to wait after the last step for debounce and in-flight calls.
fn settle_time(config: &SplitConfig, latency: Duration) -> Duration {
	(config.debounce + latency) * 2 + Duration::from_millis(50)
}

/// Replays `scenario`, writing one line per step to `out`.
pub async fn run(scenario: &Scenario, config: SplitConfig, out: &mut impl Write) -> Result<Report> {
	let item = scenario.item.to_line_item()?;
	let latency = Duration::from_millis(scenario.gateway.latency_ms);
	let gateway = Arc::new(MemoryGateway::new(latency));
	let (tx, mut rx) = mpsc::unbounded_channel();
	let store = ParticipantWeightStore::new(&item, gateway.clone(), Arc::new(tx), config)?;
	let mut notices = Vec::new();

	writeln!(out, "item {} total {} (amount {} x {})", item.id, item.total()?, item.amount, item.quantity)?;
	if !scenario.roster.is_empty() {
		store.set_roster(Roster::from_participants(&scenario.roster));
	}
	print_snapshot(out, "mount", &store.snapshot())?;

	for step in &scenario.steps {
		debug!(?step, "sim.step");
		let label = match step {
			Step::Toggle { participant } => {
				store.toggle(participant);
				format!("toggle {participant}")
			}
			Step::Adjust { participant, delta } => {
				store.adjust_weight(participant, *delta);
				format!("adjust {participant} {delta:+}")
			}
			Step::Wait { ms } => {
				tokio::time::sleep(Duration::from_millis(*ms)).await;
				format!("wait {ms}ms")
			}
			Step::Authority { participants } => {
				let outcome = store.reconcile_from_authority(participants);
				format!("authority -> {outcome:?}")
			}
			Step::FailNext { reason } => {
				gateway.fail_next(reason.clone());
				"fail next sync".to_string()
			}
			Step::Roster { ids } => {
				store.set_roster(ids.iter().cloned().collect());
				format!("roster {} ids", ids.len())
			}
			Step::Finalize => {
				store.set_finalized(true);
				"finalize".to_string()
			}
			Step::Unfinalize => {
				store.set_finalized(false);
				"unfinalize".to_string()
			}
		};
		print_snapshot(out, &label, &store.snapshot())?;
		drain_notices(&mut rx, out, &mut notices)?;
	}

	tokio::time::sleep(settle_time(&config, latency)).await;
	let snapshot = store.snapshot();
	print_snapshot(out, "settled", &snapshot)?;
	drain_notices(&mut rx, out, &mut notices)?;

	writeln!(out, "shares:")?;
	let lookup: Vec<&Participant> = scenario.roster.iter().collect();
	for (id, units) in store.allocate_minor_units() {
		let name = lookup
			.iter()
			.find(|p| p.id == id)
			.map_or(id.as_str(), |p| p.display_name.as_str());
		let amount = cashus_primitives::Amount::from_minor(units, snapshot.total.scale());
		writeln!(out, "  {name:<16} {amount:>10}  ({:.4})", store.compute_share(&id))?;
	}

	let report = Report {
		stored: gateway.stored(&item.id),
		requests: gateway.request_count(),
		snapshot,
		notices,
	};
	store.shutdown();
	Ok(report)
}
