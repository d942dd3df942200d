//! Scenario files: one line item, a roster, and a list of timed steps.

use std::path::Path;

use anyhow::{Context, Result};
use cashus_primitives::{AuthorityEntry, LineItem, Participant, ParticipantId};
use cashus_split::SplitConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
	#[serde(default)]
	pub config: SplitConfig,
	#[serde(default)]
	pub gateway: GatewaySpec,
	pub item: ItemSpec,
	#[serde(default)]
	pub roster: Vec<Participant>,
	#[serde(default)]
	pub steps: Vec<Step>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySpec {
	/// Simulated round-trip latency.
	#[serde(default)]
	pub latency_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemSpec {
	pub id: String,
	pub amount: String,
	#[serde(default = "default_quantity")]
	pub quantity: u32,
	#[serde(default)]
	pub participants: Vec<AuthorityEntry>,
}

fn default_quantity() -> u32 {
	1
}

impl ItemSpec {
	pub fn to_line_item(&self) -> Result<LineItem> {
		let mut item = LineItem::new(self.id.as_str(), &self.amount, self.quantity)
			.with_context(|| format!("item {} has invalid amount {:?}", self.id, self.amount))?;
		item.participants = self.participants.clone();
		Ok(item)
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
	Toggle { participant: ParticipantId },
	Adjust { participant: ParticipantId, delta: i64 },
	Wait { ms: u64 },
	Authority { participants: Vec<AuthorityEntry> },
	FailNext { reason: String },
	Roster { ids: Vec<ParticipantId> },
	Finalize,
	Unfinalize,
}

impl Scenario {
	pub fn from_toml_str(input: &str) -> Result<Self> {
		toml::from_str(input).context("failed to parse scenario")
	}

	pub fn load(path: &Path) -> Result<Self> {
		let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
		Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
	}
}
