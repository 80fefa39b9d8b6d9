use serde::{Deserialize, Serialize};
use crate::clock::SimSpeed;

/// Which cells a bulk command covers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum BulkScope {
    All,
    Row { row: usize },
    Col { col: usize },
}

/// All player-issued commands.
/// Variants are only ever appended; hosts and saved scripts use them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    // ── Single plot ───────────────────────────────
    Plant { row: usize, col: usize, crop_id: String },
    Harvest { row: usize, col: usize },
    Water { row: usize, col: usize },
    SetCoverCrop { row: usize, col: usize, cover_crop_id: String },
    RemovePerennial { row: usize, col: usize },

    // ── Bulk ──────────────────────────────────────
    /// `limit_rows` confirms a partial offer: commit exactly that many
    /// eligible rows, top to bottom. Only meaningful with `BulkScope::All`.
    BulkPlant {
        scope:      BulkScope,
        crop_id:    String,
        #[serde(default)]
        limit_rows: Option<usize>,
    },
    BulkHarvest { scope: BulkScope },
    BulkWater {
        scope:      BulkScope,
        #[serde(default)]
        limit_rows: Option<usize>,
    },
    BulkCoverCrop {
        scope:         BulkScope,
        cover_crop_id: String,
        #[serde(default)]
        limit_rows:    Option<usize>,
    },

    // ── Clock and events ──────────────────────────
    SetSpeed { speed: SimSpeed },
    RespondToEvent { choice_id: String },
    TakeLoan,
    DismissAutoPause,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Plant { .. }           => "plant",
            Self::Harvest { .. }         => "harvest",
            Self::Water { .. }           => "water",
            Self::SetCoverCrop { .. }    => "set_cover_crop",
            Self::RemovePerennial { .. } => "remove_perennial",
            Self::BulkPlant { .. }       => "bulk_plant",
            Self::BulkHarvest { .. }     => "bulk_harvest",
            Self::BulkWater { .. }       => "bulk_water",
            Self::BulkCoverCrop { .. }   => "bulk_cover_crop",
            Self::SetSpeed { .. }        => "set_speed",
            Self::RespondToEvent { .. }  => "respond_to_event",
            Self::TakeLoan               => "take_loan",
            Self::DismissAutoPause       => "dismiss_auto_pause",
        }
    }
}

/// The largest affordable whole-row prefix of a bulk operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PartialOffer {
    pub affordable_rows:  usize,
    pub affordable_plots: usize,
    /// Cost of committing exactly the offered rows.
    pub total_cost:       f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandResult {
    pub success:        bool,
    #[serde(default)]
    pub reason:         Option<String>,
    pub cost:           f64,
    pub revenue:        f64,
    pub cells_affected: usize,
    #[serde(default)]
    pub partial_offer:  Option<PartialOffer>,
}

impl CommandResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            reason: None,
            cost: 0.0,
            revenue: 0.0,
            cells_affected: 0,
            partial_offer: None,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: Some(reason.into()),
            ..Self::ok()
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_revenue(mut self, revenue: f64) -> Self {
        self.revenue = revenue;
        self
    }

    pub fn with_cells(mut self, cells: usize) -> Self {
        self.cells_affected = cells;
        self
    }

    pub fn with_offer(mut self, offer: PartialOffer) -> Self {
        self.partial_offer = Some(offer);
        self
    }
}
