//! Chat message payload
//!
//! The report is delivered as a Block Kit message: `{"blocks": [...]}` where
//! every block is either a divider or a markdown section. Each window
//! contributes one [`ReportGroup`] framed by dividers.

use crate::model::{FailureRow, LineageRow, StationTotal};
use crate::render::{fenced, render_rows};
use crate::window::{ReportWindow, WindowKind};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

pub const PARETO_HEADER: &str = "*Fails by Station Pareto:*";
pub const LINEAGE_HEADER: &str = "*Fails by Hairpin Station:*";
pub const SHIFT_SUMMARY_TITLE: &str = "*🚨 Shift Summary (Last Shift)*";

/// Text object of a section block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Text {
    Mrkdwn { text: String },
}

/// One message block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Divider,
    Section { text: Text },
}

impl Block {
    pub fn section(text: impl Into<String>) -> Self {
        Block::Section {
            text: Text::Mrkdwn { text: text.into() },
        }
    }

    /// Section text, `None` for dividers
    pub fn text(&self) -> Option<&str> {
        match self {
            Block::Section {
                text: Text::Mrkdwn { text },
            } => Some(text),
            Block::Divider => None,
        }
    }
}

/// Rendered tables of one window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportGroup {
    pub kind: WindowKind,
    pub header: String,
    pub failures: String,
    pub totals: String,
    pub lineage: String,
}

impl ReportGroup {
    pub fn new(
        window: &ReportWindow,
        failures: &[FailureRow],
        totals: &[StationTotal],
        lineage: &[LineageRow],
    ) -> Self {
        Self {
            kind: window.kind,
            header: window.header(),
            failures: render_rows(failures),
            totals: render_rows(totals),
            lineage: render_rows(lineage),
        }
    }

    /// Blocks of this group, divider to divider
    pub fn blocks(&self) -> Vec<Block> {
        let mut blocks = vec![Block::Divider];
        if self.kind == WindowKind::ShiftSummary {
            blocks.push(Block::section(SHIFT_SUMMARY_TITLE));
        }
        blocks.extend([
            Block::section(self.header.clone()),
            Block::section(fenced(&self.failures)),
            Block::section(PARETO_HEADER),
            Block::section(fenced(&self.totals)),
            Block::section(LINEAGE_HEADER),
            Block::section(fenced(&self.lineage)),
            Block::Divider,
        ]);
        blocks
    }
}

/// Message body posted to the chat webhook
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub blocks: Vec<Block>,
}

impl Payload {
    /// Assemble groups in order
    pub fn from_groups(groups: &[ReportGroup]) -> Self {
        Self {
            blocks: groups.iter().flat_map(ReportGroup::blocks).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Render(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Render(e.to_string()))
    }

    /// Every section text, in order
    pub fn section_texts(&self) -> Vec<&str> {
        self.blocks.iter().filter_map(Block::text).collect()
    }
}
