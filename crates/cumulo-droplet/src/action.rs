// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Action graph model.
//!
//! An action graph is an ordered, declarative description of the steps a
//! remote cell should execute: fetch an archive to a path, run an
//! executable with arguments. Graphs are built once per staging or launch
//! request, handed to the task submitter or app launcher, and never
//! mutated or persisted by this crate. Composition is strictly
//! sequential; there are no parallel or conditional branches.

use serde::{Deserialize, Serialize};

/// A primitive step executed on a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Fetch an archive from a URL and unpack it at a path.
    Download {
        /// Source URL
        from: String,
        /// Destination path on the cell
        to: String,
        /// Cell user the step runs as
        user: String,
    },
    /// Run an executable with arguments.
    Run {
        /// Path to the executable
        path: String,
        /// Working directory
        dir: String,
        /// Arguments
        args: Vec<String>,
        /// Cell user the step runs as
        user: String,
    },
}

impl Action {
    /// Download step constructor.
    pub fn download(
        from: impl Into<String>,
        to: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Action::Download {
            from: from.into(),
            to: to.into(),
            user: user.into(),
        }
    }

    /// Run step constructor.
    pub fn run(
        path: impl Into<String>,
        dir: impl Into<String>,
        args: Vec<String>,
        user: impl Into<String>,
    ) -> Self {
        Action::Run {
            path: path.into(),
            dir: dir.into(),
            args,
            user: user.into(),
        }
    }
}

/// An ordered sequence of [`Action`]s executed one after another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionGraph {
    /// Log source tag attached to the sequence's output, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_source: Option<String>,
    /// The steps, in execution order.
    pub actions: Vec<Action>,
}

impl ActionGraph {
    /// Create a graph from an ordered list of steps.
    pub fn serial(actions: Vec<Action>) -> Self {
        Self {
            log_source: None,
            actions,
        }
    }

    /// Attach a log source tag.
    pub fn with_log_source(mut self, log_source: impl Into<String>) -> Self {
        self.log_source = Some(log_source.into());
        self
    }

    /// Number of steps in the graph.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the graph has no steps.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
