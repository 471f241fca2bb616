//! Message types for the annotation session
//!
//! This module contains:
//! - Msg enum with nested sub-enums for organized message handling
//! - Feedback lines produced by the handlers

use std::fmt;
use std::path::PathBuf;

use crate::domain::{ClassId, DisplayPointer, ToolKind};
use crate::report::export::ExportFormat;

/// Drawing and zone-list messages
#[derive(Debug, Clone, PartialEq)]
pub enum DrawMsg {
    /// Switch the active tool, discarding any unfinished shape
    SelectTool(ToolKind),
    /// Toggle a class in the selection used for the next zone
    ToggleClass(ClassId),
    /// Pointer click on the displayed frame
    Click(DisplayPointer),
    /// Answer the naming step; `None` accepts the suggested name
    Name(Option<String>),
    /// Decline the naming step
    CancelName,
    /// Remove the most recent zone
    Undo,
    /// Remove every zone and the unfinished shape
    Clear,
}

/// Media, analysis and reporting messages
#[derive(Debug, Clone, PartialEq)]
pub enum SessionMsg {
    /// Load a video or still image as the reference frame
    Load(PathBuf),
    /// Render the overlay to a file
    Render(PathBuf),
    /// Send the configuration to the engine and begin polling
    Start,
    /// Stop polling and return to configuration
    Stop,
    /// Show session state and the live dashboard
    Status,
    /// Write a report; default path when none is given
    Export(ExportFormat, Option<PathBuf>),
    /// List classes and their selection state
    ListClasses,
}

/// Top-level message
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    Draw(DrawMsg),
    Session(SessionMsg),
    Help,
    Quit,
}

/// A line of output for the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Info(String),
    /// The session is waiting for an answer
    Prompt(String),
    Warning(String),
    Error(String),
}

impl Feedback {
    pub fn info(msg: impl Into<String>) -> Self {
        Self::Info(msg.into())
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self::Warning(msg.into())
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error(msg.into())
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info(msg) => write!(f, "{}", msg),
            Self::Prompt(msg) => write!(f, "? {}", msg),
            Self::Warning(msg) => write!(f, "! {}", msg),
            Self::Error(msg) => write!(f, "error: {}", msg),
        }
    }
}
