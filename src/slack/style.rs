//! Severity to icon/color lookup.

use crate::error::Result;
use crate::event::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityStyle {
    pub icon: &'static str,
    pub color: &'static str,
}

const TRACE: SeverityStyle = SeverityStyle {
    icon: ":pawprints:",
    color: "#6f6d6d",
};
const DEBUG: SeverityStyle = SeverityStyle {
    icon: ":beetle:",
    color: "#b5dae9",
};
const INFO: SeverityStyle = SeverityStyle {
    icon: ":suspect:",
    color: "#5f9ea0",
};
const WARN: SeverityStyle = SeverityStyle {
    icon: ":goberserk:",
    color: "#ff9122",
};
const ERROR: SeverityStyle = SeverityStyle {
    icon: ":feelsgood:",
    color: "#ff4444",
};
const FATAL: SeverityStyle = SeverityStyle {
    icon: ":finnadie:",
    color: "#b03e3c",
};

pub fn style_for(severity: Severity) -> SeverityStyle {
    match severity {
        Severity::Trace => TRACE,
        Severity::Debug => DEBUG,
        Severity::Info => INFO,
        Severity::Warn => WARN,
        Severity::Error => ERROR,
        Severity::Fatal => FATAL,
    }
}

pub fn icon_for(severity: Severity) -> &'static str {
    style_for(severity).icon
}

pub fn color_for(severity: Severity) -> &'static str {
    style_for(severity).color
}

/// Look up a style by level name, failing on names outside the known set.
pub fn style_for_name(level: &str) -> Result<SeverityStyle> {
    Ok(style_for(level.parse()?))
}
