use super::{CheckOutcome, SkipReason};
use crate::error::Result;
use crate::parser::manifest::Action;

/// Flag javascript actions whose Node.js runtime is older than `threshold`.
pub fn is_node_version_eol(action: &Action, threshold: u32) -> Result<CheckOutcome<bool>> {
    match action.node_version()? {
        Some(version) => Ok(CheckOutcome::Applicable(version < threshold)),
        None => Ok(CheckOutcome::NotApplicable(SkipReason::NotJavascript)),
    }
}
