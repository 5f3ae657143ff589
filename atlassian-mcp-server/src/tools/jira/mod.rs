//! Jira tools
//!
//! REST endpoints resolve under `/rest/api/latest`, agile endpoints under
//! `/rest/agile/latest`.

mod agile;
mod issues;
mod links;
mod search;
mod unsupported;
mod users;
mod worklogs;

use crate::error::AtlassianMcpResult;
use crate::registry::ToolRegistry;

pub use issues::truncate_comments;
pub use worklogs::normalize_started;

pub fn register(registry: &mut ToolRegistry) -> AtlassianMcpResult<()> {
    users::register(registry)?;
    issues::register(registry)?;
    search::register(registry)?;
    worklogs::register(registry)?;
    agile::register(registry)?;
    links::register(registry)?;
    unsupported::register(registry)?;
    Ok(())
}
