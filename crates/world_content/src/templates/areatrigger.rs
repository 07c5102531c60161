use crate::error::RowError;
use crate::registry::{ContentRecord, LoadContext};
use crate::storage::Row;

/// `areatrigger_scripts (entry, ScriptName)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaTriggerScript {
    pub entry: u32,
    pub script_id: u32,
}

impl ContentRecord for AreaTriggerScript {
    type Key = u32;
    const TABLE: &'static str = "areatrigger_scripts";
    const NAME: &'static str = "areatrigger scripts";

    fn key(&self) -> u32 {
        self.entry
    }

    fn from_row(row: &Row, ctx: &LoadContext<'_>) -> Result<Self, RowError> {
        let entry = row.u32(0)?;
        let name = row.string(1)?;
        let script_id = ctx.scripts.get_script_id(name.trim());
        if script_id == 0 {
            return Err(RowError::Invalid(format!(
                "area trigger {entry} has no script name"
            )));
        }
        Ok(Self { entry, script_id })
    }
}
