//! Table definitions for the game statistics database.
//!
//! Every table gets an `id INT AUTO_INCREMENT PRIMARY KEY` first column; the
//! remaining columns are nullable counters recorded per mission.

use crate::error::StatvaultError;
use crate::provision::SubResourceSpec;
use crate::store::Identifier;

pub const OBJECTIVES_COMPLETED: &str = "objectives_completed";
pub const SAMPLES_GAINED: &str = "samples_gained";
pub const CURRENCY_GAINED: &str = "currency_gained";
pub const COMBAT: &str = "combat";

const ID_COLUMN: &str = "id INT AUTO_INCREMENT PRIMARY KEY";

/// Builder for a `CREATE TABLE IF NOT EXISTS` statement.
///
/// Column types are passed through verbatim; names are validated when the
/// statement is rendered.
#[derive(Debug, Clone)]
pub struct TableSchema {
    name: String,
    columns: Vec<(String, String)>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn column(mut self, name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        self.columns.push((name.into(), sql_type.into()));
        self
    }

    pub fn create_statement(&self) -> Result<String, StatvaultError> {
        let name = Identifier::new(self.name.as_str())?;
        let mut definitions = Vec::with_capacity(self.columns.len() + 1);
        definitions.push(ID_COLUMN.to_string());
        for (column, sql_type) in &self.columns {
            let column = Identifier::new(column.as_str())?;
            definitions.push(format!("{} {sql_type}", column.quoted()));
        }
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            name.quoted(),
            definitions.join(", ")
        ))
    }

    pub fn into_spec(self) -> Result<SubResourceSpec, StatvaultError> {
        let ddl = self.create_statement()?;
        SubResourceSpec::new(&self.name, ddl)
    }
}

/// The four statistics tables, in creation order.
pub fn game_stats_tables() -> Result<Vec<SubResourceSpec>, StatvaultError> {
    [
        TableSchema::new(OBJECTIVES_COMPLETED)
            .column("main_objectives", "INT")
            .column("optional_objectives", "INT")
            .column("helldivers_extracted", "INT")
            .column("outposts_destroyed_light", "INT")
            .column("outposts_destroyed_medium", "INT")
            .column("outposts_destroyed_heavy", "INT")
            .column("mission_time_remaining", "TIME"),
        TableSchema::new(COMBAT)
            .column("kills", "INT")
            .column("accuracy", "DECIMAL(5,2)")
            .column("shots_fired", "INT")
            .column("deaths", "INT")
            .column("stims_used", "INT")
            .column("accidentals", "INT")
            .column("samples_extracted", "INT")
            .column("stratagems_used", "INT")
            .column("melee_kills", "INT")
            .column("times_reinforcing", "INT")
            .column("friendly_fire_damage", "INT")
            .column("distance_travelled", "INT"),
        TableSchema::new(SAMPLES_GAINED)
            .column("green_samples", "INT")
            .column("orange_samples", "INT")
            .column("violet_samples", "INT"),
        TableSchema::new(CURRENCY_GAINED)
            .column("requisition", "INT")
            .column("medals", "INT")
            .column("xp", "INT"),
    ]
    .into_iter()
    .map(TableSchema::into_spec)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_id_column_first() {
        let ddl = TableSchema::new("currency_gained")
            .column("requisition", "INT")
            .column("xp", "INT")
            .create_statement()
            .expect("valid schema");
        assert_eq!(
            ddl,
            "CREATE TABLE IF NOT EXISTS `currency_gained` \
             (id INT AUTO_INCREMENT PRIMARY KEY, `requisition` INT, `xp` INT)"
        );
    }

    #[test]
    fn rejects_bad_column_names() {
        let err = TableSchema::new("combat")
            .column("kills; DROP", "INT")
            .create_statement()
            .expect_err("bad column name");
        assert!(matches!(err, StatvaultError::InvalidIdentifier(_)));
    }

    #[test]
    fn game_stats_tables_cover_all_four_tables() {
        let specs = game_stats_tables().expect("static schema is valid");
        let names: Vec<&str> = specs.iter().map(|spec| spec.name.as_str()).collect();
        assert_eq!(
            names,
            vec![OBJECTIVES_COMPLETED, COMBAT, SAMPLES_GAINED, CURRENCY_GAINED]
        );
        let combat = &specs[1];
        assert!(combat.ddl.contains("`accuracy` DECIMAL(5,2)"));
        assert!(combat.ddl.starts_with("CREATE TABLE IF NOT EXISTS `combat`"));
    }
}
