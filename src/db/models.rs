use serde::{Deserialize, Serialize};

use super::schema::{COMBAT, CURRENCY_GAINED, OBJECTIVES_COMPLETED, SAMPLES_GAINED};
use crate::store::Value;

/// A typed row of one of the statistics tables.
///
/// `id` is assigned by the database and left out of inserts.
pub trait Record: Serialize + for<'de> Deserialize<'de> {
    const TABLE: &'static str;

    /// Column/value pairs written on insert, `id` excluded.
    fn columns(&self) -> Vec<(&'static str, Value)>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectivesCompleted {
    #[serde(default)]
    pub id: Option<i64>,
    pub main_objectives: Option<i64>,
    pub optional_objectives: Option<i64>,
    pub helldivers_extracted: Option<i64>,
    pub outposts_destroyed_light: Option<i64>,
    pub outposts_destroyed_medium: Option<i64>,
    pub outposts_destroyed_heavy: Option<i64>,
    /// `HH:MM:SS`
    pub mission_time_remaining: Option<String>,
}

impl Record for ObjectivesCompleted {
    const TABLE: &'static str = OBJECTIVES_COMPLETED;

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("main_objectives", self.main_objectives.into()),
            ("optional_objectives", self.optional_objectives.into()),
            ("helldivers_extracted", self.helldivers_extracted.into()),
            ("outposts_destroyed_light", self.outposts_destroyed_light.into()),
            ("outposts_destroyed_medium", self.outposts_destroyed_medium.into()),
            ("outposts_destroyed_heavy", self.outposts_destroyed_heavy.into()),
            (
                "mission_time_remaining",
                self.mission_time_remaining.clone().into(),
            ),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplesGained {
    #[serde(default)]
    pub id: Option<i64>,
    pub green_samples: Option<i64>,
    pub orange_samples: Option<i64>,
    pub violet_samples: Option<i64>,
}

impl Record for SamplesGained {
    const TABLE: &'static str = SAMPLES_GAINED;

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("green_samples", self.green_samples.into()),
            ("orange_samples", self.orange_samples.into()),
            ("violet_samples", self.violet_samples.into()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrencyGained {
    #[serde(default)]
    pub id: Option<i64>,
    pub requisition: Option<i64>,
    pub medals: Option<i64>,
    pub xp: Option<i64>,
}

impl Record for CurrencyGained {
    const TABLE: &'static str = CURRENCY_GAINED;

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("requisition", self.requisition.into()),
            ("medals", self.medals.into()),
            ("xp", self.xp.into()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Combat {
    #[serde(default)]
    pub id: Option<i64>,
    pub kills: Option<i64>,
    pub accuracy: Option<f64>,
    pub shots_fired: Option<i64>,
    pub deaths: Option<i64>,
    pub stims_used: Option<i64>,
    pub accidentals: Option<i64>,
    pub samples_extracted: Option<i64>,
    pub stratagems_used: Option<i64>,
    pub melee_kills: Option<i64>,
    pub times_reinforcing: Option<i64>,
    pub friendly_fire_damage: Option<i64>,
    pub distance_travelled: Option<i64>,
}

impl Record for Combat {
    const TABLE: &'static str = COMBAT;

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("kills", self.kills.into()),
            ("accuracy", self.accuracy.into()),
            ("shots_fired", self.shots_fired.into()),
            ("deaths", self.deaths.into()),
            ("stims_used", self.stims_used.into()),
            ("accidentals", self.accidentals.into()),
            ("samples_extracted", self.samples_extracted.into()),
            ("stratagems_used", self.stratagems_used.into()),
            ("melee_kills", self.melee_kills.into()),
            ("times_reinforcing", self.times_reinforcing.into()),
            ("friendly_fire_damage", self.friendly_fire_damage.into()),
            ("distance_travelled", self.distance_travelled.into()),
        ]
    }
}
