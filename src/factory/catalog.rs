//! The robot types the factory knows how to build.

use crate::model::RobotType;
use std::collections::BTreeMap;

const DEFAULT_TYPES: [(&str, &str); 8] = [
    ("Wall-E", "Cute little cubic garbage disposal robot."),
    ("EVE", "Advanced little robot. Specializes in retrieval of plants."),
    ("Coff-E", "3D printed robot with laser range finder. Looks a bit like Wall-E."),
    ("T-800", "Terminator robot. Please read the legal disclaimers and owner responsibilities."),
    ("T-1000", "Terminator robot that can change shape. Please read the legal disclaimers and owner responsibilities."),
    ("R2-D2", "Versatile astromech droid."),
    ("BB-8", "Spherical astromech droid."),
    ("Baymax", "Inflatable medical droid."),
];

#[derive(Debug, Clone)]
pub struct RobotCatalog {
    types: BTreeMap<String, RobotType>,
}

impl Default for RobotCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_TYPES.iter().map(|(id, description)| RobotType {
            robot_type_id: id.to_string(),
            description: description.to_string(),
        }))
    }
}

impl RobotCatalog {
    pub fn new(types: impl IntoIterator<Item = RobotType>) -> Self {
        Self {
            types: types
                .into_iter()
                .map(|t| (t.robot_type_id.clone(), t))
                .collect(),
        }
    }

    /// Every known type, ordered by id.
    pub fn robot_types(&self) -> Vec<RobotType> {
        self.types.values().cloned().collect()
    }

    pub fn robot_type(&self, robot_type_id: &str) -> Option<&RobotType> {
        self.types.get(robot_type_id)
    }

    pub fn contains(&self, robot_type_id: &str) -> bool {
        self.types.contains_key(robot_type_id)
    }
}
