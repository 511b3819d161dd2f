//! Scenario catalog - ordered level lookup per district.

use std::collections::HashMap;

use game_content::{
    BossPreview, DistrictId, DistrictScenario, Level, LevelId, TaskResult, TaskSpec,
};

/// Read-only lookup over every district's ordered levels.
#[derive(Debug, Clone, Default)]
pub struct ScenarioCatalog {
    districts: HashMap<DistrictId, DistrictScenario>,
}

impl ScenarioCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a district's scenario, replacing any previous content for it.
    pub fn insert_district(&mut self, district: DistrictId, scenario: DistrictScenario) {
        self.districts.insert(district, scenario);
    }

    /// Parse and register one district scenario file.
    pub fn load_district_str(
        &mut self,
        district: DistrictId,
        json: &str,
    ) -> Result<(), serde_json::Error> {
        let scenario = DistrictScenario::from_json_str(json)?;
        self.insert_district(district, scenario);
        Ok(())
    }

    pub fn district(&self, district: &DistrictId) -> Option<&DistrictScenario> {
        self.districts.get(district)
    }

    /// Level whose session range contains `sessions_count`. Counts past the
    /// final level clamp to it; unknown districts and uncovered low counts
    /// yield nothing.
    pub fn get_current_level(&self, district: &DistrictId, sessions_count: u32) -> Option<&Level> {
        let levels = &self.districts.get(district)?.levels;

        if let Some(level) = levels
            .iter()
            .find(|level| level.sessions_required.contains(sessions_count))
        {
            return Some(level);
        }

        match levels.last() {
            Some(last) if sessions_count > last.sessions_required.max => Some(last),
            _ => None,
        }
    }

    /// Linear lookup across all districts.
    pub fn get_level_by_id(&self, level_id: &LevelId) -> Option<&Level> {
        self.districts
            .values()
            .flat_map(|scenario| scenario.levels.iter())
            .find(|level| &level.level_id == level_id)
    }

    pub fn district_philosophy(&self, district: &DistrictId) -> Option<&str> {
        self.districts
            .get(district)
            .map(|scenario| scenario.philosophy.as_str())
    }

    /// Flavor preview of the district's boss.
    pub fn district_boss(&self, district: &DistrictId) -> Option<&BossPreview> {
        self.districts.get(district)?.boss.as_ref()
    }

    /// Whether `result` satisfies the level's task. Levels without a task
    /// always validate; a result whose shape does not match the task type
    /// never does.
    pub fn check_level_completion(&self, level: &Level, result: &TaskResult) -> bool {
        let Some(task) = &level.task else {
            return true;
        };

        match (task, result) {
            (TaskSpec::Reflection { min_words, .. }, TaskResult::Reflection { text }) => {
                text.split_whitespace().count() >= *min_words
            }
            (TaskSpec::Timer { .. }, TaskResult::Timer { completed }) => *completed,
            (TaskSpec::Choice { .. }, TaskResult::Choice { .. }) => true,
            (TaskSpec::Checklist { required_items }, TaskResult::Checklist { items }) => {
                items.len() >= *required_items
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_content::SessionRange;

    fn level(id: &str, district: &str, min: u32, max: u32) -> Level {
        serde_json::from_value(serde_json::json!({
            "level_id": id,
            "district": district,
            "sessions_required": [min, max]
        }))
        .unwrap()
    }

    fn oasis_catalog() -> ScenarioCatalog {
        let mut catalog = ScenarioCatalog::new();
        catalog.insert_district(
            DistrictId::new("oasis"),
            DistrictScenario {
                philosophy: "Care for the body first.".to_string(),
                boss: None,
                levels: vec![level("L1", "oasis", 1, 3), level("L2", "oasis", 4, 6)],
            },
        );
        catalog
    }

    #[test]
    fn test_current_level_by_session_count() {
        let catalog = oasis_catalog();
        let oasis = DistrictId::new("oasis");

        let l1 = catalog.get_current_level(&oasis, 1).unwrap();
        assert_eq!(l1.level_id, LevelId::new("L1"));

        let l2 = catalog.get_current_level(&oasis, 5).unwrap();
        assert_eq!(l2.level_id, LevelId::new("L2"));
    }

    #[test]
    fn test_current_level_clamps_past_the_end() {
        let catalog = oasis_catalog();
        let oasis = DistrictId::new("oasis");

        let clamped = catalog.get_current_level(&oasis, 99).unwrap();
        assert_eq!(clamped.level_id, LevelId::new("L2"));
    }

    #[test]
    fn test_current_level_below_coverage_is_none() {
        let catalog = oasis_catalog();
        assert!(catalog
            .get_current_level(&DistrictId::new("oasis"), 0)
            .is_none());
    }

    #[test]
    fn test_unknown_district_is_none() {
        let catalog = oasis_catalog();
        assert!(catalog
            .get_current_level(&DistrictId::new("mirage"), 1)
            .is_none());
    }

    #[test]
    fn test_district_philosophy() {
        let catalog = oasis_catalog();
        assert_eq!(
            catalog.district_philosophy(&DistrictId::new("oasis")),
            Some("Care for the body first.")
        );
        assert!(catalog
            .district_philosophy(&DistrictId::new("mirage"))
            .is_none());
    }

    #[test]
    fn test_level_lookup_across_districts() {
        let mut catalog = oasis_catalog();
        catalog.insert_district(
            DistrictId::new("citadel"),
            DistrictScenario {
                philosophy: String::new(),
                boss: None,
                levels: vec![level("C1", "citadel", 1, 2)],
            },
        );

        assert!(catalog.get_level_by_id(&LevelId::new("C1")).is_some());
        assert!(catalog.get_level_by_id(&LevelId::new("L2")).is_some());
        assert!(catalog.get_level_by_id(&LevelId::new("zzz")).is_none());
    }

    #[test]
    fn test_completion_reflection_word_count() {
        let catalog = oasis_catalog();
        let mut level = level("R1", "oasis", 1, 1);
        level.task = Some(TaskSpec::Reflection {
            min_words: 5,
            prompt: None,
        });

        let short = TaskResult::Reflection {
            text: "too few words".to_string(),
        };
        assert!(!catalog.check_level_completion(&level, &short));

        let long = TaskResult::Reflection {
            text: "five whole words right here".to_string(),
        };
        assert!(catalog.check_level_completion(&level, &long));
    }

    #[test]
    fn test_completion_dispatch_per_task_type() {
        let catalog = oasis_catalog();
        let mut timer_level = level("T1", "oasis", 1, 1);
        timer_level.task = Some(TaskSpec::Timer {
            duration_minutes: Some(5),
        });

        assert!(catalog.check_level_completion(&timer_level, &TaskResult::Timer { completed: true }));
        assert!(!catalog.check_level_completion(&timer_level, &TaskResult::Timer { completed: false }));

        let mut checklist_level = level("K1", "oasis", 1, 1);
        checklist_level.task = Some(TaskSpec::Checklist { required_items: 2 });
        assert!(!catalog.check_level_completion(
            &checklist_level,
            &TaskResult::Checklist {
                items: vec!["one".to_string()]
            }
        ));
        assert!(catalog.check_level_completion(
            &checklist_level,
            &TaskResult::Checklist {
                items: vec!["one".to_string(), "two".to_string()]
            }
        ));
    }

    #[test]
    fn test_completion_mismatched_result_shape_fails() {
        let catalog = oasis_catalog();
        let mut level = level("T2", "oasis", 1, 1);
        level.task = Some(TaskSpec::Timer {
            duration_minutes: None,
        });

        let wrong_shape = TaskResult::Reflection {
            text: "not a timer result".to_string(),
        };
        assert!(!catalog.check_level_completion(&level, &wrong_shape));
    }

    #[test]
    fn test_completion_without_task_always_passes() {
        let catalog = oasis_catalog();
        let bare = level("B1", "oasis", 1, 1);
        assert!(catalog.check_level_completion(&bare, &TaskResult::Timer { completed: false }));
    }

    #[test]
    fn test_levels_keep_declared_order() {
        let catalog = oasis_catalog();
        let oasis = catalog.district(&DistrictId::new("oasis")).unwrap();
        assert_eq!(oasis.levels[0].sessions_required, SessionRange::new(1, 3));
        assert_eq!(oasis.levels[1].sessions_required, SessionRange::new(4, 6));
    }
}
