//! Hierarchical region tuples.

use serde::{Deserialize, Serialize};

/// Hierarchical location key used to scope quests and their historical
/// records.
///
/// A region always names a city; `town` and `village` progressively narrow
/// the scope. An omitted level leaves that level unconstrained when
/// filtering, so a quest defined at city level applies to every town and
/// village beneath it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub city: String,
    pub town: Option<String>,
    pub village: Option<String>,
}

impl Region {
    /// Create a region filter from its levels.
    pub fn new(
        city: impl Into<String>,
        town: Option<String>,
        village: Option<String>,
    ) -> Self {
        Self {
            city: city.into(),
            town,
            village,
        }
    }

    /// Human-facing label for outgoing responses.
    ///
    /// This is display-only: query logic always compares the raw levels with
    /// exact string equality.
    pub fn display_label(&self) -> String {
        let mut label = self.city.clone();
        if let Some(town) = &self.town {
            label.push(' ');
            label.push_str(town);
        }
        if let Some(village) = &self.village {
            label.push(' ');
            label.push_str(village);
        }
        label
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_label_joins_supplied_levels() {
        let region = Region::new(
            "Jeju",
            Some("Aewol".to_string()),
            Some("Woljeong".to_string()),
        );
        assert_eq!(region.display_label(), "Jeju Aewol Woljeong");
    }

    #[test]
    fn display_label_skips_omitted_levels() {
        let region = Region::new("Jeju", None, None);
        assert_eq!(region.display_label(), "Jeju");

        let region = Region::new("Jeju", Some("Aewol".to_string()), None);
        assert_eq!(region.display_label(), "Jeju Aewol");
    }
}
