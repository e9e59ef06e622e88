use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// Syllabus block a question belongs to.
///
/// Labels are the persisted form. Anything blank or unknown is read as
/// [`Category::Other`], the catch-all bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Category {
    /// Past exams from the Navarra and Basque Country health services.
    RegionalExams,
    /// MIR preventive medicine questions.
    PreventiveMedicine,
    /// RENAVE notifiable disease reporting.
    DiseaseReporting,
    /// Health legislation.
    Legislation,
    /// Navarra regional health plan.
    RegionalHealthPlan,
    /// Unclassified questions.
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::RegionalExams,
        Category::PreventiveMedicine,
        Category::DiseaseReporting,
        Category::Legislation,
        Category::RegionalHealthPlan,
        Category::Other,
    ];

    /// Parses a stored label. Never fails: unknown labels fall into `Other`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "examenes_navarra_pais_vasco" => Self::RegionalExams,
            "mir_medicina_preventiva" => Self::PreventiveMedicine,
            "renave_declaracion" => Self::DiseaseReporting,
            "leyes" => Self::Legislation,
            "plan_salud_navarra" => Self::RegionalHealthPlan,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RegionalExams => "examenes_navarra_pais_vasco",
            Self::PreventiveMedicine => "mir_medicina_preventiva",
            Self::DiseaseReporting => "renave_declaracion",
            Self::Legislation => "leyes",
            Self::RegionalHealthPlan => "plan_salud_navarra",
            Self::Other => "otros",
        }
    }

    /// Human readable name used in statistics output.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::RegionalExams => "Exámenes Navarra y País Vasco",
            Self::PreventiveMedicine => "MIR Medicina Preventiva",
            Self::DiseaseReporting => "RENAVE y declaración",
            Self::Legislation => "Leyes",
            Self::RegionalHealthPlan => "Plan de Salud de Navarra",
            Self::Other => "Otros",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.as_deref().map_or(Self::Other, Self::from_label))
    }
}

//
// ─── QUOTA TABLE ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuotaError {
    #[error("quota table cannot be empty")]
    Empty,

    #[error("category {0} appears more than once in the quota table")]
    DuplicateCategory(Category),
}

/// Ordered per-category draw targets.
///
/// Order matters: categories are drawn in table order, which fixes the
/// consumption of random numbers for seeded runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaTable {
    entries: Vec<(Category, u32)>,
}

impl QuotaTable {
    /// Build a custom table.
    ///
    /// # Errors
    ///
    /// Returns `QuotaError::Empty` for an empty table and
    /// `QuotaError::DuplicateCategory` if a category is listed twice.
    pub fn new(entries: Vec<(Category, u32)>) -> Result<Self, QuotaError> {
        if entries.is_empty() {
            return Err(QuotaError::Empty);
        }
        for (idx, (category, _)) in entries.iter().enumerate() {
            if entries[..idx].iter().any(|(seen, _)| seen == category) {
                return Err(QuotaError::DuplicateCategory(*category));
            }
        }
        Ok(Self { entries })
    }

    #[must_use]
    pub fn entries(&self) -> &[(Category, u32)] {
        &self.entries
    }

    #[must_use]
    pub fn quota_for(&self, category: Category) -> Option<u32> {
        self.entries
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, q)| *q)
    }

    #[must_use]
    pub fn contains(&self, category: Category) -> bool {
        self.quota_for(category).is_some()
    }

    /// Nominal test size: the sum of all quotas.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.entries
            .iter()
            .fold(0_u32, |acc, (_, q)| acc.saturating_add(*q))
    }

    /// Bucket a question category against this table.
    ///
    /// Categories absent from the table land in the catch-all bucket.
    #[must_use]
    pub fn bucket_for(&self, category: Category) -> Category {
        if category != Category::Other && self.contains(category) {
            category
        } else {
            Category::Other
        }
    }
}

impl Default for QuotaTable {
    /// The standard 100-question distribution.
    fn default() -> Self {
        Self {
            entries: vec![
                (Category::RegionalExams, 40),
                (Category::PreventiveMedicine, 20),
                (Category::DiseaseReporting, 15),
                (Category::Legislation, 10),
                (Category::RegionalHealthPlan, 5),
                (Category::Other, 10),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_label(category.as_str()), category);
        }
    }

    #[test]
    fn blank_and_unknown_labels_are_other() {
        assert_eq!(Category::from_label(""), Category::Other);
        assert_eq!(Category::from_label("   "), Category::Other);
        assert_eq!(Category::from_label("cardiologia"), Category::Other);
    }

    #[test]
    fn deserializes_null_and_unknown_as_other() {
        let c: Category = serde_json::from_str("null").unwrap();
        assert_eq!(c, Category::Other);
        let c: Category = serde_json::from_str("\"leyes\"").unwrap();
        assert_eq!(c, Category::Legislation);
        let c: Category = serde_json::from_str("\"something\"").unwrap();
        assert_eq!(c, Category::Other);
    }

    #[test]
    fn default_table_sums_to_one_hundred() {
        let table = QuotaTable::default();
        assert_eq!(table.total(), 100);
        assert_eq!(table.quota_for(Category::RegionalExams), Some(40));
        assert_eq!(table.entries().last(), Some(&(Category::Other, 10)));
    }

    #[test]
    fn rejects_duplicates_and_empty() {
        assert_eq!(QuotaTable::new(Vec::new()), Err(QuotaError::Empty));
        let err = QuotaTable::new(vec![(Category::Legislation, 1), (Category::Legislation, 2)])
            .unwrap_err();
        assert_eq!(err, QuotaError::DuplicateCategory(Category::Legislation));
    }

    #[test]
    fn unlisted_categories_bucket_into_other() {
        let table =
            QuotaTable::new(vec![(Category::Legislation, 3), (Category::Other, 2)]).unwrap();
        assert_eq!(table.bucket_for(Category::Legislation), Category::Legislation);
        assert_eq!(table.bucket_for(Category::RegionalExams), Category::Other);
    }
}
