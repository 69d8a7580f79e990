//! Lead record — the fixed-position row appended to the lead sheet.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::campaigns::CampaignKind;
use crate::orchestrator::model::Profile;

/// Every row has exactly this many cells.
pub const LEAD_ROW_WIDTH: usize = 16;

/// Column positions. The sheet is shared across campaigns, so these never
/// move.
pub mod column {
    pub const NAME: usize = 0;
    pub const DOB: usize = 1;
    pub const EMAIL: usize = 2;
    pub const PRIMARY_CONCERN: usize = 3;
    pub const LIFE_STAGE: usize = 4;
    pub const DEPENDENTS: usize = 5;
    pub const EXISTING_COVERAGE: usize = 6;
    pub const PREMIUM_BUDGET: usize = 7;
    pub const SELECTED_PLAN: usize = 8;

    /// First campaign-specific column.
    pub const FIRST_CAMPAIGN: usize = 9;

    pub const ANNUAL_INCOME: usize = 9;
    pub const COVERAGE_YEARS: usize = 10;
    pub const LEGACY_AMOUNT: usize = 11;
    pub const CHILD_AGE: usize = 12;
    pub const MONTHLY_SAVING: usize = 13;
    pub const COVERAGE_TIER: usize = 14;
    pub const PACKAGE_TIER: usize = 15;
}

/// A qualified lead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadRecord {
    pub id: Uuid,
    pub campaign: CampaignKind,
    pub created_at: DateTime<Utc>,
    cells: [Option<String>; LEAD_ROW_WIDTH],
}

impl LeadRecord {
    /// Build a row from the profile prefix plus campaign columns.
    /// Campaign columns outside the campaign range are ignored.
    pub fn new(profile: &Profile, campaign: CampaignKind, trailing: &[(usize, String)]) -> Self {
        let mut cells: [Option<String>; LEAD_ROW_WIDTH] = std::array::from_fn(|_| None);

        cells[column::NAME] = profile.name.clone();
        cells[column::DOB] = profile.dob_display();
        cells[column::EMAIL] = profile.email.clone();
        cells[column::PRIMARY_CONCERN] = profile.primary_concern.clone();
        cells[column::LIFE_STAGE] = profile.life_stage.clone();
        cells[column::DEPENDENTS] = profile.dependents.clone();
        cells[column::EXISTING_COVERAGE] = profile.existing_coverage.clone();
        cells[column::PREMIUM_BUDGET] = profile.premium_budget.clone();
        cells[column::SELECTED_PLAN] = Some(campaign.id().to_string());

        for (index, value) in trailing {
            if (column::FIRST_CAMPAIGN..LEAD_ROW_WIDTH).contains(index) {
                cells[*index] = Some(value.clone());
            }
        }

        Self {
            id: Uuid::new_v4(),
            campaign,
            created_at: Utc::now(),
            cells,
        }
    }

    pub fn cells(&self) -> &[Option<String>] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(|c| c.as_deref())
    }

    /// The row as a JSON array; blank cells are `null`.
    pub fn row_json(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.cells
                .iter()
                .map(|cell| match cell {
                    Some(value) => serde_json::Value::String(value.clone()),
                    None => serde_json::Value::Null,
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn profile() -> Profile {
        Profile {
            name: Some("Ali".into()),
            dob: NaiveDate::from_ymd_opt(1990, 1, 1),
            age: Some(36),
            email: Some("ali@example.com".into()),
            primary_concern: Some("income_protection".into()),
            life_stage: Some("raising_children".into()),
            dependents: Some("2".into()),
            existing_coverage: Some("none".into()),
            premium_budget: Some("201-500".into()),
            selected_plan: Some(CampaignKind::IncomeProtection),
        }
    }

    #[test]
    fn common_prefix_positions() {
        let record = LeadRecord::new(&profile(), CampaignKind::IncomeProtection, &[]);
        assert_eq!(record.cells().len(), LEAD_ROW_WIDTH);
        assert_eq!(record.cell(column::NAME), Some("Ali"));
        assert_eq!(record.cell(column::DOB), Some("01/01/1990"));
        assert_eq!(record.cell(column::EMAIL), Some("ali@example.com"));
        assert_eq!(record.cell(column::PREMIUM_BUDGET), Some("201-500"));
        assert_eq!(record.cell(column::SELECTED_PLAN), Some("sgsa"));
    }

    #[test]
    fn campaign_columns_leave_others_blank() {
        let record = LeadRecord::new(
            &profile(),
            CampaignKind::Medical,
            &[(column::COVERAGE_TIER, "3".into())],
        );
        for index in column::FIRST_CAMPAIGN..LEAD_ROW_WIDTH {
            if index == column::COVERAGE_TIER {
                assert_eq!(record.cell(index), Some("3"));
            } else {
                assert_eq!(record.cell(index), None, "column {index} should be blank");
            }
        }
    }

    #[test]
    fn prefix_columns_cannot_be_overwritten() {
        let record = LeadRecord::new(
            &profile(),
            CampaignKind::Combo,
            &[(column::NAME, "Mallory".into()), (99, "x".into())],
        );
        assert_eq!(record.cell(column::NAME), Some("Ali"));
    }

    #[test]
    fn json_row_uses_nulls() {
        let record = LeadRecord::new(
            &profile(),
            CampaignKind::Legacy,
            &[(column::LEGACY_AMOUNT, "500000".into())],
        );
        let row = record.row_json();
        let cells = row.as_array().unwrap();
        assert_eq!(cells.len(), LEAD_ROW_WIDTH);
        assert_eq!(cells[column::LEGACY_AMOUNT], "500000");
        assert!(cells[column::ANNUAL_INCOME].is_null());
        assert!(cells[column::PACKAGE_TIER].is_null());
    }
}
