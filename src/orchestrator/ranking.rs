//! Plan recommendations from the onboarding profile.
//!
//! Each campaign has an eligibility rule and a relevance score: a matching
//! primary concern is worth 2, a matching secondary signal 1. The menu
//! lists eligible campaigns by descending score, then title.

use super::model::Profile;
use crate::campaigns::CampaignKind;

const LEGACY_MIN_AGE: u32 = 40;

fn concern_is(profile: &Profile, concerns: &[&str]) -> bool {
    profile
        .primary_concern
        .as_deref()
        .is_some_and(|c| concerns.contains(&c))
}

fn life_stage_is(profile: &Profile, stages: &[&str]) -> bool {
    profile
        .life_stage
        .as_deref()
        .is_some_and(|s| stages.contains(&s))
}

fn coverage_is(profile: &Profile, levels: &[&str]) -> bool {
    profile
        .existing_coverage
        .as_deref()
        .is_some_and(|c| levels.contains(&c))
}

fn has_young_family(profile: &Profile) -> bool {
    life_stage_is(profile, &["starting_family", "raising_children"])
}

/// Whether the campaign is offered to this profile at all.
pub fn is_eligible(kind: CampaignKind, profile: &Profile) -> bool {
    match kind {
        CampaignKind::Legacy => {
            concern_is(profile, &["retirement", "savings"])
                || profile.age.is_some_and(|age| age >= LEGACY_MIN_AGE)
        }
        CampaignKind::Education => {
            concern_is(profile, &["education"]) || profile.has_dependents() || has_young_family(profile)
        }
        CampaignKind::IncomeProtection | CampaignKind::Medical | CampaignKind::Combo => true,
    }
}

pub fn score(kind: CampaignKind, profile: &Profile) -> u32 {
    let (primary, secondary) = match kind {
        CampaignKind::IncomeProtection => (
            concern_is(profile, &["income_protection"]),
            profile.has_dependents(),
        ),
        CampaignKind::Legacy => (
            concern_is(profile, &["retirement", "savings"]),
            profile.age.is_some_and(|age| age >= LEGACY_MIN_AGE)
                || life_stage_is(profile, &["pre_retirement", "retired"]),
        ),
        CampaignKind::Education => (
            concern_is(profile, &["education"]),
            profile.has_dependents() || has_young_family(profile),
        ),
        CampaignKind::Medical => (
            concern_is(profile, &["medical_expenses", "health"]),
            coverage_is(profile, &["none", "basic"]),
        ),
        CampaignKind::Combo => (
            concern_is(profile, &["comprehensive", "wealth_building"]),
            life_stage_is(profile, &["starting_family", "home_owner"]),
        ),
    };
    u32::from(primary) * 2 + u32::from(secondary)
}

/// Eligible campaigns, best first.
pub fn rank_campaigns(profile: &Profile) -> Vec<CampaignKind> {
    let mut ranked: Vec<(u32, CampaignKind)> = CampaignKind::ALL
        .into_iter()
        .filter(|kind| is_eligible(*kind, profile))
        .map(|kind| (score(kind, profile), kind))
        .collect();
    ranked.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| a.title().cmp(b.title())));
    ranked.into_iter().map(|(_, kind)| kind).collect()
}

/// Every campaign, alphabetically by title.
pub fn all_campaigns() -> Vec<CampaignKind> {
    let mut all = CampaignKind::ALL.to_vec();
    all.sort_by_key(|kind| kind.title());
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_a() -> Profile {
        Profile {
            name: Some("Ali".into()),
            age: Some(36),
            email: Some("ali@example.com".into()),
            primary_concern: Some("income_protection".into()),
            life_stage: Some("raising_children".into()),
            dependents: Some("2".into()),
            existing_coverage: Some("none".into()),
            premium_budget: Some("201-500".into()),
            ..Profile::default()
        }
    }

    #[test]
    fn income_protection_ranks_first_for_young_parent() {
        let ranked = rank_campaigns(&scenario_a());
        assert_eq!(ranked[0], CampaignKind::IncomeProtection);
        // Legacy needs age 40+ or a retirement/savings concern.
        assert!(!ranked.contains(&CampaignKind::Legacy));
        assert_eq!(
            ranked,
            vec![
                CampaignKind::IncomeProtection,
                CampaignKind::Education,
                CampaignKind::Medical,
                CampaignKind::Combo,
            ]
        );
    }

    #[test]
    fn legacy_surfaces_by_age_or_concern() {
        let mut profile = Profile {
            age: Some(39),
            ..Profile::default()
        };
        assert!(!is_eligible(CampaignKind::Legacy, &profile));
        profile.age = Some(40);
        assert!(is_eligible(CampaignKind::Legacy, &profile));

        let profile = Profile {
            age: Some(25),
            primary_concern: Some("retirement".into()),
            ..Profile::default()
        };
        assert!(is_eligible(CampaignKind::Legacy, &profile));
        assert_eq!(rank_campaigns(&profile)[0], CampaignKind::Legacy);
    }

    #[test]
    fn education_needs_a_family_signal() {
        let single = Profile {
            life_stage: Some("single".into()),
            dependents: Some("1".into()),
            ..Profile::default()
        };
        assert!(!is_eligible(CampaignKind::Education, &single));

        let concerned = Profile {
            primary_concern: Some("education".into()),
            ..single.clone()
        };
        assert!(is_eligible(CampaignKind::Education, &concerned));
        assert_eq!(score(CampaignKind::Education, &concerned), 2);
    }

    #[test]
    fn ties_break_by_title() {
        let ranked = rank_campaigns(&Profile::default());
        // All score zero: alphabetical among the always-eligible plans.
        assert_eq!(
            ranked,
            vec![
                CampaignKind::Combo,
                CampaignKind::IncomeProtection,
                CampaignKind::Medical,
            ]
        );
    }

    #[test]
    fn all_campaigns_alphabetical() {
        let titles: Vec<&str> = all_campaigns().iter().map(|k| k.title()).collect();
        assert_eq!(
            titles,
            vec![
                "Masa Depan Anak Kita",
                "Perlindungan Combo",
                "Satu Gaji Satu Harapan",
                "Tabung Perubatan",
                "Tabung Warisan",
            ]
        );
    }
}
