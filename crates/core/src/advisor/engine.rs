use std::cmp::Ordering;

use crate::advisor::rules::{
    special_season, BudgetTier, DominantStrategy, ItemInsight, PortfolioProfile, RiskLevel,
};
use crate::domain::report::{ActionPoint, FooterAnalysis, PlayerProfile, Report, ReportSection};
use crate::domain::request::{
    AnalysisRequest, ExpertOptions, InteractionMode, OptimizationGoal, RiskTolerance, Season,
    TimeHorizon,
};
use crate::errors::DomainError;

pub trait RecommendationEngine: Send + Sync {
    /// Builds a report for a normalized request. `reportId` and `publicationDate`
    /// are left empty for the assembler.
    fn generate(&self, request: &AnalysisRequest) -> Result<Report, DomainError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RuleBasedEngine;

impl RecommendationEngine for RuleBasedEngine {
    fn generate(&self, request: &AnalysisRequest) -> Result<Report, DomainError> {
        if request.selections.is_empty() {
            return Err(DomainError::EmptySelection { dropped: Vec::new() });
        }

        let profile = PortfolioProfile::analyze(request);
        let Some(lead) = profile.lead() else {
            return Err(DomainError::EmptySelection { dropped: Vec::new() });
        };
        let lead = lead.display_name.clone();

        let (main_title, sections) = match request.interaction_mode {
            InteractionMode::Beginner => {
                (format!("Your Garden Guide: Growing {lead}"), beginner_sections(&profile, &lead))
            }
            InteractionMode::Advanced => {
                (format!("Strategic Briefing: {lead} Focus"), advanced_sections(&profile, &lead))
            }
            InteractionMode::Expert => {
                let options = request.effective_expert_options().unwrap_or_default();
                (
                    format!("Advanced Strategic Analysis: {lead} Portfolio"),
                    expert_sections(&profile, &lead, &options),
                )
            }
        };

        Ok(Report {
            report_id: String::new(),
            publication_date: String::new(),
            main_title,
            sub_title: sub_title(request.interaction_mode).to_owned(),
            visual_anchor: visual_anchor(request.interaction_mode).to_owned(),
            player_profile: PlayerProfile {
                title: "Player Profile".to_owned(),
                archetype: profile.archetype(),
                summary: profile_summary(&profile, request.interaction_mode, &lead),
            },
            mid_breaker_quote: seasonal_quote(profile.season.season).to_owned(),
            sections,
            footer_analysis: footer(&profile, request.interaction_mode, &lead),
        })
    }
}

fn sub_title(mode: InteractionMode) -> &'static str {
    match mode {
        InteractionMode::Beginner => "SIMPLE STEPS TO SUCCESS",
        InteractionMode::Advanced => "GROW A GARDEN INTELLIGENCE REPORT",
        InteractionMode::Expert => "COMPREHENSIVE MARKET INTELLIGENCE",
    }
}

fn visual_anchor(mode: InteractionMode) -> &'static str {
    match mode {
        InteractionMode::Beginner => "🌱",
        InteractionMode::Advanced => "🎯",
        InteractionMode::Expert => "📊",
    }
}

pub fn seasonal_quote(season: Option<Season>) -> &'static str {
    match season {
        Some(Season::Spring) => "Every garden begins with a single seed and the courage to plant it.",
        Some(Season::Summer) => {
            "In the peak of growth, wise gardeners prepare for tomorrow's harvest."
        }
        Some(Season::Autumn) => "The fruits of patience and planning are sweetest when shared.",
        Some(Season::Winter) => "In quiet seasons, the best strategies take root and grow strong.",
        None => "Success grows from the seeds of smart planning and patient cultivation.",
    }
}

fn section(id: &str, title: &str, points: Vec<ActionPoint>) -> ReportSection {
    ReportSection { id: id.to_owned(), title: title.to_owned(), points }
}

fn season_label(profile: &PortfolioProfile) -> String {
    profile.season.season.map_or_else(|| "this season".to_owned(), |season| season.to_string())
}

fn quantity_label(insight: &ItemInsight) -> String {
    format!("{} (x{})", insight.display_name, insight.quantity)
}

fn bonus_label(insight: &ItemInsight) -> String {
    let effect = insight.bonus_type.map_or("adds a passive special effect", |bonus| bonus.describe());
    format!("{effect} ({:.2}x)", insight.bonus_value)
}

fn beginner_sections(profile: &PortfolioProfile, lead: &str) -> Vec<ReportSection> {
    let now = profile
        .insights
        .iter()
        .map(|insight| {
            if insight.is_pet {
                ActionPoint::new(
                    format!("Keep {} next to your crops", insight.display_name),
                    format!(
                        "{} {}. Pets keep helping once you own them, so there is nothing to spend.",
                        insight.display_name,
                        bonus_label(insight)
                    ),
                    &["Safe", "Easy"],
                )
            } else if insight.multi_harvest {
                ActionPoint::new(
                    format!("Keep your {} growing and harvest it again and again", quantity_label(insight)),
                    format!(
                        "{} is a {} crop that keeps producing after the first harvest, so every plant \
                         pays you more than once.",
                        insight.display_name, insight.tier
                    ),
                    &["Safe", "Steady Income"],
                )
            } else {
                ActionPoint::new(
                    format!("Harvest your {} and sell it when it is ready", quantity_label(insight)),
                    format!(
                        "{} is a {} crop worth about {} gold each time you sell it. Selling what is \
                         ready is the safest way to grow your savings.",
                        insight.display_name,
                        insight.tier,
                        insight.sale_value / u64::from(insight.quantity.max(1))
                    ),
                    &["Safe", "Easy"],
                )
            }
        })
        .collect();

    let goal = match profile.budget {
        _ if profile.dominant == DominantStrategy::Companion => ActionPoint::new(
            format!("Buy your first seeds to plant beside {lead}"),
            format!(
                "You have {} gold. {lead} only helps crops that are in the ground, so a few cheap \
                 seeds put its bonus to work.",
                profile.gold
            ),
            &["Goal", "Growth"],
        ),
        BudgetTier::Low => ActionPoint::new(
            format!("Save up to 200 gold by selling {lead}"),
            format!(
                "You have {} gold right now. Reaching 200 gold lets you buy rarer seeds while {lead} \
                 keeps earning.",
                profile.gold
            ),
            &["Goal", "Savings"],
        ),
        BudgetTier::Medium => ActionPoint::new(
            format!("Grow your savings to 1000 gold with {lead}"),
            format!(
                "With {} gold you can replant safely. Keep {lead} in the ground and put a little \
                 aside after every sale.",
                profile.gold
            ),
            &["Goal", "Savings"],
        ),
        BudgetTier::High => ActionPoint::new(
            format!("Replant {lead} before trying anything new"),
            format!(
                "You have {} gold, which is plenty. Keeping {lead} planted is the easiest way to \
                 stay ahead.",
                profile.gold
            ),
            &["Goal", "Growth"],
        ),
    };

    let mut next = vec![goal];
    if profile.season.season.is_some() {
        next.push(ActionPoint::new(
            format!("Check on {lead} often this {}", season_label(profile)),
            profile.season.note.to_owned(),
            &["Tip"],
        ));
    }

    vec![
        section("what_to_do_now", "What To Do Now 🌱", now),
        section("next_goal", "Your Next Goal 🎯", next),
    ]
}

fn crop_priority_point(profile: &PortfolioProfile, insight: &ItemInsight, rank: usize) -> ActionPoint {
    let units = insight.affordable_units(profile.gold, profile.strategy.allocation_ratio);
    let action = if units > 0 {
        format!("Replant {units} {} now", insight.display_name)
    } else {
        format!("Harvest and sell your {} first", quantity_label(insight))
    };
    let hurdle = if insight.roi_pct >= profile.strategy.min_roi_pct {
        "Above Target"
    } else {
        "Below Target"
    };
    let mut tags = vec![format!("{} Risk", insight.risk.as_str()), hurdle.to_owned()];
    if rank == 0 {
        tags.insert(0, "Top ROI".to_owned());
    }

    ActionPoint {
        action,
        reasoning: format!(
            "{} returns an estimated {:.0}% ROI with {} risk and about {:.1}h to harvest in {}.",
            insight.display_name,
            insight.roi_pct,
            insight.risk.as_str().to_lowercase(),
            insight.growth_hours,
            season_label(profile)
        ),
        tags,
    }
}

fn pet_support_point(insight: &ItemInsight, lead_crop: Option<&ItemInsight>, tags: &[&str]) -> ActionPoint {
    match lead_crop {
        Some(crop) => ActionPoint::new(
            format!("Pair {} with {}", insight.display_name, crop.display_name),
            format!("{} {}, which compounds on your best earner.", insight.display_name, bonus_label(insight)),
            tags,
        ),
        None => ActionPoint::new(
            format!("Keep {} active while you save for seeds", insight.display_name),
            format!(
                "{} {}. It will pay off as soon as crops are back in the ground.",
                insight.display_name,
                bonus_label(insight)
            ),
            tags,
        ),
    }
}

fn by_roi(left: &&ItemInsight, right: &&ItemInsight) -> Ordering {
    right.roi_pct.total_cmp(&left.roi_pct).then_with(|| left.name.cmp(&right.name))
}

fn advanced_sections(profile: &PortfolioProfile, lead: &str) -> Vec<ReportSection> {
    let mut crops = profile.crops().collect::<Vec<_>>();
    crops.sort_by(by_roi);
    let lead_crop = crops.first().copied();

    let mut next_steps = Vec::new();
    let priority = if crops.is_empty() {
        profile.pets().map(|pet| pet_support_point(pet, None, &["Companion", "Low Risk"])).collect()
    } else {
        next_steps.extend(profile.pets().map(|pet| pet_support_point(pet, lead_crop, &["Companion", "Synergy"])));
        crops
            .iter()
            .enumerate()
            .map(|(rank, insight)| crop_priority_point(profile, insight, rank))
            .collect::<Vec<_>>()
    };

    next_steps.push(ActionPoint::new(
        format!("Build your mid-term plan around {lead}"),
        format!(
            "{} budget with {} gold across {} tier(s): {}.",
            capitalize(profile.budget.as_str()),
            profile.gold,
            profile.distinct_tiers,
            profile.dominant.describe()
        ),
        &["Strategy", "Mid-Term"],
    ));

    let mut sections = vec![
        section("priority_one", "Priority One 🎯", priority),
        section("next_steps", "Next Steps 🗺️", next_steps),
    ];

    let gems = hidden_gems(profile);
    if !gems.is_empty() {
        sections.push(section("hidden_gems", "Hidden Gems 💎", gems));
    } else {
        let warnings = risk_warnings(profile);
        if !warnings.is_empty() {
            sections.push(section("warnings", "Watch Out ⚠️", warnings));
        }
    }

    sections
}

fn hidden_gems(profile: &PortfolioProfile) -> Vec<ActionPoint> {
    let mut gems = profile
        .synergies
        .iter()
        .map(|synergy| {
            ActionPoint::new(
                format!("Combine {} with {}", synergy.first, synergy.second),
                format!("Together they unlock a {:.1}x bonus: {}.", synergy.bonus, synergy.effect),
                &["Synergy", "Hidden Opportunity"],
            )
        })
        .collect::<Vec<_>>();

    gems.extend(profile.crops().filter(|insight| insight.seasonal_boost > 1.0).map(|insight| {
        ActionPoint::new(
            format!("Prioritize {} this {}", insight.display_name, season_label(profile)),
            format!(
                "{} earns a {:.1}x seasonal bonus right now, on top of the regular season modifier.",
                insight.display_name, insight.seasonal_boost
            ),
            &["Seasonal", "Hidden Opportunity"],
        )
    }));

    gems
}

fn risk_warnings(profile: &PortfolioProfile) -> Vec<ActionPoint> {
    let low_budget = profile.budget == BudgetTier::Low;
    profile
        .crops()
        .filter_map(|insight| {
            if insight.risk == RiskLevel::High && low_budget {
                Some(ActionPoint::new(
                    format!("Don't overextend on {}", insight.display_name),
                    format!(
                        "Each {} seed costs about {} gold, more than a {} gold budget can safely \
                         replace.",
                        insight.display_name, insight.seed_cost, profile.gold
                    ),
                    &["Risk", "Budget"],
                ))
            } else if insight.roi_pct < profile.strategy.min_roi_pct {
                Some(ActionPoint::new(
                    format!("Watch the margin on {}", insight.display_name),
                    format!(
                        "{} projects {:.0}% ROI, under the {:.0}% target for your budget.",
                        insight.display_name, insight.roi_pct, profile.strategy.min_roi_pct
                    ),
                    &["Risk", "Margin"],
                ))
            } else {
                None
            }
        })
        .collect()
}

pub fn goal_tag(goal: OptimizationGoal) -> &'static str {
    match goal {
        OptimizationGoal::Profit => "High ROI",
        OptimizationGoal::Safety => "Safety First",
        OptimizationGoal::Balanced => "Balanced",
        OptimizationGoal::Speed => "Quick Turnover",
        OptimizationGoal::Xp => "XP Focus",
    }
}

pub fn risk_tag(tolerance: RiskTolerance) -> &'static str {
    match tolerance {
        RiskTolerance::Conservative => "Low Risk",
        RiskTolerance::Moderate => "Measured Risk",
        RiskTolerance::Aggressive => "High Risk Appetite",
    }
}

pub fn horizon_tag(horizon: TimeHorizon) -> &'static str {
    match horizon {
        TimeHorizon::Short => "Short-Term",
        TimeHorizon::Medium => "Mid-Term",
        TimeHorizon::Long => "Long-Term",
    }
}

type InsightOrder = fn(&&ItemInsight, &&ItemInsight) -> Ordering;

fn goal_order(goal: OptimizationGoal) -> InsightOrder {
    match goal {
        OptimizationGoal::Profit => by_expected_return,
        OptimizationGoal::Safety => by_risk,
        OptimizationGoal::Balanced => by_roi,
        OptimizationGoal::Speed => by_growth_time,
        OptimizationGoal::Xp => by_xp_yield,
    }
}

fn by_expected_return(left: &&ItemInsight, right: &&ItemInsight) -> Ordering {
    right.expected_return.total_cmp(&left.expected_return).then_with(|| left.name.cmp(&right.name))
}

fn by_risk(left: &&ItemInsight, right: &&ItemInsight) -> Ordering {
    left.risk.cmp(&right.risk).then_with(|| by_roi(left, right))
}

fn by_growth_time(left: &&ItemInsight, right: &&ItemInsight) -> Ordering {
    left.growth_hours.total_cmp(&right.growth_hours).then_with(|| left.name.cmp(&right.name))
}

fn by_xp_yield(left: &&ItemInsight, right: &&ItemInsight) -> Ordering {
    right
        .xp_yield
        .total_cmp(&left.xp_yield)
        .then_with(|| right.tier.cmp(&left.tier))
        .then_with(|| left.name.cmp(&right.name))
}

fn expert_sections(profile: &PortfolioProfile, lead: &str, options: &ExpertOptions) -> Vec<ReportSection> {
    let goal = goal_tag(options.optimization_goal);
    let risk = risk_tag(options.risk_tolerance);
    let horizon = horizon_tag(options.time_horizon);

    let mut crops = profile.crops().collect::<Vec<_>>();
    crops.sort_by(goal_order(options.optimization_goal));
    let lead_crop = crops.first().copied();

    let budget_pct = profile.strategy.allocation_ratio * 100.0;
    let total_weight = (crops.len() * (crops.len() + 1) / 2).max(1) as f64;
    let allocation = if crops.is_empty() {
        profile
            .pets()
            .map(|pet| {
                ActionPoint::new(
                    format!("Anchor your first crop allocation on {}", pet.display_name),
                    format!(
                        "{} {}; commit up to {budget_pct:.0}% of {} gold once seeds are affordable.",
                        pet.display_name,
                        bonus_label(pet),
                        profile.gold
                    ),
                    &[goal, "Companion"],
                )
            })
            .collect()
    } else {
        crops
            .iter()
            .enumerate()
            .map(|(rank, insight)| {
                let weight = (crops.len() - rank) as f64 / total_weight;
                ActionPoint::new(
                    format!(
                        "Allocate {:.0}% of your planting budget to {}",
                        budget_pct * weight,
                        insight.display_name
                    ),
                    format!(
                        "Rank {} under a {} mandate: expected return {:.0} gold, ROI {:.0}%, {:.1}h cycle.",
                        rank + 1,
                        goal.to_lowercase(),
                        insight.expected_return,
                        insight.roi_pct,
                        insight.growth_hours
                    ),
                    &[goal, insight.risk.as_str()],
                )
            })
            .collect::<Vec<_>>()
    };

    let mut sizing = crops
        .iter()
        .map(|insight| {
            let units = insight.affordable_units(profile.gold, profile.strategy.allocation_ratio);
            let fits = insight.risk <= profile.strategy.preferred_risk;
            let hurdle = if insight.roi_pct >= profile.strategy.min_roi_pct {
                "Meets Hurdle"
            } else {
                "Below Hurdle"
            };
            ActionPoint::new(
                format!("Size {} at {units} replant(s) this cycle", insight.display_name),
                format!(
                    "{:.0}% ROI against a {:.0}% hurdle; {} risk {} your {} risk ceiling.",
                    insight.roi_pct,
                    profile.strategy.min_roi_pct,
                    insight.risk.as_str().to_lowercase(),
                    if fits { "sits within" } else { "exceeds" },
                    profile.strategy.preferred_risk.as_str().to_lowercase()
                ),
                &[risk, hurdle],
            )
        })
        .collect::<Vec<_>>();
    if !crops.is_empty() {
        sizing.extend(profile.pets().map(|pet| pet_support_point(pet, lead_crop, &[risk, "Companion"])));
    } else {
        sizing.push(ActionPoint::new(
            format!("Hold {lead} and keep {} gold liquid", profile.gold),
            format!(
                "No crops are at risk yet; your {} stance keeps {:.0}% of gold in reserve.",
                risk.to_lowercase(),
                100.0 - budget_pct
            ),
            &[risk, "Liquidity"],
        ));
    }

    let timing = if crops.is_empty() {
        vec![ActionPoint::new(
            format!("Time your first planting around {lead}"),
            profile.season.note.to_owned(),
            &[horizon, "Seasonal"],
        )]
    } else {
        crops.iter().map(|insight| timing_point(profile, insight, options.time_horizon, horizon)).collect()
    };

    let mut sections = vec![
        section("portfolio_optimization", "Portfolio Optimization 📊", allocation),
        section("risk_reward", "Risk / Reward Sizing ⚖️", sizing),
        section("market_timing", "Market Timing ⏱️", timing),
    ];

    let mut warnings = risk_warnings(profile);
    warnings.extend(profile.synergies.iter().map(|synergy| {
        ActionPoint::new(
            format!("Keep {} and {} together", synergy.first, synergy.second),
            format!("Splitting them forfeits a {:.1}x bonus: {}.", synergy.bonus, synergy.effect),
            &[goal, "Synergy"],
        )
    }));
    if !warnings.is_empty() {
        sections.push(section("strategic_warnings", "Strategic Warnings ⚠️", warnings));
    }

    sections
}

fn timing_point(
    profile: &PortfolioProfile,
    insight: &ItemInsight,
    horizon: TimeHorizon,
    tag: &str,
) -> ActionPoint {
    let window = match special_season(&insight.name) {
        Some(season) if profile.season.season == Some(season) => {
            format!("{season} is its peak window ({:.1}x)", insight.seasonal_boost)
        }
        Some(season) => format!("its peak window is {season}"),
        None => profile.season.note.to_owned(),
    };

    let action = match horizon {
        TimeHorizon::Short => format!("Cycle {} every {:.1}h", insight.display_name, insight.growth_hours),
        TimeHorizon::Medium => {
            format!("Rotate {} through the {} window", insight.display_name, season_label(profile))
        }
        TimeHorizon::Long if insight.multi_harvest => {
            format!("Hold {} for its compounding harvests", insight.display_name)
        }
        TimeHorizon::Long => format!("Stage {} replants ahead of its best season", insight.display_name),
    };

    ActionPoint::new(
        action,
        format!("{}: {window}.", insight.display_name),
        &[tag, if insight.multi_harvest { "Recurring" } else { "Single Harvest" }],
    )
}

fn profile_summary(profile: &PortfolioProfile, mode: InteractionMode, lead: &str) -> String {
    match mode {
        InteractionMode::Beginner => format!(
            "You have {} gold and {} kind(s) of items. {lead} is your best earner right now.",
            profile.gold,
            profile.insights.len()
        ),
        InteractionMode::Advanced | InteractionMode::Expert => format!(
            "{} budget ({} gold) across {} tier(s); {}. {}.",
            capitalize(profile.budget.as_str()),
            profile.gold,
            profile.distinct_tiers,
            profile.dominant.describe(),
            profile.season.note
        ),
    }
}

fn footer(profile: &PortfolioProfile, mode: InteractionMode, lead: &str) -> FooterAnalysis {
    let conclusion = format!(
        "With {} gold, {lead} leads a garden worth about {:.0} gold in expected returns ({:.0}% ROI).",
        profile.gold,
        profile.total_expected_return(),
        profile.portfolio_roi_pct()
    );
    let call_to_action = match mode {
        InteractionMode::Beginner => "Plant, harvest, and come back when your gold grows!",
        InteractionMode::Advanced => "Act on priority one today and revisit the plan next season.",
        InteractionMode::Expert => {
            "Rebalance the allocation after every harvest cycle and rerun the analysis."
        }
    };

    FooterAnalysis {
        title: "Strategic Assessment".to_owned(),
        conclusion,
        call_to_action: call_to_action.to_owned(),
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{RecommendationEngine, RuleBasedEngine};
    use crate::advisor::catalog::Catalog;
    use crate::domain::report::Report;
    use crate::domain::request::{
        AnalysisRequest, ExpertOptions, InGameDate, InteractionMode, OptimizationGoal,
        RiskTolerance, SelectionEntry, TimeHorizon,
    };
    use crate::errors::DomainError;

    fn request(items: &[(&str, u32)], gold: u64, mode: InteractionMode) -> AnalysisRequest {
        let catalog = Catalog::builtin().expect("builtin catalog");
        AnalysisRequest {
            selections: items
                .iter()
                .map(|(name, quantity)| SelectionEntry {
                    item: catalog.get(name).expect("known item").clone(),
                    quantity: *quantity,
                })
                .collect(),
            gold,
            in_game_date: InGameDate::parse("Spring, Day 1"),
            current_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("date"),
            interaction_mode: mode,
            expert_options: None,
        }
    }

    fn generate(request: &AnalysisRequest) -> Report {
        RuleBasedEngine.generate(request).expect("report should generate")
    }

    /// Every catalog item a report names outside the request's selections.
    fn unselected_mentions(report: &Report, request: &AnalysisRequest) -> Vec<String> {
        let catalog = Catalog::builtin().expect("builtin catalog");
        catalog
            .items()
            .filter(|item| !request.is_selected(&item.name))
            .filter(|item| report.texts().iter().any(|text| item.is_named_in(text)))
            .map(|item| item.name.clone())
            .collect()
    }

    fn all_requests() -> Vec<AnalysisRequest> {
        let selections: &[&[(&str, u32)]] = &[
            &[("carrot", 5)],
            &[("strawberry", 3), ("pumpkin", 1)],
            &[("orange_tulip", 4), ("queen_bee", 1)],
            &[("corn", 6), ("hedgehog", 1), ("grape", 1)],
            &[("dog", 1), ("cat", 2)],
            &[("mango", 2), ("dragon_fruit", 3), ("bunny", 1), ("sea_otter", 1)],
        ];
        let mut requests = Vec::new();
        for items in selections {
            for gold in [0, 150, 600, 25_000] {
                for mode in [InteractionMode::Beginner, InteractionMode::Advanced, InteractionMode::Expert] {
                    requests.push(request(items, gold, mode));
                }
            }
        }
        requests
    }

    #[test]
    fn reports_only_name_selected_items_and_name_each_one() {
        for request in all_requests() {
            let report = generate(&request);

            assert!(!report.sections.is_empty());
            assert!(report.sections.iter().all(|section| !section.points.is_empty()));
            assert_eq!(unselected_mentions(&report, &request), Vec::<String>::new(), "{:?}", request.selected_names());
            for entry in &request.selections {
                assert!(
                    report.actions().any(|action| entry.item.is_named_in(action)),
                    "no action names {} in {:?} mode",
                    entry.item.name,
                    request.interaction_mode
                );
            }
        }
    }

    #[test]
    fn section_counts_follow_the_mode() {
        for request in all_requests() {
            let count = generate(&request).sections.len();
            let range = match request.interaction_mode {
                InteractionMode::Beginner => 1..=2,
                InteractionMode::Advanced => 2..=3,
                InteractionMode::Expert => 3..=4,
            };
            assert!(range.contains(&count), "{count} sections in {:?} mode", request.interaction_mode);
        }
    }

    #[test]
    fn generation_is_idempotent() {
        let request = request(&[("corn", 6), ("hedgehog", 1)], 600, InteractionMode::Expert);
        assert_eq!(generate(&request), generate(&request));
    }

    #[test]
    fn beginner_and_expert_reports_differ() {
        let beginner = generate(&request(&[("carrot", 5)], 100, InteractionMode::Beginner));
        let expert = generate(&request(&[("carrot", 5)], 100, InteractionMode::Expert));

        assert_ne!(beginner.main_title, expert.main_title);
        assert_ne!(beginner.sections.len(), expert.sections.len());
    }

    #[test]
    fn disjoint_selections_name_disjoint_items() {
        let catalog = Catalog::builtin().expect("builtin catalog");
        let left = generate(&request(&[("carrot", 2), ("dog", 1)], 300, InteractionMode::Advanced));
        let right = generate(&request(&[("tomato", 2), ("frog", 1)], 300, InteractionMode::Advanced));

        let named = |report: &Report| {
            catalog
                .items()
                .filter(|item| report.actions().any(|action| item.is_named_in(action)))
                .map(|item| item.name.clone())
                .collect::<Vec<_>>()
        };
        let left_names = named(&left);
        let right_names = named(&right);
        assert!(left_names.iter().all(|name| !right_names.contains(name)));
    }

    #[test]
    fn zero_gold_single_common_item_is_beginner_safe() {
        let report = generate(&request(&[("carrot", 1)], 0, InteractionMode::Beginner));

        for text in report.texts() {
            assert!(!text.contains("NaN"), "{text}");
            assert!(!text.contains("inf%"), "{text}");
            let chars = text.chars().collect::<Vec<_>>();
            assert!(
                chars.windows(2).all(|pair| !(pair[0] == '-' && pair[1].is_ascii_digit())),
                "negative number in {text}"
            );
        }
        assert!(report
            .points()
            .all(|point| point.tags.iter().any(|tag| ["Safe", "Goal", "Tip"].contains(&tag.as_str()))));
    }

    #[test]
    fn carrot_scenario_mentions_only_carrot() {
        let request = request(&[("carrot", 5)], 100, InteractionMode::Beginner);
        let report = generate(&request);

        assert!(report.actions().any(|action| action.contains("Carrot")));
        assert!(report.texts().iter().all(|text| !text.contains("Strawberry")));
        assert!(unselected_mentions(&report, &request).is_empty());
    }

    #[test]
    fn expert_goal_selects_the_emphasized_tag() {
        for (goal, tag) in [
            (OptimizationGoal::Profit, "High ROI"),
            (OptimizationGoal::Safety, "Safety First"),
            (OptimizationGoal::Balanced, "Balanced"),
            (OptimizationGoal::Speed, "Quick Turnover"),
            (OptimizationGoal::Xp, "XP Focus"),
        ] {
            let mut request = request(&[("carrot", 5), ("mango", 1)], 5_000, InteractionMode::Expert);
            request.expert_options = Some(ExpertOptions {
                optimization_goal: goal,
                risk_tolerance: RiskTolerance::Conservative,
                time_horizon: TimeHorizon::Short,
            });
            let report = generate(&request);

            let allocation = &report.sections[0];
            assert_eq!(allocation.id, "portfolio_optimization");
            assert!(allocation.points.iter().all(|point| point.tags[0] == tag));
            assert!(report.sections[1].points.iter().all(|point| point.tags[0] == "Low Risk"));
            assert!(report.sections[2].points.iter().all(|point| point.tags[0] == "Short-Term"));
        }
    }

    #[test]
    fn profit_and_safety_order_allocations_differently() {
        let mut request = request(&[("carrot", 5), ("mango", 1)], 5_000, InteractionMode::Expert);
        request.expert_options =
            Some(ExpertOptions { optimization_goal: OptimizationGoal::Profit, ..ExpertOptions::default() });
        let profit = generate(&request);
        request.expert_options =
            Some(ExpertOptions { optimization_goal: OptimizationGoal::Safety, ..ExpertOptions::default() });
        let safety = generate(&request);

        assert!(profit.sections[0].points[0].action.contains("Mango"));
        assert!(safety.sections[0].points[0].action.contains("Carrot"));
    }

    #[test]
    fn xp_goal_follows_experience_per_planting() {
        let xp = |items: &[(&str, u32)]| {
            let mut request = request(items, 5_000, InteractionMode::Expert);
            request.expert_options =
                Some(ExpertOptions { optimization_goal: OptimizationGoal::Xp, ..ExpertOptions::default() });
            generate(&request).sections[0].points[0].action.clone()
        };

        // 5 Carrot harvest 50 XP against four Tomato harvests worth 200.
        assert!(xp(&[("carrot", 5), ("tomato", 1)]).contains("Tomato"));
        assert!(xp(&[("carrot", 30), ("tomato", 1)]).contains("Carrot"));
    }

    #[test]
    fn pets_only_beginner_goal_never_sells_the_pet() {
        for gold in [0, 150, 600, 25_000] {
            let report = generate(&request(&[("dog", 1)], gold, InteractionMode::Beginner));
            let goal = &report.sections[1].points[0];

            assert_eq!(report.sections[1].id, "next_goal");
            assert!(!goal.action.contains("selling"), "{}", goal.action);
            assert!(!goal.action.starts_with("Replant"), "{}", goal.action);
            assert!(goal.action.contains("Dog"));
        }
    }

    #[test]
    fn beginner_mode_ignores_expert_options() {
        let plain = request(&[("carrot", 5)], 100, InteractionMode::Beginner);
        let mut with_options = plain.clone();
        with_options.expert_options = Some(ExpertOptions {
            optimization_goal: OptimizationGoal::Profit,
            risk_tolerance: RiskTolerance::Aggressive,
            time_horizon: TimeHorizon::Long,
        });

        assert_eq!(generate(&plain), generate(&with_options));
    }

    #[test]
    fn archetype_reflects_budget_and_strategy() {
        let report = generate(&request(&[("carrot", 5)], 100, InteractionMode::Advanced));
        assert_eq!(report.player_profile.archetype, "Resource-Constrained Quick-Turnover Trader");

        let report = generate(&request(&[("grape", 1)], 50_000, InteractionMode::Advanced));
        assert_eq!(report.player_profile.archetype, "Capital-Rich Perennial Grower");
    }

    #[test]
    fn empty_selection_is_rejected() {
        let request = request(&[], 100, InteractionMode::Advanced);
        assert_eq!(RuleBasedEngine.generate(&request), Err(DomainError::EmptySelection { dropped: Vec::new() }));
    }

    #[test]
    fn engine_leaves_identity_fields_blank() {
        let report = generate(&request(&[("carrot", 5)], 100, InteractionMode::Beginner));
        assert!(report.report_id.is_empty());
        assert!(report.publication_date.is_empty());
    }
}
