use serde::{Deserialize, Serialize};

use crate::domain::item::{BonusType, Item, Tier};
use crate::domain::request::{
    AnalysisRequest, ExpertOptions, OptimizationGoal, RiskTolerance, Season, SelectionEntry,
    TimeHorizon,
};

pub const LOW_BUDGET_LIMIT: u64 = 200;
pub const MEDIUM_BUDGET_LIMIT: u64 = 1_000;
/// Harvests counted for a multi-harvest crop with no known harvest count.
pub const DEFAULT_MULTI_HARVEST_YIELD: u64 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    Low,
    Medium,
    High,
}

impl BudgetTier {
    pub fn from_gold(gold: u64) -> Self {
        if gold < LOW_BUDGET_LIMIT {
            Self::Low
        } else if gold < MEDIUM_BUDGET_LIMIT {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn archetype_prefix(&self) -> &'static str {
        match self {
            Self::Low => "Resource-Constrained",
            Self::Medium => "Balanced",
            Self::High => "Capital-Rich",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn for_item(item: &Item) -> Self {
        if item.is_pet() {
            return Self::Low;
        }
        match item.tier {
            Tier::Common | Tier::Uncommon => Self::Low,
            Tier::Rare => Self::Medium,
            Tier::Legendary | Tier::Mythical | Tier::Divine => Self::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    fn lowered(self) -> Self {
        match self {
            Self::High => Self::Medium,
            Self::Medium | Self::Low => Self::Low,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TierEconomics {
    pub seed_cost: u64,
    pub growth_hours: f64,
    /// Experience per harvested unit.
    pub xp_reward: u64,
}

/// Seed costs are scaled against catalog sell prices rather than a flat
/// per-tier price, so Common seeds stay cheap next to an 18 gold Carrot.
pub fn tier_economics(tier: Tier) -> TierEconomics {
    let (seed_cost, growth_hours, xp_reward) = match tier {
        Tier::Common => (10, 1.0, 10),
        Tier::Uncommon => (40, 2.0, 25),
        Tier::Rare => (300, 4.0, 50),
        Tier::Legendary => (1_200, 8.0, 100),
        Tier::Mythical => (3_000, 12.0, 200),
        Tier::Divine => (8_000, 24.0, 400),
    };
    TierEconomics { seed_cost, growth_hours, xp_reward }
}

/// Harvests one planting yields. Berries and tomatoes have known counts.
pub fn harvests_per_planting(item: &Item) -> u64 {
    if !item.multi_harvest {
        return 1;
    }
    match item.name.as_str() {
        "strawberry" => 2,
        "blueberry" => 3,
        "tomato" => 4,
        _ => DEFAULT_MULTI_HARVEST_YIELD,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeasonProfile {
    pub season: Option<Season>,
    pub growth_speed: f64,
    pub gold_bonus: f64,
    pub xp_bonus: f64,
    pub note: &'static str,
}

/// Unknown seasons get neutral multipliers.
pub fn season_profile(season: Option<Season>) -> SeasonProfile {
    let (growth_speed, gold_bonus, xp_bonus, note) = match season {
        Some(Season::Spring) => (1.2, 1.0, 1.1, "Spring accelerates growth by 20%"),
        Some(Season::Summer) => (1.0, 1.3, 1.0, "Summer increases gold rewards by 30%"),
        Some(Season::Autumn) => (0.9, 1.1, 1.2, "Autumn provides a 20% XP bonus"),
        Some(Season::Winter) => (0.8, 1.0, 1.0, "Winter slows growth but keeps prices stable"),
        None => (1.0, 1.0, 1.0, "No seasonal modifier applies to this date"),
    };
    SeasonProfile { season, growth_speed, gold_bonus, xp_bonus, note }
}

/// Extra return multiplier for crops that peak in one season.
pub fn seasonal_special(item_name: &str, season: Option<Season>) -> f64 {
    match (item_name, season) {
        ("pumpkin", Some(Season::Autumn)) => 2.0,
        ("watermelon", Some(Season::Summer)) => 1.8,
        ("daffodil", Some(Season::Spring)) => 1.5,
        _ => 1.0,
    }
}

/// The season in which a crop earns a special bonus, if any.
pub fn special_season(item_name: &str) -> Option<Season> {
    match item_name {
        "pumpkin" => Some(Season::Autumn),
        "watermelon" => Some(Season::Summer),
        "daffodil" => Some(Season::Spring),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Synergy {
    pub first: String,
    pub second: String,
    pub bonus: f64,
    pub effect: &'static str,
}

const SYNERGY_PAIRS: &[(&str, &str, f64, &str)] = &[
    ("orange_tulip", "queen_bee", 2.5, "pollination doubles the bloom's value"),
    ("corn", "hedgehog", 1.3, "pest protection keeps the rows intact"),
];

fn find_synergies(selections: &[SelectionEntry]) -> Vec<Synergy> {
    let selected = |name: &str| selections.iter().find(|entry| entry.item.name == name);
    SYNERGY_PAIRS
        .iter()
        .filter_map(|&(first, second, bonus, effect)| {
            let first = selected(first)?;
            let second = selected(second)?;
            Some(Synergy {
                first: first.item.display_name.clone(),
                second: second.item.display_name.clone(),
                bonus,
                effect,
            })
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct ItemInsight {
    pub name: String,
    pub display_name: String,
    pub tier: Tier,
    pub quantity: u32,
    pub is_pet: bool,
    pub multi_harvest: bool,
    pub bonus_type: Option<BonusType>,
    pub bonus_value: f64,
    pub seed_cost: u64,
    /// Sell price times quantity, before any modifier.
    pub sale_value: u64,
    pub harvests: u64,
    pub expected_return: f64,
    /// Experience over every harvest of the planting, seasonal XP bonus included.
    pub xp_yield: f64,
    pub roi_pct: f64,
    pub growth_hours: f64,
    pub seasonal_boost: f64,
    pub risk: RiskLevel,
}

impl ItemInsight {
    fn new(
        entry: &SelectionEntry,
        season: &SeasonProfile,
        gold_multiplier: f64,
        growth_multiplier: f64,
    ) -> Self {
        let item = &entry.item;
        let quantity = u64::from(entry.quantity);
        let risk = RiskLevel::for_item(item);

        if item.is_pet() {
            return Self {
                name: item.name.clone(),
                display_name: item.display_name.clone(),
                tier: item.tier,
                quantity: entry.quantity,
                is_pet: true,
                multi_harvest: false,
                bonus_type: item.bonus_type,
                bonus_value: item.bonus_value.unwrap_or(1.0),
                seed_cost: 0,
                sale_value: 0,
                harvests: 0,
                expected_return: 0.0,
                xp_yield: 0.0,
                roi_pct: 0.0,
                growth_hours: 0.0,
                seasonal_boost: 1.0,
                risk,
            };
        }

        let economics = tier_economics(item.tier);
        let harvests = harvests_per_planting(item);
        let seasonal_boost = seasonal_special(&item.name, season.season);
        let sale_value = item.sell_price.saturating_mul(quantity);
        let expected_return = sale_value as f64
            * harvests as f64
            * season.gold_bonus
            * seasonal_boost
            * gold_multiplier;
        let investment = economics.seed_cost.saturating_mul(quantity) as f64;
        let xp_yield = economics.xp_reward.saturating_mul(quantity).saturating_mul(harvests) as f64
            * season.xp_bonus;

        Self {
            name: item.name.clone(),
            display_name: item.display_name.clone(),
            tier: item.tier,
            quantity: entry.quantity,
            is_pet: false,
            multi_harvest: item.multi_harvest,
            bonus_type: None,
            bonus_value: 1.0,
            seed_cost: economics.seed_cost,
            sale_value,
            harvests,
            expected_return,
            xp_yield,
            roi_pct: ratio_pct(expected_return - investment, investment),
            growth_hours: economics.growth_hours / (season.growth_speed * growth_multiplier),
            seasonal_boost,
            risk,
        }
    }

    /// Units the allocation share of the budget can replant; zero when the seed is free
    /// or the budget is empty.
    pub fn affordable_units(&self, gold: u64, allocation_ratio: f64) -> u64 {
        if self.is_pet || self.seed_cost == 0 {
            return 0;
        }
        let budget = (gold as f64 * allocation_ratio.clamp(0.0, 1.0)).floor() as u64;
        (budget / self.seed_cost).min(u64::from(self.quantity))
    }
}

fn ratio_pct(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    let value = numerator / denominator * 100.0;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominantStrategy {
    MultiHarvest,
    OneShot,
    Companion,
}

impl DominantStrategy {
    pub fn archetype_noun(&self) -> &'static str {
        match self {
            Self::MultiHarvest => "Perennial Grower",
            Self::OneShot => "Quick-Turnover Trader",
            Self::Companion => "Companion Keeper",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::MultiHarvest => "repeat harvests carry most of your value",
            Self::OneShot => "single-harvest crops carry most of your value",
            Self::Companion => "your garden value comes from companions rather than crops",
        }
    }
}

/// Investment stance derived from the budget, adjusted by expert options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InvestmentStrategy {
    pub min_roi_pct: f64,
    pub preferred_risk: RiskLevel,
    pub allocation_ratio: f64,
}

pub fn investment_strategy(budget: BudgetTier, options: Option<&ExpertOptions>) -> InvestmentStrategy {
    let mut strategy = match budget {
        BudgetTier::Low => {
            InvestmentStrategy { min_roi_pct: 20.0, preferred_risk: RiskLevel::Low, allocation_ratio: 0.8 }
        }
        BudgetTier::Medium => InvestmentStrategy {
            min_roi_pct: 30.0,
            preferred_risk: RiskLevel::Medium,
            allocation_ratio: 0.6,
        },
        BudgetTier::High => {
            InvestmentStrategy { min_roi_pct: 40.0, preferred_risk: RiskLevel::High, allocation_ratio: 0.4 }
        }
    };

    let Some(options) = options else {
        return strategy;
    };

    match options.risk_tolerance {
        RiskTolerance::Conservative => {
            strategy.preferred_risk = RiskLevel::Low;
            strategy.min_roi_pct = (strategy.min_roi_pct - 10.0).max(15.0);
        }
        RiskTolerance::Aggressive => {
            strategy.preferred_risk = RiskLevel::High;
            strategy.min_roi_pct += 15.0;
        }
        RiskTolerance::Moderate => {}
    }

    match options.optimization_goal {
        OptimizationGoal::Speed => {
            strategy.min_roi_pct = (strategy.min_roi_pct - 15.0).max(10.0);
            strategy.allocation_ratio += 0.2;
        }
        OptimizationGoal::Profit => {
            strategy.min_roi_pct += 10.0;
            strategy.allocation_ratio -= 0.1;
        }
        OptimizationGoal::Safety => {
            strategy.preferred_risk = RiskLevel::Low;
            strategy.allocation_ratio -= 0.1;
        }
        OptimizationGoal::Balanced | OptimizationGoal::Xp => {}
    }

    match options.time_horizon {
        TimeHorizon::Short => strategy.preferred_risk = strategy.preferred_risk.lowered(),
        TimeHorizon::Long => strategy.min_roi_pct += 5.0,
        TimeHorizon::Medium => {}
    }

    strategy.allocation_ratio = strategy.allocation_ratio.clamp(0.1, 1.0);
    strategy
}

/// Everything the templates need to know about one request.
#[derive(Clone, Debug, PartialEq)]
pub struct PortfolioProfile {
    pub budget: BudgetTier,
    pub gold: u64,
    pub season: SeasonProfile,
    pub insights: Vec<ItemInsight>,
    pub distinct_tiers: usize,
    pub dominant: DominantStrategy,
    pub multi_harvest_value: u64,
    pub one_shot_value: u64,
    pub synergies: Vec<Synergy>,
    pub strategy: InvestmentStrategy,
}

impl PortfolioProfile {
    pub fn analyze(request: &AnalysisRequest) -> Self {
        let budget = BudgetTier::from_gold(request.gold);
        let season = season_profile(request.in_game_date.season);
        let gold_multiplier = pet_multiplier(&request.selections, BonusType::GoldMultiplier);
        let growth_multiplier = pet_multiplier(&request.selections, BonusType::GrowthSpeed);

        let insights = request
            .selections
            .iter()
            .map(|entry| ItemInsight::new(entry, &season, gold_multiplier, growth_multiplier))
            .collect::<Vec<_>>();

        let mut tiers = insights.iter().map(|insight| insight.tier).collect::<Vec<_>>();
        tiers.sort();
        tiers.dedup();

        let multi_harvest_value: u64 =
            insights.iter().filter(|insight| insight.multi_harvest).map(|insight| insight.sale_value).sum();
        let one_shot_value: u64 = insights
            .iter()
            .filter(|insight| !insight.is_pet && !insight.multi_harvest)
            .map(|insight| insight.sale_value)
            .sum();

        let dominant = if insights.iter().all(|insight| insight.is_pet) {
            DominantStrategy::Companion
        } else if multi_harvest_value >= one_shot_value {
            DominantStrategy::MultiHarvest
        } else {
            DominantStrategy::OneShot
        };

        Self {
            budget,
            gold: request.gold,
            season,
            insights,
            distinct_tiers: tiers.len(),
            dominant,
            multi_harvest_value,
            one_shot_value,
            synergies: find_synergies(&request.selections),
            strategy: investment_strategy(budget, request.effective_expert_options().as_ref()),
        }
    }

    pub fn crops(&self) -> impl Iterator<Item = &ItemInsight> {
        self.insights.iter().filter(|insight| !insight.is_pet)
    }

    pub fn pets(&self) -> impl Iterator<Item = &ItemInsight> {
        self.insights.iter().filter(|insight| insight.is_pet)
    }

    /// Highest expected return among crops; the first pet when only pets are held.
    pub fn lead(&self) -> Option<&ItemInsight> {
        self.crops()
            .max_by(|left, right| {
                left.expected_return
                    .total_cmp(&right.expected_return)
                    .then_with(|| right.name.cmp(&left.name))
            })
            .or_else(|| self.insights.first())
    }

    pub fn total_expected_return(&self) -> f64 {
        self.crops().map(|insight| insight.expected_return).sum()
    }

    pub fn total_investment(&self) -> f64 {
        self.crops().map(|insight| (insight.seed_cost * u64::from(insight.quantity)) as f64).sum()
    }

    pub fn portfolio_roi_pct(&self) -> f64 {
        let investment = self.total_investment();
        ratio_pct(self.total_expected_return() - investment, investment)
    }

    pub fn archetype(&self) -> String {
        format!("{} {}", self.budget.archetype_prefix(), self.dominant.archetype_noun())
    }
}

fn pet_multiplier(selections: &[SelectionEntry], bonus: BonusType) -> f64 {
    selections
        .iter()
        .filter(|entry| entry.item.is_pet() && entry.item.bonus_type == Some(bonus))
        .filter_map(|entry| entry.item.bonus_value)
        .filter(|value| value.is_finite() && *value > 0.0)
        .product()
}
