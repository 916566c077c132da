use crate::config::RankerConfig;
use crate::models::{DramaLevel, EliminationStatus, TeamStanding};
use roster_engine::StandingTeam;
use tracing::debug;

/// Safety estimate for the neutral, fully uncertain case
const UNCERTAIN_SAFETY: f64 = 0.5;

/// Ranking math for a single league period
pub struct SurvivalCalculator {
    config: RankerConfig,
}

impl SurvivalCalculator {
    pub fn new(config: RankerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    /// Whether any active team has posted points this period
    pub fn scoring_started(active: &[&StandingTeam]) -> bool {
        active.iter().any(|team| team.score > 0.0)
    }

    /// Rank active teams, best first
    ///
    /// Before scoring starts every team is ranked on projection but reported
    /// as safe with probability 1.0. A lone remaining team is champion.
    pub fn rank(&self, active: &[&StandingTeam], weeks_remaining: u32) -> Vec<TeamStanding> {
        let scoring_started = Self::scoring_started(active);
        let effective = |team: &StandingTeam| if scoring_started { team.score } else { team.projected_score };

        let mut ordered: Vec<&StandingTeam> = active.to_vec();
        ordered.sort_by(|a, b| {
            effective(b)
                .total_cmp(&effective(a))
                .then_with(|| a.team_name.cmp(&b.team_name))
                .then_with(|| a.team_id.cmp(&b.team_id))
        });

        let count = ordered.len();
        let average_projection = if count == 0 {
            0.0
        } else {
            ordered.iter().map(|team| team.projected_score).sum::<f64>() / count as f64
        };
        let effective_scores: Vec<f64> = ordered.iter().map(|team| effective(team)).collect();

        debug!(count, scoring_started, average_projection, "Ranking survival teams");

        ordered
            .iter()
            .enumerate()
            .map(|(index, team)| {
                let (status, safety_percentage) = if count == 1 {
                    (EliminationStatus::Champion, 1.0)
                } else if !scoring_started {
                    (EliminationStatus::Safe, 1.0)
                } else {
                    (
                        self.status_for(index, count),
                        self.safety_percentage(index, count, team.projected_score, average_projection, weeks_remaining),
                    )
                };

                TeamStanding {
                    team_id: team.team_id.clone(),
                    team_name: team.team_name.clone(),
                    rank: index as u32 + 1,
                    score: team.score,
                    projected_score: team.projected_score,
                    effective_score: effective_scores[index],
                    status,
                    safety_percentage,
                    safety_margin: safety_margin(&effective_scores, index),
                }
            })
            .collect()
    }

    /// Status by rank position; never better for a lower rank
    pub fn status_for(&self, index: usize, count: usize) -> EliminationStatus {
        if count <= 1 {
            return EliminationStatus::Champion;
        }

        let from_bottom = count - 1 - index;
        let warning_count = (count as f64 * self.config.warning_band).ceil() as usize;
        match from_bottom {
            0 => EliminationStatus::Critical,
            1 => EliminationStatus::Danger,
            n if n < warning_count => EliminationStatus::Warning,
            _ => EliminationStatus::Safe,
        }
    }

    /// Probability of surviving the season from the current position
    ///
    /// The weekly estimate blends rank position with projection strength,
    /// then regresses toward 0.5 as the remaining season lengthens.
    pub fn safety_percentage(
        &self,
        index: usize,
        count: usize,
        projected: f64,
        average_projection: f64,
        weeks_remaining: u32,
    ) -> f64 {
        let rank_factor = if count <= 1 { 1.0 } else { (count - 1 - index) as f64 / (count - 1) as f64 };

        let projection_ratio = if average_projection > 0.0 { projected / average_projection } else { 1.0 };
        let projection_factor = (projection_ratio / 2.0).clamp(0.0, 1.0);

        let weekly = self.config.rank_weight * rank_factor + self.config.projection_weight * projection_factor;

        let horizon = f64::from(weeks_remaining.max(1));
        let uncertainty = (self.config.variance * horizon.sqrt()).min(1.0);

        (weekly * (1.0 - uncertainty) + UNCERTAIN_SAFETY * uncertainty).clamp(0.0, 1.0)
    }

    /// Qualitative intensity of an elimination decided by `margin` points
    pub fn drama(&self, margin: f64) -> DramaLevel {
        let thresholds = &self.config.drama;
        let margin = margin.abs();
        if margin < thresholds.tie_epsilon {
            DramaLevel::Extreme
        } else if margin < thresholds.high {
            DramaLevel::High
        } else if margin < thresholds.moderate {
            DramaLevel::Moderate
        } else {
            DramaLevel::Low
        }
    }
}

/// Distance from the cutoff: the lowest score for everyone above it, the
/// second-lowest for the team holding it
fn safety_margin(descending: &[f64], index: usize) -> f64 {
    let count = descending.len();
    if count < 2 {
        return 0.0;
    }
    let lowest = descending[count - 1];
    if index == count - 1 {
        descending[index] - descending[count - 2]
    } else {
        descending[index] - lowest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn team(id: &str, score: f64, projected: f64) -> StandingTeam {
        StandingTeam {
            team_id: id.to_string(),
            team_name: format!("Team {id}"),
            score,
            projected_score: projected,
            valid_player_count: 9,
            is_eliminated: false,
        }
    }

    fn calculator() -> SurvivalCalculator {
        SurvivalCalculator::new(RankerConfig::default())
    }

    #[test]
    fn test_pre_kickoff_everyone_safe() {
        let teams = [team("a", 0.0, 110.0), team("b", 0.0, 95.0), team("c", 0.0, 120.0)];
        let active: Vec<&StandingTeam> = teams.iter().collect();

        let standings = calculator().rank(&active, 8);
        assert!(standings.iter().all(|s| s.status == EliminationStatus::Safe && s.safety_percentage == 1.0));
        // Ordered by projection
        assert_eq!(standings[0].team_id, "c");
        assert_eq!(standings[2].team_id, "b");
        assert_eq!(standings[0].effective_score, 120.0);
    }

    #[test]
    fn test_live_ranking_statuses_and_margins() {
        let teams = [
            team("a", 101.0, 110.0),
            team("b", 88.5, 100.0),
            team("c", 90.0, 100.0),
            team("d", 120.0, 105.0),
            team("e", 70.0, 90.0),
        ];
        let active: Vec<&StandingTeam> = teams.iter().collect();
        let standings = calculator().rank(&active, 3);

        let ids: Vec<&str> = standings.iter().map(|s| s.team_id.as_str()).collect();
        assert_eq!(ids, vec!["d", "a", "c", "b", "e"]);

        let statuses: Vec<EliminationStatus> = standings.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![
                EliminationStatus::Safe,
                EliminationStatus::Safe,
                EliminationStatus::Safe,
                EliminationStatus::Danger,
                EliminationStatus::Critical,
            ]
        );

        assert_eq!(standings[0].safety_margin, 50.0);
        assert_eq!(standings[3].safety_margin, 18.5);
        assert_eq!(standings[4].safety_margin, -18.5);
    }

    #[test]
    fn test_warning_band_on_large_league() {
        let calc = calculator();
        // 12 teams: ceil(12 * 0.25) = 3 from the bottom
        assert_eq!(calc.status_for(11, 12), EliminationStatus::Critical);
        assert_eq!(calc.status_for(10, 12), EliminationStatus::Danger);
        assert_eq!(calc.status_for(9, 12), EliminationStatus::Warning);
        assert_eq!(calc.status_for(8, 12), EliminationStatus::Safe);
    }

    #[test]
    fn test_last_team_is_champion() {
        let teams = [team("a", 0.0, 0.0)];
        let active: Vec<&StandingTeam> = teams.iter().collect();
        let standings = calculator().rank(&active, 0);
        assert_eq!(standings[0].status, EliminationStatus::Champion);
        assert_eq!(standings[0].safety_percentage, 1.0);
        assert_eq!(standings[0].safety_margin, 0.0);
    }

    #[test]
    fn test_safety_regresses_with_long_season() {
        let calc = calculator();
        let leader_short = calc.safety_percentage(0, 10, 120.0, 100.0, 1);
        let leader_long = calc.safety_percentage(0, 10, 120.0, 100.0, 16);
        assert!(leader_short > leader_long);
        assert!(leader_long > 0.5);

        let last_long = calc.safety_percentage(9, 10, 80.0, 100.0, 16);
        assert!(last_long < 0.5);
    }

    #[test]
    fn test_safety_handles_zero_projection_average() {
        let value = calculator().safety_percentage(1, 3, 0.0, 0.0, 4);
        assert!((0.0..=1.0).contains(&value));
    }

    #[test]
    fn test_drama_levels() {
        let calc = calculator();
        assert_eq!(calc.drama(0.0), DramaLevel::Extreme);
        assert_eq!(calc.drama(1.5), DramaLevel::High);
        assert_eq!(calc.drama(7.0), DramaLevel::Moderate);
        assert_eq!(calc.drama(25.0), DramaLevel::Low);
    }

    proptest! {
        #[test]
        fn prop_status_is_rank_monotonic(
            scores in prop::collection::vec(0.0f64..200.0, 2..20),
            weeks in 0u32..18,
        ) {
            let teams: Vec<StandingTeam> = scores
                .iter()
                .enumerate()
                .map(|(i, score)| team(&i.to_string(), *score + 0.5, 100.0))
                .collect();
            let active: Vec<&StandingTeam> = teams.iter().collect();
            let standings = calculator().rank(&active, weeks);

            for pair in standings.windows(2) {
                prop_assert!(pair[0].status <= pair[1].status);
                prop_assert!(pair[0].effective_score >= pair[1].effective_score);
            }
            for standing in &standings {
                prop_assert!((0.0..=1.0).contains(&standing.safety_percentage));
            }
        }
    }
}
