use std::collections::BTreeSet;

use playspace_common::{Reward, RewardGrant, RewardId};

use crate::state::PlayerRuntimeState;

/// Grants each configured reward at most once per session.
#[derive(Debug, Clone, Default)]
pub struct RewardTracker {
    granted: BTreeSet<RewardId>,
}

impl RewardTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewards whose grant condition holds now and that were not granted yet.
    pub fn collect<'a>(
        &mut self,
        rewards: &'a [Reward],
        state: &PlayerRuntimeState,
    ) -> Vec<&'a Reward> {
        let mut newly = Vec::new();
        for reward in rewards {
            if self.granted.contains(&reward.id) {
                continue;
            }
            let earned = match &reward.grant {
                RewardGrant::Win => state.has_won,
                RewardGrant::Objective { objective_id } => state.objective_completed(objective_id),
                RewardGrant::Score { points } => state.score >= *points,
            };
            if earned {
                tracing::debug!(reward = %reward.id, "reward granted");
                self.granted.insert(reward.id.clone());
                newly.push(reward);
            }
        }
        newly
    }

    pub fn is_granted(&self, id: &RewardId) -> bool {
        self.granted.contains(id)
    }

    pub fn clear(&mut self) {
        self.granted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playspace_common::Objective;

    fn reward(id: &str, grant: RewardGrant) -> Reward {
        Reward {
            id: id.into(),
            name: String::new(),
            grant,
        }
    }

    #[test]
    fn rewards_are_granted_once() {
        let rewards = vec![
            reward("win", RewardGrant::Win),
            reward("rich", RewardGrant::Score { points: 50 }),
            reward(
                "explorer",
                RewardGrant::Objective {
                    objective_id: "map".into(),
                },
            ),
        ];
        let mut tracker = RewardTracker::new();
        let mut state = PlayerRuntimeState::default();
        assert!(tracker.collect(&rewards, &state).is_empty());

        state.score = 60;
        let granted: Vec<_> = tracker
            .collect(&rewards, &state)
            .iter()
            .map(|r| r.id.as_str().to_owned())
            .collect();
        assert_eq!(granted, vec!["rich"]);
        assert!(tracker.collect(&rewards, &state).is_empty());

        state.advance_objective(&Objective::new("map"));
        state.has_won = true;
        assert_eq!(tracker.collect(&rewards, &state).len(), 2);
        assert!(tracker.is_granted(&"win".into()));
    }
}
