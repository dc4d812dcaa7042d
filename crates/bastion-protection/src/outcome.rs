//! Results handed back to the host

use bastion_core::{ActorId, Denial, EntityId, Verdict};
use serde::{Deserialize, Serialize};

/// Side effects the host carries out after a decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostCommand {
    /// Show a denial message to a player.
    NotifyActor { actor: ActorId, denial: Denial },
    /// Remove a projectile so it does not bounce between crowded animals.
    RemoveProjectile { entity: EntityId },
    /// Make a pet forget its current target.
    ClearTarget { entity: EntityId },
}

/// Decision for a damage, vehicle or knockback event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventOutcome {
    pub verdict: Verdict,
    pub commands: Vec<HostCommand>,
    /// Name of the rule that decided, or `"default"`.
    pub decided_by: &'static str,
}

impl EventOutcome {
    /// Returns `true` if the host must cancel the event
    pub fn is_cancelled(&self) -> bool {
        self.verdict.is_denied()
    }

    /// Messages for the acting player, in order
    pub fn messages(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                HostCommand::NotifyActor { denial, .. } => Some(denial.message()),
                _ => None,
            })
            .collect()
    }
}

/// Decision for a splash potion, per affected entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplashOutcome {
    /// Entities whose effect intensity drops to zero.
    pub neutralized: Vec<EntityId>,
    pub commands: Vec<HostCommand>,
}

impl SplashOutcome {
    pub fn is_neutralized(&self, entity: EntityId) -> bool {
        self.neutralized.contains(&entity)
    }

    pub(crate) fn neutralize(&mut self, entity: EntityId) {
        if !self.neutralized.contains(&entity) {
            self.neutralized.push(entity);
        }
    }
}
