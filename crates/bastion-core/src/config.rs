//! Protection configuration
//!
//! Hosts deserialize [`ProtectionConfig`] from their own configuration files; every
//! field has a default so partial documents are accepted. Call
//! [`ProtectionConfig::validate`] before handing a configuration to the claim service.

use crate::block::BlockKind;
use crate::errors::BastionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level protection configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectionConfig {
    /// Claim and creature protection rules
    pub claims: ClaimRules,
    /// Player-versus-player rules
    pub pvp: PvpRules,
}

/// Host permission nodes consulted by the permission chains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionNodes {
    /// Grants full control of administrative claims.
    pub admin_claims: String,
    /// Grants edit rights over any player claim.
    pub delete_claims: String,
    /// Allows toggling claim bypass mode.
    pub ignore_claims: String,
}

impl Default for PermissionNodes {
    fn default() -> Self {
        Self {
            admin_claims: "bastion.adminclaims".to_string(),
            delete_claims: "bastion.deleteclaims".to_string(),
            ignore_claims: "bastion.ignoreclaims".to_string(),
        }
    }
}

/// Claim and creature protection rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimRules {
    /// Host permission node names
    pub nodes: PermissionNodes,
    /// Materials anyone may break while a claim is besieged
    pub siege_breakable_blocks: Vec<BlockKind>,
    /// Crops that container trust may plant
    pub farmable_blocks: Vec<BlockKind>,
    /// Protect passive creatures inside claims
    pub protect_creatures: bool,
    /// Protect horses from non-owners
    pub protect_horses: bool,
    /// Protect donkeys and mules from non-owners
    pub protect_donkeys: bool,
    /// Protect llamas from non-owners
    pub protect_llamas: bool,
    /// Protect vehicles inside claims
    pub prevent_theft: bool,
    /// Let build trust on item frames, armor stands, villagers and end crystals end
    /// the damage chain instead of falling through to creature protection
    pub build_trust_short_circuits_entity_checks: bool,
}

impl Default for ClaimRules {
    fn default() -> Self {
        Self {
            nodes: PermissionNodes::default(),
            siege_breakable_blocks: BlockKind::default_siege_breakable(),
            farmable_blocks: BlockKind::default_farmable(),
            protect_creatures: true,
            protect_horses: true,
            protect_donkeys: true,
            protect_llamas: true,
            prevent_theft: true,
            build_trust_short_circuits_entity_checks: false,
        }
    }
}

impl ClaimRules {
    /// Returns `true` if `block` may be broken during a siege
    pub fn is_siege_breakable(&self, block: &BlockKind) -> bool {
        self.siege_breakable_blocks.contains(block)
    }

    /// Returns `true` if `block` is covered by the farming exception
    pub fn is_farmable(&self, block: &BlockKind) -> bool {
        self.farmable_blocks.contains(block)
    }
}

/// Player-versus-player rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PvpRules {
    /// Newly spawned players cannot fight or be hurt until they opt in
    pub protect_fresh_spawns: bool,
    /// Player claims are PvP safe zones
    pub no_combat_in_player_claims: bool,
    /// Administrative top-level claims are PvP safe zones
    pub no_combat_in_admin_claims: bool,
    /// Administrative subdivisions are PvP safe zones
    pub no_combat_in_admin_subdivisions: bool,
    /// Tamed pets other than wolves are protected from other players
    pub protect_pets: bool,
    /// How long a player stays in combat after dealing or taking PvP damage
    pub combat_timeout_ms: u64,
    /// How long fresh-spawn immunity lasts when granted
    pub spawn_immunity_ms: u64,
    /// How long a siege may run before the defender wins by default
    pub siege_timeout_ms: u64,
}

impl Default for PvpRules {
    fn default() -> Self {
        Self {
            protect_fresh_spawns: true,
            no_combat_in_player_claims: true,
            no_combat_in_admin_claims: true,
            no_combat_in_admin_subdivisions: true,
            protect_pets: false,
            combat_timeout_ms: 15_000,
            spawn_immunity_ms: 300_000,
            siege_timeout_ms: 1_800_000,
        }
    }
}

impl PvpRules {
    /// Returns `true` if any kind of claim can be a safe zone
    pub fn any_safe_zones(&self) -> bool {
        self.no_combat_in_player_claims || self.no_combat_in_admin_claims
    }
}

/// A single configuration problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Value is required but missing
    Required { field: String },
    /// Value is outside its acceptable range
    OutOfRange { field: String, min: u64, actual: u64 },
    /// Custom validation failed
    Custom { field: String, message: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Required { field } => {
                write!(f, "Field '{field}' is required but missing")
            }
            ValidationError::OutOfRange { field, min, actual } => {
                write!(f, "Field '{field}' must be at least {min} (got {actual})")
            }
            ValidationError::Custom { field, message } => write!(f, "Field '{field}': {message}"),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for BastionError {
    fn from(err: ValidationError) -> Self {
        BastionError::configuration(err.to_string())
    }
}

#[derive(Default)]
struct ConfigValidator {
    errors: Vec<ValidationError>,
}

impl ConfigValidator {
    fn node(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.errors.push(ValidationError::Required {
                field: field.to_string(),
            });
        } else if value.starts_with('[') || value.chars().any(char::is_whitespace) {
            self.errors.push(ValidationError::Custom {
                field: field.to_string(),
                message: "permission nodes are bare dotted names".to_string(),
            });
        }
        self
    }

    fn at_least(&mut self, field: &str, value: u64, min: u64) -> &mut Self {
        if value < min {
            self.errors.push(ValidationError::OutOfRange {
                field: field.to_string(),
                min,
                actual: value,
            });
        }
        self
    }

    fn finish(&mut self) -> Result<(), Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }
}

impl ProtectionConfig {
    /// Check every field and report all problems at once
    pub fn validation_errors(&self) -> Result<(), Vec<ValidationError>> {
        ConfigValidator::default()
            .node("claims.nodes.admin_claims", &self.claims.nodes.admin_claims)
            .node("claims.nodes.delete_claims", &self.claims.nodes.delete_claims)
            .node("claims.nodes.ignore_claims", &self.claims.nodes.ignore_claims)
            .at_least("pvp.combat_timeout_ms", self.pvp.combat_timeout_ms, 1)
            .at_least("pvp.siege_timeout_ms", self.pvp.siege_timeout_ms, 1)
            .finish()
    }

    /// Validate, collapsing problems into a single configuration error
    pub fn validate(&self) -> crate::Result<()> {
        self.validation_errors().map_err(|errors| {
            let joined = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            BastionError::configuration(joined)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ProtectionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config: ProtectionConfig =
            serde_json::from_str(r#"{ "pvp": { "protect_pets": true } }"#).unwrap();
        assert!(config.pvp.protect_pets);
        assert_eq!(config.pvp.combat_timeout_ms, 15_000);
        assert!(config.claims.protect_creatures);
        assert!(!config.claims.build_trust_short_circuits_entity_checks);
    }

    #[test]
    fn test_all_problems_reported() {
        let mut config = ProtectionConfig::default();
        config.claims.nodes.ignore_claims = String::new();
        config.claims.nodes.admin_claims = "[admins]".to_string();
        config.pvp.combat_timeout_ms = 0;
        let errors = config.validation_errors().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(
            config.validate(),
            Err(BastionError::Configuration { .. })
        ));
    }

    #[test]
    fn test_farmable_lookup() {
        let rules = ClaimRules::default();
        assert!(rules.is_farmable(&BlockKind::new("wheat")));
        assert!(!rules.is_siege_breakable(&BlockKind::new("obsidian")));
        assert!(rules.is_siege_breakable(&BlockKind::new("cobblestone")));
    }
}
