//! Mock host implementing every Bastion effect trait
//!
//! State sits behind `Arc<Mutex<_>>` so a test can keep a clone of the host after
//! handing one to the claim service, then adjust the clock, grant nodes, or inspect
//! published notifications.

use bastion_core::{
    ActorId, ClaimPermissionEvent, DirectoryEffects, NotificationEffects, PermissionEffects,
    PvpOverride, PvpPreventionNotice, TimeEffects, Verdict, WorldEffects, WorldId,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Fixed start time: 2022-01-01 00:00:00 UTC
pub const START_TIME_MS: u64 = 1_640_995_200_000;

type PermissionOverride = Box<dyn Fn(&ClaimPermissionEvent) -> Option<Verdict> + Send>;

struct HostState {
    nodes: HashMap<ActorId, HashSet<String>>,
    names: HashMap<ActorId, String>,
    pvp_worlds: HashSet<WorldId>,
    claims_disabled: HashSet<WorldId>,
    world_pvp_disabled: HashSet<WorldId>,
    now_ms: u64,
    permission_override: Option<PermissionOverride>,
    pvp_override: PvpOverride,
    permission_events: Vec<ClaimPermissionEvent>,
    pvp_notices: Vec<PvpPreventionNotice>,
}

/// Deterministic host for tests
#[derive(Clone)]
pub struct MockHost {
    state: Arc<Mutex<HostState>>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockHost")
            .field("now_ms", &state.now_ms)
            .field("pvp_worlds", &state.pvp_worlds.len())
            .field("permission_events", &state.permission_events.len())
            .finish()
    }
}

impl MockHost {
    /// Host with no nodes, no names, no PvP worlds, at [`START_TIME_MS`]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(HostState {
                nodes: HashMap::new(),
                names: HashMap::new(),
                pvp_worlds: HashSet::new(),
                claims_disabled: HashSet::new(),
                world_pvp_disabled: HashSet::new(),
                now_ms: START_TIME_MS,
                permission_override: None,
                pvp_override: PvpOverride::Enforce,
                permission_events: Vec::new(),
                pvp_notices: Vec::new(),
            })),
        }
    }

    /// Give an actor a host permission node
    pub fn grant_node(&self, actor: ActorId, node: &str) {
        self.state
            .lock()
            .nodes
            .entry(actor)
            .or_default()
            .insert(node.to_string());
    }

    /// Take a host permission node away
    pub fn revoke_node(&self, actor: ActorId, node: &str) {
        if let Some(nodes) = self.state.lock().nodes.get_mut(&actor) {
            nodes.remove(node);
        }
    }

    /// Register a display name
    pub fn set_name(&self, actor: ActorId, name: &str) {
        self.state.lock().names.insert(actor, name.to_string());
    }

    /// Turn PvP rules on for a world
    pub fn enable_pvp(&self, world: WorldId) {
        self.state.lock().pvp_worlds.insert(world);
    }

    /// Keep PvP rules on but report the world's own PvP flag as off
    pub fn disable_world_pvp(&self, world: WorldId) {
        self.state.lock().world_pvp_disabled.insert(world);
    }

    /// Stop honouring claims in a world
    pub fn disable_claims(&self, world: WorldId) {
        self.state.lock().claims_disabled.insert(world);
    }

    pub fn set_time(&self, now_ms: u64) {
        self.state.lock().now_ms = now_ms;
    }

    pub fn advance(&self, delta_ms: u64) {
        let mut state = self.state.lock();
        state.now_ms = state.now_ms.saturating_add(delta_ms);
    }

    /// Replace published permission verdicts whenever `decide` returns `Some`
    pub fn override_permissions<F>(&self, decide: F)
    where
        F: Fn(&ClaimPermissionEvent) -> Option<Verdict> + Send + 'static,
    {
        self.state.lock().permission_override = Some(Box::new(decide));
    }

    pub fn clear_permission_override(&self) {
        self.state.lock().permission_override = None;
    }

    /// Answer every PvP prevention notice with `answer`
    pub fn set_pvp_override(&self, answer: PvpOverride) {
        self.state.lock().pvp_override = answer;
    }

    /// Permission checks published so far
    pub fn permission_events(&self) -> Vec<ClaimPermissionEvent> {
        self.state.lock().permission_events.clone()
    }

    /// PvP prevention notices published so far
    pub fn pvp_notices(&self) -> Vec<PvpPreventionNotice> {
        self.state.lock().pvp_notices.clone()
    }

    /// Forget recorded notifications
    pub fn clear_notifications(&self) {
        let mut state = self.state.lock();
        state.permission_events.clear();
        state.pvp_notices.clear();
    }
}

impl PermissionEffects for MockHost {
    fn actor_has_permission(&self, actor: ActorId, node: &str) -> bool {
        self.state
            .lock()
            .nodes
            .get(&actor)
            .is_some_and(|nodes| nodes.contains(node))
    }
}

impl DirectoryEffects for MockHost {
    fn display_name(&self, actor: ActorId) -> Option<String> {
        self.state.lock().names.get(&actor).cloned()
    }
}

impl WorldEffects for MockHost {
    fn pvp_rules_apply(&self, world: WorldId) -> bool {
        self.state.lock().pvp_worlds.contains(&world)
    }

    fn claims_enabled(&self, world: WorldId) -> bool {
        !self.state.lock().claims_disabled.contains(&world)
    }

    fn world_pvp_enabled(&self, world: WorldId) -> bool {
        let state = self.state.lock();
        state.pvp_worlds.contains(&world) && !state.world_pvp_disabled.contains(&world)
    }
}

impl TimeEffects for MockHost {
    fn now_ms(&self) -> u64 {
        self.state.lock().now_ms
    }
}

impl NotificationEffects for MockHost {
    fn claim_permission_resolved(&self, event: &ClaimPermissionEvent) -> Verdict {
        let mut state = self.state.lock();
        state.permission_events.push(event.clone());
        state
            .permission_override
            .as_ref()
            .and_then(|decide| decide(event))
            .unwrap_or_else(|| event.verdict.clone())
    }

    fn pvp_prevention(&self, notice: &PvpPreventionNotice) -> PvpOverride {
        let mut state = self.state.lock();
        state.pvp_notices.push(notice.clone());
        state.pvp_override
    }
}
