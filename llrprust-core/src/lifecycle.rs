//! Client-side ROSpec/AccessSpec registries
//!
//! The registries mirror the resource state the reader holds, so the
//! client can validate transitions before putting a command on the wire
//! and stay in sync as responses and autonomous events arrive. A rejected
//! transition never mutates the registry; partial application of a
//! rejected command is forbidden.

use std::collections::HashMap;

use crate::access::{AccessSpec, AccessSpecState};
use crate::events::{RoSpecEvent, RoSpecEventKind};
use crate::rospec::{RoSpec, RoSpecState};

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Registry transition failures
///
/// These mirror the reader's own status codes for the same conditions
/// (e.g. M_NoSuchROSpec), surfaced before a doomed command is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("No ROSpec with id {0}")]
    RoSpecNotFound(u32),

    #[error("No AccessSpec with id {0}")]
    AccessSpecNotFound(u32),

    #[error("Id {0} already in use")]
    DuplicateId(u32),

    #[error("Id 0 is reserved")]
    ReservedId,

    #[error("ROSpec {id} is {state:?}; {action} not permitted")]
    InvalidRoSpecState {
        id: u32,
        state: RoSpecState,
        action: &'static str,
    },

    #[error("AccessSpec {id} is {state:?}; {action} not permitted")]
    InvalidAccessSpecState {
        id: u32,
        state: AccessSpecState,
        action: &'static str,
    },
}

/// One tracked ROSpec
#[derive(Debug, Clone)]
pub struct RoSpecEntry {
    pub spec: RoSpec,
    pub state: RoSpecState,
}

/// Registry of ROSpecs known to the reader
///
/// State machine per entry:
/// `Disabled --Enable--> Inactive --Start--> Active --Stop--> Inactive
/// --Disable--> Disabled`, with Delete valid from any state. Start and
/// Stop also fire autonomously on the reader (periodic/GPI start
/// triggers, duration/GPI/tag-observation stop triggers); those arrive as
/// ROSpecEvents and are applied through [`RoSpecRegistry::observe_event`].
#[derive(Debug, Default)]
pub struct RoSpecRegistry {
    specs: HashMap<u32, RoSpecEntry>,
}

impl RoSpecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn state(&self, rospec_id: u32) -> Option<RoSpecState> {
        self.specs.get(&rospec_id).map(|entry| entry.state)
    }

    pub fn get(&self, rospec_id: u32) -> Option<&RoSpecEntry> {
        self.specs.get(&rospec_id)
    }

    pub fn ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.specs.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Add a new spec; initial state is `Disabled`
    pub fn add(&mut self, spec: &RoSpec) -> Result<()> {
        if spec.rospec_id == 0 {
            return Err(LifecycleError::ReservedId);
        }
        if self.specs.contains_key(&spec.rospec_id) {
            return Err(LifecycleError::DuplicateId(spec.rospec_id));
        }
        self.specs.insert(spec.rospec_id, RoSpecEntry {
            spec: spec.clone(),
            state: RoSpecState::Disabled,
        });
        Ok(())
    }

    /// `Disabled -> Inactive`
    pub fn enable(&mut self, rospec_id: u32) -> Result<()> {
        self.shift(rospec_id, "Enable", RoSpecState::Disabled, RoSpecState::Inactive)
    }

    /// `Inactive -> Disabled`
    pub fn disable(&mut self, rospec_id: u32) -> Result<()> {
        self.shift(rospec_id, "Disable", RoSpecState::Inactive, RoSpecState::Disabled)
    }

    /// `Inactive -> Active`
    pub fn start(&mut self, rospec_id: u32) -> Result<()> {
        self.shift(rospec_id, "Start", RoSpecState::Inactive, RoSpecState::Active)
    }

    /// `Active -> Inactive`
    pub fn stop(&mut self, rospec_id: u32) -> Result<()> {
        self.shift(rospec_id, "Stop", RoSpecState::Active, RoSpecState::Inactive)
    }

    /// Remove an entry; id 0 removes every entry
    pub fn delete(&mut self, rospec_id: u32) -> Result<()> {
        if rospec_id == 0 {
            self.specs.clear();
            return Ok(());
        }
        self.specs
            .remove(&rospec_id)
            .map(|_| ())
            .ok_or(LifecycleError::RoSpecNotFound(rospec_id))
    }

    /// Replace the registry contents with the reader's own list
    ///
    /// Used after GET_ROSPECS to resynchronize; each entry takes the
    /// state the reader reported in the spec.
    pub fn sync(&mut self, specs: &[RoSpec]) {
        self.specs.clear();
        for spec in specs {
            self.specs.insert(spec.rospec_id, RoSpecEntry {
                spec: spec.clone(),
                state: spec.current_state,
            });
        }
    }

    /// Apply an autonomous state change reported by the reader
    ///
    /// Events for unknown ids are reported as errors so the caller can
    /// log the desynchronization, but the registry stays unmodified.
    pub fn observe_event(&mut self, event: &RoSpecEvent) -> Result<()> {
        let entry = self
            .specs
            .get_mut(&event.rospec_id)
            .ok_or(LifecycleError::RoSpecNotFound(event.rospec_id))?;

        entry.state = match event.kind {
            RoSpecEventKind::Started => RoSpecState::Active,
            RoSpecEventKind::Ended | RoSpecEventKind::Preempted => RoSpecState::Inactive,
        };
        Ok(())
    }

    fn shift(
        &mut self,
        rospec_id: u32,
        action: &'static str,
        from: RoSpecState,
        to: RoSpecState,
    ) -> Result<()> {
        let entry = self
            .specs
            .get_mut(&rospec_id)
            .ok_or(LifecycleError::RoSpecNotFound(rospec_id))?;

        if entry.state != from {
            return Err(LifecycleError::InvalidRoSpecState {
                id: rospec_id,
                state: entry.state,
                action,
            });
        }
        entry.state = to;
        Ok(())
    }
}

/// One tracked AccessSpec
#[derive(Debug, Clone)]
pub struct AccessSpecEntry {
    pub spec: AccessSpec,
    pub state: AccessSpecState,
}

/// Registry of AccessSpecs known to the reader
///
/// Binary state `Disabled <-> Enabled`; an enabled spec executes
/// opportunistically when a running ROSpec singulates a matching tag.
#[derive(Debug, Default)]
pub struct AccessSpecRegistry {
    specs: HashMap<u32, AccessSpecEntry>,
}

impl AccessSpecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn state(&self, access_spec_id: u32) -> Option<AccessSpecState> {
        self.specs.get(&access_spec_id).map(|entry| entry.state)
    }

    pub fn get(&self, access_spec_id: u32) -> Option<&AccessSpecEntry> {
        self.specs.get(&access_spec_id)
    }

    pub fn ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.specs.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Add a new spec; initial state is `Disabled`
    pub fn add(&mut self, spec: &AccessSpec) -> Result<()> {
        if spec.access_spec_id == 0 {
            return Err(LifecycleError::ReservedId);
        }
        if self.specs.contains_key(&spec.access_spec_id) {
            return Err(LifecycleError::DuplicateId(spec.access_spec_id));
        }
        self.specs.insert(spec.access_spec_id, AccessSpecEntry {
            spec: spec.clone(),
            state: AccessSpecState::Disabled,
        });
        Ok(())
    }

    /// `Disabled -> Enabled`
    pub fn enable(&mut self, access_spec_id: u32) -> Result<()> {
        self.shift(access_spec_id, "Enable", AccessSpecState::Disabled, AccessSpecState::Enabled)
    }

    /// `Enabled -> Disabled`
    pub fn disable(&mut self, access_spec_id: u32) -> Result<()> {
        self.shift(access_spec_id, "Disable", AccessSpecState::Enabled, AccessSpecState::Disabled)
    }

    /// Remove an entry; id 0 removes every entry
    pub fn delete(&mut self, access_spec_id: u32) -> Result<()> {
        if access_spec_id == 0 {
            self.specs.clear();
            return Ok(());
        }
        self.specs
            .remove(&access_spec_id)
            .map(|_| ())
            .ok_or(LifecycleError::AccessSpecNotFound(access_spec_id))
    }

    /// Replace the registry contents with the reader's own list
    pub fn sync(&mut self, specs: &[AccessSpec]) {
        self.specs.clear();
        for spec in specs {
            self.specs.insert(spec.access_spec_id, AccessSpecEntry {
                spec: spec.clone(),
                state: spec.current_state,
            });
        }
    }

    fn shift(
        &mut self,
        access_spec_id: u32,
        action: &'static str,
        from: AccessSpecState,
        to: AccessSpecState,
    ) -> Result<()> {
        let entry = self
            .specs
            .get_mut(&access_spec_id)
            .ok_or(LifecycleError::AccessSpecNotFound(access_spec_id))?;

        if entry.state != from {
            return Err(LifecycleError::InvalidAccessSpecState {
                id: access_spec_id,
                state: entry.state,
                action,
            });
        }
        entry.state = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::OpSpec;
    use pretty_assertions::assert_eq;

    fn registry_with(id: u32) -> RoSpecRegistry {
        let mut registry = RoSpecRegistry::new();
        registry.add(&RoSpec::immediate_inventory(id, vec![1])).unwrap();
        registry
    }

    #[test]
    fn test_add_starts_disabled() {
        let registry = registry_with(0x04D2);
        assert_eq!(registry.state(0x04D2), Some(RoSpecState::Disabled));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_full_lifecycle() {
        let mut registry = registry_with(0x04D2);

        registry.enable(0x04D2).unwrap();
        assert_eq!(registry.state(0x04D2), Some(RoSpecState::Inactive));

        registry.start(0x04D2).unwrap();
        assert_eq!(registry.state(0x04D2), Some(RoSpecState::Active));

        registry.stop(0x04D2).unwrap();
        assert_eq!(registry.state(0x04D2), Some(RoSpecState::Inactive));

        registry.disable(0x04D2).unwrap();
        assert_eq!(registry.state(0x04D2), Some(RoSpecState::Disabled));

        registry.delete(0x04D2).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_start_on_disabled_rejected_without_mutation() {
        let mut registry = registry_with(0x04D2);

        let result = registry.start(0x04D2);
        assert_eq!(
            result,
            Err(LifecycleError::InvalidRoSpecState {
                id: 0x04D2,
                state: RoSpecState::Disabled,
                action: "Start",
            })
        );

        // Registry unchanged: the id is still Disabled
        assert_eq!(registry.state(0x04D2), Some(RoSpecState::Disabled));
    }

    #[test]
    fn test_start_while_active_rejected() {
        let mut registry = registry_with(0x04D2);
        registry.enable(0x04D2).unwrap();
        registry.start(0x04D2).unwrap();

        let result = registry.start(0x04D2);
        assert!(matches!(
            result,
            Err(LifecycleError::InvalidRoSpecState { state: RoSpecState::Active, .. })
        ));
        assert_eq!(registry.state(0x04D2), Some(RoSpecState::Active));
    }

    #[test]
    fn test_unknown_id_rejected() {
        let mut registry = RoSpecRegistry::new();
        assert_eq!(registry.enable(99), Err(LifecycleError::RoSpecNotFound(99)));
        assert_eq!(registry.delete(99), Err(LifecycleError::RoSpecNotFound(99)));
    }

    #[test]
    fn test_duplicate_and_reserved_ids_rejected() {
        let mut registry = registry_with(5);
        assert_eq!(
            registry.add(&RoSpec::immediate_inventory(5, vec![2])),
            Err(LifecycleError::DuplicateId(5))
        );
        assert_eq!(
            registry.add(&RoSpec::immediate_inventory(0, vec![1])),
            Err(LifecycleError::ReservedId)
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_delete_all() {
        let mut registry = RoSpecRegistry::new();
        registry.add(&RoSpec::immediate_inventory(1, vec![1])).unwrap();
        registry.add(&RoSpec::immediate_inventory(2, vec![2])).unwrap();

        registry.delete(0).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_multiple_active_specs() {
        let mut registry = RoSpecRegistry::new();
        registry.add(&RoSpec::immediate_inventory(1, vec![1])).unwrap();
        registry.add(&RoSpec::immediate_inventory(2, vec![1])).unwrap();

        registry.enable(1).unwrap();
        registry.enable(2).unwrap();
        registry.start(1).unwrap();
        registry.start(2).unwrap();

        // Concurrent Active specs sharing antennas are allowed; the reader
        // resolves priority itself
        assert_eq!(registry.state(1), Some(RoSpecState::Active));
        assert_eq!(registry.state(2), Some(RoSpecState::Active));
    }

    #[test]
    fn test_observe_autonomous_events() {
        let mut registry = registry_with(3);
        registry.enable(3).unwrap();

        registry
            .observe_event(&RoSpecEvent {
                kind: RoSpecEventKind::Started,
                rospec_id: 3,
                preempting_rospec_id: 0,
            })
            .unwrap();
        assert_eq!(registry.state(3), Some(RoSpecState::Active));

        registry
            .observe_event(&RoSpecEvent {
                kind: RoSpecEventKind::Ended,
                rospec_id: 3,
                preempting_rospec_id: 0,
            })
            .unwrap();
        assert_eq!(registry.state(3), Some(RoSpecState::Inactive));

        // Event for an unknown id reports desync and changes nothing
        let result = registry.observe_event(&RoSpecEvent {
            kind: RoSpecEventKind::Started,
            rospec_id: 42,
            preempting_rospec_id: 0,
        });
        assert_eq!(result, Err(LifecycleError::RoSpecNotFound(42)));
    }

    #[test]
    fn test_sync_takes_reader_reported_state() {
        let mut registry = registry_with(1);
        registry.enable(1).unwrap();

        let mut active = RoSpec::immediate_inventory(8, vec![1]);
        active.current_state = RoSpecState::Active;

        registry.sync(&[active]);

        assert_eq!(registry.ids(), vec![8]);
        assert_eq!(registry.state(8), Some(RoSpecState::Active));
        assert_eq!(registry.state(1), None);
    }

    #[test]
    fn test_access_spec_lifecycle() {
        let mut registry = AccessSpecRegistry::new();
        let spec = AccessSpec::for_any_tag(9, Vec::<OpSpec>::new());

        registry.add(&spec).unwrap();
        assert_eq!(registry.state(9), Some(AccessSpecState::Disabled));

        registry.enable(9).unwrap();
        assert_eq!(registry.state(9), Some(AccessSpecState::Enabled));

        // Enable while already enabled is rejected, state unchanged
        assert!(matches!(
            registry.enable(9),
            Err(LifecycleError::InvalidAccessSpecState { .. })
        ));
        assert_eq!(registry.state(9), Some(AccessSpecState::Enabled));

        registry.disable(9).unwrap();
        registry.delete(9).unwrap();
        assert!(registry.is_empty());
    }
}
