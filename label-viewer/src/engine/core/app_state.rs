use bevy::prelude::*;

/// Lifecycle phase of one viewer.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum ViewerPhase {
    /// No surface attached.
    #[default]
    Uninitialized,
    /// Surface attached but renderer missing, or frame not loaded yet.
    Initializing,
    Ready,
    /// Frame unloaded under a live renderer: clear and skip scene rendering.
    Clearing,
}

/// Inputs a phase is derived from, read fresh on every notification.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct PhaseInputs {
    pub surface_attached: bool,
    pub renderer_ready: bool,
    pub frame_loaded: bool,
}

impl ViewerPhase {
    /// Phase after re-evaluating `inputs` from `self`.
    pub fn next(self, inputs: PhaseInputs) -> Self {
        if !inputs.surface_attached {
            return Self::Uninitialized;
        }
        if !inputs.renderer_ready {
            return Self::Initializing;
        }
        if inputs.frame_loaded {
            return Self::Ready;
        }
        match self {
            Self::Ready | Self::Clearing => Self::Clearing,
            Self::Uninitialized | Self::Initializing => Self::Initializing,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Clearing => "clearing",
        }
    }

    pub fn renders_scene(self) -> bool {
        self == Self::Ready
    }
}

/// Apply `inputs` to `phase`, logging the transition. Returns true when the phase changed.
pub fn transition(phase: &mut ViewerPhase, inputs: PhaseInputs, viewer: u32) -> bool {
    let next = phase.next(inputs);
    if next == *phase {
        return false;
    }
    info!("→ viewer {}: {:?} -> {:?}", viewer, phase, next);
    *phase = next;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTACHED: PhaseInputs = PhaseInputs { surface_attached: true, renderer_ready: false, frame_loaded: false };
    const RENDERER: PhaseInputs = PhaseInputs { surface_attached: true, renderer_ready: true, frame_loaded: false };
    const LOADED: PhaseInputs = PhaseInputs { surface_attached: true, renderer_ready: true, frame_loaded: true };

    #[test]
    fn starts_uninitialized() {
        assert_eq!(ViewerPhase::default(), ViewerPhase::Uninitialized);
    }

    #[test]
    fn walks_to_ready() {
        let mut phase = ViewerPhase::default();
        assert!(transition(&mut phase, ATTACHED, 0));
        assert_eq!(phase, ViewerPhase::Initializing);
        assert!(!transition(&mut phase, RENDERER, 0));
        assert_eq!(phase, ViewerPhase::Initializing);
        assert!(transition(&mut phase, LOADED, 0));
        assert!(phase.renders_scene());
    }

    #[test]
    fn unloading_a_ready_frame_clears() {
        assert_eq!(ViewerPhase::Ready.next(RENDERER), ViewerPhase::Clearing);
        assert_eq!(ViewerPhase::Clearing.next(RENDERER), ViewerPhase::Clearing);
        assert_eq!(ViewerPhase::Clearing.next(LOADED), ViewerPhase::Ready);
    }

    #[test]
    fn detaching_resets_from_any_phase() {
        for phase in [ViewerPhase::Initializing, ViewerPhase::Ready, ViewerPhase::Clearing] {
            assert_eq!(phase.next(PhaseInputs::default()), ViewerPhase::Uninitialized);
        }
    }

    #[test]
    fn renderer_loss_returns_to_initializing() {
        assert_eq!(ViewerPhase::Ready.next(ATTACHED), ViewerPhase::Initializing);
    }
}
