//! Modal overlays layered over the current screen.
//!
//! `show`/`hide` are idempotent and report whether a visible transition
//! happened, so the caller only animates real changes.  The manager keeps
//! a single active overlay; the screen machine hides the previous one
//! before showing the next.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overlay {
    StartGame,
    WaitForHost,
    Paused,
    Finished,
}

impl Overlay {
    pub const ALL: [Overlay; 4] = [
        Overlay::StartGame,
        Overlay::WaitForHost,
        Overlay::Paused,
        Overlay::Finished,
    ];

    fn slot(self) -> usize {
        match self {
            Overlay::StartGame => 0,
            Overlay::WaitForHost => 1,
            Overlay::Paused => 2,
            Overlay::Finished => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Hidden,
    Visible,
}

/// What an overlay displays when shown.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayContent {
    StartGame { game_id: u64 },
    WaitForHost { game_id: u64 },
    Paused,
    /// Link to the game summary page.
    Finished { summary_url: String },
}

impl OverlayContent {
    pub fn overlay(&self) -> Overlay {
        match self {
            OverlayContent::StartGame { .. } => Overlay::StartGame,
            OverlayContent::WaitForHost { .. } => Overlay::WaitForHost,
            OverlayContent::Paused => Overlay::Paused,
            OverlayContent::Finished { .. } => Overlay::Finished,
        }
    }
}

#[derive(Debug, Default)]
pub struct OverlayManager {
    visibility: [Visibility; 4],
    active: Option<Overlay>,
}

impl OverlayManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the overlay went from hidden to visible.
    pub fn show(&mut self, overlay: Overlay) -> bool {
        let slot = &mut self.visibility[overlay.slot()];
        if *slot == Visibility::Visible {
            return false;
        }
        *slot = Visibility::Visible;
        self.active = Some(overlay);
        debug!("overlay: show {:?}", overlay);
        true
    }

    /// Returns `true` if the overlay went from visible to hidden.
    pub fn hide(&mut self, overlay: Overlay) -> bool {
        let slot = &mut self.visibility[overlay.slot()];
        if *slot == Visibility::Hidden {
            return false;
        }
        *slot = Visibility::Hidden;
        if self.active == Some(overlay) {
            self.active = None;
        }
        debug!("overlay: hide {:?}", overlay);
        true
    }

    /// Hide everything; returns the overlays that were actually visible.
    pub fn hide_all(&mut self) -> Vec<Overlay> {
        Overlay::ALL
            .into_iter()
            .filter(|o| self.hide(*o))
            .collect()
    }

    pub fn visibility(&self, overlay: Overlay) -> Visibility {
        self.visibility[overlay.slot()]
    }

    pub fn is_visible(&self, overlay: Overlay) -> bool {
        self.visibility(overlay) == Visibility::Visible
    }

    pub fn active(&self) -> Option<Overlay> {
        self.active
    }

    pub fn visible_count(&self) -> usize {
        self.visibility
            .iter()
            .filter(|v| **v == Visibility::Visible)
            .count()
    }
}
