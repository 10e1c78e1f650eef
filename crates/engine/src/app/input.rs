use glam::Vec2;

/// Discrete inbound events from the input layer.
///
/// `Strike` is raised by the animation collaborator on the weapon's hit frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Move(Vec2),
    Dash,
    Berserk,
    Skill1,
    Skill2,
    Skill3,
    Pause,
    Strike,
}

impl InputEvent {
    pub fn name(self) -> &'static str {
        match self {
            Self::Move(_) => "move",
            Self::Dash => "dash",
            Self::Berserk => "berserk",
            Self::Skill1 => "skill1",
            Self::Skill2 => "skill2",
            Self::Skill3 => "skill3",
            Self::Pause => "pause",
            Self::Strike => "strike",
        }
    }
}

/// Events queued between ticks, drained in arrival order by the driver.
#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn drain_current_tick(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }
}
