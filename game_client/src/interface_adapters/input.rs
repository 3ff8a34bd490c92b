// Maps raw key names from an input source onto engine commands.

use crate::use_cases::{Action, EngineCommand, Key};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTransition {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    Move(Key),
    Trigger(Action),
}

fn binding_for(key_name: &str) -> Option<Binding> {
    let binding = match key_name {
        "w" | "W" | "ArrowUp" => Binding::Move(Key::Forward),
        "s" | "S" | "ArrowDown" => Binding::Move(Key::Backward),
        "a" | "A" | "ArrowLeft" => Binding::Move(Key::Left),
        "d" | "D" | "ArrowRight" => Binding::Move(Key::Right),
        "m" | "M" | " " | "Space" => Binding::Trigger(Action::Mine),
        "u" | "U" => Binding::Trigger(Action::Upgrade { target_tier: None }),
        "t" | "T" => Binding::Trigger(Action::Trade),
        "Tab" => Binding::Trigger(Action::ToggleSidebar),
        "Escape" => Binding::Trigger(Action::CancelUpgrade),
        _ => return None,
    };
    Some(binding)
}

/// Movement keys follow both transitions; actions fire on key-down only.
pub fn command_for(key_name: &str, transition: KeyTransition) -> Option<EngineCommand> {
    match (binding_for(key_name)?, transition) {
        (Binding::Move(key), transition) => Some(EngineCommand::Key {
            key,
            pressed: transition == KeyTransition::Down,
        }),
        (Binding::Trigger(action), KeyTransition::Down) => Some(EngineCommand::Action(action)),
        (Binding::Trigger(_), KeyTransition::Up) => None,
    }
}
