use crate::sim::Action;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scene {
    Main,
    Help,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Act(Action),
    HelpToggle,
    Back,
    Quit,
}

#[derive(Clone, Debug)]
pub(crate) struct InputEvent {
    pub(crate) key: KeyCode,
    pub(crate) mods: KeyModifiers,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press {
                out.push(InputEvent {
                    key: k.code,
                    mods: k.modifiers,
                });
                if out.len() >= 32 {
                    break;
                }
            }
        }
    }
    Ok(out)
}

pub(crate) fn map_event_to_command(scene: Scene, ev: &InputEvent) -> Option<Command> {
    // raw mode swallows SIGINT
    if matches!(ev.key, KeyCode::Char('c') | KeyCode::Char('C'))
        && ev.mods.contains(KeyModifiers::CONTROL)
    {
        return Some(Command::Quit);
    }
    match ev.key {
        KeyCode::Char('q') | KeyCode::Char('Q') => return Some(Command::Quit),
        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
            return Some(Command::HelpToggle)
        }
        KeyCode::Esc => return Some(Command::Back),
        _ => {}
    }

    match scene {
        Scene::Main => match ev.key {
            KeyCode::Char('f') | KeyCode::Char('F') => Some(Command::Act(Action::Feed)),
            KeyCode::Char('b') | KeyCode::Char('B') => Some(Command::Act(Action::Bribe)),
            KeyCode::Char('e') | KeyCode::Char('E') => Some(Command::Act(Action::Escape)),
            _ => None,
        },
        Scene::Help => None,
    }
}
