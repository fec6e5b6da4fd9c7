//! Static action catalog.
//!
//! Every interactive element the bot emits is backed by an `ActionSpec`:
//! a name plus the ordered argument keys its component identifier carries.
//! Specs are compile-time data; lookups are plain slice scans. Button, modal,
//! and selection callbacks have separate namespaces.

/// How an action reaches the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Slash command, dispatched by command name (no component identifier).
    Command,
    /// Button press.
    Button,
    /// Form (modal) submission.
    Modal,
    /// Select-menu choice.
    Selection,
}

/// Which callback namespace an inbound component identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackClass {
    Button,
    Modal,
    Selection,
}

impl CallbackClass {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Modal => "modal",
            Self::Selection => "selection",
        }
    }
}

/// A named action and the ordered argument keys its identifier carries.
/// The key list is fixed at compile time and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpec {
    pub kind: ActionKind,
    /// Case-sensitive name; must not contain `-` (the identifier separator).
    pub name: &'static str,
    pub arg_keys: &'static [&'static str],
}

impl ActionSpec {
    pub const fn new(kind: ActionKind, name: &'static str, arg_keys: &'static [&'static str]) -> Self {
        Self {
            kind,
            name,
            arg_keys,
        }
    }

    pub fn arity(&self) -> usize {
        self.arg_keys.len()
    }
}

/// Slash commands. Arguments arrive as typed command options, not through
/// component identifiers, so the key lists are empty.
pub static COMMANDS: &[ActionSpec] = &[
    ActionSpec::new(ActionKind::Command, "courses", &[]),
    ActionSpec::new(ActionKind::Command, "subscribe", &[]),
    ActionSpec::new(ActionKind::Command, "unsubscribe", &[]),
    ActionSpec::new(ActionKind::Command, "events", &[]),
    ActionSpec::new(ActionKind::Command, "remind", &[]),
    ActionSpec::new(ActionKind::Command, "draft", &[]),
];

/// Button actions.
pub static BUTTON_ACTIONS: &[ActionSpec] = &[
    ActionSpec::new(ActionKind::Button, "draft_confirm", &["draft_id"]),
    ActionSpec::new(ActionKind::Button, "draft_discard", &["draft_id"]),
    ActionSpec::new(ActionKind::Button, "event_edit", &["event_id"]),
    ActionSpec::new(ActionKind::Button, "event_delete", &["event_id"]),
    ActionSpec::new(ActionKind::Button, "event_undo_delete", &["event_id"]),
    ActionSpec::new(ActionKind::Button, "event_complete", &["event_id"]),
    ActionSpec::new(ActionKind::Button, "course_join", &["course_id"]),
    ActionSpec::new(ActionKind::Button, "course_leave", &["course_id"]),
    ActionSpec::new(ActionKind::Button, "offset_remove", &["offset_hours"]),
    ActionSpec::new(ActionKind::Button, "events_page", &["page"]),
];

/// Modal (form submission) actions.
pub static MODAL_ACTIONS: &[ActionSpec] = &[
    ActionSpec::new(ActionKind::Modal, "draft_form", &["draft_id"]),
    ActionSpec::new(ActionKind::Modal, "event_edit_form", &["event_id"]),
];

/// Select-menu actions. Chosen values ride in the selection payload; the
/// identifier only addresses the menu (plus any context id).
pub static SELECTION_ACTIONS: &[ActionSpec] = &[
    ActionSpec::new(ActionKind::Selection, "course_pick", &[]),
    ActionSpec::new(ActionKind::Selection, "offset_pick", &[]),
    ActionSpec::new(ActionKind::Selection, "draft_course_pick", &["draft_id"]),
];

/// The action namespaces a deployment serves. A value type so tests can run
/// against a reduced or synthetic catalog.
#[derive(Debug, Clone, Copy)]
pub struct ActionRegistry {
    pub commands: &'static [ActionSpec],
    pub buttons: &'static [ActionSpec],
    pub modals: &'static [ActionSpec],
    pub selections: &'static [ActionSpec],
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self {
            commands: COMMANDS,
            buttons: BUTTON_ACTIONS,
            modals: MODAL_ACTIONS,
            selections: SELECTION_ACTIONS,
        }
    }
}

impl ActionRegistry {
    /// Case-sensitive lookup within one callback namespace.
    pub fn lookup(&self, class: CallbackClass, name: &str) -> Option<&'static ActionSpec> {
        let namespace = match class {
            CallbackClass::Button => self.buttons,
            CallbackClass::Modal => self.modals,
            CallbackClass::Selection => self.selections,
        };
        namespace.iter().find(|spec| spec.name == name)
    }

    /// Look up a slash command by name.
    pub fn command(&self, name: &str) -> Option<&'static ActionSpec> {
        self.commands.iter().find(|spec| spec.name == name)
    }
}
