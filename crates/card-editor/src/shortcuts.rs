//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Resolution is
//! pure: the editor decides what an action does.
//!
//! Key listening is not global. Each editor owns an [`InputContext`] that
//! knows whether a text node is being edited inline; while it is, no
//! shortcut resolves so typing reaches the text field.

use card_core::NodeId;
use serde::{Deserialize, Serialize};

/// Arrow direction for nudges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit offset in document axes (y grows downward).
    pub fn unit(&self) -> (f32, f32) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" => Some(Direction::Up),
            "ArrowDown" => Some(Direction::Down),
            "ArrowLeft" => Some(Direction::Left),
            "ArrowRight" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Edit ──
    Undo,
    Redo,
    Delete,
    Duplicate,
    Deselect,
    /// Move the selection one nudge step.
    Nudge(Direction),
    /// Move the selection ten nudge steps.
    NudgeLarge(Direction),
    Group,
    Ungroup,

    // ── View ──
    ZoomIn,
    ZoomOut,
    ZoomToFit,
    /// Back to 100%.
    ZoomReset,
    ToggleGrid,

    // ── File ──
    Export,
    Save,
}

impl ShortcutAction {
    /// Whether a held key may retrigger this action.
    pub fn is_repeat_safe(&self) -> bool {
        matches!(
            self,
            ShortcutAction::Undo
                | ShortcutAction::Redo
                | ShortcutAction::Nudge(_)
                | ShortcutAction::NudgeLarge(_)
                | ShortcutAction::ZoomIn
                | ShortcutAction::ZoomOut
        )
    }
}

/// Modifier key state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };
    pub const CMD: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };
    pub const CMD_SHIFT: Modifiers = Modifiers {
        ctrl: true,
        shift: true,
        ..Modifiers::NONE
    };
}

/// A keydown as delivered by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// `KeyboardEvent.key` value, e.g. `"z"`, `"Delete"`, `"ArrowLeft"`.
    pub key: String,
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Platform auto-repeat of a held key.
    #[serde(default)]
    pub repeat: bool,
}

impl KeyEvent {
    pub fn new(key: &str, modifiers: Modifiers) -> Self {
        Self {
            key: key.to_string(),
            modifiers,
            repeat: false,
        }
    }

    #[must_use]
    pub fn repeated(mut self) -> Self {
        self.repeat = true;
        self
    }
}

/// Resolves key events into shortcut actions.
///
/// Platform-aware: `meta` is ⌘ on macOS and `ctrl` plays the same role
/// elsewhere, so either counts as "cmd".
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key combo to an action. `None` if it has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        // ── Modifier combos first (most specific) ──
        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                "g" | "G" => Some(ShortcutAction::Ungroup),
                // shifted `=` on most layouts
                "+" => Some(ShortcutAction::ZoomIn),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "d" | "D" => Some(ShortcutAction::Duplicate),
                "g" | "G" => Some(ShortcutAction::Group),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ZoomReset),
                "'" => Some(ShortcutAction::ToggleGrid),
                "e" | "E" => Some(ShortcutAction::Export),
                "s" | "S" => Some(ShortcutAction::Save),
                _ => None,
            };
        }

        if shift {
            return match key {
                "!" | "1" => Some(ShortcutAction::ZoomToFit),
                _ => Direction::from_key(key).map(ShortcutAction::NudgeLarge),
            };
        }

        // ── Single keys (no modifiers) ──
        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Deselect),
            _ => Direction::from_key(key).map(ShortcutAction::Nudge),
        }
    }

    pub fn resolve_event(event: &KeyEvent) -> Option<ShortcutAction> {
        let m = event.modifiers;
        Self::resolve(&event.key, m.ctrl, m.shift, m.alt, m.meta)
    }
}

/// Per-editor keyboard state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputContext {
    text_editing: Option<NodeId>,
}

impl InputContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the inline text-editing sub-mode for `node`.
    pub fn begin_text_edit(&mut self, node: NodeId) {
        self.text_editing = Some(node);
    }

    pub fn end_text_edit(&mut self) {
        self.text_editing = None;
    }

    pub fn text_editing(&self) -> Option<NodeId> {
        self.text_editing
    }

    pub fn is_text_editing(&self) -> bool {
        self.text_editing.is_some()
    }

    /// Resolve `event` in this context. Nothing resolves while a text node
    /// is being edited, and auto-repeat only retriggers repeat-safe actions.
    pub fn resolve(&self, event: &KeyEvent) -> Option<ShortcutAction> {
        if self.is_text_editing() {
            return None;
        }
        let action = ShortcutMap::resolve_event(event)?;
        if event.repeat && !action.is_repeat_safe() {
            log::trace!("ignoring auto-repeat of {action:?}");
            return None;
        }
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_undo_redo() {
        // Cmd+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", false, false, false, true),
            Some(ShortcutAction::Undo)
        );
        // Ctrl+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", true, false, false, false),
            Some(ShortcutAction::Undo)
        );
        // Cmd+Shift+Z → Redo
        assert_eq!(
            ShortcutMap::resolve("Z", false, true, false, true),
            Some(ShortcutAction::Redo)
        );
        assert_eq!(
            ShortcutMap::resolve("y", true, false, false, false),
            Some(ShortcutAction::Redo)
        );
    }

    #[test]
    fn resolve_edit_keys() {
        assert_eq!(
            ShortcutMap::resolve("Delete", false, false, false, false),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(
            ShortcutMap::resolve("Backspace", false, false, false, false),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(
            ShortcutMap::resolve("d", true, false, false, false),
            Some(ShortcutAction::Duplicate)
        );
        assert_eq!(
            ShortcutMap::resolve("Escape", false, false, false, false),
            Some(ShortcutAction::Deselect)
        );
        assert_eq!(
            ShortcutMap::resolve("g", true, false, false, false),
            Some(ShortcutAction::Group)
        );
        assert_eq!(
            ShortcutMap::resolve("g", false, true, false, true),
            Some(ShortcutAction::Ungroup)
        );
    }

    #[test]
    fn resolve_nudges() {
        assert_eq!(
            ShortcutMap::resolve("ArrowLeft", false, false, false, false),
            Some(ShortcutAction::Nudge(Direction::Left))
        );
        assert_eq!(
            ShortcutMap::resolve("ArrowDown", false, true, false, false),
            Some(ShortcutAction::NudgeLarge(Direction::Down))
        );
        // arrows with cmd are not nudges
        assert_eq!(ShortcutMap::resolve("ArrowUp", true, false, false, false), None);
    }

    #[test]
    fn resolve_view_and_file() {
        assert_eq!(
            ShortcutMap::resolve("=", true, false, false, false),
            Some(ShortcutAction::ZoomIn)
        );
        assert_eq!(
            ShortcutMap::resolve("+", false, true, false, true),
            Some(ShortcutAction::ZoomIn)
        );
        assert_eq!(
            ShortcutMap::resolve("-", true, false, false, false),
            Some(ShortcutAction::ZoomOut)
        );
        assert_eq!(
            ShortcutMap::resolve("0", true, false, false, false),
            Some(ShortcutAction::ZoomReset)
        );
        assert_eq!(
            ShortcutMap::resolve("!", false, true, false, false),
            Some(ShortcutAction::ZoomToFit)
        );
        assert_eq!(
            ShortcutMap::resolve("'", false, false, false, true),
            Some(ShortcutAction::ToggleGrid)
        );
        assert_eq!(
            ShortcutMap::resolve("e", true, false, false, false),
            Some(ShortcutAction::Export)
        );
        assert_eq!(
            ShortcutMap::resolve("s", true, false, false, false),
            Some(ShortcutAction::Save)
        );
    }

    #[test]
    fn unbound_keys_resolve_to_none() {
        assert_eq!(ShortcutMap::resolve("q", false, false, false, false), None);
        assert_eq!(ShortcutMap::resolve("q", true, false, false, false), None);
    }

    #[test]
    fn text_editing_blocks_shortcuts() {
        let mut ctx = InputContext::new();
        let backspace = KeyEvent::new("Backspace", Modifiers::NONE);
        assert_eq!(ctx.resolve(&backspace), Some(ShortcutAction::Delete));

        ctx.begin_text_edit(NodeId::intern("k_text"));
        assert_eq!(ctx.resolve(&backspace), None);
        assert_eq!(ctx.resolve(&KeyEvent::new("z", Modifiers::CMD)), None);

        ctx.end_text_edit();
        assert_eq!(ctx.resolve(&backspace), Some(ShortcutAction::Delete));
    }

    #[test]
    fn repeat_only_retriggers_safe_actions() {
        let ctx = InputContext::new();
        let held_arrow = KeyEvent::new("ArrowRight", Modifiers::NONE).repeated();
        assert_eq!(
            ctx.resolve(&held_arrow),
            Some(ShortcutAction::Nudge(Direction::Right))
        );
        let held_dup = KeyEvent::new("d", Modifiers::CMD).repeated();
        assert_eq!(ctx.resolve(&held_dup), None);
        let held_delete = KeyEvent::new("Delete", Modifiers::NONE).repeated();
        assert_eq!(ctx.resolve(&held_delete), None);
    }

    #[test]
    fn contexts_are_independent() {
        let mut a = InputContext::new();
        let b = InputContext::new();
        a.begin_text_edit(NodeId::intern("k_a"));
        let esc = KeyEvent::new("Escape", Modifiers::NONE);
        assert_eq!(a.resolve(&esc), None);
        assert_eq!(b.resolve(&esc), Some(ShortcutAction::Deselect));
    }
}
