//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. On macOS the
//! command modifier is ⌘ (`meta`); elsewhere `ctrl` plays the same role.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Undo,
    Redo,
    /// Group the selected nodes.
    Group,
    /// Dissolve the selected group.
    Ungroup,
    /// Delete the selected nodes, edge or group.
    Delete,
    SelectAll,
    /// Abort the active drag, or clear the selection.
    Cancel,
}

pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the combo has no binding.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let cmd = modifiers.command();

        // ── Modifier combos first (most specific) ──
        if cmd && modifiers.shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                "g" | "G" => Some(ShortcutAction::Ungroup),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "g" | "G" => Some(ShortcutAction::Group),
                "a" | "A" => Some(ShortcutAction::SelectAll),
                _ => None,
            };
        }

        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Cancel),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd_shift() -> Modifiers {
        Modifiers {
            shift: true,
            ..Modifiers::CTRL
        }
    }

    #[test]
    fn undo_redo_bindings() {
        assert_eq!(ShortcutMap::resolve("z", Modifiers::CTRL), Some(ShortcutAction::Undo));
        assert_eq!(ShortcutMap::resolve("Z", cmd_shift()), Some(ShortcutAction::Redo));
        assert_eq!(ShortcutMap::resolve("y", Modifiers::CTRL), Some(ShortcutAction::Redo));

        let meta = Modifiers {
            meta: true,
            ..Modifiers::NONE
        };
        assert_eq!(ShortcutMap::resolve("z", meta), Some(ShortcutAction::Undo));
    }

    #[test]
    fn grouping_bindings() {
        assert_eq!(ShortcutMap::resolve("g", Modifiers::CTRL), Some(ShortcutAction::Group));
        assert_eq!(ShortcutMap::resolve("G", cmd_shift()), Some(ShortcutAction::Ungroup));
    }

    #[test]
    fn bare_keys() {
        assert_eq!(ShortcutMap::resolve("Backspace", Modifiers::NONE), Some(ShortcutAction::Delete));
        assert_eq!(ShortcutMap::resolve("Escape", Modifiers::NONE), Some(ShortcutAction::Cancel));
        assert_eq!(ShortcutMap::resolve("z", Modifiers::NONE), None);
        assert_eq!(ShortcutMap::resolve("g", Modifiers::SHIFT), None);
    }
}
