//! Copy and context-menu deterrence for guide pages.
//!
//! This is cosmetic. It discourages casual copying in a browser and nothing
//! more; the content is still plain HTML.

use std::fmt::Write;

/// Where an interceptor is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Document,
    Window,
}

/// A DOM event whose default action is prevented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interceptor {
    pub event: &'static str,
    pub target: Target,
    /// Only `keydown` is filtered; every other event is always suppressed.
    pub filtered: bool,
}

const fn on(event: &'static str, target: Target, filtered: bool) -> Interceptor {
    Interceptor { event, target, filtered }
}

pub const INTERCEPTORS: &[Interceptor] = &[
    on("contextmenu", Target::Document, false),
    on("copy", Target::Document, false),
    on("cut", Target::Document, false),
    on("selectstart", Target::Document, false),
    on("dragstart", Target::Document, false),
    on("keydown", Target::Document, true),
    on("beforeprint", Target::Window, false),
];

/// Letters suppressed with Ctrl or Meta held.
pub const SHORTCUT_KEYS: &[char] = &['c', 'x', 'a', 's', 'u', 'p'];

/// Digits suppressed with Ctrl or Meta plus Shift held.
pub const SCREENSHOT_KEYS: &[&str] = &["3", "4"];

/// The parts of a `KeyboardEvent` the rules look at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        KeyEvent { key: key.into(), ..Default::default() }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Whether the keydown handler prevents this key combination.
    ///
    /// ```rust
    /// use guidebook::protection::KeyEvent;
    ///
    /// assert!(KeyEvent::new("PrintScreen").suppresses());
    /// assert!(KeyEvent::new("C").ctrl().suppresses());
    /// assert!(KeyEvent::new("s").meta().shift().suppresses());
    /// assert!(KeyEvent::new("4").ctrl().shift().suppresses());
    /// assert!(!KeyEvent::new("4").ctrl().suppresses());
    /// assert!(!KeyEvent::new("v").ctrl().suppresses());
    /// assert!(!KeyEvent::new("c").suppresses());
    /// ```
    pub fn suppresses(&self) -> bool {
        let command = self.ctrl || self.meta;
        let letter = {
            let mut chars = self.key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c.to_ascii_lowercase()),
                _ => None,
            }
        };

        self.key == "PrintScreen"
            || (self.meta && self.shift && letter == Some('s'))
            || (command && self.shift && SCREENSHOT_KEYS.contains(&&*self.key))
            || (command && letter.map_or(false, |c| SHORTCUT_KEYS.contains(&c)))
    }
}

/// Generates the browser script that installs [`INTERCEPTORS`] with the
/// key rules of [`KeyEvent::suppresses`].
pub fn script() -> String {
    let letters: String = SHORTCUT_KEYS.iter().collect();
    let digits: String = SCREENSHOT_KEYS.concat();

    let mut js = String::from("(function () {\n");
    js.push_str("  var stop = function (e) { e.preventDefault(); return false; };\n");
    js.push_str("  var keydown = function (e) {\n");
    js.push_str("    var k = e.key || '', l = k.length === 1 ? k.toLowerCase() : '';\n");
    js.push_str("    var cmd = e.ctrlKey || e.metaKey;\n");
    js.push_str("    if (k === 'PrintScreen') {\n");
    js.push_str("      try { navigator.clipboard.writeText(''); } catch (_) {}\n");
    js.push_str("      return stop(e);\n");
    js.push_str("    }\n");
    js.push_str("    if (e.metaKey && e.shiftKey && l === 's') return stop(e);\n");
    let _ = writeln!(js, "    if (cmd && e.shiftKey && l && '{digits}'.indexOf(l) >= 0) return stop(e);");
    let _ = writeln!(js, "    if (cmd && l && '{letters}'.indexOf(l) >= 0) return stop(e);");
    js.push_str("  };\n");

    for interceptor in INTERCEPTORS {
        let target = match interceptor.target {
            Target::Document => "document",
            Target::Window => "window",
        };

        let handler = if interceptor.filtered { "keydown" } else { "stop" };
        let _ = writeln!(js, "  {target}.addEventListener('{}', {handler});", interceptor.event);
    }

    js.push_str("})();\n");
    js
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_letters_ignore_case_and_modifier() {
        for key in ["c", "X", "a", "S", "u", "P"] {
            assert!(KeyEvent::new(key).ctrl().suppresses(), "ctrl+{key}");
            assert!(KeyEvent::new(key).meta().suppresses(), "meta+{key}");
        }

        assert!(!KeyEvent::new("s").shift().suppresses());
        assert!(!KeyEvent::new("Control").ctrl().suppresses());
    }

    #[test]
    fn screenshot_digits_need_shift() {
        assert!(KeyEvent::new("3").meta().shift().suppresses());
        assert!(!KeyEvent::new("3").shift().suppresses());
        assert!(!KeyEvent::new("5").meta().shift().suppresses());
    }

    #[test]
    fn script_attaches_every_interceptor() {
        let js = script();
        assert_eq!(js.matches("addEventListener").count(), INTERCEPTORS.len());
        assert!(js.contains("window.addEventListener('beforeprint', stop);"));
        assert!(js.contains("document.addEventListener('keydown', keydown);"));
        assert!(js.contains("'cxasup'"));
        assert!(js.contains("'34'"));
    }
}
