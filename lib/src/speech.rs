//! Read-aloud playback for a rendered guide.
//!
//! [`Playback`] is a three-state machine (`Idle`, `Playing`, `Paused`) driving
//! a [`Narrator`], the speech engine behind it. Transitions that the reader
//! should hear about return a [`Notice`]. The same transitions, as a
//! [`Machine`] table, drive the player in the exported pages.

use std::collections::BTreeMap;

use memchr::memchr2;
use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
}

/// Something that happens to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Event {
    /// The play/pause button.
    Toggle,
    Stop,
    /// The utterance reached its end.
    Finished,
    /// The narrator reported an error.
    Error,
}

/// A [`Narrator`] method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Call {
    Speak,
    Pause,
    Resume,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub to: PlaybackState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call: Option<Call>,
}

impl PlaybackState {
    pub const ALL: [PlaybackState; 3] = [PlaybackState::Idle, PlaybackState::Playing, PlaybackState::Paused];

    /// Where `event` leads from this state, and what the narrator is asked
    /// to do on the way.
    ///
    /// ```rust
    /// use guidebook::speech::{Call, Event, PlaybackState};
    ///
    /// let t = PlaybackState::Playing.on(Event::Toggle);
    /// assert_eq!((t.to, t.call), (PlaybackState::Paused, Some(Call::Pause)));
    ///
    /// let t = PlaybackState::Paused.on(Event::Stop);
    /// assert_eq!((t.to, t.call), (PlaybackState::Idle, Some(Call::Cancel)));
    /// ```
    pub fn on(self, event: Event) -> Transition {
        let (to, call) = match (self, event) {
            (PlaybackState::Idle, Event::Toggle) => (PlaybackState::Playing, Some(Call::Speak)),
            (PlaybackState::Playing, Event::Toggle) => (PlaybackState::Paused, Some(Call::Pause)),
            (PlaybackState::Paused, Event::Toggle) => (PlaybackState::Playing, Some(Call::Resume)),
            (_, Event::Stop) => (PlaybackState::Idle, Some(Call::Cancel)),
            (_, Event::Finished | Event::Error) => (PlaybackState::Idle, None),
        };

        Transition { to, call }
    }

    /// The play/pause button's label in this state.
    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Idle => "朗读",
            PlaybackState::Playing => "暂停",
            PlaybackState::Paused => "继续",
        }
    }
}

impl Event {
    pub const ALL: [Event; 4] = [Event::Toggle, Event::Stop, Event::Finished, Event::Error];
}

/// A speech engine.
pub trait Narrator {
    fn is_supported(&self) -> bool;

    /// Starts reading `text` from the beginning.
    fn speak(&mut self, text: &str) -> Result<()>;

    fn pause(&mut self);

    fn resume(&mut self);

    fn cancel(&mut self);
}

/// A message shown to the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Unsupported,
    /// Shown once, after narration fails inside WeChat's in-app browser.
    EmbeddedBrowser,
}

impl Notice {
    pub fn text(&self) -> &'static str {
        match self {
            Notice::Unsupported => "您的浏览器不支持语音朗读功能",
            Notice::EmbeddedBrowser => "微信内置浏览器可能不支持语音朗读，请点击右上角在浏览器中打开",
        }
    }
}

/// User-agent marker of WeChat's in-app browser.
pub const EMBEDDED_BROWSER_MARKER: &str = "MicroMessenger";

pub struct Playback<N> {
    narrator: N,
    text: String,
    state: PlaybackState,
    embedded_browser: bool,
    notified: bool,
}

impl<N: Narrator> Playback<N> {
    /// Creates an idle player that reads `text` using `narrator`.
    /// `user_agent` is consulted only to tailor error notices.
    pub fn new(narrator: N, text: impl Into<String>, user_agent: &str) -> Self {
        Playback {
            narrator,
            text: text.into(),
            state: PlaybackState::Idle,
            embedded_browser: user_agent.contains(EMBEDDED_BROWSER_MARKER),
            notified: false,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn narrator(&self) -> &N {
        &self.narrator
    }

    /// The play/pause button.
    pub fn toggle(&mut self) -> Option<Notice> {
        if !self.narrator.is_supported() {
            return Some(Notice::Unsupported);
        }

        self.fire(Event::Toggle)
    }

    pub fn stop(&mut self) {
        match self.narrator.is_supported() {
            true => { self.fire(Event::Stop); }
            false => self.state = PlaybackState::Idle,
        }
    }

    /// The utterance reached its end.
    pub fn finished(&mut self) {
        self.fire(Event::Finished);
    }

    /// The narrator reported an error mid-utterance.
    pub fn error(&mut self, error: crate::error::Error) -> Option<Notice> {
        tracing::error!("narration failed: {}", error.message());
        self.state = self.state.on(Event::Error).to;
        if self.embedded_browser && !self.notified {
            self.notified = true;
            return Some(Notice::EmbeddedBrowser);
        }

        None
    }

    fn fire(&mut self, event: Event) -> Option<Notice> {
        let transition = self.state.on(event);
        let result = match transition.call {
            Some(Call::Speak) => self.narrator.speak(&self.text),
            Some(Call::Pause) => { self.narrator.pause(); Ok(()) }
            Some(Call::Resume) => { self.narrator.resume(); Ok(()) }
            Some(Call::Cancel) => { self.narrator.cancel(); Ok(()) }
            None => Ok(()),
        };

        match result {
            Ok(()) => {
                self.state = transition.to;
                None
            }
            Err(e) => self.error(e),
        }
    }
}

/// The playback machine as data, for the page script.
#[derive(Debug, Clone, Serialize)]
pub struct Machine {
    pub initial: PlaybackState,
    pub labels: BTreeMap<PlaybackState, &'static str>,
    pub transitions: BTreeMap<PlaybackState, BTreeMap<Event, Transition>>,
    /// Shown instead of playing when the browser has no speech engine.
    pub unsupported: &'static str,
    /// User-agent marker, and the notice shown once after an error there.
    pub embedded_marker: &'static str,
    pub embedded_notice: &'static str,
}

impl Machine {
    pub fn new() -> Machine {
        let states = PlaybackState::ALL;
        Machine {
            initial: PlaybackState::default(),
            labels: states.iter().map(|s| (*s, s.label())).collect(),
            transitions: states.iter()
                .map(|s| (*s, Event::ALL.iter().map(|e| (*e, s.on(*e))).collect()))
                .collect(),
            unsupported: Notice::Unsupported.text(),
            embedded_marker: EMBEDDED_BROWSER_MARKER,
            embedded_notice: Notice::EmbeddedBrowser.text(),
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Machine::new()
    }
}

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6",
    "blockquote", "pre", "tr", "table", "hr", "section", "article",
];

const ENTITIES: &[(&str, &str)] = &[
    ("&amp;", "&"), ("&lt;", "<"), ("&gt;", ">"), ("&quot;", "\""),
    ("&#39;", "'"), ("&#x27;", "'"), ("&nbsp;", " "),
];

/// Extracts the text to be read aloud from rendered HTML.
///
/// Tags are dropped, block-level elements end a line, a few common entities
/// are decoded, and whitespace runs collapse to a single space. Lines that end
/// up empty are removed.
///
/// ```rust
/// use guidebook::speech::plain_text;
///
/// let html = "<h1 id=\"x\">雷峰塔</h1>\n<p>西湖&amp;南岸<br />夕照山</p><p>  a   b </p>";
/// assert_eq!(plain_text(html), "雷峰塔\n西湖&南岸\n夕照山\na b");
/// ```
pub fn plain_text(html: &str) -> String {
    let mut raw = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(i) = memchr2(b'<', b'&', rest.as_bytes()) {
        raw.push_str(&rest[..i]);
        rest = &rest[i..];
        if rest.starts_with('<') {
            let Some(end) = rest.find('>') else {
                rest = "";
                break;
            };

            let name = rest[1..end]
                .trim_start_matches('/')
                .split(|c: char| c.is_whitespace() || c == '/')
                .next()
                .unwrap_or("")
                .to_ascii_lowercase();

            if BLOCK_TAGS.contains(&&*name) {
                raw.push('\n');
            }

            rest = &rest[end + 1..];
        } else {
            match ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
                Some((entity, ch)) => {
                    raw.push_str(ch);
                    rest = &rest[entity.len()..];
                }
                None => {
                    raw.push('&');
                    rest = &rest[1..];
                }
            }
        }
    }

    raw.push_str(rest);
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        supported: bool,
        fail: bool,
        calls: Vec<&'static str>,
        spoken: Option<String>,
    }

    impl Narrator for Recorder {
        fn is_supported(&self) -> bool { self.supported }

        fn speak(&mut self, text: &str) -> Result<()> {
            self.calls.push("speak");
            if self.fail {
                return crate::err!("synthesis-failed");
            }

            self.spoken = Some(text.into());
            Ok(())
        }

        fn pause(&mut self) { self.calls.push("pause") }
        fn resume(&mut self) { self.calls.push("resume") }
        fn cancel(&mut self) { self.calls.push("cancel") }
    }

    fn supported() -> Recorder {
        Recorder { supported: true, ..Default::default() }
    }

    #[test]
    fn toggle_cycles_through_states() {
        let mut playback = Playback::new(supported(), "雷峰塔", "Firefox");
        assert_eq!(playback.state(), PlaybackState::Idle);

        assert_eq!(playback.toggle(), None);
        assert_eq!(playback.state(), PlaybackState::Playing);
        assert_eq!(playback.toggle(), None);
        assert_eq!(playback.state(), PlaybackState::Paused);
        assert_eq!(playback.toggle(), None);
        assert_eq!(playback.state(), PlaybackState::Playing);

        playback.stop();
        assert_eq!(playback.state(), PlaybackState::Idle);
        assert_eq!(playback.narrator().calls, ["speak", "pause", "resume", "cancel"]);
        assert_eq!(playback.narrator().spoken.as_deref(), Some("雷峰塔"));
    }

    #[test]
    fn end_of_utterance_returns_to_idle() {
        let mut playback = Playback::new(supported(), "x", "");
        playback.toggle();
        playback.finished();
        assert_eq!(playback.state(), PlaybackState::Idle);

        playback.toggle();
        assert_eq!(playback.narrator().calls, ["speak", "speak"]);
    }

    #[test]
    fn unsupported_narrator_keeps_state() {
        let mut playback = Playback::new(Recorder::default(), "x", "");
        assert_eq!(playback.toggle(), Some(Notice::Unsupported));
        assert_eq!(playback.state(), PlaybackState::Idle);
        assert!(playback.narrator().calls.is_empty());
    }

    #[test]
    fn embedded_browser_notice_is_shown_once() {
        let failing = Recorder { supported: true, fail: true, ..Default::default() };
        let ua = "Mozilla/5.0 (iPhone) MicroMessenger/8.0.47";
        let mut playback = Playback::new(failing, "x", ua);

        assert_eq!(playback.toggle(), Some(Notice::EmbeddedBrowser));
        assert_eq!(playback.state(), PlaybackState::Idle);
        assert_eq!(playback.toggle(), None);
        assert_eq!(playback.state(), PlaybackState::Idle);
    }

    #[test]
    fn errors_elsewhere_are_silent() {
        let failing = Recorder { supported: true, fail: true, ..Default::default() };
        let mut playback = Playback::new(failing, "x", "Safari");
        assert_eq!(playback.toggle(), None);
        assert_eq!(playback.state(), PlaybackState::Idle);
    }

    #[test]
    fn machine_table_matches_playback() {
        let machine = Machine::new();
        for state in PlaybackState::ALL {
            assert_eq!(machine.transitions[&state].len(), Event::ALL.len());
        }

        // Replay the table against a live player.
        let mut playback = Playback::new(supported(), "x", "");
        let mut state = machine.initial;
        for event in [Event::Toggle, Event::Toggle, Event::Toggle, Event::Finished, Event::Toggle, Event::Stop] {
            match event {
                Event::Toggle => { playback.toggle(); }
                Event::Stop => playback.stop(),
                Event::Finished => playback.finished(),
                Event::Error => unreachable!(),
            }

            state = machine.transitions[&state][&event].to;
            assert_eq!(playback.state(), state, "after {event:?}");
        }

        let json = serde_json::to_value(&machine).unwrap();
        assert_eq!(json["transitions"]["idle"]["toggle"], serde_json::json!({ "to": "playing", "call": "speak" }));
        assert_eq!(json["transitions"]["paused"]["finished"], serde_json::json!({ "to": "idle" }));
        assert_eq!(json["labels"]["paused"], "继续");
        assert_eq!(json["embedded_marker"], "MicroMessenger");
    }

    #[test]
    fn plain_text_handles_odd_markup() {
        assert_eq!(plain_text("a &copy; b"), "a &copy; b");
        assert_eq!(plain_text("<ul><li>one</li><li>two</li></ul>"), "one\ntwo");
        assert_eq!(plain_text("cut <b"), "cut");
        assert_eq!(plain_text(""), "");
    }
}
