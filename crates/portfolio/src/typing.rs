//! Hero typing effect: type a phrase, dwell, delete it, move to the next.

use anyhow::Result;
use core::time::Duration;
use dom::NodeKey;
use log::debug;
use page_runtime::Page;

pub const DEFAULT_PHRASES: [&str; 4] = [
    "Data Science Student",
    "Python Developer",
    "Problem Solver",
    "Cultural Bridge Builder",
];

pub const START_DELAY: Duration = Duration::from_millis(1000);
pub const TYPE_DELAY: Duration = Duration::from_millis(100);
pub const DELETE_DELAY: Duration = Duration::from_millis(50);
pub const PAUSE: Duration = Duration::from_millis(2000);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Typing,
    Pausing,
    Deleting,
}

/// Cursor of the typing loop. Owned by the task that drives it.
#[derive(Clone, Debug)]
pub struct TypingState {
    phrases: Vec<Vec<char>>,
    phrase: usize,
    visible: usize,
    phase: Phase,
}

impl TypingState {
    /// `None` when there is nothing to type.
    pub fn new<S: AsRef<str>>(phrases: &[S]) -> Option<Self> {
        if phrases.is_empty() {
            return None;
        }
        Some(Self {
            phrases: phrases
                .iter()
                .map(|phrase| phrase.as_ref().chars().collect())
                .collect(),
            phrase: 0,
            visible: 0,
            phase: Phase::Typing,
        })
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub const fn phrase_index(&self) -> usize {
        self.phrase
    }

    pub fn current_phrase(&self) -> String {
        self.current().iter().collect()
    }

    fn current(&self) -> &[char] {
        self.phrases
            .get(self.phrase)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The displayed text: the first `visible` characters of the phrase.
    pub fn text(&self) -> String {
        self.current().iter().take(self.visible).collect()
    }

    /// Advance one step and return the delay before the next one.
    pub fn step(&mut self) -> Duration {
        let len = self.current().len();
        match self.phase {
            Phase::Typing => {
                self.visible = (self.visible + 1).min(len);
                if self.visible == len {
                    self.phase = Phase::Pausing;
                    PAUSE
                } else {
                    TYPE_DELAY
                }
            }
            Phase::Pausing | Phase::Deleting => {
                self.visible = self.visible.saturating_sub(1);
                if self.visible == 0 {
                    self.phrase = (self.phrase + 1) % self.phrases.len();
                    self.phase = Phase::Typing;
                } else {
                    self.phase = Phase::Deleting;
                }
                DELETE_DELAY
            }
        }
    }
}

fn schedule(page: &mut Page, node: NodeKey, mut state: TypingState, delay: Duration) {
    page.set_timeout(delay, move |page| {
        if !page.document().contains(node) {
            debug!("typing target removed; stopping");
            return Ok(());
        }
        let next = state.step();
        page.document_mut().set_text_content(node, &state.text())?;
        schedule(page, node, state, next);
        Ok(())
    });
}

/// Start the loop on `.typing-effect`.
///
/// # Errors
/// Propagates selector failures.
pub fn init<S: AsRef<str>>(page: &mut Page, phrases: &[S]) -> Result<()> {
    let Some(node) = page.document().query_selector(".typing-effect")? else {
        debug!("no typing target");
        return Ok(());
    };
    let Some(state) = TypingState::new(phrases) else {
        debug!("no phrases to type");
        return Ok(());
    };
    schedule(page, node, state, START_DELAY);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_pauses_deletes_and_advances() {
        let mut state = TypingState::new(&["ab", "c"]).unwrap();
        assert_eq!(state.step(), TYPE_DELAY);
        assert_eq!(state.text(), "a");
        assert_eq!(state.step(), PAUSE);
        assert_eq!(state.text(), "ab");
        assert_eq!(state.phase(), Phase::Pausing);
        assert_eq!(state.step(), DELETE_DELAY);
        assert_eq!(state.text(), "a");
        assert_eq!(state.phase(), Phase::Deleting);
        assert_eq!(state.step(), DELETE_DELAY);
        assert_eq!(state.text(), "");
        assert_eq!(state.phrase_index(), 1);
        assert_eq!(state.phase(), Phase::Typing);
        assert_eq!(state.step(), PAUSE);
        assert_eq!(state.text(), "c");
        state.step();
        assert_eq!(state.phrase_index(), 0, "wraps to the first phrase");
    }

    #[test]
    fn multibyte_phrases_never_split() {
        let mut state = TypingState::new(&["né😀"]).unwrap();
        let mut shown = Vec::new();
        for _ in 0..3 {
            state.step();
            shown.push(state.text());
        }
        assert_eq!(shown, vec!["n", "né", "né😀"]);
    }

    #[test]
    fn empty_phrase_list_is_rejected() {
        assert!(TypingState::new::<&str>(&[]).is_none());
    }

    #[test]
    fn text_is_always_a_prefix_of_the_phrase() {
        let mut state = TypingState::new(&DEFAULT_PHRASES).unwrap();
        for _ in 0..500 {
            state.step();
            assert!(state.current_phrase().starts_with(&state.text()));
        }
    }
}
