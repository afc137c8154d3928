/// A raw key as seen by the session, already stripped of terminal detail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Backspace,
    /// Shift, arrows, function keys and anything else that is not typing.
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Key ignored because the session is not accepting input.
    Rejected,
    /// Key not part of the accepted alphabet.
    Ignored,
    Appended { correct: bool },
    Erased,
    /// Backspace on an empty buffer.
    NothingToErase,
}

impl KeyOutcome {
    pub fn mutated_buffer(self) -> bool {
        matches!(self, KeyOutcome::Appended { .. } | KeyOutcome::Erased)
    }
}

pub fn is_accepted_char(ch: char) -> bool {
    !ch.is_control()
}

/// Applies one key to the typed buffer. The caller decides whether input is
/// allowed at all; this only enforces the alphabet and the target bound.
pub fn apply_key(typed: &mut Vec<char>, target: &[char], key: KeyInput) -> KeyOutcome {
    match key {
        KeyInput::Char(ch) if is_accepted_char(ch) => {
            let idx = typed.len();
            if idx >= target.len() {
                return KeyOutcome::Ignored;
            }
            typed.push(ch);
            KeyOutcome::Appended {
                correct: target[idx] == ch,
            }
        }
        KeyInput::Char(_) | KeyInput::Other => KeyOutcome::Ignored,
        KeyInput::Backspace => {
            if typed.pop().is_some() {
                KeyOutcome::Erased
            } else {
                KeyOutcome::NothingToErase
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn printable_chars_append() {
        let t = target("ab c");
        let mut typed = Vec::new();
        assert_eq!(
            apply_key(&mut typed, &t, KeyInput::Char('a')),
            KeyOutcome::Appended { correct: true }
        );
        assert_eq!(
            apply_key(&mut typed, &t, KeyInput::Char('x')),
            KeyOutcome::Appended { correct: false }
        );
        assert_eq!(
            apply_key(&mut typed, &t, KeyInput::Char(' ')),
            KeyOutcome::Appended { correct: true }
        );
        assert_eq!(typed, vec!['a', 'x', ' ']);
    }

    #[test]
    fn control_chars_and_other_keys_are_ignored() {
        let t = target("abc");
        let mut typed = Vec::new();
        assert_eq!(apply_key(&mut typed, &t, KeyInput::Char('\n')), KeyOutcome::Ignored);
        assert_eq!(apply_key(&mut typed, &t, KeyInput::Char('\t')), KeyOutcome::Ignored);
        assert_eq!(apply_key(&mut typed, &t, KeyInput::Other), KeyOutcome::Ignored);
        assert!(typed.is_empty());
    }

    #[test]
    fn backspace_floors_at_empty() {
        let t = target("abc");
        let mut typed = vec!['a'];
        assert_eq!(apply_key(&mut typed, &t, KeyInput::Backspace), KeyOutcome::Erased);
        assert_eq!(
            apply_key(&mut typed, &t, KeyInput::Backspace),
            KeyOutcome::NothingToErase
        );
        assert!(typed.is_empty());
    }

    #[test]
    fn buffer_never_grows_past_target() {
        let t = target("ab");
        let mut typed = vec!['a', 'b'];
        assert_eq!(apply_key(&mut typed, &t, KeyInput::Char('c')), KeyOutcome::Ignored);
        assert_eq!(typed.len(), 2);
    }

    #[test]
    fn unicode_printables_are_accepted() {
        let t = target("é");
        let mut typed = Vec::new();
        assert_eq!(
            apply_key(&mut typed, &t, KeyInput::Char('é')),
            KeyOutcome::Appended { correct: true }
        );
    }
}
