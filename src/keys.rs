//! Key events and character-to-key translation.
//!
//! Characters are typed as short batches of [`KeyEvent`]s: a plain press and
//! release, or the same pair bracketed by Shift when the host layout needs a
//! modifier to produce the character.

/// Virtual key codes used by the engine. Values follow the Win32 table.
pub mod vk {
    pub const SHIFT: u8 = 0x10;
    pub const RETURN: u8 = 0x0D;
    pub const SPACE: u8 = 0x20;
    /// Start hotkey.
    pub const F2: u8 = 0x71;
    /// Stop/restart hotkey.
    pub const F4: u8 = 0x73;
}

/// Lowest printable ASCII character used by randomized messages.
pub const PRINTABLE_FIRST: char = ' ';
/// Highest printable ASCII character used by randomized messages.
pub const PRINTABLE_LAST: char = '~';

/// A single synthesized press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub virtual_key: u8,
    pub extended: bool,
    pub key_up: bool,
}

impl KeyEvent {
    pub const fn down(virtual_key: u8) -> Self {
        Self {
            virtual_key,
            extended: false,
            key_up: false,
        }
    }

    pub const fn up(virtual_key: u8) -> Self {
        Self {
            virtual_key,
            extended: false,
            key_up: true,
        }
    }

    /// Shift events are sent with the extended-key flag.
    const fn shift(key_up: bool) -> Self {
        Self {
            virtual_key: vk::SHIFT,
            extended: true,
            key_up,
        }
    }
}

/// Result of translating a character through the host keyboard layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyMapping {
    pub virtual_key: u8,
    pub needs_shift: bool,
}

impl KeyMapping {
    /// What the host reports for a character it cannot produce.
    pub const UNMAPPED: Self = Self {
        virtual_key: 0xFF,
        needs_shift: true,
    };

    pub const fn new(virtual_key: u8, needs_shift: bool) -> Self {
        Self {
            virtual_key,
            needs_shift,
        }
    }

    /// Decodes the packed value returned by `VkKeyScan`: the low byte is the
    /// virtual key, bit 0 of the high byte is the Shift state.
    pub const fn from_scan(scan: i16) -> Self {
        let raw = scan as u16;
        Self {
            virtual_key: (raw & 0xFF) as u8,
            needs_shift: raw & 0x100 != 0,
        }
    }

    pub fn is_unmapped(&self) -> bool {
        *self == Self::UNMAPPED
    }

    /// Builds the batch that types this key: 4 events with Shift, 2 without.
    pub fn key_events(&self) -> Vec<KeyEvent> {
        let press = [KeyEvent::down(self.virtual_key), KeyEvent::up(self.virtual_key)];
        if self.needs_shift {
            let mut events = Vec::with_capacity(4);
            events.push(KeyEvent::shift(false));
            events.extend(press);
            events.push(KeyEvent::shift(true));
            events
        } else {
            press.to_vec()
        }
    }
}

/// The Enter press that terminates every message.
pub fn enter_events() -> Vec<KeyEvent> {
    KeyMapping::new(vk::RETURN, false).key_events()
}

/// US-QWERTY layout table, used where no host mapping function exists.
pub mod us_layout {
    use super::KeyMapping;

    const SHIFTED_DIGITS: &str = ")!@#$%^&*(";

    /// Unshifted / shifted pairs on the OEM keys.
    const OEM_KEYS: [(u8, char, char); 11] = [
        (0xBA, ';', ':'),
        (0xBB, '=', '+'),
        (0xBC, ',', '<'),
        (0xBD, '-', '_'),
        (0xBE, '.', '>'),
        (0xBF, '/', '?'),
        (0xC0, '`', '~'),
        (0xDB, '[', '{'),
        (0xDC, '\\', '|'),
        (0xDD, ']', '}'),
        (0xDE, '\'', '"'),
    ];

    pub fn char_to_key(ch: char) -> Option<KeyMapping> {
        match ch {
            'a'..='z' => Some(KeyMapping::new(ch.to_ascii_uppercase() as u8, false)),
            'A'..='Z' => Some(KeyMapping::new(ch as u8, true)),
            '0'..='9' => Some(KeyMapping::new(ch as u8, false)),
            ' ' => Some(KeyMapping::new(super::vk::SPACE, false)),
            _ => {
                if let Some(digit) = SHIFTED_DIGITS.find(ch) {
                    return Some(KeyMapping::new(b'0' + digit as u8, true));
                }
                OEM_KEYS.iter().find_map(|&(vk, plain, shifted)| {
                    if ch == plain {
                        Some(KeyMapping::new(vk, false))
                    } else if ch == shifted {
                        Some(KeyMapping::new(vk, true))
                    } else {
                        None
                    }
                })
            }
        }
    }

    pub fn key_to_char(mapping: KeyMapping) -> Option<char> {
        let KeyMapping {
            virtual_key,
            needs_shift,
        } = mapping;
        match virtual_key {
            b'A'..=b'Z' if needs_shift => Some(virtual_key as char),
            b'A'..=b'Z' => Some(virtual_key.to_ascii_lowercase() as char),
            b'0'..=b'9' if needs_shift => SHIFTED_DIGITS.chars().nth((virtual_key - b'0') as usize),
            b'0'..=b'9' => Some(virtual_key as char),
            super::vk::SPACE if !needs_shift => Some(' '),
            _ => OEM_KEYS
                .iter()
                .find(|(vk, _, _)| *vk == virtual_key)
                .map(|&(_, plain, shifted)| if needs_shift { shifted } else { plain }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_key_batch() {
        let events = KeyMapping::new(b'H', false).key_events();
        assert_eq!(events, vec![KeyEvent::down(b'H'), KeyEvent::up(b'H')]);
    }

    #[test]
    fn test_shifted_key_batch() {
        let events = KeyMapping::new(b'H', true).key_events();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].virtual_key, vk::SHIFT);
        assert!(events[0].extended && !events[0].key_up);
        assert_eq!(events[1], KeyEvent::down(b'H'));
        assert_eq!(events[2], KeyEvent::up(b'H'));
        assert_eq!(events[3].virtual_key, vk::SHIFT);
        assert!(events[3].extended && events[3].key_up);
    }

    #[test]
    fn test_enter_batch() {
        assert_eq!(
            enter_events(),
            vec![KeyEvent::down(vk::RETURN), KeyEvent::up(vk::RETURN)]
        );
    }

    #[test]
    fn test_from_scan() {
        // 'A' on a US layout: VK 0x41 with Shift.
        assert_eq!(KeyMapping::from_scan(0x0141), KeyMapping::new(0x41, true));
        assert_eq!(KeyMapping::from_scan(0x0041), KeyMapping::new(0x41, false));
        // Ctrl/Alt bits are dropped, only Shift matters.
        assert_eq!(KeyMapping::from_scan(0x0631), KeyMapping::new(0x31, false));
        assert!(KeyMapping::from_scan(-1).is_unmapped());
    }

    #[test]
    fn test_us_layout_shift_classification() {
        let shifted: Vec<char> = (PRINTABLE_FIRST..=PRINTABLE_LAST)
            .filter(|&ch| {
                us_layout::char_to_key(ch)
                    .unwrap_or_else(|| panic!("{ch:?} should be mapped"))
                    .needs_shift
            })
            .collect();

        let mut expected: Vec<char> = ('A'..='Z').collect();
        expected.extend("~!@#$%^&*()_+{}|:\"<>?".chars());
        expected.sort_unstable();

        let mut actual = shifted;
        actual.sort_unstable();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_us_layout_reverse_lookup() {
        for ch in PRINTABLE_FIRST..=PRINTABLE_LAST {
            let mapping = us_layout::char_to_key(ch).unwrap();
            assert_eq!(us_layout::key_to_char(mapping), Some(ch));
        }
        assert_eq!(us_layout::char_to_key('\n'), None);
        assert_eq!(us_layout::char_to_key('é'), None);
    }
}
