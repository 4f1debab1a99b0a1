//! Win32 backend: `GetAsyncKeyState`, `VkKeyScanW`, `SendInput` and the
//! multimedia timer resolution calls.

use std::mem;

use tracing::{debug, warn};
use winapi::um::mmsystem::{MMSYSERR_NOERROR, TIMECAPS, TIMERR_NOERROR};
use winapi::um::timeapi::{timeBeginPeriod, timeEndPeriod, timeGetDevCaps};
use winapi::um::winuser::{
    GetAsyncKeyState, GetMessageExtraInfo, SendInput, VkKeyScanW, INPUT, INPUT_KEYBOARD,
    KEYBDINPUT, KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP,
};

use super::InputBackend;
use crate::error::{MksError, Result};
use crate::keys::{KeyEvent, KeyMapping};

pub struct WindowsBackend {
    /// Finest period the multimedia timer supports, if it could be queried.
    min_period: Option<u32>,
    extra_info: usize,
}

impl Default for WindowsBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowsBackend {
    pub fn new() -> Self {
        let min_period = query_min_period();
        if min_period.is_none() {
            warn!("timeGetDevCaps failed, sleeps will use the default timer resolution");
        }

        // SAFETY: no preconditions.
        let extra_info = unsafe { GetMessageExtraInfo() } as usize;

        Self {
            min_period,
            extra_info,
        }
    }

    fn to_input(&self, event: &KeyEvent) -> INPUT {
        let mut flags = 0;
        if event.extended {
            flags |= KEYEVENTF_EXTENDEDKEY;
        }
        if event.key_up {
            flags |= KEYEVENTF_KEYUP;
        }

        // SAFETY: INPUT is plain data, all-zero is a valid value.
        let mut input: INPUT = unsafe { mem::zeroed() };
        input.type_ = INPUT_KEYBOARD;
        // SAFETY: type_ is INPUT_KEYBOARD, so `ki` is the active union member.
        unsafe {
            *input.u.ki_mut() = KEYBDINPUT {
                wVk: u16::from(event.virtual_key),
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: self.extra_info,
            };
        }
        input
    }
}

fn query_min_period() -> Option<u32> {
    // SAFETY: TIMECAPS is plain data and its size is passed alongside.
    unsafe {
        let mut caps: TIMECAPS = mem::zeroed();
        if timeGetDevCaps(&mut caps, mem::size_of::<TIMECAPS>() as u32) != MMSYSERR_NOERROR {
            return None;
        }
        Some(caps.wPeriodMin)
    }
}

impl InputBackend for WindowsBackend {
    fn is_key_pressed(&self, virtual_key: u8) -> bool {
        // SAFETY: no preconditions. The high bit means "currently down".
        let state = unsafe { GetAsyncKeyState(i32::from(virtual_key)) };
        (state as u16) & 0x8000 != 0
    }

    fn map_char(&self, ch: char) -> KeyMapping {
        let mut units = [0u16; 2];
        let unit = ch.encode_utf16(&mut units)[0];
        // SAFETY: no preconditions; -1 is returned for unmappable characters.
        let scan = unsafe { VkKeyScanW(unit) };
        KeyMapping::from_scan(scan)
    }

    fn inject(&self, events: &[KeyEvent]) -> Result<()> {
        let mut inputs: Vec<INPUT> = events.iter().map(|event| self.to_input(event)).collect();

        // SAFETY: `inputs` holds `events.len()` initialized INPUT records.
        let sent = unsafe {
            SendInput(
                inputs.len() as u32,
                inputs.as_mut_ptr(),
                mem::size_of::<INPUT>() as i32,
            )
        };

        if sent as usize != inputs.len() {
            return Err(MksError::injection_failed(
                inputs.len(),
                format!("SendInput accepted {sent}"),
            ));
        }
        Ok(())
    }

    fn request_high_res_timer(&self) -> bool {
        let Some(period) = self.min_period else {
            return false;
        };
        // SAFETY: no preconditions.
        let ok = unsafe { timeBeginPeriod(period) } == TIMERR_NOERROR;
        if !ok {
            debug!("timeBeginPeriod({}) failed", period);
        }
        ok
    }

    fn release_high_res_timer(&self) -> bool {
        let Some(period) = self.min_period else {
            return false;
        };
        // SAFETY: no preconditions.
        let ok = unsafe { timeEndPeriod(period) } == TIMERR_NOERROR;
        if !ok {
            debug!("timeEndPeriod({}) failed", period);
        }
        ok
    }
}
