//! Low-level keyboard and mouse hooks (Windows)
//!
//! Each hook set lives on a dedicated thread that owns a message loop; the
//! hook procedures run on that thread and only forward events to the
//! current [`HookSink`].

use crate::capture::input::hook::{HookSink, HotkeySource, InputSource};
use crate::capture::input::types::{MouseButton, RawInputEvent};
use crate::recorder::channel::{RecordingError, RecordingResult};
use parking_lot::Mutex as ParkingMutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread::JoinHandle;
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, POINT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::GetKeyNameTextW;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetCursorPos, GetMessageW, PostThreadMessageW,
    SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx, HHOOK, KBDLLHOOKSTRUCT, MSG,
    MSLLHOOKSTRUCT, WH_KEYBOARD_LL, WH_MOUSE_LL, WINDOWS_HOOK_ID, WM_KEYDOWN, WM_KEYUP,
    WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MBUTTONDOWN, WM_MBUTTONUP, WM_MOUSEMOVE, WM_MOUSEWHEEL,
    WM_QUIT, WM_RBUTTONDOWN, WM_RBUTTONUP, WM_SYSKEYDOWN, WM_SYSKEYUP,
};

static RECORD_SINK: ParkingMutex<Option<HookSink>> = parking_lot::const_mutex(None);
static HOTKEY_SINK: ParkingMutex<Option<HookSink>> = parking_lot::const_mutex(None);
static HOTKEY_VK: AtomicU32 = AtomicU32::new(0);
static HOTKEY_HELD: AtomicBool = AtomicBool::new(false);

type HookProc = unsafe extern "system" fn(i32, WPARAM, LPARAM) -> LRESULT;

struct HookThread {
    thread_id: u32,
    handle: JoinHandle<()>,
}

impl HookThread {
    /// Install `hooks` on a fresh thread and pump its messages until stopped.
    fn spawn(name: &str, hooks: Vec<(WINDOWS_HOOK_ID, HookProc)>) -> RecordingResult<Self> {
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<u32, String>>();

        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || unsafe {
                let module = match GetModuleHandleW(None) {
                    Ok(module) => module,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };

                let mut installed: Vec<HHOOK> = Vec::with_capacity(hooks.len());
                for (id, proc_) in hooks {
                    match SetWindowsHookExW(id, Some(proc_), HINSTANCE::from(module), 0) {
                        Ok(hook) => installed.push(hook),
                        Err(e) => {
                            for hook in installed.drain(..) {
                                let _ = UnhookWindowsHookEx(hook);
                            }
                            let _ = ready_tx.send(Err(e.to_string()));
                            return;
                        }
                    }
                }

                let _ = ready_tx.send(Ok(GetCurrentThreadId()));

                let mut msg = MSG::default();
                while GetMessageW(&mut msg, HWND::default(), 0, 0).as_bool() {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }

                for hook in installed {
                    let _ = UnhookWindowsHookEx(hook);
                }
            })
            .map_err(|e| RecordingError::HookInstall(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => Ok(Self { thread_id, handle }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(RecordingError::HookInstall(e))
            }
            Err(_) => {
                let _ = handle.join();
                Err(RecordingError::HookInstall("hook thread exited".to_string()))
            }
        }
    }

    fn stop(self) {
        unsafe {
            let _ = PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
        }
        let _ = self.handle.join();
    }
}

/// Recording hooks: pointer moves, buttons, wheel and every key except the hotkey.
pub struct LowLevelHooks {
    thread: Option<HookThread>,
}

impl LowLevelHooks {
    pub fn new() -> Self {
        Self { thread: None }
    }
}

impl Default for LowLevelHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for LowLevelHooks {
    fn attach(&mut self, sink: HookSink) -> RecordingResult<()> {
        if self.thread.is_some() {
            return Ok(());
        }
        *RECORD_SINK.lock() = Some(sink);
        match HookThread::spawn(
            "input-hooks",
            vec![
                (WH_MOUSE_LL, mouse_hook_proc as HookProc),
                (WH_KEYBOARD_LL, keyboard_hook_proc as HookProc),
            ],
        ) {
            Ok(thread) => {
                self.thread = Some(thread);
                tracing::info!("Input hooks attached");
                Ok(())
            }
            Err(e) => {
                *RECORD_SINK.lock() = None;
                Err(e)
            }
        }
    }

    fn detach(&mut self) {
        if let Some(thread) = self.thread.take() {
            thread.stop();
            tracing::info!("Input hooks detached");
        }
        *RECORD_SINK.lock() = None;
    }

    fn cursor_position(&self) -> Option<(i32, i32)> {
        cursor_position()
    }
}

/// Process-lifetime keyboard hook that only reports the toggle hotkey.
pub struct HotkeyHook {
    thread: Option<HookThread>,
}

impl HotkeyHook {
    pub fn new() -> Self {
        Self { thread: None }
    }
}

impl Default for HotkeyHook {
    fn default() -> Self {
        Self::new()
    }
}

impl HotkeySource for HotkeyHook {
    fn listen(&mut self, hotkey: &str, sink: HookSink) -> RecordingResult<()> {
        let vk = name_to_vk(hotkey).ok_or_else(|| {
            RecordingError::ConfigurationError(format!("Unknown hotkey: {}", hotkey))
        })?;
        HOTKEY_VK.store(vk, Ordering::SeqCst);
        HOTKEY_HELD.store(false, Ordering::SeqCst);
        *HOTKEY_SINK.lock() = Some(sink);

        let hooks = vec![(WH_KEYBOARD_LL, hotkey_hook_proc as HookProc)];
        match HookThread::spawn("hotkey-hook", hooks) {
            Ok(thread) => {
                self.thread = Some(thread);
                tracing::info!("Listening for hotkey {} (vk=0x{:02X})", hotkey, vk);
                Ok(())
            }
            Err(e) => {
                *HOTKEY_SINK.lock() = None;
                Err(e)
            }
        }
    }

    fn shutdown(&mut self) {
        if let Some(thread) = self.thread.take() {
            thread.stop();
        }
        *HOTKEY_SINK.lock() = None;
    }
}

fn cursor_position() -> Option<(i32, i32)> {
    let mut pt = POINT::default();
    unsafe { GetCursorPos(&mut pt).ok().map(|_| (pt.x, pt.y)) }
}

unsafe extern "system" fn mouse_hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code == 0 {
        if let Some(sink) = RECORD_SINK.lock().as_ref() {
            let data = *(lparam.0 as *const MSLLHOOKSTRUCT);
            let t = sink.now_ms();
            let button = |button: MouseButton, pressed: bool| {
                // The hook struct can lag behind the real cursor; query it at the edge.
                let (x, y) = cursor_position().unwrap_or((data.pt.x, data.pt.y));
                RawInputEvent::PointerButton {
                    x,
                    y,
                    button,
                    pressed,
                    t,
                }
            };
            let event = match wparam.0 as u32 {
                WM_MOUSEMOVE => Some(RawInputEvent::PointerMove {
                    x: data.pt.x,
                    y: data.pt.y,
                    t,
                }),
                WM_LBUTTONDOWN => Some(button(MouseButton::Left, true)),
                WM_LBUTTONUP => Some(button(MouseButton::Left, false)),
                WM_RBUTTONDOWN => Some(button(MouseButton::Right, true)),
                WM_RBUTTONUP => Some(button(MouseButton::Right, false)),
                WM_MBUTTONDOWN => Some(button(MouseButton::Middle, true)),
                WM_MBUTTONUP => Some(button(MouseButton::Middle, false)),
                WM_MOUSEWHEEL => Some(RawInputEvent::Wheel {
                    delta: ((data.mouseData >> 16) & 0xffff) as i16 as i32,
                    t,
                }),
                _ => None,
            };
            if let Some(event) = event {
                sink.input(event);
            }
        }
    }
    CallNextHookEx(HHOOK::default(), code, wparam, lparam)
}

unsafe extern "system" fn keyboard_hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code == 0 {
        if let Some(sink) = RECORD_SINK.lock().as_ref() {
            let data = *(lparam.0 as *const KBDLLHOOKSTRUCT);
            let pressed = match wparam.0 as u32 {
                WM_KEYDOWN | WM_SYSKEYDOWN => Some(true),
                WM_KEYUP | WM_SYSKEYUP => Some(false),
                _ => None,
            };
            if let Some(pressed) = pressed {
                if data.vkCode != HOTKEY_VK.load(Ordering::SeqCst) {
                    sink.input(RawInputEvent::Key {
                        scan_code: data.scanCode,
                        name: key_name(data.vkCode, data.scanCode, data.flags.0),
                        pressed,
                        t: sink.now_ms(),
                    });
                }
            }
        }
    }
    CallNextHookEx(HHOOK::default(), code, wparam, lparam)
}

unsafe extern "system" fn hotkey_hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code == 0 {
        let data = *(lparam.0 as *const KBDLLHOOKSTRUCT);
        if data.vkCode == HOTKEY_VK.load(Ordering::SeqCst) {
            match wparam.0 as u32 {
                WM_KEYDOWN | WM_SYSKEYDOWN => {
                    // Auto-repeat must not toggle again
                    if !HOTKEY_HELD.swap(true, Ordering::SeqCst) {
                        if let Some(sink) = HOTKEY_SINK.lock().as_ref() {
                            sink.hotkey(sink.now_ms());
                        }
                    }
                }
                WM_KEYUP | WM_SYSKEYUP => HOTKEY_HELD.store(false, Ordering::SeqCst),
                _ => {}
            }
        }
    }
    CallNextHookEx(HHOOK::default(), code, wparam, lparam)
}

/// Key names in the lowercase style macro scripts expect (`a`, `shift`, `page up`).
pub fn vk_to_name(vk: u32) -> Option<String> {
    let name = match vk {
        0x08 => "backspace",
        0x09 => "tab",
        0x0D => "enter",
        0x10 | 0xA0 => "shift",
        0xA1 => "right shift",
        0x11 | 0xA2 => "ctrl",
        0xA3 => "right ctrl",
        0x12 | 0xA4 => "alt",
        0xA5 => "right alt",
        0x14 => "caps lock",
        0x1B => "esc",
        0x20 => "space",
        0x21 => "page up",
        0x22 => "page down",
        0x23 => "end",
        0x24 => "home",
        0x25 => "left",
        0x26 => "up",
        0x27 => "right",
        0x28 => "down",
        0x2D => "insert",
        0x2E => "delete",
        0x5B => "left windows",
        0x5C => "right windows",
        0x30..=0x39 | 0x41..=0x5A => {
            return Some(((vk as u8) as char).to_ascii_lowercase().to_string());
        }
        0x70..=0x87 => return Some(format!("f{}", vk - 0x6F)),
        _ => return None,
    };
    Some(name.to_string())
}

fn name_to_vk(name: &str) -> Option<u32> {
    (1..=0xFE).find(|vk| vk_to_name(*vk).is_some_and(|n| n.eq_ignore_ascii_case(name)))
}

fn key_name(vk: u32, scan_code: u32, flags: u32) -> String {
    if let Some(name) = vk_to_name(vk) {
        return name;
    }
    // Bit 0 of the hook flags marks extended keys; GetKeyNameTextW wants it at bit 24.
    let lparam = ((scan_code as i32) << 16) | (((flags & 1) as i32) << 24);
    let mut buf = [0u16; 64];
    let len = unsafe { GetKeyNameTextW(lparam, &mut buf) };
    if len > 0 {
        String::from_utf16_lossy(&buf[..len as usize]).to_lowercase()
    } else {
        format!("vk_{:02x}", vk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vk_names() {
        assert_eq!(vk_to_name(0x41).as_deref(), Some("a"));
        assert_eq!(vk_to_name(0x75).as_deref(), Some("f6"));
        assert_eq!(vk_to_name(0xA1).as_deref(), Some("right shift"));
        assert_eq!(name_to_vk("F6"), Some(0x75));
        assert_eq!(name_to_vk("nope"), None);
    }
}
