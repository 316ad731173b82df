//! Terminal lifecycle management and keyboard input.
//!
//! This module handles raw-mode setup, restore, and panic hooks.
//! Terminal state is guaranteed to be restored on:
//! - Normal exit
//! - A second Ctrl+C (via the interrupt restore hook)
//! - Panic

use std::io::{self, Read};
use std::panic;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use blinkctl_core::workers::{KeyInput, KeySource};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

/// Puts the terminal into raw mode so single keystrokes arrive unbuffered.
///
/// Call `install_panic_hook()` before this to ensure terminal restore on panic.
///
/// # Errors
/// Returns an error if the operation fails.
pub fn setup_terminal() -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")
}

/// Restores terminal state.
///
/// This function is idempotent and safe to call multiple times.
///
/// # Errors
/// Returns an error if the operation fails.
pub fn restore_terminal() -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")
}

/// Installs a panic hook that restores the terminal before printing the panic.
///
/// Call this BEFORE `setup_terminal()` to ensure terminal restore on panic.
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

/// Maps a key event to protocol input.
///
/// In raw mode Ctrl+C no longer raises SIGINT, so it is mapped to the quit
/// key. Ctrl+D ends input.
fn key_input(key: KeyEvent) -> Option<KeyInput> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(KeyInput::Byte(b'q')),
            KeyCode::Char('d') => Some(KeyInput::EndOfInput),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Char(c) if c.is_ascii() => Some(KeyInput::Byte(c as u8)),
        KeyCode::Enter => Some(KeyInput::Byte(b'\r')),
        KeyCode::Esc => Some(KeyInput::Byte(0x1b)),
        _ => None,
    }
}

/// Keystrokes from the raw-mode terminal.
pub struct CrosstermKeys;

impl KeySource for CrosstermKeys {
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyInput>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) => Ok(key_input(key)),
            _ => Ok(None),
        }
    }
}

/// Keystrokes from a non-terminal stdin, one byte per key.
///
/// A detached thread does the blocking reads; end of stdin reads as end of
/// input once the thread drops its sender.
///
/// # Errors
/// Returns an error if the reader thread cannot be spawned.
pub fn stdin_keys() -> Result<Receiver<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for byte in io::stdin().lock().bytes() {
                let Ok(byte) = byte else { break };
                if tx.send(byte).is_err() {
                    break;
                }
            }
        })
        .context("spawn stdin reader")?;
    Ok(rx)
}
